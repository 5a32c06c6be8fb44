//! Update event bus.
//!
//! Design principles:
//! - Broadcast channel (tokio) - all subscribers receive every event
//! - Non-blocking send from the background context, dropped without subscribers
//! - Lagging receivers skip old events (only the latest state matters)

use crate::types::{ClientAppInfo, NowPlayingInfo};
use futures_util::stream::{self, Stream};
use log::debug;
use std::sync::Arc;
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError, error::TryRecvError};

/// Default broadcast channel capacity.
pub const CHANNEL_CAPACITY: usize = 64;

/// Largest accepted channel capacity.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Events published by a `NowPlaying` instance.
#[derive(Clone, Debug)]
pub enum InfoEvent {
    /// A new snapshot was installed.
    Updated(Arc<NowPlayingInfo>),
    /// A notification named the application holding now playing focus.
    ClientAppChanged(ClientAppInfo),
}

impl InfoEvent {
    /// Get variant index for deduplication.
    #[inline]
    pub fn variant_index(&self) -> usize {
        match self {
            InfoEvent::Updated(_) => 0,
            InfoEvent::ClientAppChanged(_) => 1,
        }
    }
}

/// Per-instance broadcast sender.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<InfoEvent>,
}

impl EventBus {
    /// Capacity is clamped to `1..=MAX_EVENT_CAPACITY`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _rx) = broadcast::channel(capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self { sender }
    }

    /// Send an event to all subscribers. Non-blocking.
    /// If no receivers, the event is dropped.
    #[inline]
    pub fn send(&self, event: InfoEvent) {
        let _ = self.sender.send(event);
    }

    /// Returns a new receiver that will receive all future events.
    pub fn subscribe(&self) -> Receiver<InfoEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

/// Drain all pending events from a receiver, keeping only the latest per variant.
/// Handles lagging by continuing to drain.
pub fn drain_latest(rx: &mut Receiver<InfoEvent>) -> Vec<InfoEvent> {
    let mut events = Vec::new();

    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Closed) => break,
        }
    }

    if events.len() <= 1 {
        return events;
    }

    let mut seen = [false; 2];
    let mut result = Vec::with_capacity(2);
    for event in events.into_iter().rev() {
        let idx = event.variant_index();
        if !seen[idx] {
            seen[idx] = true;
            result.push(event);
        }
    }

    result.reverse();
    result
}

/// Adapt a receiver into a stream of installed snapshots.
/// Ends when the owning instance is dropped.
pub fn snapshot_stream(
    rx: Receiver<InfoEvent>,
) -> impl Stream<Item = Arc<NowPlayingInfo>> + Send + 'static {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(InfoEvent::Updated(info)) => return Some((info, rx)),
                Ok(InfoEvent::ClientAppChanged(_)) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Snapshot stream lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
