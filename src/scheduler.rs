//! Asynchronous refresh of the now playing snapshot.
//!
//! Every refresh asks the backend for the full dictionary, decodes it on
//! the completion context and swaps it in whole. Overlapping refreshes are
//! not ordered: whichever completes last wins.

use crate::event_bus::{EventBus, InfoEvent};
use crate::snapshot::InfoSnapshot;
use crate::types::NowPlayingInfo;
use log::debug;
use np_remote::MediaRemoteBackend;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Runs after a refresh installed its snapshot, on the background context.
/// May run concurrently with the thread that requested the refresh.
pub type UpdateCallback = Arc<dyn Fn(Arc<NowPlayingInfo>) + Send + Sync + 'static>;

type AfterInstall = Box<dyn FnOnce(Arc<NowPlayingInfo>) + Send + 'static>;

pub struct UpdateScheduler {
    backend: Arc<dyn MediaRemoteBackend>,
    snapshot: Arc<InfoSnapshot>,
    events: Arc<EventBus>,
}

impl UpdateScheduler {
    pub fn new(
        backend: Arc<dyn MediaRemoteBackend>,
        snapshot: Arc<InfoSnapshot>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            backend,
            snapshot,
            events,
        }
    }

    /// Request a refresh. Returns immediately.
    pub fn update(&self) {
        self.request(None);
    }

    /// Request a refresh and run `callback` once its snapshot is installed.
    pub fn update_with<F>(&self, callback: F)
    where
        F: FnOnce(Arc<NowPlayingInfo>) + Send + 'static,
    {
        self.request(Some(Box::new(callback)));
    }

    /// Request a refresh and wait for its snapshot.
    ///
    /// Resolves to None if the backend dropped the request. There is no
    /// timeout: a stalled backend leaves this pending.
    pub async fn update_async(&self) -> Option<Arc<NowPlayingInfo>> {
        let (tx, rx) = oneshot::channel();
        self.update_with(move |info| {
            let _ = tx.send(info);
        });
        rx.await.ok()
    }

    fn request(&self, after: Option<AfterInstall>) {
        let snapshot = Arc::clone(&self.snapshot);
        let events = Arc::clone(&self.events);

        debug!("Requesting now playing info");
        self.backend.request_now_playing_info(Box::new(move |raw| {
            let installed = snapshot.install(NowPlayingInfo::from_raw(raw));
            events.send(InfoEvent::Updated(Arc::clone(&installed)));
            if let Some(after) = after {
                after(installed);
            }
        }));
    }
}
