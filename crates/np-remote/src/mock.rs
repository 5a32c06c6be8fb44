//! In-process MediaRemote backend.
//!
//! Records what it is asked to do and serves a configurable now playing
//! dictionary. Info requests complete on a fresh thread each, like the
//! concurrent global queue; notifications are delivered in order on one
//! dedicated thread.

use crate::backend::{EventListener, InfoCompletion, MediaRemoteBackend};
use crate::types::{Command, CommandOptions, NowPlayingEvent, RawInfo};
use crossbeam_channel::{Sender, unbounded};
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

type SharedListener = Arc<Mutex<Option<EventListener>>>;

/// Mock MediaRemote backend.
pub struct MockRemote {
    info: Mutex<RawInfo>,
    accept_commands: AtomicBool,
    commands: Mutex<Vec<(Command, Option<CommandOptions>)>>,
    elapsed_times: Mutex<Vec<f64>>,
    hold_requests: AtomicBool,
    pending: Mutex<Vec<InfoCompletion>>,
    requests: AtomicUsize,
    listener: SharedListener,
    registered: AtomicBool,
    events_tx: Sender<NowPlayingEvent>,
}

impl MockRemote {
    /// Create a mock that accepts commands and reports no now playing info.
    pub fn new() -> Self {
        let (events_tx, events_rx) = unbounded::<NowPlayingEvent>();
        let listener: SharedListener = Arc::new(Mutex::new(None));

        let delivery = Arc::clone(&listener);
        thread::Builder::new()
            .name("mock-notifications".to_string())
            .spawn(move || {
                for event in events_rx {
                    let current = delivery
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .clone();
                    match current {
                        Some(listener) => listener(event),
                        None => debug!("Dropping {} (not registered)", event.name),
                    }
                }
            })
            .ok();

        Self {
            info: Mutex::new(RawInfo::new()),
            accept_commands: AtomicBool::new(true),
            commands: Mutex::new(Vec::new()),
            elapsed_times: Mutex::new(Vec::new()),
            hold_requests: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
            requests: AtomicUsize::new(0),
            listener,
            registered: AtomicBool::new(false),
            events_tx,
        }
    }

    /// Replace the dictionary served to future requests.
    pub fn set_info(&self, info: RawInfo) {
        *self.info.lock().unwrap_or_else(PoisonError::into_inner) = info;
    }

    /// Choose what `send_command` reports.
    pub fn set_accept_commands(&self, accept: bool) {
        self.accept_commands.store(accept, Ordering::SeqCst);
    }

    /// Keep info requests pending until completed with `complete_request`.
    pub fn set_hold_requests(&self, hold: bool) {
        self.hold_requests.store(hold, Ordering::SeqCst);
    }

    /// Commands sent so far, in order.
    pub fn commands(&self) -> Vec<(Command, Option<CommandOptions>)> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Elapsed times set so far, in order.
    pub fn elapsed_times(&self) -> Vec<f64> {
        self.elapsed_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total info requests received.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Requests held and not yet completed.
    pub fn pending_requests(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Complete the held request at `index` (arrival order among those
    /// still pending) with `info`, on the calling thread.
    /// Returns false when there is no such request.
    pub fn complete_request(&self, index: usize, info: RawInfo) -> bool {
        let completion = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if index >= pending.len() {
                return false;
            }
            pending.remove(index)
        };
        completion(info);
        true
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Post a notification. Delivered asynchronously if registered,
    /// dropped otherwise.
    pub fn emit(&self, event: NowPlayingEvent) {
        let _ = self.events_tx.send(event);
    }
}

impl Default for MockRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaRemoteBackend for MockRemote {
    fn send_command(&self, command: Command, options: Option<&CommandOptions>) -> bool {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((command, options.cloned()));
        self.accept_commands.load(Ordering::SeqCst)
    }

    fn set_elapsed_time(&self, seconds: f64) {
        self.elapsed_times
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(seconds);
    }

    fn request_now_playing_info(&self, completion: InfoCompletion) {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.hold_requests.load(Ordering::SeqCst) {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(completion);
            return;
        }

        let info = self
            .info
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        thread::spawn(move || completion(info));
    }

    fn register_notifications(&self, listener: EventListener) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);
        self.registered.store(true, Ordering::SeqCst);
    }

    fn unregister_notifications(&self) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.registered.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RawValue, keys};
    use std::time::Duration;

    #[test]
    fn test_request_completes_in_background() {
        let mock = MockRemote::new();
        let mut info = RawInfo::new();
        info.insert(keys::TITLE.to_string(), RawValue::from("Song"));
        mock.set_info(info.clone());

        let (tx, rx) = crossbeam_channel::bounded(1);
        mock.request_now_playing_info(Box::new(move |raw| {
            let _ = tx.send(raw);
        }));

        let received = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(received, info);
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_held_requests_complete_out_of_order() {
        let mock = MockRemote::new();
        mock.set_hold_requests(true);

        let order = Arc::new(Mutex::new(Vec::new()));
        for id in 0..2 {
            let order = Arc::clone(&order);
            mock.request_now_playing_info(Box::new(move |_| order.lock().unwrap().push(id)));
        }
        assert_eq!(mock.pending_requests(), 2);

        assert!(mock.complete_request(1, RawInfo::new()));
        assert!(mock.complete_request(0, RawInfo::new()));
        assert!(!mock.complete_request(0, RawInfo::new()));
        assert_eq!(*order.lock().unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_events_only_reach_registered_listener() {
        let mock = MockRemote::new();
        let (tx, rx) = crossbeam_channel::unbounded();

        mock.register_notifications(Arc::new(move |event: NowPlayingEvent| {
            let _ = tx.send(event.name);
        }));
        mock.emit(NowPlayingEvent::new("delivered", RawInfo::new()));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), "delivered");

        mock.unregister_notifications();
        assert!(!mock.is_registered());
        mock.emit(NowPlayingEvent::new("dropped", RawInfo::new()));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_records_commands_and_seeks() {
        let mock = MockRemote::new();
        mock.set_accept_commands(false);
        assert!(!mock.send_command(Command::Play, None));
        mock.set_elapsed_time(42.5);

        assert_eq!(mock.commands(), vec![(Command::Play, None)]);
        assert_eq!(mock.elapsed_times(), vec![42.5]);
    }
}
