//! Notification bridge.
//!
//! Subscribes to the system now playing change notifications and turns each
//! one into a refresh. Notifications are also the only source of the client
//! application record.

use crate::error::NowPlayingError;
use crate::event_bus::{EventBus, InfoEvent};
use crate::scheduler::{UpdateCallback, UpdateScheduler};
use crate::snapshot::InfoSnapshot;
use crate::types::ClientAppInfo;
use log::{debug, info, warn};
use np_remote::{EventListener, MediaRemoteBackend, NowPlayingEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistrationState {
    #[default]
    Unregistered,
    Registered,
}

pub struct NotificationBridge {
    backend: Arc<dyn MediaRemoteBackend>,
    scheduler: Arc<UpdateScheduler>,
    snapshot: Arc<InfoSnapshot>,
    events: Arc<EventBus>,
    state: Mutex<RegistrationState>,
    // Bumped on every transition; listeners from an older registration go quiet.
    generation: Arc<AtomicU64>,
}

impl NotificationBridge {
    pub fn new(
        backend: Arc<dyn MediaRemoteBackend>,
        scheduler: Arc<UpdateScheduler>,
        snapshot: Arc<InfoSnapshot>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            backend,
            scheduler,
            snapshot,
            events,
            state: Mutex::new(RegistrationState::Unregistered),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start refreshing on every notification.
    ///
    /// `callback` runs once per notification, after that notification's
    /// snapshot is installed.
    pub fn register(&self, callback: Option<UpdateCallback>) -> Result<(), NowPlayingError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RegistrationState::Registered {
            return Err(NowPlayingError::AlreadyRegistered);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let listener = self.listener(generation, callback);
        self.backend.register_notifications(listener);
        *state = RegistrationState::Registered;

        info!("Registered for now playing notifications");
        Ok(())
    }

    /// Stop listening. Refreshes already in flight still complete.
    pub fn unregister(&self) -> Result<(), NowPlayingError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RegistrationState::Unregistered {
            return Err(NowPlayingError::NotRegistered);
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.backend.unregister_notifications();
        *state = RegistrationState::Unregistered;

        info!("Unregistered from now playing notifications");
        Ok(())
    }

    pub fn state(&self) -> RegistrationState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_registered(&self) -> bool {
        self.state() == RegistrationState::Registered
    }

    fn listener(&self, generation: u64, callback: Option<UpdateCallback>) -> EventListener {
        // The backend owns the listener, so it must not keep the scheduler alive.
        let scheduler: Weak<UpdateScheduler> = Arc::downgrade(&self.scheduler);
        let snapshot = Arc::downgrade(&self.snapshot);
        let events = Arc::downgrade(&self.events);
        let current = Arc::clone(&self.generation);

        Arc::new(move |event: NowPlayingEvent| {
            if current.load(Ordering::SeqCst) != generation {
                debug!("Ignoring {} from a stale registration", event.name);
                return;
            }
            let Some(scheduler) = scheduler.upgrade() else {
                return;
            };
            debug!("Received {}", event.name);

            if let Some(app) = ClientAppInfo::from_user_info(&event.user_info) {
                if let Some(snapshot) = snapshot.upgrade() {
                    if snapshot.set_client_app(app.clone()) {
                        debug!("Client app is now {} ({})", app.display_name, app.pid);
                        if let Some(events) = events.upgrade() {
                            events.send(InfoEvent::ClientAppChanged(app));
                        }
                    }
                }
            }

            match &callback {
                Some(callback) => {
                    let callback = Arc::clone(callback);
                    scheduler.update_with(move |info| callback(info));
                }
                None => scheduler.update(),
            }
        })
    }
}

impl Drop for NotificationBridge {
    fn drop(&mut self) {
        if self.is_registered() {
            if let Err(e) = self.unregister() {
                warn!("Failed to unregister on drop: {}", e);
            }
        }
    }
}
