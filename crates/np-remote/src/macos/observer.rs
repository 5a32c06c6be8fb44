//! Now playing notification observer on the local notification center.

use super::convert::{raw_info_from_dictionary, string_from_ref};
use crate::backend::EventListener;
use crate::types::NowPlayingEvent;
use core_foundation::base::TCFType;
use core_foundation::dictionary::CFDictionaryRef;
use core_foundation::string::{CFString, CFStringRef};
use log::{debug, info};
use std::ffi::c_void;
use std::sync::{Arc, Mutex, PoisonError};

type CFNotificationCenterRef = *mut c_void;
type CFNotificationCallback = extern "C" fn(
    center: CFNotificationCenterRef,
    observer: *mut c_void,
    name: CFStringRef,
    object: *const c_void,
    user_info: CFDictionaryRef,
);

const DELIVER_IMMEDIATELY: isize = 4;

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFNotificationCenterGetLocalCenter() -> CFNotificationCenterRef;
    fn CFNotificationCenterAddObserver(
        center: CFNotificationCenterRef,
        observer: *const c_void,
        callback: CFNotificationCallback,
        name: CFStringRef,
        object: *const c_void,
        suspension_behavior: isize,
    );
    fn CFNotificationCenterRemoveEveryObserver(
        center: CFNotificationCenterRef,
        observer: *const c_void,
    );
}

/// Forwards observed notifications to the current listener.
///
/// The observer owns one heap allocation whose address is the
/// notification center's observer token. It stays alive until the
/// observer is dropped, after the center has forgotten it.
pub(crate) struct NotificationObserver {
    names: Vec<String>,
    sink: Arc<Sink>,
    observing: Mutex<bool>,
}

struct Sink {
    listener: Mutex<Option<EventListener>>,
}

impl NotificationObserver {
    pub(crate) fn new(names: Vec<String>) -> Self {
        Self {
            names,
            sink: Arc::new(Sink {
                listener: Mutex::new(None),
            }),
            observing: Mutex::new(false),
        }
    }

    fn token(&self) -> *const c_void {
        Arc::as_ptr(&self.sink) as *const c_void
    }

    pub(crate) fn start(&self, listener: EventListener) {
        *self.sink.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(listener);

        let mut observing = self.observing.lock().unwrap_or_else(PoisonError::into_inner);
        if *observing {
            return;
        }

        // SAFETY: the token outlives the registration (see Drop).
        unsafe {
            let center = CFNotificationCenterGetLocalCenter();
            for name in &self.names {
                let cf_name = CFString::new(name);
                CFNotificationCenterAddObserver(
                    center,
                    self.token(),
                    on_notification,
                    cf_name.as_concrete_TypeRef(),
                    std::ptr::null(),
                    DELIVER_IMMEDIATELY,
                );
            }
        }
        *observing = true;
        info!("Observing {} now playing notifications", self.names.len());
    }

    pub(crate) fn stop(&self) {
        let mut observing = self.observing.lock().unwrap_or_else(PoisonError::into_inner);
        if *observing {
            // SAFETY: removes only what `start` added for this token.
            unsafe {
                CFNotificationCenterRemoveEveryObserver(
                    CFNotificationCenterGetLocalCenter(),
                    self.token(),
                );
            }
            *observing = false;
        }
        *self.sink.listener.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl Drop for NotificationObserver {
    fn drop(&mut self) {
        self.stop();
    }
}

extern "C" fn on_notification(
    _center: CFNotificationCenterRef,
    observer: *mut c_void,
    name: CFStringRef,
    _object: *const c_void,
    user_info: CFDictionaryRef,
) {
    if observer.is_null() {
        return;
    }
    // SAFETY: the token is a live `Sink` while it is registered.
    let sink = unsafe { &*(observer as *const Sink) };
    let listener = sink
        .listener
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    let Some(listener) = listener else {
        return;
    };

    // SAFETY: the center passes a valid name and a null or valid dictionary.
    let event = unsafe {
        NowPlayingEvent::new(
            string_from_ref(name),
            raw_info_from_dictionary(user_info as *const c_void),
        )
    };
    debug!("Notification received: {}", event.name);
    listener(event);
}
