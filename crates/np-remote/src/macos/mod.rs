//! macOS backend for np-remote.
//!
//! Implements the MediaRemoteBackend trait on top of the private
//! MediaRemote framework. Completions and notifications arrive on the
//! default-priority global dispatch queue.

mod convert;
mod observer;

use crate::backend::{EventListener, FrameworkOptions, InfoCompletion, MediaRemoteBackend};
use crate::error::ResolveError;
use crate::symbols::MediaRemoteSymbols;
use crate::types::{Command, CommandOptions};
use block2::{Block, RcBlock};
use core_foundation::base::TCFType;
use log::debug;
use observer::NotificationObserver;
use std::ffi::c_void;
use std::sync::{Mutex, PoisonError};

const DISPATCH_QUEUE_PRIORITY_DEFAULT: isize = 0;

unsafe extern "C" {
    fn dispatch_get_global_queue(identifier: isize, flags: usize) -> *mut c_void;
}

fn global_queue() -> *mut c_void {
    // SAFETY: global queues are process-lifetime singletons.
    unsafe { dispatch_get_global_queue(DISPATCH_QUEUE_PRIORITY_DEFAULT, 0) }
}

/// The system MediaRemote framework.
pub struct MediaRemoteFramework {
    symbols: MediaRemoteSymbols,
    observer: NotificationObserver,
}

impl MediaRemoteFramework {
    /// Load the framework and resolve all entry points.
    pub fn load(options: &FrameworkOptions) -> Result<Self, ResolveError> {
        let symbols = MediaRemoteSymbols::load(&options.path)?;
        Ok(Self {
            symbols,
            observer: NotificationObserver::new(options.notifications.clone()),
        })
    }
}

impl MediaRemoteBackend for MediaRemoteFramework {
    fn send_command(&self, command: Command, options: Option<&CommandOptions>) -> bool {
        let dict = options
            .filter(|o| command.takes_options() && !o.is_empty())
            .map(convert::options_dictionary);
        let user_info = dict
            .as_ref()
            .map_or(std::ptr::null(), |d| d.as_concrete_TypeRef() as *const c_void);

        // SAFETY: `user_info` is null or a dictionary alive for the call.
        let accepted = unsafe { (self.symbols.send_command)(command.code(), user_info) } != 0;
        debug!("Sent {:?}: accepted={}", command, accepted);
        accepted
    }

    fn set_elapsed_time(&self, seconds: f64) {
        debug!("Setting elapsed time to {}s", seconds);
        // SAFETY: plain value call.
        unsafe { (self.symbols.set_elapsed_time)(seconds) }
    }

    fn request_now_playing_info(&self, completion: InfoCompletion) {
        let completion = Mutex::new(Some(completion));
        let handler = RcBlock::new(move |dict: *const c_void| {
            // SAFETY: the framework hands over a null or valid dictionary.
            let info = unsafe { convert::raw_info_from_dictionary(dict) };
            let done = completion
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(done) = done {
                done(info);
            }
        });
        let block: *const Block<_> = &*handler;

        // SAFETY: the framework copies the block before returning.
        unsafe { (self.symbols.get_now_playing_info)(global_queue(), block as *const c_void) }
    }

    fn register_notifications(&self, listener: EventListener) {
        self.observer.start(listener);
        // SAFETY: plain queue argument.
        unsafe { (self.symbols.register_notifications)(global_queue()) }
        debug!("Native notifications registered");
    }

    fn unregister_notifications(&self) {
        // SAFETY: no arguments.
        unsafe { (self.symbols.unregister_notifications)() }
        self.observer.stop();
        debug!("Native notifications unregistered");
    }
}
