//! Entry point resolution for the MediaRemote framework.
//!
//! All five entry points are resolved up front. A library missing any of
//! them is rejected as a whole, so a `MediaRemoteSymbols` value is always
//! complete. The raw pointers never leave this crate.

use crate::error::ResolveError;
use libloading::Library;
use log::{debug, info};
use std::ffi::c_void;
use std::fmt;
use std::path::Path;

/// Where macOS ships the framework binary.
pub const DEFAULT_FRAMEWORK_PATH: &str =
    "/System/Library/PrivateFrameworks/MediaRemote.framework/MediaRemote";

pub const SEND_COMMAND: &str = "MRMediaRemoteSendCommand";
pub const SET_ELAPSED_TIME: &str = "MRMediaRemoteSetElapsedTime";
pub const GET_NOW_PLAYING_INFO: &str = "MRMediaRemoteGetNowPlayingInfo";
pub const REGISTER_NOTIFICATIONS: &str = "MRMediaRemoteRegisterForNowPlayingNotifications";
pub const UNREGISTER_NOTIFICATIONS: &str = "MRMediaRemoteUnregisterForNowPlayingNotifications";

/// Entry points that must all resolve, in resolution order.
pub const REQUIRED_SYMBOLS: [&str; 5] = [
    SEND_COMMAND,
    SET_ELAPSED_TIME,
    GET_NOW_PLAYING_INFO,
    REGISTER_NOTIFICATIONS,
    UNREGISTER_NOTIFICATIONS,
];

// (command, options dictionary or null) -> Boolean
pub(crate) type SendCommandFn = unsafe extern "C" fn(command: u32, user_info: *const c_void) -> u8;
pub(crate) type SetElapsedTimeFn = unsafe extern "C" fn(seconds: f64);
// (dispatch queue, block taking the info dictionary)
pub(crate) type GetNowPlayingInfoFn =
    unsafe extern "C" fn(queue: *mut c_void, handler: *const c_void);
pub(crate) type RegisterNotificationsFn = unsafe extern "C" fn(queue: *mut c_void);
pub(crate) type UnregisterNotificationsFn = unsafe extern "C" fn();

/// The fully resolved entry point set, kept alive with its library.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub struct MediaRemoteSymbols {
    pub(crate) send_command: SendCommandFn,
    pub(crate) set_elapsed_time: SetElapsedTimeFn,
    pub(crate) get_now_playing_info: GetNowPlayingInfoFn,
    pub(crate) register_notifications: RegisterNotificationsFn,
    pub(crate) unregister_notifications: UnregisterNotificationsFn,
    _library: Library,
}

impl MediaRemoteSymbols {
    /// Load the framework binary at `path` and resolve every entry point.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        info!("Loading MediaRemote from {}", path.display());

        // SAFETY: the framework has no initializers with preconditions on the caller.
        let library =
            unsafe { Library::new(path) }.map_err(|source| ResolveError::LibraryNotFound {
                path: path.to_path_buf(),
                source,
            })?;

        // SAFETY: each type alias matches the framework's C signature.
        let symbols = unsafe {
            Self {
                send_command: resolve(&library, SEND_COMMAND)?,
                set_elapsed_time: resolve(&library, SET_ELAPSED_TIME)?,
                get_now_playing_info: resolve(&library, GET_NOW_PLAYING_INFO)?,
                register_notifications: resolve(&library, REGISTER_NOTIFICATIONS)?,
                unregister_notifications: resolve(&library, UNREGISTER_NOTIFICATIONS)?,
                _library: library,
            }
        };

        info!("MediaRemote entry points resolved");
        Ok(symbols)
    }
}

impl fmt::Debug for MediaRemoteSymbols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaRemoteSymbols")
            .field("resolved", &REQUIRED_SYMBOLS)
            .finish()
    }
}

/// # Safety
/// `T` must be the function pointer type of the exported symbol.
unsafe fn resolve<T: Copy>(library: &Library, symbol: &'static str) -> Result<T, ResolveError> {
    // SAFETY: forwarded to the caller.
    let value = unsafe { library.get::<T>(symbol.as_bytes()) }
        .map_err(|source| ResolveError::MissingSymbol { symbol, source })?;
    debug!("Resolved {}", symbol);
    Ok(*value)
}
