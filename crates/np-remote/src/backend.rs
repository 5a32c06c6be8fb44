use crate::error::ResolveError;
use crate::types::{Command, CommandOptions, NowPlayingEvent, RawInfo};
use std::path::PathBuf;
use std::sync::Arc;

/// Completion for a single now playing info request.
/// Runs once, on the backend's background execution context.
pub type InfoCompletion = Box<dyn FnOnce(RawInfo) + Send + 'static>;

/// Receives now playing change notifications.
/// Called on the backend's background execution context, possibly
/// concurrently with any caller thread.
pub type EventListener = Arc<dyn Fn(NowPlayingEvent) + Send + Sync + 'static>;

/// Trait that all MediaRemote backends must implement.
/// Mirrors the five native entry points with owned, typed values.
pub trait MediaRemoteBackend: Send + Sync {
    /// Send a command to the application holding now playing focus.
    /// Returns whether the system accepted it, not whether it took effect.
    fn send_command(&self, command: Command, options: Option<&CommandOptions>) -> bool;

    /// Ask the focused application to jump to `seconds`. Fire-and-forget.
    fn set_elapsed_time(&self, seconds: f64);

    /// Request the current now playing dictionary.
    /// Returns immediately; `completion` runs later on a background context.
    fn request_now_playing_info(&self, completion: InfoCompletion);

    /// Start delivering change notifications to `listener`.
    fn register_notifications(&self, listener: EventListener);

    /// Stop delivering change notifications. Requests already in flight
    /// are unaffected.
    fn unregister_notifications(&self);
}

/// Settings for loading the system framework.
#[derive(Clone, Debug)]
pub struct FrameworkOptions {
    /// Path of the framework binary.
    pub path: PathBuf,
    /// Notification names to observe once registered.
    pub notifications: Vec<String>,
}

impl Default for FrameworkOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(crate::symbols::DEFAULT_FRAMEWORK_PATH),
            notifications: crate::types::notifications::defaults(),
        }
    }
}

/// Create the system backend.
/// Fails with a `ResolveError` when the framework or any entry point is missing.
pub fn create_backend(
    options: &FrameworkOptions,
) -> Result<Arc<dyn MediaRemoteBackend>, ResolveError> {
    #[cfg(target_os = "macos")]
    {
        let framework = crate::macos::MediaRemoteFramework::load(options)?;
        Ok(Arc::new(framework))
    }

    #[cfg(not(target_os = "macos"))]
    {
        log::warn!(
            "MediaRemote requested from {} on an unsupported platform",
            options.path.display()
        );
        Err(ResolveError::UnsupportedPlatform)
    }
}
