//! Error types for nowplaying

use np_remote::ResolveError;

/// Now playing errors
#[derive(Debug, thiserror::Error)]
pub enum NowPlayingError {
    /// A required MediaRemote entry point could not be resolved.
    /// Terminal for the instance being constructed.
    #[error("MediaRemote unavailable: {0}")]
    Unavailable(#[from] ResolveError),

    #[error("Auto update is already registered")]
    AlreadyRegistered,

    #[error("Auto update is not registered")]
    NotRegistered,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}
