//! Error types for np-remote

use std::path::PathBuf;

/// Failure to make the MediaRemote framework usable.
///
/// Every variant means the framework is unavailable to the instance that
/// tried to load it. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("MediaRemote framework could not be loaded from {path}: {source}")]
    LibraryNotFound {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("MediaRemote entry point {symbol} could not be resolved: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },

    #[error("MediaRemote is not available on this platform")]
    UnsupportedPlatform,
}
