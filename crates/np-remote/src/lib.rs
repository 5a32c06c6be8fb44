//! np-remote: typed access to the macOS MediaRemote private framework
//!
//! Resolves the framework's entry points once and exposes them through the
//! `MediaRemoteBackend` trait with owned Rust values. Raw pointers and
//! CoreFoundation objects stay inside this crate.

pub mod backend;
pub mod error;
pub mod symbols;
pub mod types;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(feature = "mock")]
pub mod mock;

pub use backend::{
    EventListener, FrameworkOptions, InfoCompletion, MediaRemoteBackend, create_backend,
};
pub use error::ResolveError;
pub use symbols::{DEFAULT_FRAMEWORK_PATH, MediaRemoteSymbols};
pub use types::{Command, CommandOptions, NowPlayingEvent, RawInfo, RawValue, keys, notifications};
