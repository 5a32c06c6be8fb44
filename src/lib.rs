//! nowplaying - system now playing info and playback control on macOS
//!
//! Features:
//! - MediaRemote loaded at runtime, entry points resolved up front
//! - Immutable snapshots swapped whole, readable from any thread
//! - Optional auto update driven by system notifications
//! - Broadcast channel and stream of installed snapshots

pub mod bridge;
pub mod client;
pub mod commander;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod logging;
pub mod scheduler;
pub mod snapshot;
pub mod types;

pub use bridge::RegistrationState;
pub use client::NowPlaying;
pub use commander::Commander;
pub use config::NowPlayingConfig;
pub use error::NowPlayingError;
pub use event_bus::{InfoEvent, drain_latest};
pub use np_remote::{Command, CommandOptions, RawInfo, RawValue, ResolveError};
pub use scheduler::UpdateCallback;
pub use types::{ClientAppInfo, NowPlayingInfo, PlaybackPosition, RepeatMode, ShuffleMode};
