//! Core types shared across the MediaRemote boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Playback commands understood by MediaRemote.
///
/// Declaration order is the native enum order, so `code()` is the value
/// passed to the send-command entry point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Command {
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    NextTrack,
    PreviousTrack,
    AdvanceShuffleMode,
    AdvanceRepeatMode,
    BeginFastForward,
    EndFastForward,
    BeginRewind,
    EndRewind,
    Rewind15Seconds,
    FastForward15Seconds,
    Rewind30Seconds,
    FastForward30Seconds,
    ToggleRecord,
    SkipForward,
    SkipBackward,
    ChangePlaybackRate,
    RateTrack,
    LikeTrack,
    DislikeTrack,
    BookmarkTrack,
    SeekToPlaybackPosition,
    ChangeRepeatMode,
    ChangeShuffleMode,
    EnableLanguageOption,
    DisableLanguageOption,
}

impl Command {
    /// Native enum value.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Whether the command reads the options dictionary.
    /// Every other command is sent with no options.
    pub fn takes_options(self) -> bool {
        matches!(
            self,
            Command::RateTrack | Command::LikeTrack | Command::DislikeTrack | Command::BookmarkTrack
        )
    }
}

/// Options attached to track rating commands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOptions {
    pub track_id: Option<String>,
    pub station_id: Option<i64>,
    pub station_hash: Option<String>,
}

impl CommandOptions {
    pub fn for_track(track_id: impl Into<String>) -> Self {
        Self {
            track_id: Some(track_id.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.track_id.is_none() && self.station_id.is_none() && self.station_hash.is_none()
    }
}

/// A single loosely-typed value from a MediaRemote dictionary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Data(Vec<u8>),
    /// Seconds since the UNIX epoch.
    Date(f64),
}

impl RawValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Float(f) => Some(*f),
            RawValue::Integer(i) => Some(*i as f64),
            RawValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawValue::Integer(i) => Some(*i),
            RawValue::Float(f) if f.is_finite() => Some(*f as i64),
            RawValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Identifiers are unsigned natively but may arrive as signed or float numbers.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RawValue::Integer(i) => Some(*i as u64),
            RawValue::Float(f) if f.is_finite() && *f >= 0.0 => Some(*f as u64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawValue::Bool(b) => Some(*b),
            RawValue::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            RawValue::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Dates, or plain numbers already expressed as UNIX seconds.
    pub fn as_unix_time(&self) -> Option<f64> {
        match self {
            RawValue::Date(t) => Some(*t),
            RawValue::Float(f) => Some(*f),
            RawValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::String(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::String(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        RawValue::Integer(i)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(d: Vec<u8>) -> Self {
        RawValue::Data(d)
    }
}

/// Raw now playing dictionary, keyed by the system-defined key strings.
pub type RawInfo = HashMap<String, RawValue>;

/// A now playing change notification delivered by the system.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NowPlayingEvent {
    /// Notification name, e.g. "kMRMediaRemoteNowPlayingInfoDidChangeNotification".
    pub name: String,
    /// The notification's user info dictionary.
    pub user_info: RawInfo,
}

impl NowPlayingEvent {
    pub fn new(name: impl Into<String>, user_info: RawInfo) -> Self {
        Self {
            name: name.into(),
            user_info,
        }
    }
}

/// Well-known dictionary keys.
///
/// Only the keys the snapshot decodes are listed; the raw map may carry more.
pub mod keys {
    pub const TITLE: &str = "kMRMediaRemoteNowPlayingInfoTitle";
    pub const ARTIST: &str = "kMRMediaRemoteNowPlayingInfoArtist";
    pub const ALBUM: &str = "kMRMediaRemoteNowPlayingInfoAlbum";
    pub const COMPOSER: &str = "kMRMediaRemoteNowPlayingInfoComposer";
    pub const GENRE: &str = "kMRMediaRemoteNowPlayingInfoGenre";
    pub const MEDIA_TYPE: &str = "kMRMediaRemoteNowPlayingInfoMediaType";
    pub const ARTWORK_DATA: &str = "kMRMediaRemoteNowPlayingInfoArtworkData";
    pub const ARTWORK_WIDTH: &str = "kMRMediaRemoteNowPlayingInfoArtworkDataWidth";
    pub const ARTWORK_HEIGHT: &str = "kMRMediaRemoteNowPlayingInfoArtworkDataHeight";
    pub const ARTWORK_MIME_TYPE: &str = "kMRMediaRemoteNowPlayingInfoArtworkMIMEType";
    pub const ARTWORK_IDENTIFIER: &str = "kMRMediaRemoteNowPlayingInfoArtworkIdentifier";
    pub const DURATION: &str = "kMRMediaRemoteNowPlayingInfoDuration";
    pub const ELAPSED_TIME: &str = "kMRMediaRemoteNowPlayingInfoElapsedTime";
    pub const TIMESTAMP: &str = "kMRMediaRemoteNowPlayingInfoTimestamp";
    pub const PLAYBACK_RATE: &str = "kMRMediaRemoteNowPlayingInfoPlaybackRate";
    pub const TRACK_NUMBER: &str = "kMRMediaRemoteNowPlayingInfoTrackNumber";
    pub const QUEUE_INDEX: &str = "kMRMediaRemoteNowPlayingInfoQueueIndex";
    pub const TOTAL_QUEUE_COUNT: &str = "kMRMediaRemoteNowPlayingInfoTotalQueueCount";
    pub const TOTAL_TRACK_COUNT: &str = "kMRMediaRemoteNowPlayingInfoTotalTrackCount";
    pub const REPEAT_MODE: &str = "kMRMediaRemoteNowPlayingInfoRepeatMode";
    pub const SHUFFLE_MODE: &str = "kMRMediaRemoteNowPlayingInfoShuffleMode";
    pub const IS_MUSIC_APP: &str = "kMRMediaRemoteNowPlayingInfoIsMusicApp";
    pub const CONTENT_ITEM_IDENTIFIER: &str = "kMRMediaRemoteNowPlayingInfoContentItemIdentifier";
    pub const UNIQUE_IDENTIFIER: &str = "kMRMediaRemoteNowPlayingInfoUniqueIdentifier";
    pub const ITUNES_STORE_IDENTIFIER: &str = "kMRMediaRemoteNowPlayingInfoiTunesStoreIdentifier";
    pub const ITUNES_STORE_SUBSCRIPTION_ADAM_IDENTIFIER: &str =
        "kMRMediaRemoteNowPlayingInfoiTunesStoreSubscriptionAdamIdentifier";
    pub const ALBUM_ITUNES_STORE_ADAM_IDENTIFIER: &str =
        "kMRMediaRemoteNowPlayingInfoAlbumiTunesStoreAdamIdentifier";
    pub const ARTIST_ITUNES_STORE_ADAM_IDENTIFIER: &str =
        "kMRMediaRemoteNowPlayingInfoArtistiTunesStoreAdamIdentifier";

    // Notification user info
    pub const APPLICATION_DISPLAY_NAME: &str =
        "kMRMediaRemoteNowPlayingApplicationDisplayNameUserInfoKey";
    pub const APPLICATION_PID: &str = "kMRMediaRemoteNowPlayingApplicationPIDUserInfoKey";

    // Command options
    pub const OPTION_TRACK_ID: &str = "kMRMediaRemoteOptionTrackID";
    pub const OPTION_STATION_ID: &str = "kMRMediaRemoteOptionStationID";
    pub const OPTION_STATION_HASH: &str = "kMRMediaRemoteOptionStationHash";
}

/// Notification names posted when the now playing state changes.
pub mod notifications {
    pub const INFO_DID_CHANGE: &str = "kMRMediaRemoteNowPlayingInfoDidChangeNotification";
    pub const APPLICATION_DID_CHANGE: &str =
        "kMRMediaRemoteNowPlayingApplicationDidChangeNotification";
    pub const APPLICATION_IS_PLAYING_DID_CHANGE: &str =
        "kMRMediaRemoteNowPlayingApplicationIsPlayingDidChangeNotification";

    /// Names observed unless configured otherwise.
    pub fn defaults() -> Vec<String> {
        vec![
            INFO_DID_CHANGE.to_string(),
            APPLICATION_DID_CHANGE.to_string(),
            APPLICATION_IS_PLAYING_DID_CHANGE.to_string(),
        ]
    }
}
