//! Core types for nowplaying

use chrono::{DateTime, TimeZone, Utc};
use np_remote::{RawInfo, keys};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Repeat mode of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepeatMode {
    Off,
    /// Repeat everything in the current view, e.g. a playlist.
    All,
    /// Repeat the current track.
    Current,
    #[default]
    Unknown,
}

impl RepeatMode {
    /// Decode the raw numeric mode (0 off, 1 one, 2 all).
    pub fn from_raw(value: i64) -> Self {
        match value {
            0 => RepeatMode::Off,
            1 => RepeatMode::Current,
            2 => RepeatMode::All,
            _ => RepeatMode::Unknown,
        }
    }
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepeatMode::Off => write!(f, "Off"),
            RepeatMode::All => write!(f, "All"),
            RepeatMode::Current => write!(f, "Current"),
            RepeatMode::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Shuffle mode of the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuffleMode {
    Off,
    On,
    #[default]
    Unknown,
}

impl ShuffleMode {
    /// Decode the raw numeric mode (0 off, 1 items, 2 collections).
    pub fn from_raw(value: i64) -> Self {
        match value {
            0 => ShuffleMode::Off,
            1 | 2 => ShuffleMode::On,
            _ => ShuffleMode::Unknown,
        }
    }
}

impl fmt::Display for ShuffleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShuffleMode::Off => write!(f, "Off"),
            ShuffleMode::On => write!(f, "On"),
            ShuffleMode::Unknown => write!(f, "Unknown"),
        }
    }
}

/// The application that last posted a now playing change.
/// Only known after a notification; empty and zero otherwise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAppInfo {
    pub display_name: String,
    pub pid: i32,
}

impl ClientAppInfo {
    /// Extract from a notification's user info.
    /// Returns None when the notification names no application.
    pub fn from_user_info(user_info: &RawInfo) -> Option<Self> {
        let display_name = extract_string(user_info, keys::APPLICATION_DISPLAY_NAME);
        let pid = user_info
            .get(keys::APPLICATION_PID)
            .and_then(|v| v.as_i64())
            .and_then(|p| i32::try_from(p).ok());

        if display_name.is_none() && pid.is_none() {
            return None;
        }

        Some(Self {
            display_name: display_name.unwrap_or_default(),
            pid: pid.unwrap_or(0),
        })
    }

    pub fn is_known(&self) -> bool {
        !self.display_name.is_empty() || self.pid != 0
    }
}

/// Elapsed time as of the last playback status change.
///
/// All fields come from the same snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlaybackPosition {
    /// Elapsed seconds at `timestamp`.
    pub elapsed: f64,
    /// UNIX seconds of the last status change, 0 if unknown.
    pub timestamp: f64,
    /// Playback rate, -1 if unknown.
    pub rate: f64,
    /// Total duration in seconds, 0 if unknown.
    pub duration: f64,
}

impl PlaybackPosition {
    /// Extrapolate the elapsed time to `now`.
    ///
    /// Without a timestamp or a positive rate the recorded elapsed time is
    /// returned as is. The result is clamped to the duration when known.
    pub fn estimated_elapsed(&self, now: DateTime<Utc>) -> f64 {
        if self.timestamp <= 0.0 || self.rate <= 0.0 {
            return self.elapsed;
        }

        let now_secs = now.timestamp_millis() as f64 / 1000.0;
        let since_change = (now_secs - self.timestamp).max(0.0);
        let estimate = (self.elapsed + since_change * self.rate).max(0.0);

        if self.duration > 0.0 {
            estimate.min(self.duration)
        } else {
            estimate
        }
    }
}

/// Immutable now playing snapshot captured at one refresh.
///
/// Missing fields hold their defaults: `None` for strings and artwork,
/// 0 for numbers and identifiers, -1 for the playback rate and `Unknown`
/// for repeat and shuffle modes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NowPlayingInfo {
    /// The dictionary this snapshot was decoded from.
    pub raw: RawInfo,

    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub composer: Option<String>,
    pub genre: Option<String>,
    pub media_type: Option<String>,

    #[serde(skip)]
    pub artwork_data: Option<Vec<u8>>,
    pub artwork_mime_type: Option<String>,
    pub artwork_identifier: Option<String>,
    pub artwork_width: u32,
    pub artwork_height: u32,

    /// Seconds.
    pub duration: f64,
    /// Seconds, as of `timestamp`.
    pub elapsed_time: f64,
    /// UNIX seconds of the last status change.
    pub timestamp: f64,
    pub playback_rate: f64,

    pub track_number: u32,
    pub queue_index: u32,
    pub total_queue_count: u32,
    pub total_track_count: u32,

    pub repeat_mode: RepeatMode,
    pub shuffle_mode: ShuffleMode,
    pub is_music_app: bool,

    pub content_item_identifier: Option<String>,
    pub unique_identifier: u64,
    pub itunes_store_identifier: u64,
    pub itunes_store_subscription_adam_identifier: u64,
    pub album_itunes_store_adam_identifier: u64,
    pub artist_itunes_store_adam_identifier: u64,
}

impl Default for NowPlayingInfo {
    fn default() -> Self {
        Self {
            raw: RawInfo::new(),
            title: None,
            artist: None,
            album: None,
            composer: None,
            genre: None,
            media_type: None,
            artwork_data: None,
            artwork_mime_type: None,
            artwork_identifier: None,
            artwork_width: 0,
            artwork_height: 0,
            duration: 0.0,
            elapsed_time: 0.0,
            timestamp: 0.0,
            playback_rate: -1.0,
            track_number: 0,
            queue_index: 0,
            total_queue_count: 0,
            total_track_count: 0,
            repeat_mode: RepeatMode::Unknown,
            shuffle_mode: ShuffleMode::Unknown,
            is_music_app: false,
            content_item_identifier: None,
            unique_identifier: 0,
            itunes_store_identifier: 0,
            itunes_store_subscription_adam_identifier: 0,
            album_itunes_store_adam_identifier: 0,
            artist_itunes_store_adam_identifier: 0,
        }
    }
}

impl NowPlayingInfo {
    /// Decode a raw dictionary, applying the defaults for missing keys.
    pub fn from_raw(raw: RawInfo) -> Self {
        let artwork_data = raw
            .get(keys::ARTWORK_DATA)
            .and_then(|v| v.as_bytes())
            .filter(|d| !d.is_empty())
            .map(|d| d.to_vec());

        Self {
            title: extract_string(&raw, keys::TITLE),
            artist: extract_string(&raw, keys::ARTIST),
            album: extract_string(&raw, keys::ALBUM),
            composer: extract_string(&raw, keys::COMPOSER),
            genre: extract_string(&raw, keys::GENRE),
            media_type: extract_string(&raw, keys::MEDIA_TYPE),
            artwork_data,
            artwork_mime_type: extract_string(&raw, keys::ARTWORK_MIME_TYPE),
            artwork_identifier: extract_string(&raw, keys::ARTWORK_IDENTIFIER),
            artwork_width: extract_u32(&raw, keys::ARTWORK_WIDTH),
            artwork_height: extract_u32(&raw, keys::ARTWORK_HEIGHT),
            duration: extract_f64(&raw, keys::DURATION).unwrap_or(0.0),
            elapsed_time: extract_f64(&raw, keys::ELAPSED_TIME).unwrap_or(0.0),
            timestamp: raw
                .get(keys::TIMESTAMP)
                .and_then(|v| v.as_unix_time())
                .unwrap_or(0.0),
            playback_rate: extract_f64(&raw, keys::PLAYBACK_RATE).unwrap_or(-1.0),
            track_number: extract_u32(&raw, keys::TRACK_NUMBER),
            queue_index: extract_u32(&raw, keys::QUEUE_INDEX),
            total_queue_count: extract_u32(&raw, keys::TOTAL_QUEUE_COUNT),
            total_track_count: extract_u32(&raw, keys::TOTAL_TRACK_COUNT),
            repeat_mode: raw
                .get(keys::REPEAT_MODE)
                .and_then(|v| v.as_i64())
                .map(RepeatMode::from_raw)
                .unwrap_or_default(),
            shuffle_mode: raw
                .get(keys::SHUFFLE_MODE)
                .and_then(|v| v.as_i64())
                .map(ShuffleMode::from_raw)
                .unwrap_or_default(),
            is_music_app: raw
                .get(keys::IS_MUSIC_APP)
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            content_item_identifier: extract_string(&raw, keys::CONTENT_ITEM_IDENTIFIER),
            unique_identifier: extract_u64(&raw, keys::UNIQUE_IDENTIFIER),
            itunes_store_identifier: extract_u64(&raw, keys::ITUNES_STORE_IDENTIFIER),
            itunes_store_subscription_adam_identifier: extract_u64(
                &raw,
                keys::ITUNES_STORE_SUBSCRIPTION_ADAM_IDENTIFIER,
            ),
            album_itunes_store_adam_identifier: extract_u64(
                &raw,
                keys::ALBUM_ITUNES_STORE_ADAM_IDENTIFIER,
            ),
            artist_itunes_store_adam_identifier: extract_u64(
                &raw,
                keys::ARTIST_ITUNES_STORE_ADAM_IDENTIFIER,
            ),
            raw,
        }
    }

    /// True when the system reported anything at all.
    pub fn has_info(&self) -> bool {
        !self.raw.is_empty()
    }

    pub fn artwork_len(&self) -> usize {
        self.artwork_data.as_ref().map_or(0, Vec::len)
    }

    pub fn playback_position(&self) -> PlaybackPosition {
        PlaybackPosition {
            elapsed: self.elapsed_time,
            timestamp: self.timestamp,
            rate: self.playback_rate,
            duration: self.duration,
        }
    }

    /// Time of the last playback status change.
    pub fn last_changed_at(&self) -> Option<DateTime<Utc>> {
        if self.timestamp <= 0.0 {
            return None;
        }
        let millis = (self.timestamp * 1000.0) as i64;
        Utc.timestamp_millis_opt(millis).single()
    }
}

// ============ Raw extraction helpers ============

fn extract_string(map: &RawInfo, key: &str) -> Option<String> {
    map.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn extract_f64(map: &RawInfo, key: &str) -> Option<f64> {
    map.get(key).and_then(|v| v.as_f64())
}

fn extract_u64(map: &RawInfo, key: &str) -> u64 {
    map.get(key).and_then(|v| v.as_u64()).unwrap_or(0)
}

fn extract_u32(map: &RawInfo, key: &str) -> u32 {
    map.get(key)
        .and_then(|v| v.as_i64())
        .and_then(|i| u32::try_from(i).ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use np_remote::RawValue;

    fn raw(pairs: &[(&str, RawValue)]) -> RawInfo {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_empty_snapshot_defaults() {
        let info = NowPlayingInfo::default();
        assert!(!info.has_info());
        assert_eq!(info.playback_rate, -1.0);
        assert_eq!(info.duration, 0.0);
        assert_eq!(info.timestamp, 0.0);
        assert_eq!(info.repeat_mode, RepeatMode::Unknown);
        assert_eq!(info.shuffle_mode, ShuffleMode::Unknown);
        assert_eq!(info.artwork_len(), 0);
        assert!(info.artwork_data.is_none());
        assert!(info.title.is_none());
        assert!(info.last_changed_at().is_none());
        assert_eq!(NowPlayingInfo::from_raw(RawInfo::new()), info);
    }

    #[test]
    fn test_decode_known_fields() {
        let info = NowPlayingInfo::from_raw(raw(&[
            (keys::TITLE, "Song".into()),
            (keys::ARTIST, "Artist".into()),
            (keys::ALBUM, "Album".into()),
            (keys::DURATION, 215.5.into()),
            (keys::ELAPSED_TIME, 12.0.into()),
            (keys::TIMESTAMP, RawValue::Date(1_700_000_000.0)),
            (keys::PLAYBACK_RATE, 1i64.into()),
            (keys::TRACK_NUMBER, 4i64.into()),
            (keys::REPEAT_MODE, 2i64.into()),
            (keys::SHUFFLE_MODE, 0i64.into()),
            (keys::IS_MUSIC_APP, true.into()),
            (keys::ARTWORK_DATA, vec![0xFF, 0xD8, 0xFF].into()),
            (keys::ARTWORK_MIME_TYPE, "image/jpeg".into()),
            (keys::ARTWORK_WIDTH, 600i64.into()),
            (keys::UNIQUE_IDENTIFIER, 987654321i64.into()),
        ]));

        assert!(info.has_info());
        assert_eq!(info.title.as_deref(), Some("Song"));
        assert_eq!(info.artist.as_deref(), Some("Artist"));
        assert_eq!(info.album.as_deref(), Some("Album"));
        assert!(info.composer.is_none());
        assert_eq!(info.duration, 215.5);
        assert_eq!(info.playback_rate, 1.0);
        assert_eq!(info.track_number, 4);
        assert_eq!(info.repeat_mode, RepeatMode::All);
        assert_eq!(info.shuffle_mode, ShuffleMode::Off);
        assert!(info.is_music_app);
        assert_eq!(info.artwork_len(), 3);
        assert_eq!(info.artwork_width, 600);
        assert_eq!(info.artwork_height, 0);
        assert_eq!(info.unique_identifier, 987654321);
        assert_eq!(info.itunes_store_identifier, 0);
        assert_eq!(
            info.last_changed_at().map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
    }

    #[test]
    fn test_mistyped_values_fall_back_to_defaults() {
        let info = NowPlayingInfo::from_raw(raw(&[
            (keys::TITLE, 5i64.into()),
            (keys::PLAYBACK_RATE, "fast".into()),
            (keys::TRACK_NUMBER, (-3i64).into()),
            (keys::REPEAT_MODE, 9i64.into()),
            (keys::ARTWORK_DATA, Vec::<u8>::new().into()),
        ]));

        assert!(info.has_info());
        assert!(info.title.is_none());
        assert_eq!(info.playback_rate, -1.0);
        assert_eq!(info.track_number, 0);
        assert_eq!(info.repeat_mode, RepeatMode::Unknown);
        assert!(info.artwork_data.is_none());
    }

    #[test]
    fn test_estimated_elapsed() {
        let position = PlaybackPosition {
            elapsed: 10.0,
            timestamp: 1_700_000_000.0,
            rate: 1.0,
            duration: 30.0,
        };
        let now = Utc.timestamp_opt(1_700_000_005, 0).unwrap();
        assert_eq!(position.estimated_elapsed(now), 15.0);

        let later = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
        assert_eq!(position.estimated_elapsed(later), 30.0);

        let paused = PlaybackPosition { rate: 0.0, ..position };
        assert_eq!(paused.estimated_elapsed(later), 10.0);

        let unknown = PlaybackPosition { timestamp: 0.0, ..position };
        assert_eq!(unknown.estimated_elapsed(later), 10.0);
    }

    #[test]
    fn test_client_app_from_user_info() {
        let app = ClientAppInfo::from_user_info(&raw(&[
            (keys::APPLICATION_DISPLAY_NAME, "Music".into()),
            (keys::APPLICATION_PID, 4242i64.into()),
        ]))
        .unwrap();
        assert_eq!(app.display_name, "Music");
        assert_eq!(app.pid, 4242);
        assert!(app.is_known());

        assert!(ClientAppInfo::from_user_info(&RawInfo::new()).is_none());
        assert!(!ClientAppInfo::default().is_known());
    }

    #[test]
    fn test_mode_decoding() {
        assert_eq!(RepeatMode::from_raw(0), RepeatMode::Off);
        assert_eq!(RepeatMode::from_raw(1), RepeatMode::Current);
        assert_eq!(ShuffleMode::from_raw(2), ShuffleMode::On);
        assert_eq!(ShuffleMode::from_raw(-1), ShuffleMode::Unknown);
        assert_eq!(RepeatMode::Current.to_string(), "Current");
    }
}
