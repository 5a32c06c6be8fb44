//! The `NowPlaying` handle.
//!
//! Ties the pieces together:
//! - `Commander` for playback control
//! - `UpdateScheduler` refreshing the snapshot on request
//! - `NotificationBridge` refreshing it on system notifications
//!
//! Getters return owned copies taken from one snapshot each. Use
//! `snapshot()` when several fields must come from the same refresh.

use crate::bridge::NotificationBridge;
use crate::commander::Commander;
use crate::config::NowPlayingConfig;
use crate::error::NowPlayingError;
use crate::event_bus::{EventBus, InfoEvent, snapshot_stream};
use crate::scheduler::{UpdateCallback, UpdateScheduler};
use crate::snapshot::InfoSnapshot;
use crate::types::{ClientAppInfo, NowPlayingInfo, PlaybackPosition, RepeatMode, ShuffleMode};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use log::debug;
use np_remote::{MediaRemoteBackend, RawInfo, create_backend};
use std::sync::Arc;
use tokio::sync::broadcast::Receiver;

pub struct NowPlaying {
    // Dropped first so notifications stop before anything else goes away.
    bridge: NotificationBridge,
    scheduler: Arc<UpdateScheduler>,
    snapshot: Arc<InfoSnapshot>,
    events: Arc<EventBus>,
    commander: Commander,
}

impl NowPlaying {
    /// Construct from `<config dir>/nowplaying/config.json` (defaults when
    /// missing) with `NOWPLAYING_FRAMEWORK_PATH` applied.
    pub fn new() -> Result<Self, NowPlayingError> {
        Self::with_config(NowPlayingConfig::from_default_location())
    }

    /// Blocks while the framework is loaded. Fails with `Unavailable` if
    /// any entry point is missing.
    pub fn with_config(config: NowPlayingConfig) -> Result<Self, NowPlayingError> {
        config.validate()?;
        let backend = create_backend(&config.framework_options())?;
        Ok(Self::with_backend(backend, &config))
    }

    /// Build on an already loaded backend.
    pub fn with_backend(backend: Arc<dyn MediaRemoteBackend>, config: &NowPlayingConfig) -> Self {
        let snapshot = Arc::new(InfoSnapshot::new());
        let events = Arc::new(EventBus::new(config.event_capacity));
        let scheduler = Arc::new(UpdateScheduler::new(
            Arc::clone(&backend),
            Arc::clone(&snapshot),
            Arc::clone(&events),
        ));
        let bridge = NotificationBridge::new(
            Arc::clone(&backend),
            Arc::clone(&scheduler),
            Arc::clone(&snapshot),
            Arc::clone(&events),
        );

        let now_playing = Self {
            bridge,
            scheduler,
            snapshot,
            events,
            commander: Commander::with_backend(backend),
        };

        if config.initial_update {
            debug!("Issuing initial update");
            now_playing.update();
        }
        now_playing
    }

    /// Playback control sharing this instance's backend.
    pub fn commander(&self) -> &Commander {
        &self.commander
    }

    // ============ Refresh ============

    /// Refresh in the background. Returns immediately.
    ///
    /// Overlapping refreshes are not ordered; whichever completes last
    /// determines the snapshot.
    pub fn update(&self) {
        self.scheduler.update();
    }

    /// Refresh and call `callback` with the installed snapshot, on the
    /// background context. It may run concurrently with the caller.
    pub fn update_with<F>(&self, callback: F)
    where
        F: FnOnce(Arc<NowPlayingInfo>) + Send + 'static,
    {
        self.scheduler.update_with(callback);
    }

    /// Refresh and wait for the result. Never times out on its own.
    pub async fn update_async(&self) -> Option<Arc<NowPlayingInfo>> {
        self.scheduler.update_async().await
    }

    // ============ Auto update ============

    pub fn register_auto_update(&self) -> Result<(), NowPlayingError> {
        self.bridge.register(None)
    }

    /// Like `register_auto_update`, calling `callback` after every refresh
    /// a notification triggers.
    pub fn register_auto_update_with<F>(&self, callback: F) -> Result<(), NowPlayingError>
    where
        F: Fn(Arc<NowPlayingInfo>) + Send + Sync + 'static,
    {
        let callback: UpdateCallback = Arc::new(callback);
        self.bridge.register(Some(callback))
    }

    /// Stop reacting to notifications. Refreshes in flight still land.
    pub fn unregister_auto_update(&self) -> Result<(), NowPlayingError> {
        self.bridge.unregister()
    }

    pub fn is_auto_updated(&self) -> bool {
        self.bridge.is_registered()
    }

    // ============ Events ============

    pub fn subscribe(&self) -> Receiver<InfoEvent> {
        self.events.subscribe()
    }

    /// Stream of installed snapshots. Ends when this instance is dropped.
    pub fn updates(&self) -> impl Stream<Item = Arc<NowPlayingInfo>> + Send + 'static {
        snapshot_stream(self.events.subscribe())
    }

    // ============ Snapshot ============

    /// The current snapshot. It is never modified; later refreshes replace it.
    pub fn snapshot(&self) -> Arc<NowPlayingInfo> {
        self.snapshot.current()
    }

    pub fn has_info(&self) -> bool {
        self.snapshot.read(NowPlayingInfo::has_info)
    }

    /// Copy of the raw dictionary, None when empty.
    pub fn raw_info(&self) -> Option<RawInfo> {
        self.snapshot
            .read(|info| (!info.raw.is_empty()).then(|| info.raw.clone()))
    }

    pub fn client_app(&self) -> ClientAppInfo {
        self.snapshot.client_app()
    }

    pub fn title(&self) -> Option<String> {
        self.snapshot.read(|info| info.title.clone())
    }

    pub fn artist(&self) -> Option<String> {
        self.snapshot.read(|info| info.artist.clone())
    }

    pub fn album(&self) -> Option<String> {
        self.snapshot.read(|info| info.album.clone())
    }

    pub fn composer(&self) -> Option<String> {
        self.snapshot.read(|info| info.composer.clone())
    }

    pub fn genre(&self) -> Option<String> {
        self.snapshot.read(|info| info.genre.clone())
    }

    pub fn media_type(&self) -> Option<String> {
        self.snapshot.read(|info| info.media_type.clone())
    }

    pub fn artwork_data(&self) -> Option<Vec<u8>> {
        self.snapshot.read(|info| info.artwork_data.clone())
    }

    pub fn artwork_len(&self) -> usize {
        self.snapshot.read(NowPlayingInfo::artwork_len)
    }

    pub fn artwork_mime_type(&self) -> Option<String> {
        self.snapshot.read(|info| info.artwork_mime_type.clone())
    }

    pub fn artwork_identifier(&self) -> Option<String> {
        self.snapshot.read(|info| info.artwork_identifier.clone())
    }

    pub fn artwork_width(&self) -> u32 {
        self.snapshot.read(|info| info.artwork_width)
    }

    pub fn artwork_height(&self) -> u32 {
        self.snapshot.read(|info| info.artwork_height)
    }

    /// Seconds, 0 if unknown.
    pub fn duration(&self) -> f64 {
        self.snapshot.read(|info| info.duration)
    }

    /// Seconds as of `timestamp()`, 0 if unknown.
    /// Reads its own snapshot; use `playback_position()` to get elapsed
    /// time and timestamp from the same refresh.
    pub fn elapsed_time(&self) -> f64 {
        self.snapshot.read(|info| info.elapsed_time)
    }

    /// UNIX seconds of the last playback status change, 0 if unknown.
    /// Pair with elapsed time through `playback_position()`, not
    /// `elapsed_time()`.
    pub fn timestamp(&self) -> i64 {
        self.snapshot.read(|info| info.timestamp as i64)
    }

    pub fn last_changed_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read(NowPlayingInfo::last_changed_at)
    }

    /// -1 if unknown.
    pub fn playback_rate(&self) -> f64 {
        self.snapshot.read(|info| info.playback_rate)
    }

    pub fn playback_position(&self) -> PlaybackPosition {
        self.snapshot.read(NowPlayingInfo::playback_position)
    }

    /// Elapsed time extrapolated to `now`. An estimate, not live tracking.
    pub fn estimated_elapsed(&self, now: DateTime<Utc>) -> f64 {
        self.playback_position().estimated_elapsed(now)
    }

    pub fn track_number(&self) -> u32 {
        self.snapshot.read(|info| info.track_number)
    }

    pub fn queue_index(&self) -> u32 {
        self.snapshot.read(|info| info.queue_index)
    }

    pub fn total_queue_count(&self) -> u32 {
        self.snapshot.read(|info| info.total_queue_count)
    }

    pub fn total_track_count(&self) -> u32 {
        self.snapshot.read(|info| info.total_track_count)
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.snapshot.read(|info| info.repeat_mode)
    }

    pub fn shuffle_mode(&self) -> ShuffleMode {
        self.snapshot.read(|info| info.shuffle_mode)
    }

    pub fn is_music_app(&self) -> bool {
        self.snapshot.read(|info| info.is_music_app)
    }

    pub fn content_item_identifier(&self) -> Option<String> {
        self.snapshot.read(|info| info.content_item_identifier.clone())
    }

    pub fn unique_identifier(&self) -> u64 {
        self.snapshot.read(|info| info.unique_identifier)
    }

    pub fn itunes_store_identifier(&self) -> u64 {
        self.snapshot.read(|info| info.itunes_store_identifier)
    }

    pub fn itunes_store_subscription_adam_identifier(&self) -> u64 {
        self.snapshot
            .read(|info| info.itunes_store_subscription_adam_identifier)
    }

    pub fn album_itunes_store_adam_identifier(&self) -> u64 {
        self.snapshot
            .read(|info| info.album_itunes_store_adam_identifier)
    }

    pub fn artist_itunes_store_adam_identifier(&self) -> u64 {
        self.snapshot
            .read(|info| info.artist_itunes_store_adam_identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use np_remote::mock::MockRemote;
    use np_remote::{RawValue, ResolveError, keys};
    use std::path::PathBuf;
    use std::time::Duration;

    fn quiet_config() -> NowPlayingConfig {
        NowPlayingConfig {
            initial_update: false,
            ..NowPlayingConfig::default()
        }
    }

    fn wait_for_update(np: &NowPlaying) -> Arc<NowPlayingInfo> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        np.update_with(move |info| {
            let _ = tx.send(info);
        });
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_defaults_before_any_info() {
        let mock = Arc::new(MockRemote::new());
        let np = NowPlaying::with_backend(mock, &quiet_config());

        assert!(!np.has_info());
        assert_eq!(np.raw_info(), None);
        assert_eq!(np.title(), None);
        assert_eq!(np.album(), None);
        assert_eq!(np.artwork_data(), None);
        assert_eq!(np.artwork_len(), 0);
        assert_eq!(np.duration(), 0.0);
        assert_eq!(np.elapsed_time(), 0.0);
        assert_eq!(np.timestamp(), 0);
        assert_eq!(np.last_changed_at(), None);
        assert_eq!(np.playback_rate(), -1.0);
        assert_eq!(np.track_number(), 0);
        assert_eq!(np.unique_identifier(), 0);
        assert_eq!(np.artist_itunes_store_adam_identifier(), 0);
        assert_eq!(np.repeat_mode(), RepeatMode::Unknown);
        assert_eq!(np.shuffle_mode(), ShuffleMode::Unknown);
        assert!(!np.is_music_app());
        assert_eq!(np.client_app(), ClientAppInfo::default());
        assert!(!np.is_auto_updated());
    }

    #[test]
    fn test_initial_update_on_construction() {
        let mock = Arc::new(MockRemote::new());
        mock.set_hold_requests(true);

        let _np = NowPlaying::with_backend(mock.clone(), &NowPlayingConfig::default());
        assert_eq!(mock.request_count(), 1);

        let _quiet = NowPlaying::with_backend(mock.clone(), &quiet_config());
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_getters_return_copies() {
        let mock = Arc::new(MockRemote::new());
        let mut raw = RawInfo::new();
        raw.insert(keys::TITLE.to_string(), RawValue::from("First"));
        raw.insert(keys::ARTWORK_DATA.to_string(), RawValue::from(vec![1u8, 2, 3]));
        raw.insert(keys::PLAYBACK_RATE.to_string(), RawValue::from(1.0));
        raw.insert(keys::REPEAT_MODE.to_string(), RawValue::from(2i64));
        mock.set_info(raw);
        let np = NowPlaying::with_backend(mock.clone(), &quiet_config());

        wait_for_update(&np);
        let title = np.title();
        let artwork = np.artwork_data();
        let raw_copy = np.raw_info();

        let mut next = RawInfo::new();
        next.insert(keys::TITLE.to_string(), RawValue::from("Second"));
        mock.set_info(next);
        wait_for_update(&np);

        assert_eq!(title.as_deref(), Some("First"));
        assert_eq!(artwork, Some(vec![1, 2, 3]));
        assert_eq!(raw_copy.map(|r| r.len()), Some(4));
        assert_eq!(np.title().as_deref(), Some("Second"));
        assert_eq!(np.artwork_len(), 0);
        assert_eq!(np.playback_rate(), -1.0);
        assert_eq!(np.repeat_mode(), RepeatMode::Unknown);
    }

    #[test]
    fn test_playback_fields_from_one_snapshot() {
        let mock = Arc::new(MockRemote::new());
        let mut raw = RawInfo::new();
        raw.insert(keys::ELAPSED_TIME.to_string(), RawValue::from(10.0));
        raw.insert(keys::DURATION.to_string(), RawValue::from(200.0));
        raw.insert(keys::PLAYBACK_RATE.to_string(), RawValue::from(1.0));
        raw.insert(keys::TIMESTAMP.to_string(), RawValue::Date(1_700_000_000.0));
        mock.set_info(raw);
        let np = NowPlaying::with_backend(mock, &quiet_config());

        wait_for_update(&np);

        assert_eq!(np.timestamp(), 1_700_000_000);
        let position = np.playback_position();
        assert_eq!(position.elapsed, 10.0);
        assert_eq!(position.timestamp, 1_700_000_000.0);
        assert_eq!(position.rate, 1.0);
        let later = np.last_changed_at().unwrap() + chrono::Duration::seconds(5);
        assert!((np.estimated_elapsed(later) - 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_event_capacity_does_not_panic() {
        let mock = Arc::new(MockRemote::new());
        let config = NowPlayingConfig {
            event_capacity: usize::MAX,
            ..quiet_config()
        };
        let np = NowPlaying::with_backend(mock, &config);

        let mut rx = np.subscribe();
        wait_for_update(&np);
        assert!(matches!(rx.try_recv(), Ok(InfoEvent::Updated(_))));
    }

    #[test]
    fn test_commander_shares_backend() {
        let mock = Arc::new(MockRemote::new());
        let np = NowPlaying::with_backend(mock.clone(), &quiet_config());

        assert!(np.commander().play());
        np.commander().seek_to(3.0);

        assert_eq!(mock.commands().len(), 1);
        assert_eq!(mock.elapsed_times(), vec![3.0]);
    }

    #[test]
    fn test_drop_unregisters_notifications() {
        let mock = Arc::new(MockRemote::new());
        let np = NowPlaying::with_backend(mock.clone(), &quiet_config());
        np.register_auto_update().unwrap();
        assert!(mock.is_registered());

        drop(np);
        assert!(!mock.is_registered());
    }

    #[test]
    fn test_unavailable_framework() {
        let config = NowPlayingConfig {
            framework_path: PathBuf::from("/nonexistent/MediaRemote"),
            ..NowPlayingConfig::default()
        };
        match NowPlaying::with_config(config) {
            Err(NowPlayingError::Unavailable(
                ResolveError::LibraryNotFound { .. } | ResolveError::UnsupportedPlatform,
            )) => {}
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("loaded a nonexistent framework"),
        }
    }

    #[tokio::test]
    async fn test_updates_stream_yields_snapshots() {
        use futures_util::StreamExt;

        let mock = Arc::new(MockRemote::new());
        let mut raw = RawInfo::new();
        raw.insert(keys::TITLE.to_string(), RawValue::from("Streamed"));
        mock.set_info(raw);
        let np = NowPlaying::with_backend(mock, &quiet_config());

        let mut updates = Box::pin(np.updates());
        np.update();

        let info = tokio::time::timeout(Duration::from_secs(5), updates.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(info.title.as_deref(), Some("Streamed"));
    }
}
