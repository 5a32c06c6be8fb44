//! Snapshot storage.
//!
//! Two independently guarded values: the current now playing snapshot and
//! the client application record. Each is replaced wholesale and the two
//! locks are never held together.

use crate::types::{ClientAppInfo, NowPlayingInfo};
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Latest now playing state of one instance.
#[derive(Debug)]
pub struct InfoSnapshot {
    current: RwLock<Arc<NowPlayingInfo>>,
    client_app: RwLock<ClientAppInfo>,
    installs: AtomicU64,
}

impl InfoSnapshot {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(NowPlayingInfo::default())),
            client_app: RwLock::new(ClientAppInfo::default()),
            installs: AtomicU64::new(0),
        }
    }

    /// The current snapshot. Never changes after it is returned.
    pub fn current(&self) -> Arc<NowPlayingInfo> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Read from one snapshot. Everything `f` sees comes from the same install.
    pub fn read<T>(&self, f: impl FnOnce(&NowPlayingInfo) -> T) -> T {
        f(&self.current())
    }

    /// Replace the current snapshot and return the installed one.
    /// Decoding happens before this call, so the write lock only covers the swap.
    pub fn install(&self, info: NowPlayingInfo) -> Arc<NowPlayingInfo> {
        let info = Arc::new(info);
        {
            let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Arc::clone(&info);
        }
        let installs = self.installs.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(
            "Installed snapshot #{} (title={:?})",
            installs,
            info.title.as_deref().unwrap_or("")
        );
        info
    }

    /// Number of snapshots installed so far.
    pub fn installs(&self) -> u64 {
        self.installs.load(Ordering::SeqCst)
    }

    pub fn client_app(&self) -> ClientAppInfo {
        self.client_app
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the client application record.
    /// Returns whether it differs from the previous one.
    pub fn set_client_app(&self, app: ClientAppInfo) -> bool {
        let mut guard = self.client_app.write().unwrap_or_else(PoisonError::into_inner);
        if *guard == app {
            return false;
        }
        *guard = app;
        true
    }
}

impl Default for InfoSnapshot {
    fn default() -> Self {
        Self::new()
    }
}
