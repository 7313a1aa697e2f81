// ── Snapshot store ──
//
// Readers load the current `Arc<WattsState>` without locking. The
// refresh cycle is the only writer and always swaps in a whole new
// snapshot, so readers never observe a half-applied refresh.

use std::collections::BTreeSet;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{Device, WattsState};

/// Holder for the latest coordinator snapshot.
pub struct DataStore {
    snapshot: ArcSwapOption<WattsState>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            snapshot: ArcSwapOption::empty(),
            last_refresh,
        }
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    /// The current snapshot, `None` before the first successful refresh.
    pub fn snapshot(&self) -> Option<Arc<WattsState>> {
        self.snapshot.load_full()
    }

    pub fn has_data(&self) -> bool {
        self.snapshot.load().is_some()
    }

    pub fn device(&self, smarthome_id: &str, id_device: &str) -> Option<Device> {
        self.snapshot()
            .and_then(|s| s.get_device(smarthome_id, id_device).cloned())
    }

    pub fn device_keys(&self) -> BTreeSet<(String, String)> {
        self.snapshot()
            .map(|s| s.device_keys())
            .unwrap_or_default()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Install a new snapshot and stamp the refresh time.
    pub(crate) fn replace(&self, state: WattsState) {
        self.snapshot.store(Some(Arc::new(state)));
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    // ── Refresh bookkeeping ──────────────────────────────────────────

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn subscribe_last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refresh.subscribe()
    }

    /// How long ago the last refresh occurred, or `None` if never refreshed.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}
