// ── Update coordinator ──
//
// Owns the refresh cycle for one account: fetch the profile, fan out
// per-smarthome detail and error reads, fold everything into a new
// `WattsState` and swap it into the store. Device writes go through here
// too, so a successful write can open the fast-poll window and trigger an
// immediate refresh.
//
// There is no background task. The host schedules the next `refresh()`
// after `update_interval()`, which changes between cycles.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use watts_api::WattsClient;

use crate::codec::TemperatureCodec;
use crate::command::{Command, WriteRequest};
use crate::config::CoordinatorConfig;
use crate::convert::{parse_state, parse_user_profile};
use crate::error::CoreError;
use crate::model::{Device, Mode, SetpointKey, WattsState};
use crate::program::normalize_program;
use crate::store::{DataStore, PollWindow};

// ── RefreshState ─────────────────────────────────────────────────

/// Refresh state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh running; the snapshot (if any) is current.
    Idle,
    Refreshing,
    /// The last cycle failed; the previous snapshot is kept.
    Failed { message: String },
    /// Credentials were rejected. Polling should stop until the account
    /// is re-authenticated.
    AuthRequired,
}

// ── Coordinator ──────────────────────────────────────────────────

/// Polling data-update coordinator for one account.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: Arc<WattsClient>,
    lang: String,
    codec: TemperatureCodec,
    store: DataStore,
    poll: std::sync::Mutex<PollWindow>,
    refresh_state: watch::Sender<RefreshState>,
    /// Serializes refresh cycles so snapshots are installed in order.
    refresh_lock: Mutex<()>,
}

impl Coordinator {
    /// Create a coordinator over an existing client. Does not fetch
    /// anything; call [`refresh()`](Self::refresh) for the first snapshot.
    pub fn new(client: Arc<WattsClient>, config: &CoordinatorConfig) -> Self {
        let (refresh_state, _) = watch::channel(RefreshState::Idle);
        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                lang: config.lang.clone(),
                codec: config.codec,
                store: DataStore::new(),
                poll: std::sync::Mutex::new(PollWindow::new(config.polling_interval())),
                refresh_state,
                refresh_lock: Mutex::new(()),
            }),
        }
    }

    pub fn client(&self) -> &Arc<WattsClient> {
        &self.inner.client
    }

    pub fn store(&self) -> &DataStore {
        &self.inner.store
    }

    fn lang(&self) -> Option<&str> {
        Some(self.inner.lang.as_str())
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn refresh_state(&self) -> watch::Receiver<RefreshState> {
        self.inner.refresh_state.subscribe()
    }

    pub fn current_refresh_state(&self) -> RefreshState {
        self.inner.refresh_state.borrow().clone()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_refresh()
    }

    // ── Polling cadence ──────────────────────────────────────────

    /// Delay before the host should call [`refresh()`](Self::refresh)
    /// again.
    pub fn update_interval(&self) -> Duration {
        self.poll_window().interval(Instant::now())
    }

    pub fn is_fast_polling(&self) -> bool {
        self.poll_window().is_fast(Instant::now())
    }

    /// The configured normal interval.
    pub fn polling_interval(&self) -> Duration {
        self.poll_window().normal()
    }

    fn arm_fast_poll(&self) {
        let mut window = self
            .inner
            .poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        window.arm(Instant::now());
        debug!(
            interval_secs = window.fast().as_secs(),
            "fast polling window armed"
        );
    }

    fn poll_window(&self) -> PollWindow {
        self.inner
            .poll
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Read accessors ───────────────────────────────────────────

    /// The current snapshot, `None` before the first successful refresh.
    pub fn data(&self) -> Option<Arc<WattsState>> {
        self.inner.store.snapshot()
    }

    pub fn get_device(&self, smarthome_id: &str, id_device: &str) -> Option<Device> {
        self.inner.store.device(smarthome_id, id_device)
    }

    pub fn device_keys(&self) -> BTreeSet<(String, String)> {
        self.inner.store.device_keys()
    }

    /// Like [`get_device`](Self::get_device), but says what is missing.
    pub fn require_device(&self, smarthome_id: &str, id_device: &str) -> Result<Device, CoreError> {
        let state = self.data().ok_or(CoreError::NoData)?;
        let smarthome =
            state
                .get_smarthome(smarthome_id)
                .ok_or_else(|| CoreError::SmarthomeNotFound {
                    smarthome_id: smarthome_id.to_owned(),
                })?;
        smarthome
            .get_device(id_device)
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                smarthome_id: smarthome_id.to_owned(),
                id_device: id_device.to_owned(),
            })
    }

    /// Expand a short device id to its composite id using the snapshot.
    pub fn resolve_device_id(&self, reference: &str) -> String {
        self.data().map_or_else(
            || reference.trim().to_owned(),
            |state| state.resolve_device_id(reference),
        )
    }

    // ── Refresh cycle ────────────────────────────────────────────

    /// Run one refresh cycle and install the resulting snapshot.
    ///
    /// A failing smarthome detail read drops that smarthome for this cycle
    /// only; the cycle fails if every smarthome failed. Error-list reads
    /// never fail the cycle. Authentication failures are returned and
    /// published as [`RefreshState::AuthRequired`]. On any failure the
    /// previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<Arc<WattsState>, CoreError> {
        let _guard = self.inner.refresh_lock.lock().await;
        self.inner.refresh_state.send_replace(RefreshState::Refreshing);

        match self.fetch_state().await {
            Ok(state) => {
                debug!(
                    smarthomes = state.smarthomes.len(),
                    devices = state.device_count(),
                    "data refresh complete"
                );
                self.inner.store.replace(state);
                self.inner.refresh_state.send_replace(RefreshState::Idle);
                self.data().ok_or(CoreError::NoData)
            }
            Err(e) => {
                let next = if e.is_auth() {
                    warn!(error = %e, "refresh failed: re-authentication required");
                    RefreshState::AuthRequired
                } else {
                    warn!(error = %e, "refresh failed, keeping previous snapshot");
                    RefreshState::Failed {
                        message: e.to_string(),
                    }
                };
                self.inner.refresh_state.send_replace(next);
                Err(e)
            }
        }
    }

    async fn fetch_state(&self) -> Result<WattsState, CoreError> {
        let client = self.inner.client.as_ref();
        let lang = self.lang();

        let user_payload = client.get_user_data(lang).await?;
        let user = parse_user_profile(&user_payload)?;
        let smarthome_ids: Vec<&str> = user.smarthome_ids().collect();

        let fetches = smarthome_ids.iter().map(|&smarthome_id| async move {
            let (detail, errors) = tokio::join!(
                client.get_smarthome_data(smarthome_id, lang),
                client.get_errors(smarthome_id, lang),
            );
            (smarthome_id, detail, errors)
        });
        let results = join_all(fetches).await;

        let mut details = HashMap::new();
        let mut error_payloads = HashMap::new();
        let mut first_failure = None;

        for (smarthome_id, detail, errors) in results {
            match detail {
                Ok(payload) => {
                    details.insert(smarthome_id.to_owned(), payload);
                }
                Err(e) if e.is_auth() => return Err(e.into()),
                Err(e) => {
                    warn!(
                        smarthome_id,
                        transient = e.is_transient(),
                        error = %e,
                        "smarthome read failed, skipping this cycle"
                    );
                    first_failure.get_or_insert(e);
                }
            }
            match errors {
                Ok(payload) => {
                    error_payloads.insert(smarthome_id.to_owned(), payload);
                }
                Err(e) => debug!(smarthome_id, error = %e, "error list unavailable"),
            }
        }

        if details.is_empty() {
            if let Some(e) = first_failure {
                return Err(e.into());
            }
        }

        parse_state(&user_payload, &details, &error_payloads, self.inner.codec)
    }

    // ── Device writes ────────────────────────────────────────────

    pub async fn set_mode(
        &self,
        smarthome_id: &str,
        id_device: &str,
        mode: Mode,
    ) -> Result<(), CoreError> {
        self.execute(smarthome_id, id_device, Command::SetMode { mode })
            .await
    }

    pub async fn set_setpoint(
        &self,
        smarthome_id: &str,
        id_device: &str,
        key: SetpointKey,
        celsius: f64,
    ) -> Result<(), CoreError> {
        self.execute(
            smarthome_id,
            id_device,
            Command::SetSetpoint { key, celsius },
        )
        .await
    }

    pub async fn set_boost_timer(
        &self,
        smarthome_id: &str,
        id_device: &str,
        seconds: i64,
    ) -> Result<(), CoreError> {
        self.execute(smarthome_id, id_device, Command::SetBoostTimer { seconds })
            .await
    }

    /// Resolve the device from the snapshot, build and push the write.
    ///
    /// An unknown device fails before any network call. After a successful
    /// push the fast-poll window opens and a refresh runs; a failure of
    /// that refresh is logged and published on the refresh state, not
    /// returned, since the write itself went through.
    pub async fn execute(
        &self,
        smarthome_id: &str,
        id_device: &str,
        command: Command,
    ) -> Result<(), CoreError> {
        let device = self.require_device(smarthome_id, id_device)?;
        let request = command.build(&device)?;

        debug!(
            smarthome_id,
            id_device,
            command = command.name(),
            "pushing device write"
        );
        self.push(&request).await?;
        info!(smarthome_id, id_device, command = command.name(), "device write accepted");

        self.after_write().await;
        Ok(())
    }

    /// Push a pre-built write request as is.
    pub async fn push(&self, request: &WriteRequest) -> Result<(), CoreError> {
        self.inner
            .client
            .push_query(&request.smarthome_id, &request.query, self.lang())
            .await?;
        Ok(())
    }

    /// Apply a weekly program. `device_ref` may be a short or composite
    /// id; see [`normalize_program`] for the accepted program shapes.
    pub async fn apply_program(
        &self,
        device_ref: &str,
        program: &Map<String, Value>,
    ) -> Result<(), CoreError> {
        let device_id = self.resolve_device_id(device_ref);
        let mut fields = normalize_program(program);
        fields.remove("device_id");
        fields.remove("lang");

        if !fields.keys().any(|k| k.starts_with("program[")) {
            return Err(CoreError::Validation {
                message: "program contains no complete time block".into(),
            });
        }

        debug!(device_id, fields = fields.len(), "applying weekly program");
        self.inner
            .client
            .apply_program(&device_id, &fields, self.lang())
            .await?;
        info!(device_id, "weekly program applied");

        self.after_write().await;
        Ok(())
    }

    /// Ask the API to render a device's program as display blocks.
    pub async fn convert_program(&self, device_ref: &str) -> Result<Value, CoreError> {
        let fields = BTreeMap::from([
            ("device_id".to_owned(), self.resolve_device_id(device_ref)),
            ("now".to_owned(), Utc::now().timestamp().to_string()),
        ]);
        Ok(self
            .inner
            .client
            .convert_program(&fields, self.lang())
            .await?)
    }

    async fn after_write(&self) {
        self.arm_fast_poll();
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refresh after write failed");
        }
    }
}
