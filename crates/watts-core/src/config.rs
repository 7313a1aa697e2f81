// ── Runtime coordinator configuration ──
//
// Describes one account session: credentials, language, polling cadence
// and transport tuning. Never touches disk; `watts-config` or the host
// builds a `CoordinatorConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use watts_api::TransportConfig;

use crate::codec::TemperatureCodec;

pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(60);
pub const MIN_POLLING_INTERVAL: Duration = Duration::from_secs(30);
pub const MAX_POLLING_INTERVAL: Duration = Duration::from_secs(3600);

/// Configuration for one account's coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub username: String,
    pub password: SecretString,
    /// Language sent with every API call.
    pub lang: String,
    /// Normal polling interval. See [`CoordinatorConfig::polling_interval`].
    polling_interval: Duration,
    /// Temperature encoding of the account's devices.
    pub codec: TemperatureCodec,
    pub transport: TransportConfig,
}

impl CoordinatorConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            lang: watts_api::DEFAULT_LANG.into(),
            polling_interval: DEFAULT_POLLING_INTERVAL,
            codec: TemperatureCodec::default(),
            transport: TransportConfig::default(),
        }
    }

    /// Set the normal polling interval, clamped to 30 s ..= 1 h.
    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval.clamp(MIN_POLLING_INTERVAL, MAX_POLLING_INTERVAL);
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_codec(mut self, codec: TemperatureCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }
}
