// ── Core error types ──
//
// User-facing errors from watts-core. Callers see three families: a
// connection problem worth retrying on the next poll, an authentication
// failure that ends the session, and an API rejection. The
// `From<watts_api::Error>` impl performs that classification.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach Watts cloud: {reason}")]
    ConnectionFailed { reason: String },

    /// Bad credentials or a token the API keeps rejecting. Polling must
    /// stop until the account is re-authenticated.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {smarthome_id}/{id_device}")]
    DeviceNotFound {
        smarthome_id: String,
        id_device: String,
    },

    #[error("Smarthome not found: {smarthome_id}")]
    SmarthomeNotFound { smarthome_id: String },

    /// No snapshot has been loaded yet.
    #[error("No data available; refresh has not completed")]
    NoData,

    #[error("Malformed {context} payload: {message}")]
    InvalidPayload { context: String, message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// Vendor envelope code, when the rejection came from the envelope.
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for the fatal session condition.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<watts_api::Error> for CoreError {
    fn from(err: watts_api::Error) -> Self {
        match err {
            watts_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            watts_api::Error::Connection(e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            watts_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            watts_api::Error::Transport(message) => CoreError::Config { message },
            watts_api::Error::Http { path, status, body } => CoreError::Api {
                message: format!("{path} failed (HTTP {status}): {body}"),
                code: None,
                status: Some(status),
            },
            watts_api::Error::Vendor {
                path,
                code,
                key,
                value,
            } => CoreError::Api {
                message: format!("{path} rejected ({key}: {value})"),
                code: Some(code),
                status: None,
            },
            watts_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Unreadable response: {message}"),
                code: None,
                status: None,
            },
        }
    }
}
