use thiserror::Error;

/// Top-level error type for the `watts-api` crate.
///
/// Three families matter to callers: transport failures (retryable),
/// authentication failures (fatal to the session) and API rejections,
/// either by HTTP status or by the vendor's `{code: {code, key, value}}`
/// envelope. `watts-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login failed, or the API kept rejecting the bearer token after a
    /// forced re-authentication.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Timeout, refused connection, reset, DNS failure.
    #[error("Connection error: {0}")]
    Connection(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Transport setup failed: {0}")]
    Transport(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success HTTP status from an API endpoint.
    #[error("API request to {path} failed (HTTP {status}): {body}")]
    Http {
        path: String,
        status: u16,
        body: String,
    },

    /// HTTP 200, but the vendor envelope carried a disallowed code.
    #[error("API request to {path} rejected with vendor code {code} ({key}: {value})")]
    Vendor {
        path: String,
        code: String,
        key: String,
        value: String,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the session is unusable until credentials are
    /// re-entered.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if this is a transport error worth retrying on the
    /// next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Returns `true` if the API itself rejected the call.
    pub fn is_api(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Vendor { .. })
    }

    /// HTTP status of a rejected call, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Connection(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Vendor envelope code of a rejected call.
    pub fn vendor_code(&self) -> Option<&str> {
        match self {
            Self::Vendor { code, .. } => Some(code),
            _ => None,
        }
    }
}
