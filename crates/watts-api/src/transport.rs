// Shared transport configuration for building reqwest::Client instances.
//
// Holds the two base URLs (auth realm and API host) and the request
// timeout. Tests point both URLs at a mock server.

use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Production Keycloak host serving the `watts` realm.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://auth.smarthome.wattselectronics.com";
/// Production API host.
pub const DEFAULT_API_BASE_URL: &str = "https://smarthome.wattselectronics.com";

const USER_AGENT: &str = concat!("watts-rs/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub auth_base_url: String,
    pub api_base_url: String,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            auth_base_url: DEFAULT_AUTH_BASE_URL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Point both auth and API traffic at one host (mock servers, proxies).
    pub fn single_host(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            auth_base_url: base.clone(),
            api_base_url: base,
            ..Self::default()
        }
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Transport(format!("failed to build HTTP client: {e}")))
    }

    /// Join `path` onto the auth base URL.
    pub(crate) fn auth_url(&self, path: &str) -> Result<Url, Error> {
        join(&self.auth_base_url, path)
    }

    /// Join `path` onto the API base URL.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        join(&self.api_base_url, path)
    }
}

fn join(base: &str, path: &str) -> Result<Url, Error> {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_without_double_slash() {
        let cfg = TransportConfig::single_host("http://127.0.0.1:8080/");
        let url = cfg.api_url("/api/v0.1/human/user/read/").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/v0.1/human/user/read/");
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let cfg = TransportConfig::single_host("not a url");
        assert!(matches!(cfg.auth_url("token"), Err(Error::InvalidUrl(_))));
    }
}
