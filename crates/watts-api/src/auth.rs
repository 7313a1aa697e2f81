use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use tokio::time::Instant;

/// Token endpoint of the `watts` OpenID Connect realm.
pub const TOKEN_PATH: &str = "/realms/watts/protocol/openid-connect/token";
/// Public OAuth client used by the vendor's own app.
pub const CLIENT_ID: &str = "app-front";
/// Tokens this close to expiry are treated as already expired.
pub const EXPIRY_MARGIN: Duration = Duration::from_secs(30);

const DEFAULT_EXPIRES_IN: u64 = 300;

/// Account credentials for the password grant.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// An issued token. Replaced wholesale on every login, never edited.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Instant,
}

impl Token {
    /// Whether the token can still be sent at `now`, keeping
    /// [`EXPIRY_MARGIN`] in reserve.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN < self.expires_at
    }
}

/// Body of a successful token response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN
}

impl TokenResponse {
    /// Convert into a [`Token`] issued at `now`. A zero lifetime is floored
    /// to one second.
    pub(crate) fn into_token(self, now: Instant) -> Token {
        Token {
            access_token: SecretString::from(self.access_token),
            refresh_token: self.refresh_token.map(SecretString::from),
            expires_at: now + Duration::from_secs(self.expires_in.max(1)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn token_response(expires_in: u64) -> TokenResponse {
        TokenResponse {
            access_token: "abc".into(),
            refresh_token: Some("def".into()),
            expires_in,
        }
    }

    #[test]
    fn token_inside_margin_is_stale() {
        let now = Instant::now();
        let token = token_response(20).into_token(now);
        assert!(!token.is_fresh(now));
    }

    #[test]
    fn token_outside_margin_is_fresh() {
        let now = Instant::now();
        let token = token_response(300).into_token(now);
        assert!(token.is_fresh(now));
        assert!(!token.is_fresh(now + Duration::from_secs(271)));
    }

    #[test]
    fn zero_lifetime_is_floored() {
        let now = Instant::now();
        let token = token_response(0).into_token(now);
        assert_eq!(token.expires_at, now + Duration::from_secs(1));
    }

    #[test]
    fn missing_expires_in_defaults() {
        let parsed: TokenResponse = serde_json::from_str(r#"{"access_token":"x"}"#).unwrap();
        assert_eq!(parsed.expires_in, 300);
        assert!(parsed.refresh_token.is_none());
    }
}
