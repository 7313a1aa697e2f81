// Watts SmartHome HTTP client
//
// Wraps `reqwest::Client` with the OAuth password-grant token lifecycle,
// bearer injection, one-shot re-authentication on 401/403, and the vendor
// `{ code: { code, key, value }, data: {...} }` envelope check. Endpoint
// wrappers live in `endpoints.rs`.

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};
use url::Url;

use crate::auth::{CLIENT_ID, Credentials, TOKEN_PATH, Token, TokenResponse};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Vendor codes accepted on every call. Endpoints may widen the set.
pub const DEFAULT_ALLOWED_CODES: &[&str] = &["1", "8"];

/// Default language sent with every API call.
pub const DEFAULT_LANG: &str = "en";

/// Form-encoded request body.
pub type Form = Vec<(String, String)>;

/// Raw HTTP client for the Watts SmartHome API.
///
/// Owns the single token for one account. All methods return the decoded
/// JSON body once the vendor envelope has been validated; parsing into
/// domain types is left to the caller.
pub struct WattsClient {
    http: reqwest::Client,
    transport: TransportConfig,
    credentials: Credentials,
    default_lang: String,
    /// Guards "ensure token": concurrent callers needing a fresh token queue
    /// behind a single login.
    token: Mutex<Option<Token>>,
}

impl WattsClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(
        credentials: Credentials,
        default_lang: impl Into<String>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, credentials, default_lang, transport.clone()))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        credentials: Credentials,
        default_lang: impl Into<String>,
        transport: TransportConfig,
    ) -> Self {
        Self {
            http,
            transport,
            credentials,
            default_lang: default_lang.into(),
            token: Mutex::new(None),
        }
    }

    /// The language used when a call does not override it.
    pub fn default_lang(&self) -> &str {
        &self.default_lang
    }

    /// The account this client authenticates as.
    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    pub(crate) fn lang<'a>(&'a self, lang: Option<&'a str>) -> &'a str {
        lang.unwrap_or(&self.default_lang)
    }

    // ── Token lifecycle ──────────────────────────────────────────────

    /// Authenticate with the password grant and install the new token.
    pub async fn login(&self) -> Result<(), Error> {
        let mut guard = self.token.lock().await;
        *guard = Some(self.fetch_token().await?);
        Ok(())
    }

    /// Drop the current token; the next authenticated call logs in again.
    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    /// Whether a token is held and outside the expiry margin.
    pub async fn has_fresh_token(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| t.is_fresh(Instant::now()))
    }

    /// Return a usable access token, logging in first if none is held or
    /// the held one is about to expire.
    ///
    /// Always a full password-grant login, never a refresh grant.
    pub async fn ensure_access_token(&self) -> Result<SecretString, Error> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.access_token.clone());
        }

        debug!("access token missing or expiring, logging in");
        let token = self.fetch_token().await?;
        let access = token.access_token.clone();
        *guard = Some(token);
        Ok(access)
    }

    /// POST the password grant. Does not touch the stored token.
    async fn fetch_token(&self) -> Result<Token, Error> {
        let url = self.transport.auth_url(TOKEN_PATH)?;
        debug!(username = %self.credentials.username, "authenticating at {}", url);

        let form = [
            ("grant_type", "password"),
            ("username", self.credentials.username.as_str()),
            ("password", self.credentials.password.expose_secret()),
            ("client_id", CLIENT_ID),
        ];

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Connection)?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let body = resp.text().await.map_err(Error::Connection)?;
        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("token response: {e}"),
                body: body.clone(),
            })?;

        debug!(expires_in = parsed.expires_in, "login successful");
        Ok(parsed.into_token(Instant::now()))
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Perform one API call and validate the vendor envelope.
    ///
    /// When `auth_required` is set a 401/403 triggers exactly one forced
    /// re-login and one retry; a second rejection is terminal. Transport
    /// failures are returned as [`Error::Connection`] without retrying.
    /// `extra_codes` widens [`DEFAULT_ALLOWED_CODES`] for this call.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        form: &[(String, String)],
        auth_required: bool,
        extra_codes: &[&str],
    ) -> Result<Value, Error> {
        let url = self.transport.api_url(path)?;
        debug!("{} {}", method, url);

        let mut resp = self.send(&method, &url, form, auth_required).await?;

        if auth_required && is_auth_rejection(resp.status()) {
            debug!(path, status = %resp.status(), "token rejected, re-authenticating");
            self.login().await?;

            resp = self.send(&method, &url, form, auth_required).await?;
            if is_auth_rejection(resp.status()) {
                warn!(path, status = %resp.status(), "token rejected after re-authentication");
                self.invalidate_token().await;
                return Err(Error::Authentication {
                    message: format!(
                        "{path} rejected the token after re-authentication (HTTP {})",
                        resp.status()
                    ),
                });
            }
        }

        parse_envelope(path, resp, extra_codes).await
    }

    /// Authenticated form POST, the shape of every API endpoint.
    pub(crate) async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        extra_codes: &[&str],
    ) -> Result<Value, Error> {
        self.request(Method::POST, path, form, true, extra_codes)
            .await
    }

    async fn send(
        &self,
        method: &Method,
        url: &Url,
        form: &[(String, String)],
        auth_required: bool,
    ) -> Result<reqwest::Response, Error> {
        let mut builder = self.http.request(method.clone(), url.clone());
        if auth_required {
            let token = self.ensure_access_token().await?;
            builder = builder.bearer_auth(token.expose_secret());
        }
        if !form.is_empty() {
            builder = builder.form(form);
        }
        builder.send().await.map_err(Error::Connection)
    }
}

fn is_auth_rejection(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

/// Check HTTP status, decode JSON and enforce the vendor code allow-list.
async fn parse_envelope(
    path: &str,
    resp: reqwest::Response,
    extra_codes: &[&str],
) -> Result<Value, Error> {
    let status = resp.status();

    if status.is_client_error() || status.is_server_error() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Http {
            path: path.to_owned(),
            status: status.as_u16(),
            body: preview(&body).to_owned(),
        });
    }

    let body = resp.text().await.map_err(Error::Connection)?;
    if body.trim().is_empty() {
        trace!(path, "empty response body");
        return Ok(Value::Null);
    }

    let value: Value = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body: body.clone(),
    })?;

    check_vendor_code(path, &value, extra_codes)?;
    Ok(value)
}

/// Validate the `{code: {code, key, value}}` part of a response. Bodies
/// without a `code` object pass unchanged.
pub fn check_vendor_code(path: &str, body: &Value, extra_codes: &[&str]) -> Result<(), Error> {
    let Some(envelope) = body.get("code").filter(|c| c.is_object()) else {
        return Ok(());
    };

    let code = scalar_text(envelope.get("code"));
    let allowed = DEFAULT_ALLOWED_CODES
        .iter()
        .chain(extra_codes)
        .any(|c| *c == code);
    if allowed {
        return Ok(());
    }

    Err(Error::Vendor {
        path: path.to_owned(),
        code,
        key: scalar_text(envelope.get("key")),
        value: scalar_text(envelope.get("value")),
    })
}

/// Render a JSON scalar as the vendor's string form (`1` and `"1"` agree).
fn scalar_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn body_without_code_object_passes() {
        assert!(check_vendor_code("p", &json!({"data": {}}), &[]).is_ok());
        assert!(check_vendor_code("p", &json!({"code": "9"}), &[]).is_ok());
    }

    #[test]
    fn default_codes_pass() {
        for code in ["1", "8"] {
            let body = json!({"code": {"code": code, "key": "OK", "value": "ok"}});
            assert!(check_vendor_code("p", &body, &[]).is_ok());
        }
    }

    #[test]
    fn numeric_code_matches_string_form() {
        let body = json!({"code": {"code": 1, "key": "OK", "value": "ok"}});
        assert!(check_vendor_code("p", &body, &[]).is_ok());
    }

    #[test]
    fn disallowed_code_carries_triple() {
        let body = json!({"code": {"code": "2", "key": "NO_DATA", "value": "nothing"}});
        let err = check_vendor_code("/x/", &body, &[]).unwrap_err();
        match err {
            Error::Vendor {
                path,
                code,
                key,
                value,
            } => {
                assert_eq!(path, "/x/");
                assert_eq!(code, "2");
                assert_eq!(key, "NO_DATA");
                assert_eq!(value, "nothing");
            }
            other => panic!("expected Vendor error, got: {other:?}"),
        }
    }

    #[test]
    fn extra_codes_widen_allow_list() {
        let body = json!({"code": {"code": "2", "key": "NO_DATA", "value": ""}});
        assert!(check_vendor_code("p", &body, &["2"]).is_ok());
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "é".repeat(300);
        assert_eq!(preview(&long).chars().count(), 200);
        assert_eq!(preview("short"), "short");
    }
}
