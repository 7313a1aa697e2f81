//! Shared configuration for Watts SmartHome tools.
//!
//! TOML profiles, credential resolution (env + plaintext) and translation
//! to `watts_core::CoordinatorConfig`. One profile describes one account.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use watts_api::{DEFAULT_API_BASE_URL, DEFAULT_AUTH_BASE_URL, DEFAULT_LANG, TransportConfig};
use watts_core::{CoordinatorConfig, TemperatureCodec};

/// Environment variable checked first for the account password.
pub const PASSWORD_ENV: &str = "WATTS_PASSWORD";
/// Environment variable used when a profile names no username.
pub const USERNAME_ENV: &str = "WATTS_USERNAME";

const ENV_PREFIX: &str = "WATTS_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    /// Values a profile falls back to.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up `name`, or the default profile when `name` is `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Seconds between normal refresh cycles.
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Temperature encoding: "scaled_celsius" or "deci_fahrenheit".
    #[serde(default = "default_codec")]
    pub codec: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            polling_interval: default_polling_interval(),
            timeout: default_timeout(),
            codec: default_codec(),
        }
    }
}

fn default_lang() -> String {
    DEFAULT_LANG.into()
}
fn default_polling_interval() -> u64 {
    60
}
fn default_timeout() -> u64 {
    30
}
fn default_codec() -> String {
    "scaled_celsius".into()
}

/// A named account profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Account e-mail.
    pub username: Option<String>,

    /// Password (plaintext, prefer `password_env` or `WATTS_PASSWORD`).
    pub password: Option<String>,

    /// Name of an environment variable holding the password.
    pub password_env: Option<String>,

    pub lang: Option<String>,
    pub polling_interval: Option<u64>,
    pub timeout: Option<u64>,
    pub codec: Option<String>,

    /// Override the Keycloak host.
    pub auth_url: Option<String>,

    /// Override the API host.
    pub api_url: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "watts", "watts").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("watts");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical file plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` plus environment. A missing file is not an
/// error; defaults and `WATTS_*` variables still apply.
///
/// Nested keys use a double underscore, e.g.
/// `WATTS_PROFILES__HOME__LANG=fr`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve username and password for a profile.
///
/// Password order: `WATTS_PASSWORD`, then the variable named by
/// `password_env`, then plaintext `password`.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let no_credentials = || ConfigError::NoCredentials {
        profile: profile_name.into(),
    };

    let username = profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(no_credentials)?;

    // 1. Global env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Ok((username, SecretString::from(pw)));
    }

    // 2. Profile's password_env
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Ok((username, SecretString::from(pw)));
        }
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok((username, SecretString::from(pw.clone())));
    }

    Err(no_credentials())
}

/// Map a codec name to its parameter set.
pub fn parse_codec(name: &str) -> Result<TemperatureCodec, ConfigError> {
    match name.trim().to_lowercase().as_str() {
        "scaled_celsius" | "celsius" => Ok(TemperatureCodec::SCALED_CELSIUS),
        "deci_fahrenheit" | "fahrenheit" => Ok(TemperatureCodec::DECI_FAHRENHEIT),
        other => Err(ConfigError::Validation {
            field: "codec".into(),
            reason: format!("expected 'scaled_celsius' or 'deci_fahrenheit', got '{other}'"),
        }),
    }
}

fn base_url(field: &str, value: Option<&str>, default: &str) -> Result<String, ConfigError> {
    let raw = value.unwrap_or(default);
    let parsed: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(raw.trim_end_matches('/').to_owned())
}

/// Build a `CoordinatorConfig` from a profile and the global defaults.
///
/// The polling interval is clamped by `CoordinatorConfig`; a zero timeout
/// is rejected.
pub fn profile_to_coordinator_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<CoordinatorConfig, ConfigError> {
    let (username, password) = resolve_credentials(profile, profile_name)?;

    let lang = profile.lang.as_deref().unwrap_or(&defaults.lang).trim();
    if lang.is_empty() {
        return Err(ConfigError::Validation {
            field: "lang".into(),
            reason: "must not be empty".into(),
        });
    }

    let timeout = profile.timeout.unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }

    let codec = parse_codec(profile.codec.as_deref().unwrap_or(&defaults.codec))?;
    let transport = TransportConfig {
        auth_base_url: base_url("auth_url", profile.auth_url.as_deref(), DEFAULT_AUTH_BASE_URL)?,
        api_base_url: base_url("api_url", profile.api_url.as_deref(), DEFAULT_API_BASE_URL)?,
        timeout: Duration::from_secs(timeout),
    };
    let polling = Duration::from_secs(profile.polling_interval.unwrap_or(defaults.polling_interval));

    Ok(CoordinatorConfig::new(username, password)
        .with_lang(lang)
        .with_polling_interval(polling)
        .with_codec(codec)
        .with_transport(transport))
}
