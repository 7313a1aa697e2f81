//! CLI configuration: thin wrapper around `watts_config`.
//!
//! Picks the config file and profile from the global flags and applies
//! flag overrides on top of the profile.

use std::path::PathBuf;

use watts_config::{ConfigError, Profile, load_config_from, profile_to_coordinator_config};
use watts_core::CoordinatorConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file named by `--config`, or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(watts_config::config_path)
}

/// Build the `CoordinatorConfig` for this invocation.
///
/// Without a matching profile and without `--profile`, credentials come
/// from `WATTS_USERNAME` / `WATTS_PASSWORD` alone.
pub fn resolve(global: &GlobalOpts) -> Result<CoordinatorConfig, CliError> {
    let path = config_file(global);
    let cfg = load_config_from(&path)?;
    let fallback = Profile::default();

    let (name, profile) = match cfg.profile(global.profile.as_deref()) {
        Ok(found) => found,
        Err(ConfigError::UnknownProfile { name }) if global.profile.is_none() => {
            tracing::debug!(profile = %name, "no profile in config, using environment only");
            ("env", &fallback)
        }
        Err(ConfigError::UnknownProfile { name }) => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut config = profile_to_coordinator_config(profile, name, &cfg.defaults)?;
    if let Some(ref lang) = global.lang {
        config = config.with_lang(lang.clone());
    }
    tracing::debug!(profile = name, lang = %config.lang, "resolved account profile");
    Ok(config)
}
