//! Config subcommand handlers. These never open a session.

use watts_config::{Config, Profile, load_config_from, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::config_file;
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_file(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Init {
            username,
            password_env,
            default,
            force,
        } => {
            let name = global.profile.clone().unwrap_or_else(|| "default".into());
            let mut cfg = if path.exists() {
                load_config_from(&path)?
            } else {
                Config::default()
            };

            let profile = Profile {
                username: Some(username),
                password_env,
                lang: global.lang.clone(),
                ..Profile::default()
            };
            insert_profile(&mut cfg, &name, profile, force)?;
            if default || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(name.clone());
            }

            save_config_to(&cfg, &path)?;
            tracing::info!(profile = %name, path = %path.display(), "profile written");
            output::print_output(
                &format!("Profile '{name}' written to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }
    }
}

fn insert_profile(
    cfg: &mut Config,
    name: &str,
    profile: Profile,
    force: bool,
) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) && !force {
        return Err(CliError::Validation {
            field: "profile".into(),
            reason: format!("'{name}' already exists, pass --force to replace it"),
        });
    }
    cfg.profiles.insert(name.to_owned(), profile);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cli::OutputFormat;

    fn global(path: &std::path::Path, profile: Option<&str>) -> GlobalOpts {
        GlobalOpts {
            profile: profile.map(Into::into),
            config: Some(path.to_path_buf()),
            lang: None,
            output: OutputFormat::Table,
            verbose: 0,
            quiet: true,
        }
    }

    fn init(username: &str, default: bool, force: bool) -> ConfigArgs {
        ConfigArgs {
            command: ConfigCommand::Init {
                username: username.into(),
                password_env: Some("HOME_PASSWORD".into()),
                default,
                force,
            },
        }
    }

    #[test]
    fn init_writes_a_loadable_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watts").join("config.toml");

        handle(init("me@example.com", false, false), &global(&path, Some("home"))).unwrap();

        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "home");
        assert_eq!(profile.username.as_deref(), Some("me@example.com"));
        assert_eq!(profile.password_env.as_deref(), Some("HOME_PASSWORD"));
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let opts = global(&path, None);

        handle(init("first@example.com", false, false), &opts).unwrap();
        let err = handle(init("second@example.com", false, false), &opts).unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));

        handle(init("second@example.com", false, true), &opts).unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(
            cfg.profiles["default"].username.as_deref(),
            Some("second@example.com")
        );
    }

    #[test]
    fn second_profile_keeps_existing_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        handle(init("a@example.com", false, false), &global(&path, Some("a"))).unwrap();
        handle(init("b@example.com", false, false), &global(&path, Some("b"))).unwrap();
        assert_eq!(
            load_config_from(&path).unwrap().default_profile.as_deref(),
            Some("a")
        );

        handle(init("b@example.com", true, true), &global(&path, Some("b"))).unwrap();
        assert_eq!(
            load_config_from(&path).unwrap().default_profile.as_deref(),
            Some("b")
        );
    }
}
