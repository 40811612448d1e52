//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = axectl_config::load_config()?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                OutputFormat::Json => output::render_json(&cfg, false)?,
                OutputFormat::JsonCompact => output::render_json(&cfg, true)?,
                OutputFormat::Yaml => output::render_yaml(&cfg)?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Add {
            name,
            host,
            label,
            timeout,
            poll_interval,
            default,
        } => {
            // Reject bad addresses before anything is written.
            config::parse_device_url(&host)?;
            if timeout == Some(0) {
                return Err(CliError::Validation {
                    field: "timeout".into(),
                    reason: "must be at least 1 second".into(),
                });
            }

            let mut cfg = axectl_config::load_config()?;
            let first = cfg.profiles.is_empty();
            cfg.profiles.insert(
                name.clone(),
                Profile {
                    host,
                    name: label,
                    timeout,
                    poll_interval,
                },
            );
            if default || first {
                cfg.default_profile = Some(name.clone());
            }

            let path = config::save_config(&cfg)?;
            output::print_output(
                &format!("Saved profile '{name}' to {}", path.display()),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Remove { name } => {
            let mut cfg = axectl_config::load_config()?;
            require_profile(&cfg, &name)?;
            cfg.profiles.remove(&name);
            if cfg.default_profile.as_deref() == Some(name.as_str()) {
                cfg.default_profile = None;
            }

            config::save_config(&cfg)?;
            output::print_output(&format!("Removed profile '{name}'"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = axectl_config::load_config()?;
            require_profile(&cfg, &name)?;
            cfg.default_profile = Some(name.clone());

            config::save_config(&cfg)?;
            output::print_output(&format!("Default profile is now '{name}'"), global.quiet);
            Ok(())
        }
    }
}

fn require_profile(cfg: &Config, name: &str) -> Result<(), CliError> {
    if cfg.profiles.contains_key(name) {
        Ok(())
    } else {
        Err(CliError::ProfileNotFound {
            name: name.into(),
            available: config::available_profiles(cfg),
        })
    }
}
