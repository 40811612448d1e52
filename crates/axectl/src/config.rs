//! CLI configuration -- thin wrapper around `axectl_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--device, --profile, --timeout).

use axectl_core::DeviceConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use axectl_config::{
    Config, Profile, config_path, load_config_or_default, parse_device_url,
    profile_to_device_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Build the `DeviceConfig` for this invocation.
///
/// Precedence: `--device` flag, then the selected profile. `--timeout`
/// overrides the profile and defaults either way. Both paths go through
/// the same validation.
pub fn resolve_device(global: &GlobalOpts, config: &Config) -> Result<DeviceConfig, CliError> {
    let mut profile = if let Some(ref address) = global.device {
        Profile::new(address.as_str())
    } else {
        let name = active_profile_name(global, config);
        match config.profiles.get(&name) {
            Some(profile) => profile.clone(),
            None if global.profile.is_some() => {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: available_profiles(config),
                });
            }
            None => {
                return Err(CliError::NoDevice {
                    path: config_path().display().to_string(),
                });
            }
        }
    };

    if let Some(secs) = global.timeout {
        profile.timeout = Some(secs);
    }

    Ok(profile_to_device_config(&profile, &config.defaults)?)
}

/// Comma-separated, sorted profile names for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort_unstable();
    names.join(", ")
}
