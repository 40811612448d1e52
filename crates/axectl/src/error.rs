//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use axectl_config::ConfigError;
use axectl_core::{CoreError, DispatchError, FetchError, RegistryError, WriteError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Device ───────────────────────────────────────────────────────
    #[error("Could not connect to the device: {reason}")]
    #[diagnostic(
        code(axectl::connection_failed),
        help(
            "Check that the miner is powered on and reachable on this network.\n\
             Try: axectl --device <ip> status"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("{message}")]
    #[diagnostic(
        code(axectl::timeout),
        help("Increase the timeout with --timeout or check the device's Wi-Fi signal.")
    )]
    Timeout { message: String },

    #[error("Unexpected response from the device: {message}")]
    #[diagnostic(
        code(axectl::protocol),
        help("Make sure the address points at an AxeOS device and its firmware is current.")
    )]
    Protocol { message: String },

    #[error("Change to '{key}' was sent but could not be read back: {reason}")]
    #[diagnostic(
        code(axectl::unconfirmed),
        help("The device accepted the write. Run: axectl get {key}")
    )]
    Unconfirmed { key: String, reason: String },

    #[error("Write did not complete: {message}")]
    #[diagnostic(
        code(axectl::interrupted),
        help("The device may or may not have applied it. Run: axectl status")
    )]
    Interrupted { message: String },

    // ── Control points ───────────────────────────────────────────────
    #[error("Unknown control point or command '{key}'")]
    #[diagnostic(
        code(axectl::unknown_key),
        help("Run: axectl points to see available keys")
    )]
    UnknownKey { key: String },

    #[error("'{value}' is not a valid value for {key}: {reason}")]
    #[diagnostic(code(axectl::invalid_value), help("Run: axectl options {key}"))]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("'{key}' is read-only")]
    #[diagnostic(code(axectl::read_only))]
    ReadOnly { key: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No device configured")]
    #[diagnostic(
        code(axectl::no_device),
        help(
            "Pass --device <ip>, or add a profile with: axectl config add <name> <ip>\n\
             Config file: {path}"
        )
    )]
    NoDevice { path: String },

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(axectl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: axectl config add {name} <ip>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(axectl::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(axectl::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(axectl::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(axectl::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to render TOML: {0}")]
    #[diagnostic(code(axectl::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::UnknownKey { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::InvalidValue { .. }
            | Self::ReadOnly { .. }
            | Self::Validation { .. }
            | Self::NoDevice { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Core → CliError mapping ──────────────────────────────────────────

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Connect { message } => CliError::ConnectionFailed { reason: message },
            timeout @ FetchError::Timeout { .. } => CliError::Timeout {
                message: timeout.to_string(),
            },
            FetchError::Protocol { message } => CliError::Protocol { message },
        }
    }
}

impl From<RegistryError> for CliError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownKey { key } => CliError::UnknownKey { key },
            RegistryError::ReadOnlyKey { key } => CliError::ReadOnly { key },
            RegistryError::OutOfDomain { key, value, reason } => {
                CliError::InvalidValue { key, value, reason }
            }
            RegistryError::MissingValue { key } => CliError::Protocol {
                message: format!("device did not report {key}"),
            },
            RegistryError::UnknownRawValue { key, raw } => CliError::Protocol {
                message: format!("device reported unrecognized value {raw} for {key}"),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Fetch(e)
            | CoreError::Dispatch(DispatchError::Write(
                WriteError::Write(e) | WriteError::Refresh(e),
            )) => e.into(),
            CoreError::Dispatch(DispatchError::Write(WriteError::Interrupted { message })) => {
                CliError::Interrupted { message }
            }
            CoreError::Registry(e) | CoreError::Dispatch(DispatchError::Registry(e)) => e.into(),
            CoreError::Config { message } => CliError::Validation {
                field: "device".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: "(run: axectl config show)".into(),
            },
            other => CliError::Config(other),
        }
    }
}
