// ── Core error types ──
//
// Layered errors for axectl-core. Refresh failures are classified into
// three buckets (connect, timeout, protocol); registry and dispatch
// errors are caller-local and never touch the cached snapshot.
// The `From<axectl_api::Error>` impl translates transport-layer errors.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

// ── Transport classification ─────────────────────────────────────────

/// Why a round-trip to the device failed.
///
/// `Clone` because every waiter coalesced onto a refresh round receives
/// its own copy of the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Device unreachable, connection refused or reset.
    #[error("Cannot connect to device: {message}")]
    Connect { message: String },

    /// `timeout` is `None` when the HTTP client gave up on its own limit.
    #[error(
        "Device request timed out{}",
        .timeout.map(|t| format!(" after {t:?}")).unwrap_or_default()
    )]
    Timeout { timeout: Option<Duration> },

    /// Non-2xx status or an undecodable body.
    #[error("Device protocol error: {message}")]
    Protocol { message: String },
}

impl FetchError {
    /// Short machine-readable kind, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Timeout { .. } => "timeout",
            Self::Protocol { .. } => "protocol",
        }
    }
}

impl From<axectl_api::Error> for FetchError {
    fn from(err: axectl_api::Error) -> Self {
        match err {
            axectl_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    FetchError::Timeout { timeout: None }
                } else if e.is_decode() || e.is_body() {
                    FetchError::Protocol {
                        message: e.to_string(),
                    }
                } else {
                    FetchError::Connect {
                        message: e.to_string(),
                    }
                }
            }
            axectl_api::Error::InvalidUrl(e) => FetchError::Connect {
                message: format!("invalid device URL: {e}"),
            },
            axectl_api::Error::Timeout { timeout } => FetchError::Timeout {
                timeout: Some(timeout),
            },
            axectl_api::Error::Status { status, url, .. } => FetchError::Protocol {
                message: format!("HTTP {status} from {url}"),
            },
            axectl_api::Error::Deserialization { message, body: _ } => {
                FetchError::Protocol { message }
            }
        }
    }
}

/// Failure of [`Coordinator::write_and_refresh`](crate::store::Coordinator::write_and_refresh).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// The write itself failed; the snapshot was left untouched.
    #[error("Write rejected: {0}")]
    Write(FetchError),

    /// The write was accepted but the follow-up refresh failed.
    #[error("Write applied but refresh failed: {0}")]
    Refresh(FetchError),

    /// The write task died mid-flight; whether the device applied the
    /// write is unknown.
    #[error("Write interrupted, device state unknown: {message}")]
    Interrupted { message: String },
}

// ── Registry / dispatch ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("Unknown control point: {key}")]
    UnknownKey { key: String },

    /// The device did not report this value (absent or null).
    #[error("No value reported for {key}")]
    MissingValue { key: String },

    #[error("Value {value} is not valid for {key}: {reason}")]
    OutOfDomain {
        key: String,
        value: String,
        reason: String,
    },

    /// A raw value with no registered label.
    #[error("Raw value {raw} of {key} has no label")]
    UnknownRawValue { key: String, raw: Value },

    #[error("Control point {key} is read-only")]
    ReadOnlyKey { key: String },
}

impl RegistryError {
    /// `MissingValue` means "currently unknown", not a failure to report.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingValue { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

// ── Umbrella ─────────────────────────────────────────────────────────

/// Unified error type for the [`Device`](crate::Device) facade.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl From<axectl_api::Error> for CoreError {
    fn from(err: axectl_api::Error) -> Self {
        match err {
            axectl_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            other => CoreError::Fetch(other.into()),
        }
    }
}
