// AxeOS HTTP client
//
// Wraps `reqwest::Client` with device URL construction, status checking,
// and JSON object decoding. Request helpers map transport failures into
// `Error` so the caller never sees a raw `reqwest::Error` for timeouts.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::SystemInfo;
use crate::error::Error;
use crate::transport::TransportConfig;

/// REST paths exposed by the device firmware.
pub mod endpoints {
    /// Full telemetry + settings object.
    pub const SYSTEM_INFO: &str = "/api/system/info";
    /// Settings update (JSON object body, one or more fields).
    pub const SYSTEM: &str = "/api/system";
    /// Bodiless reboot command.
    pub const RESTART: &str = "/api/system/restart";
    /// Bodiless "blink the screen" command.
    pub const IDENTIFY: &str = "/api/system/identify";
}

/// Raw HTTP client for a single device.
///
/// All methods return decoded bodies or a typed [`Error`]; the client keeps
/// no state between calls beyond the connection pool inside `reqwest`.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl DeviceClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the device root, e.g. `http://192.168.1.50`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: Some(transport.timeout),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            timeout: None,
        }
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the full device state.
    ///
    /// `GET /api/system/info`
    ///
    /// Returns loosely-typed JSON because the field set varies by
    /// firmware version and ASIC family.
    pub async fn get_system_info(&self) -> Result<SystemInfo, Error> {
        let url = self.api_url(endpoints::SYSTEM_INFO)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let resp = check_status(resp).await?;
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::Deserialization {
                message: format!("expected a JSON object, got {}", json_kind(&other)),
                body,
            }),
            Err(e) => Err(Error::Deserialization {
                message: e.to_string(),
                body,
            }),
        }
    }

    /// Update one or more settings.
    ///
    /// `PATCH /api/system` with `{ "<apiKey>": <rawValue>, ... }`
    pub async fn patch_system(&self, fields: &SystemInfo) -> Result<(), Error> {
        let url = self.api_url(endpoints::SYSTEM)?;
        debug!(fields = fields.len(), "PATCH {}", url);

        let resp = self
            .http
            .patch(url)
            .json(fields)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        check_status(resp).await?;
        Ok(())
    }

    /// Send a bodiless command, e.g. [`endpoints::RESTART`].
    pub async fn post_command(&self, endpoint: &str) -> Result<(), Error> {
        let url = self.api_url(endpoint)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        check_status(resp).await?;
        Ok(())
    }

    /// Reboot the device.
    pub async fn restart(&self) -> Result<(), Error> {
        self.post_command(endpoints::RESTART).await
    }

    /// Flash the device display so it can be found on a shelf.
    pub async fn identify(&self) -> Result<(), Error> {
        self.post_command(endpoints::IDENTIFY).await
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn api_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        match self.timeout {
            Some(timeout) if err.is_timeout() => Error::Timeout { timeout },
            _ => Error::Transport(err),
        }
    }
}

/// Turn a non-2xx response into `Error::Status`, keeping the body for logs.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        url,
        body,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
