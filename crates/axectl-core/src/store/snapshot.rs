// ── Device snapshot ──
//
// One immutable capture of `GET /api/system/info`. Snapshots are only
// ever replaced wholesale; nothing merges into an existing one.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Field the device uses to report its ASIC family.
pub const ASIC_MODEL_KEY: &str = "ASICModel";

/// The last-known full state of the device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    values: Map<String, Value>,
    captured_at: DateTime<Utc>,
    version: u64,
}

impl DeviceSnapshot {
    pub fn new(values: Map<String, Value>, version: u64) -> Self {
        Self {
            values,
            captured_at: Utc::now(),
            version,
        }
    }

    /// Raw value for a device API key. JSON null is reported as absent.
    pub fn get(&self, api_key: &str) -> Option<&Value> {
        self.values.get(api_key).filter(|v| !v.is_null())
    }

    /// The reported ASIC model, if any.
    pub fn asic_model(&self) -> Option<&str> {
        self.get(ASIC_MODEL_KEY).and_then(Value::as_str)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Monotonic publish counter. The first snapshot is version 1.
    pub fn version(&self) -> u64 {
        self.version
    }
}
