// axectl-api: Async Rust client for the AxeOS device REST API

pub mod client;
pub mod error;
pub mod transport;

pub use client::{DeviceClient, endpoints};
pub use error::Error;
pub use transport::TransportConfig;

/// A decoded `GET /api/system/info` body: device API key -> raw value.
pub type SystemInfo = serde_json::Map<String, serde_json::Value>;
