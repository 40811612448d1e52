// ── Transport seam ──
//
// The coordinator only needs three operations from the network layer.
// `axectl_api::DeviceClient` is the production implementation; tests
// plug in an in-memory device.

use std::future::Future;

use serde_json::{Map, Value};

use axectl_api::DeviceClient;

use crate::error::FetchError;

/// Request/response contract the coordinator drives.
///
/// Implementations should bound their own requests, but the coordinator
/// applies its configured timeout on top regardless.
pub trait Transport: Send + Sync + 'static {
    /// `GET /api/system/info` decoded into a JSON object.
    fn fetch_info(&self) -> impl Future<Output = Result<Map<String, Value>, FetchError>> + Send;

    /// `PATCH /api/system` with the given fields.
    fn patch(
        &self,
        fields: &Map<String, Value>,
    ) -> impl Future<Output = Result<(), FetchError>> + Send;

    /// Bodiless `POST` to a fixed endpoint.
    fn post(&self, endpoint: &str) -> impl Future<Output = Result<(), FetchError>> + Send;
}

impl Transport for DeviceClient {
    async fn fetch_info(&self) -> Result<Map<String, Value>, FetchError> {
        Ok(self.get_system_info().await?)
    }

    async fn patch(&self, fields: &Map<String, Value>) -> Result<(), FetchError> {
        Ok(self.patch_system(fields).await?)
    }

    async fn post(&self, endpoint: &str) -> Result<(), FetchError> {
        Ok(self.post_command(endpoint).await?)
    }
}

/// A single device write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    /// `PATCH /api/system` with a JSON object body.
    Patch(Map<String, Value>),
    /// Bodiless `POST` to a command endpoint.
    Post { endpoint: &'static str },
}

impl WriteRequest {
    /// Single-field PATCH: `{ api_key: value }`.
    pub fn patch(api_key: &str, value: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(api_key.to_owned(), value);
        Self::Patch(fields)
    }

    pub fn post(endpoint: &'static str) -> Self {
        Self::Post { endpoint }
    }

    pub(crate) async fn send<T: Transport>(&self, transport: &T) -> Result<(), FetchError> {
        match self {
            Self::Patch(fields) => transport.patch(fields).await,
            Self::Post { endpoint } => transport.post(endpoint).await,
        }
    }
}
