// ── Command dispatch ──
//
// User intents ("set frequency to 525", "press restart") become device
// writes here. Validation happens against the current snapshot before
// anything touches the network; the write itself and the read-back go
// through the coordinator so they are serialized with everything else.

use std::sync::Arc;

use tracing::debug;

use crate::error::{DispatchError, RegistryError};
use crate::registry::{DisplayValue, Registry};
use crate::store::{Coordinator, DeviceSnapshot};
use crate::transport::{Transport, WriteRequest};

/// Routes settings writes and button presses for one device.
pub struct Dispatcher<T: Transport> {
    coordinator: Coordinator<T>,
    registry: Arc<Registry>,
}

impl<T: Transport> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(coordinator: Coordinator<T>, registry: Arc<Registry>) -> Self {
        Self {
            coordinator,
            registry,
        }
    }

    /// Validate and write one setting, returning the snapshot read back
    /// after the write.
    ///
    /// Unknown keys, read-only keys and out-of-domain input fail before any
    /// request is made. Model-dependent domains are resolved against the
    /// current snapshot (the default model if there is none yet).
    pub async fn set(
        &self,
        key: &str,
        input: &DisplayValue,
    ) -> Result<Arc<DeviceSnapshot>, DispatchError> {
        let descriptor = self.registry.describe(key)?;
        if !descriptor.is_writable() {
            return Err(RegistryError::ReadOnlyKey {
                key: descriptor.key.to_owned(),
            }
            .into());
        }

        let snapshot = self.coordinator.current_snapshot();
        let domain = descriptor.resolve_domain(snapshot.as_deref());
        let raw = descriptor.encode(input, &domain)?;

        debug!(key, api_key = descriptor.api_key, %raw, "dispatching setting");
        let request = WriteRequest::patch(descriptor.api_key, raw);
        Ok(self.coordinator.write_and_refresh(request).await?)
    }

    /// Trigger a device command, then force a refresh.
    pub async fn press(&self, key: &str) -> Result<Arc<DeviceSnapshot>, DispatchError> {
        let command = self.registry.command(key)?;

        debug!(key, endpoint = command.endpoint, "dispatching command");
        let request = WriteRequest::post(command.endpoint);
        Ok(self.coordinator.write_and_refresh(request).await?)
    }
}
