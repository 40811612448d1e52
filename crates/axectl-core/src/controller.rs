// ── Device facade ──
//
// Lifecycle management for one device: the initial fetch, the background
// poller, and a single entry point for reads, settings writes and
// commands. Consumers (CLI, or anything embedding the crate) hold a
// `Device` and never touch the coordinator directly unless they need to.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use axectl_api::{DeviceClient, TransportConfig};

use crate::command::Dispatcher;
use crate::config::DeviceConfig;
use crate::convert::raw_to_string;
use crate::error::{CoreError, FetchError, RegistryError};
use crate::registry::{ControlPointDescriptor, DisplayValue, Registry, ValueDomain};
use crate::store::{Coordinator, DeviceSnapshot};
use crate::transport::Transport;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── Reading ──────────────────────────────────────────────────────

/// A control point as currently observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub descriptor: &'static ControlPointDescriptor,
    /// `None` when the device has not reported the value.
    pub value: Option<DisplayValue>,
    pub domain: ValueDomain,
}

impl Reading {
    /// Decode `descriptor` against an optional snapshot.
    ///
    /// A raw value with no label is shown as its raw string rather than
    /// dropped, so the reader still sees what the device reports.
    pub fn observe(
        descriptor: &'static ControlPointDescriptor,
        snapshot: Option<&DeviceSnapshot>,
    ) -> Self {
        let value = snapshot.and_then(|snap| match descriptor.decode(snap) {
            Ok(value) => Some(value),
            Err(RegistryError::UnknownRawValue { raw, .. }) => {
                debug!(key = descriptor.key, %raw, "unmapped raw value");
                Some(DisplayValue::Text(raw_to_string(&raw)))
            }
            Err(_) => None,
        });

        Self {
            descriptor,
            value,
            domain: descriptor.resolve_domain(snapshot),
        }
    }
}

// ── Device ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable. [`connect()`](Self::connect) performs the first
/// fetch and starts polling; everything else works against the cached
/// snapshot and the coordinator.
pub struct Device<T: Transport = DeviceClient> {
    inner: Arc<DeviceInner<T>>,
}

impl<T: Transport> Clone for Device<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct DeviceInner<T: Transport> {
    config: DeviceConfig,
    coordinator: Coordinator<T>,
    dispatcher: Dispatcher<T>,
    registry: Arc<Registry>,
    connection_state: watch::Sender<ConnectionState>,
    poller: Mutex<Option<Poller>>,
}

struct Poller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Device<DeviceClient> {
    /// Create a device backed by the HTTP client. Does NOT connect.
    pub fn new(config: DeviceConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = DeviceClient::new(config.url.clone(), &transport)?;
        Ok(Self::with_transport(client, config))
    }
}

impl<T: Transport> Device<T> {
    /// Create a device over any transport. Only the timeout and poll
    /// interval of `config` are used; the URL is informational.
    pub fn with_transport(transport: T, config: DeviceConfig) -> Self {
        let coordinator = Coordinator::new(transport, config.timeout);
        let registry = Arc::new(Registry::new());
        let dispatcher = Dispatcher::new(coordinator.clone(), Arc::clone(&registry));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(DeviceInner {
                config,
                coordinator,
                dispatcher,
                registry,
                connection_state,
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn coordinator(&self) -> &Coordinator<T> {
        &self.inner.coordinator
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Fetch the initial snapshot, then start the background poller if a
    /// non-zero poll interval is configured.
    ///
    /// A failed initial fetch leaves the device disconnected (state
    /// [`Failed`](ConnectionState::Failed)) with no poller running.
    pub async fn connect(&self) -> Result<Arc<DeviceSnapshot>, CoreError> {
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let snapshot = match self.inner.coordinator.refresh(true).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e.into());
            }
        };

        let period = self.inner.config.poll_interval;
        if period.is_zero() {
            debug!("polling disabled");
        } else {
            let mut poller = self.inner.poller.lock().await;
            if poller.is_none() {
                let cancel = CancellationToken::new();
                let handle = self.inner.coordinator.spawn_poller(period, cancel.clone());
                *poller = Some(Poller { cancel, handle });
            }
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connected);
        info!(
            url = %self.inner.config.url,
            model = snapshot.asic_model().unwrap_or("unknown"),
            "connected to device"
        );
        Ok(snapshot)
    }

    /// Stop the poller and wait for it to exit. The cached snapshot is kept.
    pub async fn disconnect(&self) {
        if let Some(poller) = self.inner.poller.lock().await.take() {
            poller.cancel.cancel();
            if let Err(e) = poller.handle.await {
                warn!(error = %e, "poller task ended abnormally");
            }
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Latest snapshot without touching the network.
    pub fn snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.inner.coordinator.current_snapshot()
    }

    /// Snapshot version notifications.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.coordinator.subscribe()
    }

    pub async fn last_error(&self) -> Option<FetchError> {
        self.inner.coordinator.last_error().await
    }

    /// Refresh now, coalescing with any round already in flight.
    pub async fn refresh(&self) -> Result<Arc<DeviceSnapshot>, CoreError> {
        Ok(self.inner.coordinator.refresh(false).await?)
    }

    /// Current reading of one control point.
    pub fn read(&self, key: &str) -> Result<Reading, CoreError> {
        let descriptor = self.inner.registry.describe(key)?;
        Ok(Reading::observe(descriptor, self.snapshot().as_deref()))
    }

    /// Every control point in catalog order, from one snapshot.
    pub fn readings(&self) -> Vec<Reading> {
        let snapshot = self.snapshot();
        self.inner
            .registry
            .iter()
            .map(|descriptor| Reading::observe(descriptor, snapshot.as_deref()))
            .collect()
    }

    /// Legal values of a control point for this device.
    pub fn options(&self, key: &str) -> Result<ValueDomain, CoreError> {
        Ok(self
            .inner
            .registry
            .resolve_domain(key, self.snapshot().as_deref())?)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Write a setting and return the snapshot read back afterwards.
    pub async fn set(
        &self,
        key: &str,
        input: impl Into<DisplayValue>,
    ) -> Result<Arc<DeviceSnapshot>, CoreError> {
        Ok(self.inner.dispatcher.set(key, &input.into()).await?)
    }

    /// Trigger a device command (`restart`, `identify`).
    pub async fn press(&self, key: &str) -> Result<Arc<DeviceSnapshot>, CoreError> {
        Ok(self.inner.dispatcher.press(key).await?)
    }
}
