// ── Sync coordinator ──
//
// Owns the cached device snapshot. Refreshes are coalesced into rounds:
// at most one GET is outstanding, and every caller attached to a round
// receives the same outcome. Writes are serialized and always followed
// by a forced refresh, so a successful write is visible in the snapshot
// before the writer returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::snapshot::DeviceSnapshot;
use crate::error::{FetchError, WriteError};
use crate::transport::{Transport, WriteRequest};

type RoundResult = Result<Arc<DeviceSnapshot>, FetchError>;

/// Polling and caching front for one device.
///
/// Cheaply cloneable; clones share the same snapshot and refresh state.
/// Readers use [`current_snapshot()`](Self::current_snapshot), which never
/// waits on the network or on the coordinator's lock.
pub struct Coordinator<T: Transport> {
    inner: Arc<CoordinatorInner<T>>,
}

impl<T: Transport> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct CoordinatorInner<T> {
    transport: T,
    timeout: Duration,
    /// Single published slot. Replaced wholesale, never merged.
    snapshot: ArcSwapOption<DeviceSnapshot>,
    /// Version of the published snapshot; 0 until the first success.
    version_tx: watch::Sender<u64>,
    state: Mutex<RefreshState>,
    /// Held across write + refresh; tokio's mutex is FIFO-fair.
    write_lock: Arc<Mutex<()>>,
}

#[derive(Default)]
struct RefreshState {
    last_error: Option<FetchError>,
    in_flight: Option<Round>,
    rounds_started: u64,
    last_version: u64,
}

/// An outstanding GET. Waiters hold receivers of `tx`.
struct Round {
    id: u64,
    tx: broadcast::Sender<RoundResult>,
}

impl<T: Transport> Coordinator<T> {
    /// Create a coordinator with no snapshot. Nothing is fetched until the
    /// first [`refresh()`](Self::refresh).
    pub fn new(transport: T, timeout: Duration) -> Self {
        let (version_tx, _) = watch::channel(0);

        Self {
            inner: Arc::new(CoordinatorInner {
                transport,
                timeout,
                snapshot: ArcSwapOption::empty(),
                version_tx,
                state: Mutex::new(RefreshState::default()),
                write_lock: Arc::new(Mutex::new(())),
            }),
        }
    }

    /// Access the underlying transport.
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    // ── Reads ────────────────────────────────────────────────────

    /// The last successfully fetched snapshot, or `None` before the first
    /// success. Never blocks.
    pub fn current_snapshot(&self) -> Option<Arc<DeviceSnapshot>> {
        self.inner.snapshot.load_full()
    }

    /// Subscribe to snapshot publishes. The value is the snapshot version.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.version_tx.subscribe()
    }

    /// Failure of the most recent round, cleared by the next success.
    pub async fn last_error(&self) -> Option<FetchError> {
        self.inner.state.lock().await.last_error.clone()
    }

    /// `true` while a GET is outstanding.
    pub async fn is_refreshing(&self) -> bool {
        self.inner.state.lock().await.in_flight.is_some()
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch the device state, coalescing with any round already in flight.
    ///
    /// Without `force`, the caller attaches to the in-flight round if there
    /// is one. With `force`, a round that started before this call is waited
    /// out first (it cannot be cancelled), then the caller joins or starts a
    /// round that began after the call. Either way at most one GET is ever
    /// outstanding.
    ///
    /// A failed round leaves the published snapshot untouched.
    pub async fn refresh(&self, force: bool) -> Result<Arc<DeviceSnapshot>, FetchError> {
        let mut requested_after: Option<u64> = None;

        loop {
            let (mut rx, stale) = {
                let mut state = self.inner.state.lock().await;
                let threshold = *requested_after.get_or_insert(state.rounds_started);

                let joined = state
                    .in_flight
                    .as_ref()
                    .map(|round| (round.id, round.tx.subscribe(), round.tx.receiver_count()));

                match joined {
                    Some((id, rx, waiters)) => {
                        debug!(round = id, waiters, force, "joining in-flight refresh");
                        (rx, force && id <= threshold)
                    }
                    None => (self.start_round(&mut state), false),
                }
            };

            let result = await_round(&mut rx).await;
            if !stale {
                return result;
            }
            debug!("older round finished, forcing a fresh one");
        }
    }

    fn start_round(&self, state: &mut RefreshState) -> broadcast::Receiver<RoundResult> {
        state.rounds_started += 1;
        let id = state.rounds_started;
        let (tx, rx) = broadcast::channel(1);
        state.in_flight = Some(Round { id, tx });

        // Detached so that a cancelled caller never aborts the request.
        let this = self.clone();
        tokio::spawn(async move { this.run_round(id).await });

        rx
    }

    async fn run_round(self, id: u64) {
        debug!(round = id, "fetching device state");
        let outcome = bounded(self.inner.timeout, self.inner.transport.fetch_info()).await;

        let mut state = self.inner.state.lock().await;
        let result = match outcome {
            Ok(values) => {
                state.last_version += 1;
                let snapshot = Arc::new(DeviceSnapshot::new(values, state.last_version));
                self.inner.snapshot.store(Some(Arc::clone(&snapshot)));
                self.inner.version_tx.send_replace(snapshot.version());
                state.last_error = None;
                debug!(
                    round = id,
                    version = snapshot.version(),
                    keys = snapshot.values().len(),
                    "snapshot published"
                );
                Ok(snapshot)
            }
            Err(err) => {
                debug!(round = id, kind = err.kind(), error = %err, "refresh failed");
                state.last_error = Some(err.clone());
                Err(err)
            }
        };

        if let Some(round) = state.in_flight.take() {
            // No receivers is fine: every waiter may have been dropped.
            let _ = round.tx.send(result);
        }
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Apply a write, then force a refresh and return the new snapshot.
    ///
    /// Writes are serialized in arrival order. If the write fails the
    /// refresh is skipped and the snapshot stays as it was.
    pub async fn write_and_refresh(
        &self,
        request: WriteRequest,
    ) -> Result<Arc<DeviceSnapshot>, WriteError> {
        let guard = Arc::clone(&self.inner.write_lock).lock_owned().await;

        let this = self.clone();
        let task = tokio::spawn(async move {
            let _guard = guard;
            debug!(?request, "writing to device");

            bounded(this.inner.timeout, request.send(&this.inner.transport))
                .await
                .map_err(WriteError::Write)?;

            this.refresh(true).await.map_err(WriteError::Refresh)
        });

        task.await.unwrap_or_else(|e| {
            warn!(error = %e, "write task ended abnormally");
            Err(WriteError::Interrupted {
                message: e.to_string(),
            })
        })
    }

    // ── Background polling ───────────────────────────────────────

    /// Spawn the periodic refresh loop. `period` must be non-zero.
    ///
    /// Each tick is an independent attempt; failures are logged and the
    /// loop keeps going until `cancel` fires.
    pub fn spawn_poller(&self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.poll(period, cancel).await })
    }

    async fn poll(self, period: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if self.is_refreshing().await {
                        debug!("refresh already in flight, skipping tick");
                    } else if let Err(e) = self.refresh(false).await {
                        warn!(error = %e, kind = e.kind(), "periodic refresh failed");
                    }
                }
            }
        }

        debug!("poller stopped");
    }
}

/// Bound a transport call by the coordinator timeout.
async fn bounded<F, R>(timeout: Duration, fut: F) -> Result<R, FetchError>
where
    F: Future<Output = Result<R, FetchError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(FetchError::Timeout {
            timeout: Some(timeout),
        }))
}

async fn await_round(rx: &mut broadcast::Receiver<RoundResult>) -> RoundResult {
    rx.recv().await.unwrap_or_else(|_| {
        Err(FetchError::Protocol {
            message: "refresh round ended without a result".into(),
        })
    })
}
