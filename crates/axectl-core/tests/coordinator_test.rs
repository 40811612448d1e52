#![allow(clippy::unwrap_used)]
// Coordinator, dispatcher and device lifecycle tests against an in-memory
// device that echoes writes back on the next GET.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use tokio::sync::Semaphore;
use url::Url;

use axectl_core::{
    Coordinator, CoreError, Device, DeviceConfig, DispatchError, DisplayValue, FetchError,
    RegistryError, Transport, WriteError,
};

// ── Fake device ─────────────────────────────────────────────────────

#[derive(Clone)]
struct FakeDevice {
    inner: Arc<FakeInner>,
}

struct FakeInner {
    state: Mutex<Map<String, Value>>,
    gets: AtomicUsize,
    patches: Mutex<Vec<Map<String, Value>>>,
    posts: Mutex<Vec<String>>,
    /// Every GET takes one permit before answering.
    gate: Semaphore,
    /// Every PATCH takes one permit before applying.
    write_gate: Semaphore,
    /// Start/end of every request, in the order the device saw them.
    events: Mutex<Vec<String>>,
    fail_gets: AtomicBool,
    fail_writes: AtomicBool,
    panic_writes: AtomicBool,
}

impl FakeDevice {
    fn new(state: Value) -> Self {
        Self::build(state, Semaphore::MAX_PERMITS, Semaphore::MAX_PERMITS)
    }

    /// GETs block until [`release`](Self::release) is called.
    fn gated(state: Value) -> Self {
        Self::build(state, 0, Semaphore::MAX_PERMITS)
    }

    /// PATCHes block until [`release_writes`](Self::release_writes) is called.
    fn write_gated(state: Value) -> Self {
        Self::build(state, Semaphore::MAX_PERMITS, 0)
    }

    fn build(state: Value, permits: usize, write_permits: usize) -> Self {
        let Value::Object(state) = state else {
            panic!("fake device state must be an object");
        };
        Self {
            inner: Arc::new(FakeInner {
                state: Mutex::new(state),
                gets: AtomicUsize::new(0),
                patches: Mutex::new(Vec::new()),
                posts: Mutex::new(Vec::new()),
                gate: Semaphore::new(permits),
                write_gate: Semaphore::new(write_permits),
                events: Mutex::new(Vec::new()),
                fail_gets: AtomicBool::new(false),
                fail_writes: AtomicBool::new(false),
                panic_writes: AtomicBool::new(false),
            }),
        }
    }

    fn release(&self, n: usize) {
        self.inner.gate.add_permits(n);
    }

    fn release_writes(&self, n: usize) {
        self.inner.write_gate.add_permits(n);
    }

    fn events(&self) -> Vec<String> {
        self.inner.events.lock().unwrap().clone()
    }

    fn log(&self, event: String) {
        self.inner.events.lock().unwrap().push(event);
    }

    fn gets(&self) -> usize {
        self.inner.gets.load(Ordering::SeqCst)
    }

    fn patches(&self) -> Vec<Map<String, Value>> {
        self.inner.patches.lock().unwrap().clone()
    }

    fn posts(&self) -> Vec<String> {
        self.inner.posts.lock().unwrap().clone()
    }

    fn fail_gets(&self, fail: bool) {
        self.inner.fail_gets.store(fail, Ordering::SeqCst);
    }

    fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn panic_writes(&self, panic: bool) {
        self.inner.panic_writes.store(panic, Ordering::SeqCst);
    }

    fn refused() -> FetchError {
        FetchError::Connect {
            message: "connection refused".into(),
        }
    }
}

impl Transport for FakeDevice {
    async fn fetch_info(&self) -> Result<Map<String, Value>, FetchError> {
        self.inner.gets.fetch_add(1, Ordering::SeqCst);
        self.log("get".into());
        self.inner.gate.acquire().await.unwrap().forget();
        self.log("/get".into());

        if self.inner.fail_gets.load(Ordering::SeqCst) {
            return Err(Self::refused());
        }
        Ok(self.inner.state.lock().unwrap().clone())
    }

    async fn patch(&self, fields: &Map<String, Value>) -> Result<(), FetchError> {
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        let keys = keys.join(",");
        self.log(format!("patch {keys}"));
        self.inner.write_gate.acquire().await.unwrap().forget();
        self.log(format!("/patch {keys}"));

        assert!(
            !self.inner.panic_writes.load(Ordering::SeqCst),
            "device firmware crashed mid-write"
        );
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::refused());
        }
        self.inner.patches.lock().unwrap().push(fields.clone());
        let mut state = self.inner.state.lock().unwrap();
        for (key, value) in fields {
            state.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn post(&self, endpoint: &str) -> Result<(), FetchError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Self::refused());
        }
        self.inner.posts.lock().unwrap().push(endpoint.to_owned());
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn bitaxe() -> Value {
    json!({
        "ASICModel": "BM1370",
        "frequency": 490,
        "coreVoltage": 1150,
        "fanspeed": 45,
        "displayTimeout": -1,
        "hashRate": 1021.7,
        "bestDiff": 2_500_000_000_u64,
        "uptimeSeconds": 90_061,
        "autofanspeed": 1,
        "hostname": "bitaxe"
    })
}

fn config() -> DeviceConfig {
    DeviceConfig::new(Url::parse("http://bitaxe.local").unwrap())
        .with_poll_interval(Duration::ZERO)
}

async fn connected(fake: &FakeDevice) -> Device<FakeDevice> {
    let device = Device::with_transport(fake.clone(), config());
    device.connect().await.unwrap();
    device
}

/// Let spawned tasks on the current-thread runtime run until they block.
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

// ── Coalescing ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_refreshes_share_one_get() {
    let fake = FakeDevice::gated(bitaxe());
    let coordinator = Coordinator::new(fake.clone(), Duration::from_secs(10));

    let waiters: Vec<_> = (0..10)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh(false).await })
        })
        .collect();

    settle().await;
    assert_eq!(fake.gets(), 1);
    assert!(coordinator.is_refreshing().await);

    fake.release(1);
    for waiter in waiters {
        let snapshot = waiter.await.unwrap().unwrap();
        assert_eq!(snapshot.version(), 1);
    }

    assert_eq!(fake.gets(), 1);
    assert!(!coordinator.is_refreshing().await);
    assert_eq!(coordinator.current_snapshot().unwrap().version(), 1);
}

#[tokio::test]
async fn test_concurrent_refreshes_share_one_failure() {
    let fake = FakeDevice::gated(bitaxe());
    fake.fail_gets(true);
    let coordinator = Coordinator::new(fake.clone(), Duration::from_secs(10));

    let waiters: Vec<_> = (0..5)
        .map(|_| {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.refresh(false).await })
        })
        .collect();

    settle().await;
    assert_eq!(fake.gets(), 1);

    fake.release(1);
    for waiter in waiters {
        assert_eq!(waiter.await.unwrap().unwrap_err(), FakeDevice::refused());
    }

    assert_eq!(fake.gets(), 1);
    assert!(coordinator.current_snapshot().is_none());
    assert_eq!(coordinator.last_error().await, Some(FakeDevice::refused()));
}

#[tokio::test]
async fn test_forced_refresh_waits_out_older_round() {
    let fake = FakeDevice::gated(bitaxe());
    let coordinator = Coordinator::new(fake.clone(), Duration::from_secs(10));

    let plain = {
        let c = coordinator.clone();
        tokio::spawn(async move { c.refresh(false).await })
    };
    settle().await;
    assert_eq!(fake.gets(), 1);

    let forced: Vec<_> = (0..2)
        .map(|_| {
            let c = coordinator.clone();
            tokio::spawn(async move { c.refresh(true).await })
        })
        .collect();
    settle().await;

    // Still one GET outstanding; forced callers queue behind it.
    assert_eq!(fake.gets(), 1);

    fake.release(1);
    assert_eq!(plain.await.unwrap().unwrap().version(), 1);
    settle().await;
    assert_eq!(fake.gets(), 2);

    fake.release(1);
    for waiter in forced {
        assert_eq!(waiter.await.unwrap().unwrap().version(), 2);
    }
    assert_eq!(fake.gets(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_timeout_is_classified() {
    let fake = FakeDevice::gated(bitaxe());
    let coordinator = Coordinator::new(fake.clone(), Duration::from_secs(10));

    let err = coordinator.refresh(false).await.unwrap_err();

    assert_eq!(
        err,
        FetchError::Timeout {
            timeout: Some(Duration::from_secs(10))
        }
    );
    assert_eq!(err.kind(), "timeout");
    assert!(coordinator.current_snapshot().is_none());
    assert_eq!(coordinator.last_error().await, Some(err));
}

#[tokio::test(start_paused = true)]
async fn test_sub_second_timeout_is_reported_exactly() {
    let fake = FakeDevice::gated(bitaxe());
    let coordinator = Coordinator::new(fake.clone(), Duration::from_millis(250));

    let err = coordinator.refresh(true).await.unwrap_err();

    assert_eq!(
        err,
        FetchError::Timeout {
            timeout: Some(Duration::from_millis(250))
        }
    );
    assert!(err.to_string().ends_with("after 250ms"), "{err}");
}

// ── Failure isolation ───────────────────────────────────────────────

#[tokio::test]
async fn test_failed_forced_refresh_keeps_previous_snapshot() {
    let fake = FakeDevice::new(bitaxe());
    let coordinator = Coordinator::new(fake.clone(), Duration::from_secs(10));
    let before = coordinator.refresh(true).await.unwrap();

    fake.fail_gets(true);
    let err = coordinator.refresh(true).await.unwrap_err();

    assert_eq!(err, FakeDevice::refused());
    let after = coordinator.current_snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(after.version(), 1);
    assert_eq!(*coordinator.subscribe().borrow(), 1);
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;
    let before = device.snapshot().unwrap();

    fake.fail_gets(true);
    let err = device.refresh().await.unwrap_err();
    assert!(matches!(err, CoreError::Fetch(FetchError::Connect { .. })));

    let after = device.snapshot().unwrap();
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(device.last_error().await.map(|e| e.kind()), Some("connect"));

    fake.fail_gets(false);
    let recovered = device.refresh().await.unwrap();
    assert_eq!(recovered.version(), 2);
    assert_eq!(device.last_error().await, None);
}

#[tokio::test]
async fn test_failed_write_skips_refresh() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;

    fake.fail_writes(true);
    let err = device.set("fan_speed_setting", 80_i64).await.unwrap_err();

    assert!(
        matches!(
            err,
            CoreError::Dispatch(DispatchError::Write(WriteError::Write(_)))
        ),
        "expected write failure, got: {err:?}"
    );
    assert_eq!(fake.gets(), 1);
    assert_eq!(device.snapshot().unwrap().version(), 1);
}

#[tokio::test]
async fn test_initial_fetch_failure_marks_failed() {
    let fake = FakeDevice::new(bitaxe());
    fake.fail_gets(true);
    let device = Device::with_transport(fake.clone(), config());

    assert!(device.connect().await.is_err());
    assert_eq!(
        *device.connection_state().borrow(),
        axectl_core::ConnectionState::Failed
    );
    assert!(device.snapshot().is_none());
    assert_eq!(device.read("hash_rate").unwrap().value, None);
}

// ── Writes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_write_is_visible_to_the_writer() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;

    let snapshot = device.set("frequency", "525").await.unwrap();

    assert_eq!(snapshot.get("frequency"), Some(&json!(525)));
    assert_eq!(
        device.read("frequency").unwrap().value,
        Some(DisplayValue::from("525"))
    );
    assert_eq!(fake.patches(), vec![json_map(json!({ "frequency": 525 }))]);
    assert_eq!(fake.gets(), 2);
}

#[tokio::test]
async fn test_round_trip_through_each_codec() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;

    let cases: [(&str, DisplayValue); 5] = [
        ("display_sleep", "5 minutes".into()),
        ("display_rotation", "180".into()),
        ("overclock_enabled", true.into()),
        ("temp_target", 65_i64.into()),
        ("hostname", "bitaxe-garage".into()),
    ];

    for (key, value) in cases {
        device.set(key, value.clone()).await.unwrap();
        assert_eq!(device.read(key).unwrap().value, Some(value), "{key}");
    }

    let patches = fake.patches();
    assert_eq!(patches[0], json_map(json!({ "displayTimeout": 300 })));
    assert_eq!(patches[2], json_map(json!({ "overclockEnabled": 1 })));
    // display_timeout shares the raw field with display_sleep
    assert_eq!(
        device.read("display_timeout").unwrap().value,
        Some(DisplayValue::Integer(300))
    );
}

#[tokio::test]
async fn test_concurrent_writes_are_serialized() {
    let fake = FakeDevice::write_gated(bitaxe());
    let device = connected(&fake).await;

    let first = {
        let d = device.clone();
        tokio::spawn(async move { d.set("fan_speed_setting", 70_i64).await })
    };
    settle().await;
    let second = {
        let d = device.clone();
        tokio::spawn(async move { d.set("stratum_user", "worker.2").await })
    };
    settle().await;

    // The second write queues behind the first, which is parked mid-PATCH.
    assert_eq!(fake.events(), ["get", "/get", "patch fanspeed"]);

    fake.release_writes(1);
    settle().await;

    // First write and its read-back done before the second PATCH starts.
    assert!(first.is_finished());
    assert!(!second.is_finished());
    assert_eq!(
        fake.events(),
        [
            "get",
            "/get",
            "patch fanspeed",
            "/patch fanspeed",
            "get",
            "/get",
            "patch stratumUser",
        ]
    );

    fake.release_writes(1);
    first.await.unwrap().unwrap();
    let latest = second.await.unwrap().unwrap();

    assert_eq!(
        fake.events(),
        [
            "get",
            "/get",
            "patch fanspeed",
            "/patch fanspeed",
            "get",
            "/get",
            "patch stratumUser",
            "/patch stratumUser",
            "get",
            "/get",
        ]
    );
    assert_eq!(latest.get("fanspeed"), Some(&json!(70)));
    assert_eq!(latest.get("stratumUser"), Some(&json!("worker.2")));
}

#[tokio::test]
async fn test_interrupted_write_is_not_reported_as_rejected() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;

    fake.panic_writes(true);
    let err = device.set("fan_speed_setting", 80_i64).await.unwrap_err();
    assert!(
        matches!(
            err,
            CoreError::Dispatch(DispatchError::Write(WriteError::Interrupted { .. }))
        ),
        "expected interrupted write, got: {err:?}"
    );

    // The write lock was released with the dead task.
    fake.panic_writes(false);
    let snapshot = device.set("fan_speed_setting", 80_i64).await.unwrap();
    assert_eq!(snapshot.get("fanspeed"), Some(&json!(80)));
}

#[tokio::test]
async fn test_invalid_input_never_reaches_device() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;

    let unknown = device.set("warp_drive", 1_i64).await.unwrap_err();
    assert!(matches!(
        unknown,
        CoreError::Dispatch(DispatchError::Registry(RegistryError::UnknownKey { .. }))
    ));

    let read_only = device.set("hash_rate", 1_i64).await.unwrap_err();
    assert!(matches!(
        read_only,
        CoreError::Dispatch(DispatchError::Registry(RegistryError::ReadOnlyKey { .. }))
    ));

    let out_of_range = device.set("fan_speed_setting", 150_i64).await.unwrap_err();
    assert!(matches!(
        out_of_range,
        CoreError::Dispatch(DispatchError::Registry(RegistryError::OutOfDomain { .. }))
    ));

    // 485 MHz is not a BM1370 preset.
    let not_a_preset = device.set("frequency", "485").await.unwrap_err();
    assert!(matches!(
        not_a_preset,
        CoreError::Dispatch(DispatchError::Registry(RegistryError::OutOfDomain { .. }))
    ));

    assert!(fake.patches().is_empty());
    assert_eq!(fake.gets(), 1);
}

#[tokio::test]
async fn test_domain_follows_reported_model() {
    let mut state = bitaxe();
    state["ASICModel"] = json!("BM1366");
    let fake = FakeDevice::new(state);
    let device = connected(&fake).await;

    device.set("frequency", "485").await.unwrap();
    assert_eq!(fake.patches(), vec![json_map(json!({ "frequency": 485 }))]);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_press_posts_then_refreshes() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;

    let snapshot = device.press("identify").await.unwrap();

    assert_eq!(fake.posts(), vec!["/api/system/identify".to_owned()]);
    assert_eq!(snapshot.version(), 2);
    assert_eq!(fake.gets(), 2);

    let err = device.press("self_destruct").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Dispatch(DispatchError::Registry(RegistryError::UnknownKey { .. }))
    ));
}

// ── Polling ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_poller_refreshes_until_disconnect() {
    let fake = FakeDevice::new(bitaxe());
    let device = Device::with_transport(
        fake.clone(),
        config().with_poll_interval(Duration::from_secs(30)),
    );
    let mut versions = device.subscribe();

    device.connect().await.unwrap();
    assert_eq!(*versions.borrow_and_update(), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(fake.gets(), 2);
    assert!(versions.has_changed().unwrap());

    // A failed tick is logged, not fatal.
    fake.fail_gets(true);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fake.gets(), 3);
    fake.fail_gets(false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fake.gets(), 4);
    assert_eq!(device.snapshot().unwrap().version(), 3);

    device.disconnect().await;
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(fake.gets(), 4);
    assert_eq!(
        *device.connection_state().borrow(),
        axectl_core::ConnectionState::Disconnected
    );
}

// ── Readings ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_readings_cover_catalog() {
    let fake = FakeDevice::new(bitaxe());
    let device = connected(&fake).await;

    let readings = device.readings();
    assert_eq!(readings.len(), device.registry().len());

    let by_key = |key: &str| {
        readings
            .iter()
            .find(|r| r.descriptor.key == key)
            .unwrap()
            .value
            .clone()
    };
    assert_eq!(by_key("best_diff"), Some("2.50 G".into()));
    assert_eq!(by_key("uptime"), Some("1d 1h 1m 1s".into()));
    assert_eq!(by_key("display_sleep"), Some("Always on".into()));
    assert_eq!(by_key("auto_fan_speed"), Some(DisplayValue::Bool(true)));
    assert_eq!(by_key("vr_temp"), None);
}

fn json_map(value: Value) -> Map<String, Value> {
    let Value::Object(map) = value else {
        panic!("expected an object");
    };
    map
}
