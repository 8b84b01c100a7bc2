// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use acqd_adapters::FakeAdapter;
use acqd_core::test_support::{holding_point, mc_device, modbus_device, multi_device_task, task};
use acqd_core::{FakeClock, Reading, Value};
use acqd_sink::FakeSink;
use acqd_store::{MemorySessionStore, SessionRecord, SessionStore as _};

const TS: i64 = 1_700_000_000_000_000_000;

/// Supervisor over fakes: one FakeAdapter per device code, one shared
/// FakeSink.
fn build_supervisor(
    tasks: Vec<Task>,
    adapters: HashMap<String, FakeAdapter>,
    sink: FakeSink,
) -> (Supervisor<MemorySessionStore, FakeClock>, MemorySessionStore) {
    let store = MemorySessionStore::new();
    let mut builder = Supervisor::builder(
        Arc::new(store.clone()),
        fast_config(),
        FakeClock::new(),
    );
    for task in tasks {
        builder = builder.task(task);
    }
    let supervisor = builder
        .adapter_factory(move |device: &Device| {
            adapters
                .get(&device.code)
                .cloned()
                .map(|fake| Box::new(fake) as Box<dyn Adapter>)
                .ok_or_else(|| AdapterError::Config(format!("no fake for {}", device.code)))
        })
        .sink_factory(move || Box::new(sink.clone()))
        .build()
        .unwrap();
    (supervisor, store)
}

fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.batch_size = 2;
    config.batch_timeout_s = 0.05;
    config
}

fn fast_task(code: &str, device_code: &str) -> Task {
    let mut t = task(code, modbus_device(device_code), vec![holding_point("p1", 40001)]);
    t.poll_interval_s = 0.02;
    t
}

#[tokio::test]
async fn start_validates_and_attaches_the_report() {
    let fake = FakeAdapter::new();
    fake.push_readings(vec![Reading::good("p1", Value::I64(1), TS)]);
    let (supervisor, store) = build_supervisor(
        vec![fast_task("t1", "plc-01")],
        HashMap::from([("plc-01".to_string(), fake.clone())]),
        FakeSink::new(),
    );

    let report = supervisor.start("t1").await.unwrap();
    assert!(report.validation.healthy);
    assert!(!report.handle.is_empty());
    let device = &report.validation.per_device["plc-01"];
    assert!(device.connected);
    assert_eq!(device.total_points, 1);
    assert_eq!(device.successful_points, 1);

    let record = store.get(report.session_id).await.unwrap();
    assert_eq!(record.status, SessionStatus::Running);
    let validation = record.metadata.get("startup_validation").unwrap();
    assert_eq!(validation["healthy"], serde_json::json!(true));

    supervisor.stop(report.session_id).await.unwrap();
    assert!(supervisor.wait(report.session_id).await);
}

#[tokio::test]
async fn start_rejects_when_no_device_connects() {
    let fake = FakeAdapter::new();
    fake.fail_connects(10);
    let (supervisor, store) = build_supervisor(
        vec![fast_task("t1", "plc-01")],
        HashMap::from([("plc-01".to_string(), fake)]),
        FakeSink::new(),
    );

    match supervisor.start("t1").await {
        Err(LifecycleError::NoDeviceConnected(code)) => assert_eq!(code, "t1"),
        other => panic!("expected NoDeviceConnected, got {other:?}"),
    }
    assert!(store.all().is_empty(), "no session record is created");
}

#[tokio::test]
async fn start_with_a_partially_failing_fleet_still_runs() {
    let good = FakeAdapter::new();
    let bad = FakeAdapter::new();
    bad.fail_connects(u32::MAX);

    let mut task = multi_device_task(
        "t1",
        vec![
            (modbus_device("plc-ok"), vec![holding_point("p1", 40001)]),
            (mc_device("plc-down"), vec![holding_point("p2", 40002)]),
        ],
    );
    task.poll_interval_s = 0.02;

    let (supervisor, store) = build_supervisor(
        vec![task],
        HashMap::from([
            ("plc-ok".to_string(), good),
            ("plc-down".to_string(), bad),
        ]),
        FakeSink::new(),
    );

    let report = supervisor.start("t1").await.unwrap();
    assert!(!report.validation.healthy);
    assert!(report.validation.per_device["plc-ok"].connected);
    assert!(!report.validation.per_device["plc-down"].connected);
    assert!(!report.validation.failed_points.is_empty());

    supervisor.stop(report.session_id).await.unwrap();
    supervisor.wait(report.session_id).await;
    let record = store.get(report.session_id).await.unwrap();
    assert_eq!(record.status, SessionStatus::Stopped);
}

#[tokio::test]
async fn second_start_for_the_same_task_is_rejected() {
    let fake = FakeAdapter::new();
    let (supervisor, _store) = build_supervisor(
        vec![fast_task("t1", "plc-01")],
        HashMap::from([("plc-01".to_string(), fake)]),
        FakeSink::new(),
    );

    let first = supervisor.start("t1").await.unwrap();
    match supervisor.start("t1").await {
        Err(LifecycleError::Store(acqd_store::StoreError::AlreadyRunning(_))) => {}
        other => panic!("expected AlreadyRunning, got {other:?}"),
    }

    supervisor.stop(first.session_id).await.unwrap();
    supervisor.wait(first.session_id).await;
}

#[tokio::test]
async fn unknown_task_and_session_are_reported() {
    let (supervisor, _store) =
        build_supervisor(vec![], HashMap::new(), FakeSink::new());

    assert!(matches!(
        supervisor.start("missing").await,
        Err(LifecycleError::TaskNotFound(_))
    ));
    assert!(matches!(
        supervisor.status(SessionId::new(42)).await,
        Err(LifecycleError::Store(acqd_store::StoreError::NotFound(_)))
    ));
}

#[tokio::test]
async fn status_reflects_engine_progress() {
    let fake = FakeAdapter::new();
    let (supervisor, _store) = build_supervisor(
        vec![fast_task("t1", "plc-01")],
        HashMap::from([("plc-01".to_string(), fake)]),
        FakeSink::new(),
    );

    let report = supervisor.start("t1").await.unwrap();
    supervisor.stop(report.session_id).await.unwrap();
    supervisor.wait(report.session_id).await;

    let status = supervisor.status(report.session_id).await.unwrap();
    assert_eq!(status.status, SessionStatus::Stopped);
    assert!(status.stopped_at.is_some());
    assert_eq!(status.device_health["plc-01"]["status"], "healthy");
}

#[tokio::test]
async fn test_connection_probes_without_a_session() {
    let fake = FakeAdapter::new();
    let (supervisor, store) = build_supervisor(
        vec![],
        HashMap::from([("plc-01".to_string(), fake.clone())]),
        FakeSink::new(),
    );

    let device = modbus_device("plc-01");
    let report = supervisor.test_connection("modbus", &device).await;
    assert!(report.connected);
    assert!(report.healthy);
    assert_eq!(report.error, None);
    assert!(!fake.is_connected(), "probe must disconnect afterwards");
    assert!(store.all().is_empty());

    let report = supervisor.test_connection("opcua", &device).await;
    assert!(!report.connected);
    assert!(report.error.unwrap().contains("opcua"));
}

#[tokio::test]
async fn recover_revokes_deletes_and_restarts() {
    let fake = FakeAdapter::new();
    let (supervisor, store) = build_supervisor(
        vec![fast_task("t1", "plc-01")],
        HashMap::from([("plc-01".to_string(), fake)]),
        FakeSink::new(),
    );

    // A stale running record from a previous process.
    store.insert(SessionRecord {
        id: SessionId::new(7),
        task_code: "t1".into(),
        status: SessionStatus::Running,
        handle: "dead-handle".into(),
        started_at: chrono::Utc::now(),
        stopped_at: None,
        error_message: None,
        metadata: serde_json::Map::new(),
    });

    let restarted = supervisor.recover().await.unwrap();
    assert_eq!(restarted.len(), 1);
    let new_id = restarted[0];
    assert!(new_id > SessionId::new(7), "fresh session, never resumed");
    assert!(matches!(
        store.get(SessionId::new(7)).await,
        Err(acqd_store::StoreError::NotFound(_))
    ));
    assert_eq!(
        store.get(new_id).await.unwrap().status,
        SessionStatus::Running
    );

    supervisor.stop(new_id).await.unwrap();
    supervisor.wait(new_id).await;
}

#[tokio::test]
async fn shutdown_stops_every_live_session() {
    let fake_a = FakeAdapter::new();
    let fake_b = FakeAdapter::new();
    let (supervisor, store) = build_supervisor(
        vec![fast_task("t1", "plc-01"), fast_task("t2", "plc-02")],
        HashMap::from([
            ("plc-01".to_string(), fake_a),
            ("plc-02".to_string(), fake_b),
        ]),
        FakeSink::new(),
    );

    let a = supervisor.start("t1").await.unwrap();
    let b = supervisor.start("t2").await.unwrap();
    supervisor.shutdown(Duration::from_secs(5)).await;

    for id in [a.session_id, b.session_id] {
        let record = store.get(id).await.unwrap();
        assert_eq!(record.status, SessionStatus::Stopped);
        assert!(record.stopped_at.is_some());
    }
}
