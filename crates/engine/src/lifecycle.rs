// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor-facing lifecycle surface.
//!
//! `start` validates every device, creates the session record and hands
//! off to the engine loop; `stop` signals cancellation and returns
//! immediately; `status` reads the record; `test_connection` is a
//! one-shot probe; `recover` revokes and restarts sessions left
//! `running` by a previous process.

use crate::error::LifecycleError;
use crate::session::{SessionEngine, SessionParams};
use acqd_adapters::{Adapter, AdapterError, AdapterRegistry, TracedAdapter};
use acqd_core::{
    Clock, Device, EngineConfig, Protocol, SessionId, SessionStatus, SinkConfig, Task,
};
use acqd_sink::{InfluxSink, Sink};
use acqd_store::SessionStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Hard deadline on startup validation.
const VALIDATION_DEADLINE: Duration = Duration::from_secs(5);
/// Sample size for failed points attached to the session record.
const FAILED_POINT_SAMPLE: usize = 20;

type AdapterFactory = Box<dyn Fn(&Device) -> Result<Box<dyn Adapter>, AdapterError> + Send + Sync>;
type SinkFactory = Box<dyn Fn() -> Box<dyn Sink> + Send + Sync>;

/// Per-device startup validation entry.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceValidation {
    pub status: String,
    pub connected: bool,
    pub total_points: usize,
    pub successful_points: usize,
}

/// One failed point (or whole device) during validation.
#[derive(Debug, Clone, Serialize)]
pub struct FailedPoint {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point: Option<String>,
    pub error: String,
}

/// The `startup_validation` report attached to new sessions.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub healthy: bool,
    pub per_device: BTreeMap<String, DeviceValidation>,
    pub failed_points: Vec<FailedPoint>,
}

/// Returned by `start`.
#[derive(Debug, Clone)]
pub struct StartReport {
    pub session_id: SessionId,
    /// Run handle identifying the engine task (revoked on recovery).
    pub handle: String,
    pub validation: ValidationReport,
}

/// Returned by `status`.
#[derive(Debug, Clone)]
pub struct SessionStatusReport {
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub points_read: u64,
    pub last_read_time: Option<i64>,
    pub error_count: u64,
    pub error_message: Option<String>,
    pub device_health: serde_json::Value,
}

/// Returned by `test_connection`.
#[derive(Debug, Clone)]
pub struct ConnectionTestReport {
    pub connected: bool,
    pub healthy: bool,
    pub error: Option<String>,
}

struct LiveSession {
    cancel: watch::Sender<bool>,
    engine: JoinHandle<()>,
}

/// Builder for [`Supervisor`].
pub struct SupervisorBuilder<St: SessionStore, C: Clock> {
    tasks: HashMap<String, Arc<Task>>,
    store: Arc<St>,
    config: EngineConfig,
    clock: C,
    adapter_factory: Option<AdapterFactory>,
    sink_factory: Option<SinkFactory>,
}

impl<St: SessionStore, C: Clock> SupervisorBuilder<St, C> {
    pub fn new(store: Arc<St>, config: EngineConfig, clock: C) -> Self {
        Self {
            tasks: HashMap::new(),
            store,
            config,
            clock,
            adapter_factory: None,
            sink_factory: None,
        }
    }

    pub fn task(mut self, task: Task) -> Self {
        self.tasks.insert(task.code.clone(), Arc::new(task));
        self
    }

    /// Write to an InfluxDB endpoint (the default sink).
    pub fn sink_config(mut self, sink: SinkConfig) -> Self {
        self.sink_factory = Some(Box::new(move || Box::new(InfluxSink::new(sink.clone()))));
        self
    }

    /// Custom sink source, one per session.
    pub fn sink_factory(
        mut self,
        factory: impl Fn() -> Box<dyn Sink> + Send + Sync + 'static,
    ) -> Self {
        self.sink_factory = Some(Box::new(factory));
        self
    }

    /// Custom adapter source (tests inject fakes here).
    pub fn adapter_factory(
        mut self,
        factory: impl Fn(&Device) -> Result<Box<dyn Adapter>, AdapterError> + Send + Sync + 'static,
    ) -> Self {
        self.adapter_factory = Some(Box::new(factory));
        self
    }

    pub fn build(self) -> Result<Supervisor<St, C>, LifecycleError> {
        self.config.validate()?;
        let transport_timeout = self.config.transport_timeout();
        let adapter_factory = self.adapter_factory.unwrap_or_else(|| {
            Box::new(move |device: &Device| {
                let inner = AdapterRegistry::global().create(device, transport_timeout)?;
                Ok(Box::new(TracedAdapter::new(device.code.clone(), inner)) as Box<dyn Adapter>)
            })
        });
        let sink_factory = self
            .sink_factory
            .ok_or_else(|| LifecycleError::Config(acqd_core::ConfigError::Invalid {
                field: "sink",
                reason: "no sink configured".into(),
            }))?;
        Ok(Supervisor {
            tasks: self.tasks,
            store: self.store,
            config: self.config,
            clock: self.clock,
            adapter_factory,
            sink_factory,
            live: Mutex::new(HashMap::new()),
        })
    }
}

/// Owns the task catalog and the live engine handles.
pub struct Supervisor<St: SessionStore, C: Clock> {
    tasks: HashMap<String, Arc<Task>>,
    store: Arc<St>,
    config: EngineConfig,
    clock: C,
    adapter_factory: AdapterFactory,
    sink_factory: SinkFactory,
    live: Mutex<HashMap<SessionId, LiveSession>>,
}

impl<St: SessionStore, C: Clock> Supervisor<St, C> {
    pub fn builder(store: Arc<St>, config: EngineConfig, clock: C) -> SupervisorBuilder<St, C> {
        SupervisorBuilder::new(store, config, clock)
    }

    pub fn task_codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.tasks.keys().cloned().collect();
        codes.sort();
        codes
    }

    /// Start a session for a task.
    pub async fn start(&self, task_code: &str) -> Result<StartReport, LifecycleError> {
        let task = self
            .tasks
            .get(task_code)
            .cloned()
            .ok_or_else(|| LifecycleError::TaskNotFound(task_code.to_string()))?;
        self.prune_finished();

        let validation = tokio::time::timeout(
            VALIDATION_DEADLINE,
            validate_task(&task, &self.adapter_factory, self.config.transport_timeout()),
        )
        .await;
        let (report, mut adapters) = match validation {
            Ok(result) => result,
            Err(_) => {
                return Err(LifecycleError::ValidationTimeout(task_code.to_string()));
            }
        };

        if !report.per_device.values().any(|d| d.connected) {
            release_adapters(&mut adapters).await;
            return Err(LifecycleError::NoDeviceConnected(task_code.to_string()));
        }

        let handle = uuid::Uuid::new_v4().to_string();
        let record = match self.store.create(task_code, &handle).await {
            Ok(record) => record,
            Err(e) => {
                release_adapters(&mut adapters).await;
                return Err(e.into());
            }
        };

        let mut metadata = serde_json::Map::new();
        metadata.insert(
            "startup_validation".into(),
            serde_json::to_value(&report).unwrap_or_default(),
        );
        if let Err(e) = self.store.merge_metadata(record.id, metadata).await {
            tracing::warn!(session = %record.id, error = %e, "failed to attach validation report");
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let engine = tokio::spawn(SessionEngine::run(SessionParams {
            session_id: record.id,
            task,
            adapters,
            store: Arc::clone(&self.store),
            sink: (self.sink_factory)(),
            config: self.config.clone(),
            clock: self.clock.clone(),
            cancel: cancel_rx,
        }));
        self.live.lock().insert(
            record.id,
            LiveSession {
                cancel: cancel_tx,
                engine,
            },
        );

        tracing::info!(
            session = %record.id,
            task = task_code,
            healthy = report.healthy,
            "session started"
        );
        Ok(StartReport {
            session_id: record.id,
            handle,
            validation: report,
        })
    }

    /// Signal cancellation; returns immediately.
    pub async fn stop(&self, id: SessionId) -> Result<(), LifecycleError> {
        if let Some(live) = self.live.lock().get(&id) {
            let _ = live.cancel.send(true);
            tracing::info!(session = %id, "stop signalled");
            return Ok(());
        }
        // Not one of ours: an orphaned record can still be closed out.
        let record = self.store.get(id).await?;
        if record.status == SessionStatus::Running {
            self.store.finish(id, SessionStatus::Stopped, None).await?;
            tracing::warn!(session = %id, "orphaned running record closed");
        }
        Ok(())
    }

    /// Read the session record into a status report.
    pub async fn status(&self, id: SessionId) -> Result<SessionStatusReport, LifecycleError> {
        let record = self.store.get(id).await?;
        let meta = |key: &str| record.metadata.get(key).cloned();
        Ok(SessionStatusReport {
            status: record.status,
            started_at: record.started_at,
            stopped_at: record.stopped_at,
            points_read: meta("points_read").and_then(|v| v.as_u64()).unwrap_or(0),
            last_read_time: meta("last_read_time").and_then(|v| v.as_i64()),
            error_count: meta("error_count").and_then(|v| v.as_u64()).unwrap_or(0),
            error_message: record.error_message.clone(),
            device_health: meta("device_health").unwrap_or(serde_json::Value::Null),
        })
    }

    /// One-shot adapter probe; no session record is created.
    pub async fn test_connection(&self, protocol: &str, device: &Device) -> ConnectionTestReport {
        let parsed = match Protocol::parse(protocol) {
            Some(parsed) => parsed,
            None => {
                return ConnectionTestReport {
                    connected: false,
                    healthy: false,
                    error: Some(format!("unknown protocol '{}'", protocol)),
                }
            }
        };
        let mut probe_device = device.clone();
        probe_device.protocol = parsed;

        let mut adapter = match (self.adapter_factory)(&probe_device) {
            Ok(adapter) => adapter,
            Err(e) => {
                return ConnectionTestReport {
                    connected: false,
                    healthy: false,
                    error: Some(e.to_string()),
                }
            }
        };

        let report = match adapter.connect().await {
            Ok(()) => {
                let healthy = adapter.health().await;
                ConnectionTestReport {
                    connected: true,
                    healthy,
                    error: None,
                }
            }
            Err(e) => ConnectionTestReport {
                connected: false,
                healthy: false,
                error: Some(e.to_string()),
            },
        };
        adapter.disconnect().await;
        report
    }

    /// Restart-recovery: every record still `running` belongs to a dead
    /// process. Revoke its handle, delete it and start a fresh session
    /// for the task; the old record is never resumed in place.
    pub async fn recover(&self) -> Result<Vec<SessionId>, LifecycleError> {
        let stale = self.store.running().await?;
        let mut restarted = Vec::new();

        for record in stale {
            tracing::info!(
                session = %record.id,
                task = %record.task_code,
                handle = %record.handle,
                "revoking stale running session"
            );
            if let Err(e) = self.store.delete(record.id).await {
                tracing::error!(session = %record.id, error = %e, "failed to delete stale record");
                continue;
            }
            if !self.tasks.contains_key(&record.task_code) {
                tracing::warn!(task = %record.task_code, "stale session references unknown task");
                continue;
            }
            match self.start(&record.task_code).await {
                Ok(report) => restarted.push(report.session_id),
                Err(e) => {
                    tracing::error!(task = %record.task_code, error = %e, "recovery restart failed");
                }
            }
        }
        Ok(restarted)
    }

    /// Stop every live session and wait for the engines to finish.
    pub async fn shutdown(&self, deadline: Duration) {
        let live: Vec<(SessionId, LiveSession)> = self.live.lock().drain().collect();
        for (id, session) in &live {
            let _ = session.cancel.send(true);
            tracing::info!(session = %id, "shutdown signalled");
        }
        for (id, session) in live {
            if tokio::time::timeout(deadline, session.engine).await.is_err() {
                tracing::error!(session = %id, "engine did not stop within the shutdown deadline");
            }
        }
    }

    /// Wait until a session's engine task has finished (test helper and
    /// shutdown aid); returns false if it was not live.
    pub async fn wait(&self, id: SessionId) -> bool {
        let handle = {
            let mut live = self.live.lock();
            live.remove(&id)
        };
        match handle {
            Some(session) => {
                let _ = session.engine.await;
                true
            }
            None => false,
        }
    }

    fn prune_finished(&self) {
        self.live.lock().retain(|_, s| !s.engine.is_finished());
    }
}

async fn release_adapters(adapters: &mut HashMap<String, Box<dyn Adapter>>) {
    for (_, adapter) in adapters.iter_mut() {
        adapter.disconnect().await;
    }
    adapters.clear();
}

/// Connect every device and perform one trial read.
///
/// Devices that fail to connect keep their (disconnected) adapter so
/// the session's worker can keep retrying within its reconnect budget.
async fn validate_task(
    task: &Task,
    factory: &AdapterFactory,
    transport_timeout: Duration,
) -> (ValidationReport, HashMap<String, Box<dyn Adapter>>) {
    let mut per_device = BTreeMap::new();
    let mut failed_points = Vec::new();
    let mut adapters: HashMap<String, Box<dyn Adapter>> = HashMap::new();

    for task_device in &task.devices {
        let device = &task_device.device;
        let total_points = task_device.points.len();

        let mut adapter = match factory(device) {
            Ok(adapter) => adapter,
            Err(e) => {
                per_device.insert(
                    device.code.clone(),
                    DeviceValidation {
                        status: "error".into(),
                        connected: false,
                        total_points,
                        successful_points: 0,
                    },
                );
                failed_points.push(FailedPoint {
                    device: device.code.clone(),
                    point: None,
                    error: e.to_string(),
                });
                continue;
            }
        };

        let connect = tokio::time::timeout(transport_timeout, adapter.connect()).await;
        match connect {
            Ok(Ok(())) => {
                let trial =
                    tokio::time::timeout(transport_timeout, adapter.read_points(&task_device.points))
                        .await;
                let entry = match trial {
                    Ok(Ok(readings)) => {
                        let successful = readings.iter().filter(|r| r.is_good()).count();
                        for reading in readings.iter().filter(|r| !r.is_good()) {
                            failed_points.push(FailedPoint {
                                device: device.code.clone(),
                                point: Some(reading.code.clone()),
                                error: reading
                                    .error
                                    .clone()
                                    .unwrap_or_else(|| "bad quality".into()),
                            });
                        }
                        DeviceValidation {
                            status: if successful == total_points {
                                "healthy".into()
                            } else {
                                "partial".into()
                            },
                            connected: true,
                            total_points,
                            successful_points: successful,
                        }
                    }
                    Ok(Err(e)) => {
                        failed_points.push(FailedPoint {
                            device: device.code.clone(),
                            point: None,
                            error: e.to_string(),
                        });
                        DeviceValidation {
                            status: "error".into(),
                            connected: true,
                            total_points,
                            successful_points: 0,
                        }
                    }
                    Err(_) => {
                        failed_points.push(FailedPoint {
                            device: device.code.clone(),
                            point: None,
                            error: format!("trial read timed out after {:?}", transport_timeout),
                        });
                        DeviceValidation {
                            status: "error".into(),
                            connected: true,
                            total_points,
                            successful_points: 0,
                        }
                    }
                };
                per_device.insert(device.code.clone(), entry);
            }
            other => {
                let reason = match other {
                    Ok(Err(e)) => e.to_string(),
                    _ => format!("connect timed out after {:?}", transport_timeout),
                };
                tracing::warn!(device = %device.code, error = %reason, "validation connect failed");
                per_device.insert(
                    device.code.clone(),
                    DeviceValidation {
                        status: "disconnected".into(),
                        connected: false,
                        total_points,
                        successful_points: 0,
                    },
                );
                failed_points.push(FailedPoint {
                    device: device.code.clone(),
                    point: None,
                    error: reason,
                });
            }
        }
        adapters.insert(device.code.clone(), adapter);
    }

    failed_points.truncate(FAILED_POINT_SAMPLE);
    let healthy = per_device.values().all(|d| d.connected) && failed_points.is_empty();
    (
        ValidationReport {
            healthy,
            per_device,
            failed_points,
        },
        adapters,
    )
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
