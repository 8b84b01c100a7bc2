// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-session event loop.
//!
//! Owns the sink, the device workers and the batch buffer. Workers
//! produce canonical points into a bounded channel whose sole consumer
//! is this loop; flushes are therefore strictly serialized and a slow
//! sink pushes back on the workers.

use crate::worker::{DeviceWorker, SharedHealth, WorkerParams};
use acqd_adapters::Adapter;
use acqd_core::{CanonicalPoint, Clock, EngineConfig, SessionId, SessionStatus, Task};
use acqd_sink::Sink;
use acqd_store::SessionStore;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Inputs for one session run.
pub struct SessionParams<St: SessionStore, C: Clock> {
    pub session_id: SessionId,
    pub task: Arc<Task>,
    /// Adapters keyed by device code, usually still connected from
    /// startup validation.
    pub adapters: HashMap<String, Box<dyn Adapter>>,
    pub store: Arc<St>,
    pub sink: Box<dyn Sink>,
    pub config: EngineConfig,
    pub clock: C,
    pub cancel: watch::Receiver<bool>,
}

#[derive(Default)]
struct Counters {
    points_read: u64,
    points_written: u64,
    dropped_records: u64,
    sink_errors: u64,
    last_read_ns: Option<i64>,
}

pub struct SessionEngine;

impl SessionEngine {
    /// Run a session to completion.
    ///
    /// Every exit path flushes the remaining buffer once, disconnects
    /// all workers and the sink, and writes the terminal session
    /// record.
    pub async fn run<St: SessionStore, C: Clock>(params: SessionParams<St, C>) {
        let SessionParams {
            session_id,
            task,
            mut adapters,
            store,
            mut sink,
            config,
            clock,
            mut cancel,
        } = params;

        let poll_interval = if task.poll_interval_s > 0.0 {
            task.poll_interval()
        } else {
            Duration::from_secs_f64(config.poll_interval_s)
        };

        let (tx, mut rx) = mpsc::channel::<CanonicalPoint>(config.buffer_cap());
        let health: SharedHealth = Arc::new(Mutex::new(HashMap::new()));
        let read_errors = Arc::new(AtomicU64::new(0));

        let mut workers = Vec::new();
        for task_device in &task.devices {
            let adapter = match adapters.remove(&task_device.device.code) {
                Some(adapter) => adapter,
                None => {
                    tracing::warn!(device = %task_device.device.code, "no adapter for device, skipping");
                    continue;
                }
            };
            let worker = DeviceWorker::new(WorkerParams {
                device: task_device.device.clone(),
                points: task_device.points.clone(),
                adapter,
                health: Arc::clone(&health),
                tx: tx.clone(),
                cancel: cancel.clone(),
                config: config.clone(),
                poll_interval,
                clock: clock.clone(),
                read_errors: Arc::clone(&read_errors),
            });
            workers.push(tokio::spawn(worker.run()));
        }
        // The engine keeps its sender so the loop stays alive even when
        // every worker has gone terminal; only cancellation ends it.
        let _keepalive = tx;

        tracing::info!(session = %session_id, task = %task.code, workers = workers.len(), "session loop started");

        let mut buffer: VecDeque<CanonicalPoint> = VecDeque::new();
        let mut counters = Counters::default();
        let mut last_flush = tokio::time::Instant::now();
        let mut snapshots = tokio::time::interval(Duration::from_secs(1));
        snapshots.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let flush_at = last_flush + config.batch_timeout();
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!(session = %session_id, "cancellation received");
                        break;
                    }
                }
                maybe_point = rx.recv() => {
                    if let Some(point) = maybe_point {
                        counters.points_read += 1;
                        counters.last_read_ns = Some(clock.now_ns());
                        buffer.push_back(point);
                        while buffer.len() > config.buffer_cap() {
                            buffer.pop_front();
                            counters.dropped_records += 1;
                        }
                        if buffer.len() >= config.batch_size {
                            flush(&mut sink, &mut buffer, &mut counters, session_id).await;
                            last_flush = tokio::time::Instant::now();
                        }
                    }
                }
                _ = tokio::time::sleep_until(flush_at) => {
                    if !buffer.is_empty() {
                        flush(&mut sink, &mut buffer, &mut counters, session_id).await;
                    }
                    last_flush = tokio::time::Instant::now();
                }
                _ = snapshots.tick() => {
                    snapshot(&store, session_id, &health, &counters, &read_errors, &clock).await;
                }
            }
        }

        // Teardown: workers first (they finish their in-flight call and
        // release their adapters), then the remaining buffer, then the
        // sink.
        let mut failure: Option<String> = None;
        let join_deadline = config.transport_timeout() + poll_interval + Duration::from_secs(1);
        for handle in workers {
            match tokio::time::timeout(join_deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(join_error)) => {
                    tracing::error!(session = %session_id, error = %join_error, "worker ended abnormally");
                    failure = Some(format!("worker ended abnormally: {}", join_error));
                }
                Err(_) => {
                    tracing::error!(session = %session_id, "worker did not stop within its deadline");
                    failure = Some("worker did not stop within its deadline".to_string());
                }
            }
        }

        while let Ok(point) = rx.try_recv() {
            buffer.push_back(point);
            counters.points_read += 1;
            while buffer.len() > config.buffer_cap() {
                buffer.pop_front();
                counters.dropped_records += 1;
            }
        }
        if !buffer.is_empty() {
            flush(&mut sink, &mut buffer, &mut counters, session_id).await;
        }
        sink.disconnect().await;

        snapshot(&store, session_id, &health, &counters, &read_errors, &clock).await;

        let (status, error_message) = match failure {
            Some(message) => (SessionStatus::Error, Some(message)),
            None => (SessionStatus::Stopped, None),
        };
        if let Err(e) = store.finish(session_id, status, error_message).await {
            tracing::error!(session = %session_id, error = %e, "failed to finalize session record");
        }
        tracing::info!(
            session = %session_id,
            points_written = counters.points_written,
            dropped = counters.dropped_records,
            "session loop ended"
        );
    }
}

/// One serialized sink write. Success clears the buffer; failure keeps
/// it for the next cycle.
async fn flush(
    sink: &mut Box<dyn Sink>,
    buffer: &mut VecDeque<CanonicalPoint>,
    counters: &mut Counters,
    session_id: SessionId,
) {
    buffer.make_contiguous();
    let (batch, _) = buffer.as_slices();
    match sink.write(batch).await {
        Ok(()) => {
            counters.points_written += batch.len() as u64;
            tracing::debug!(session = %session_id, points = batch.len(), "batch flushed");
            buffer.clear();
        }
        Err(e) => {
            counters.sink_errors += 1;
            tracing::error!(
                session = %session_id,
                points = batch.len(),
                error = %e,
                "sink write failed, batch retained"
            );
        }
    }
}

/// Best-effort health and counter snapshot into the session record.
async fn snapshot<St: SessionStore, C: Clock>(
    store: &Arc<St>,
    session_id: SessionId,
    health: &SharedHealth,
    counters: &Counters,
    read_errors: &Arc<AtomicU64>,
    clock: &C,
) {
    let device_health: serde_json::Map<String, serde_json::Value> = health
        .lock()
        .iter()
        .map(|(code, entry)| {
            (
                code.clone(),
                serde_json::json!({
                    "status": entry.status,
                    "consecutive_failures": entry.consecutive_failures,
                    "last_success_ns": entry.last_success_ns,
                }),
            )
        })
        .collect();

    let mut entries = serde_json::Map::new();
    entries.insert("device_health".into(), device_health.into());
    entries.insert("points_read".into(), counters.points_read.into());
    entries.insert("points_written".into(), counters.points_written.into());
    entries.insert(
        "error_count".into(),
        (read_errors.load(Ordering::Relaxed) + counters.sink_errors).into(),
    );
    entries.insert("dropped_records".into(), counters.dropped_records.into());
    entries.insert("sink_errors".into(), counters.sink_errors.into());
    if let Some(last_read_ns) = counters.last_read_ns {
        entries.insert("last_read_time".into(), last_read_ns.into());
    }
    entries.insert("last_health_update".into(), clock.now_ns().into());

    if let Err(e) = store.merge_metadata(session_id, entries).await {
        tracing::warn!(session = %session_id, error = %e, "health snapshot failed");
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
