// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device read loop.
//!
//! One worker per device in the task. The worker owns its adapter,
//! drives one poll cycle per tick, keeps the shared health entry
//! current, and sends canonical points into the session channel. A
//! worker that overruns a tick skips the missed ticks.

use crate::format::canonicalize;
use acqd_adapters::Adapter;
use acqd_core::{
    CanonicalPoint, Clock, Device, DeviceHealth, DeviceStatus, EngineConfig, Point,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

/// Health map shared between the workers and the session snapshotter.
pub type SharedHealth = Arc<Mutex<HashMap<String, DeviceHealth>>>;

/// Worker states mirror the per-device lifecycle: connect with bounded
/// retries, read while healthy, disconnect on staleness, and stop for
/// good once the reconnect budget is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Connecting,
    Healthy,
    Error,
    Timeout,
    Disconnected,
}

/// Everything a worker needs; the adapter is owned exclusively.
pub struct WorkerParams<C: Clock> {
    pub device: Device,
    pub points: Vec<Point>,
    pub adapter: Box<dyn Adapter>,
    pub health: SharedHealth,
    pub tx: mpsc::Sender<CanonicalPoint>,
    pub cancel: watch::Receiver<bool>,
    pub config: EngineConfig,
    pub poll_interval: Duration,
    pub clock: C,
    /// Read-failure counter shared with the session engine.
    pub read_errors: Arc<AtomicU64>,
}

pub struct DeviceWorker<C: Clock> {
    device: Device,
    points: Vec<Point>,
    adapter: Box<dyn Adapter>,
    health: SharedHealth,
    tx: mpsc::Sender<CanonicalPoint>,
    cancel: watch::Receiver<bool>,
    config: EngineConfig,
    poll_interval: Duration,
    clock: C,
    read_errors: Arc<AtomicU64>,
    state: WorkerState,
}

impl<C: Clock> DeviceWorker<C> {
    pub fn new(params: WorkerParams<C>) -> Self {
        params
            .health
            .lock()
            .insert(params.device.code.clone(), DeviceHealth::connecting());
        Self {
            device: params.device,
            points: params.points,
            adapter: params.adapter,
            health: params.health,
            tx: params.tx,
            cancel: params.cancel,
            config: params.config,
            poll_interval: params.poll_interval,
            clock: params.clock,
            read_errors: params.read_errors,
            state: WorkerState::Connecting,
        }
    }

    /// Drive the worker until cancellation or a terminal state, then
    /// release the adapter. Runs as its own task so a slow device never
    /// stalls the others.
    pub async fn run(mut self) {
        let mut ticks = tokio::time::interval(self.poll_interval.max(Duration::from_millis(10)));
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = self.cancel.changed() => {
                    if changed.is_err() || *self.cancel.borrow() {
                        tracing::debug!(device = %self.device.code, "worker cancelled");
                        break;
                    }
                }
                _ = ticks.tick() => {
                    if !self.tick().await {
                        break;
                    }
                }
            }
        }

        let deadline = self.config.transport_timeout();
        let _ = tokio::time::timeout(deadline, self.adapter.disconnect()).await;
        tracing::info!(device = %self.device.code, "worker stopped");
    }

    /// One tick. Returns false once the worker is done for the session.
    async fn tick(&mut self) -> bool {
        match self.state {
            WorkerState::Connecting => self.try_connect().await,
            WorkerState::Healthy | WorkerState::Error => self.read_cycle().await,
            WorkerState::Timeout => {
                // Staleness already disconnected the adapter; start the
                // reconnect cycle.
                self.state = WorkerState::Connecting;
                self.try_connect().await
            }
            WorkerState::Disconnected => false,
        }
    }

    async fn try_connect(&mut self) -> bool {
        let deadline = self.config.transport_timeout();
        match tokio::time::timeout(deadline, self.adapter.connect()).await {
            Ok(Ok(())) => {
                self.state = WorkerState::Healthy;
                // Seed last_success at connect time so the staleness
                // clock runs even if every subsequent read fails.
                let now_ns = self.clock.now_ns();
                self.update_health(|h| h.record_success(now_ns));
                true
            }
            other => {
                let reason = match other {
                    Ok(Err(e)) => e.to_string(),
                    _ => format!("connect timed out after {:?}", deadline),
                };
                let failures = self.update_health(|h| {
                    h.record_failure();
                    h.consecutive_failures
                });
                tracing::warn!(
                    device = %self.device.code,
                    failures,
                    error = %reason,
                    "connect attempt failed"
                );
                if failures >= self.config.max_reconnect_attempts {
                    self.state = WorkerState::Disconnected;
                    self.update_health(|h| h.status = DeviceStatus::Disconnected);
                    tracing::error!(
                        device = %self.device.code,
                        "reconnect budget exhausted, device disconnected for this session"
                    );
                    return false;
                }
                true
            }
        }
    }

    async fn read_cycle(&mut self) -> bool {
        let deadline = self.config.transport_timeout();
        let result = tokio::time::timeout(deadline, self.adapter.read_points(&self.points)).await;

        match result {
            Ok(Ok(readings)) => {
                let now_ns = self.clock.now_ns();
                self.state = WorkerState::Healthy;
                self.update_health(|h| h.record_success(now_ns));

                for point in canonicalize(&self.device, &self.points, &readings) {
                    // Bounded channel: a slow sink pushes back here. The
                    // send races cancellation so a full channel cannot
                    // wedge shutdown.
                    tokio::select! {
                        sent = self.tx.send(point) => {
                            if sent.is_err() {
                                tracing::debug!(device = %self.device.code, "session channel closed");
                                return false;
                            }
                        }
                        _ = self.cancel.changed() => {
                            tracing::debug!(device = %self.device.code, "cancelled mid-send");
                            return false;
                        }
                    }
                }
                true
            }
            other => {
                let reason = match other {
                    Ok(Err(e)) => e.to_string(),
                    _ => format!("read timed out after {:?}", deadline),
                };
                self.read_errors.fetch_add(1, Ordering::Relaxed);
                let now_ns = self.clock.now_ns();
                let timeout_ns = self.config.connection_timeout_ns();
                let stale = self.update_health(|h| {
                    h.record_failure();
                    h.timed_out(now_ns, timeout_ns)
                });
                tracing::warn!(device = %self.device.code, error = %reason, "read failed");

                if stale {
                    // Entry action of the timeout state: drop the
                    // transport so the next tick reconnects cleanly.
                    self.state = WorkerState::Timeout;
                    self.update_health(|h| h.status = DeviceStatus::Timeout);
                    let _ = tokio::time::timeout(deadline, self.adapter.disconnect()).await;
                    tracing::warn!(device = %self.device.code, "device timed out, reconnecting");
                } else {
                    self.state = WorkerState::Error;
                }
                true
            }
        }
    }

    fn update_health<T>(&self, f: impl FnOnce(&mut DeviceHealth) -> T) -> T {
        let mut map = self.health.lock();
        let entry = map
            .entry(self.device.code.clone())
            .or_insert_with(DeviceHealth::connecting);
        f(entry)
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
