// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable fake adapter for tests.
//!
//! Clones share state, so tests keep a handle while the engine owns the
//! adapter.

use crate::{Adapter, AdapterError};
use acqd_core::{Point, Reading, Value};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Recorded adapter operations.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCall {
    Connect,
    ReadPoints(Vec<String>),
    Health,
    Disconnect,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<AdapterCall>,
    connected: bool,
    connect_failures_remaining: u32,
    read_errors_remaining: u32,
    scripted: VecDeque<Vec<Reading>>,
    values: HashMap<String, Value>,
    timestamp_ns: i64,
}

/// Shared-state fake implementing the adapter contract.
#[derive(Debug, Clone, Default)]
pub struct FakeAdapter {
    inner: Arc<Mutex<Inner>>,
}

/// Alias kept for readability at call sites that hold the test's copy.
pub type FakeAdapterHandle = FakeAdapter;

impl FakeAdapter {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.inner.lock().timestamp_ns = 1_700_000_000_000_000_000;
        fake
    }

    /// Make the next `n` connect attempts fail.
    pub fn fail_connects(&self, n: u32) {
        self.inner.lock().connect_failures_remaining = n;
    }

    /// Make the next `n` read calls fail wholesale.
    pub fn fail_reads(&self, n: u32) {
        self.inner.lock().read_errors_remaining = n;
    }

    /// Queue an exact response for one read call.
    pub fn push_readings(&self, readings: Vec<Reading>) {
        self.inner.lock().scripted.push_back(readings);
    }

    /// Default value served for a point code when no response is queued.
    pub fn set_value(&self, code: &str, value: Value) {
        self.inner.lock().values.insert(code.to_string(), value);
    }

    /// Timestamp stamped onto default readings.
    pub fn set_timestamp_ns(&self, timestamp_ns: i64) {
        self.inner.lock().timestamp_ns = timestamp_ns;
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.inner.lock().calls.clone()
    }

    pub fn read_count(&self) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, AdapterCall::ReadPoints(_)))
            .count()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }
}

#[async_trait]
impl Adapter for FakeAdapter {
    async fn connect(&mut self) -> Result<(), AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(AdapterCall::Connect);
        if inner.connect_failures_remaining > 0 {
            inner.connect_failures_remaining -= 1;
            return Err(AdapterError::Connection("scripted connect failure".into()));
        }
        inner.connected = true;
        Ok(())
    }

    async fn read_points(&mut self, points: &[Point]) -> Result<Vec<Reading>, AdapterError> {
        let mut inner = self.inner.lock();
        inner.calls.push(AdapterCall::ReadPoints(
            points.iter().map(|p| p.code.clone()).collect(),
        ));
        if !inner.connected {
            return Err(AdapterError::Read("not connected".into()));
        }
        if inner.read_errors_remaining > 0 {
            inner.read_errors_remaining -= 1;
            return Err(AdapterError::Read("scripted read failure".into()));
        }
        if let Some(scripted) = inner.scripted.pop_front() {
            return Ok(scripted);
        }
        let timestamp_ns = inner.timestamp_ns;
        Ok(points
            .iter()
            .map(|point| {
                let value = inner
                    .values
                    .get(&point.code)
                    .cloned()
                    .unwrap_or(Value::I64(0));
                Reading::good(&point.code, value, timestamp_ns)
            })
            .collect())
    }

    async fn health(&mut self) -> bool {
        let mut inner = self.inner.lock();
        inner.calls.push(AdapterCall::Health);
        inner.connected
    }

    async fn disconnect(&mut self) {
        let mut inner = self.inner.lock();
        inner.calls.push(AdapterCall::Disconnect);
        inner.connected = false;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
