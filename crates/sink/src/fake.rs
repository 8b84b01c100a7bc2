// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch-recording fake sink for tests.

use crate::{Sink, SinkError};
use acqd_core::CanonicalPoint;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded sink operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Connect,
    Write(usize),
    Health,
    Disconnect,
}

#[derive(Default)]
struct Inner {
    calls: Vec<SinkCall>,
    batches: Vec<Vec<CanonicalPoint>>,
    connected: bool,
    write_failures_remaining: u32,
}

/// Shared-state fake implementing the sink contract.
#[derive(Clone, Default)]
pub struct FakeSink {
    inner: Arc<Mutex<Inner>>,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` non-empty writes fail.
    pub fn fail_writes(&self, n: u32) {
        self.inner.lock().write_failures_remaining = n;
    }

    /// Successfully written batches, in write order.
    pub fn batches(&self) -> Vec<Vec<CanonicalPoint>> {
        self.inner.lock().batches.clone()
    }

    /// All successfully written points, flattened.
    pub fn points(&self) -> Vec<CanonicalPoint> {
        self.inner.lock().batches.iter().flatten().cloned().collect()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.inner.lock().calls.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }
}

#[async_trait]
impl Sink for FakeSink {
    async fn connect(&mut self) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SinkCall::Connect);
        inner.connected = true;
        Ok(())
    }

    async fn write(&mut self, batch: &[CanonicalPoint]) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        inner.calls.push(SinkCall::Write(batch.len()));
        if batch.is_empty() {
            return Ok(());
        }
        if inner.write_failures_remaining > 0 {
            inner.write_failures_remaining -= 1;
            return Err(SinkError::Write("scripted write failure".into()));
        }
        inner.batches.push(batch.to_vec());
        Ok(())
    }

    async fn health(&mut self) -> bool {
        let mut inner = self.inner.lock();
        inner.calls.push(SinkCall::Health);
        inner.connected
    }

    async fn disconnect(&mut self) {
        let mut inner = self.inner.lock();
        inner.calls.push(SinkCall::Disconnect);
        inner.connected = false;
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
