// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrapper for consistent observability

use crate::{Adapter, AdapterError};
use acqd_core::{Point, Reading};
use async_trait::async_trait;
use tracing::Instrument;

/// Wrapper that adds tracing to any Adapter
#[derive(Debug)]
pub struct TracedAdapter<A> {
    device: String,
    inner: A,
}

impl<A> TracedAdapter<A> {
    pub fn new(device: impl Into<String>, inner: A) -> Self {
        Self {
            device: device.into(),
            inner,
        }
    }
}

#[async_trait]
impl<A: Adapter> Adapter for TracedAdapter<A> {
    async fn connect(&mut self) -> Result<(), AdapterError> {
        let span = tracing::info_span!("adapter.connect", device = %self.device);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.connect().await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "connected"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "connect failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn read_points(&mut self, points: &[Point]) -> Result<Vec<Reading>, AdapterError> {
        let span = tracing::info_span!("adapter.read", device = %self.device, points = points.len());
        async {
            let start = std::time::Instant::now();
            let result = self.inner.read_points(points).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(readings) => {
                    let bad = readings.iter().filter(|r| !r.is_good()).count();
                    tracing::debug!(elapsed_ms, readings = readings.len(), bad, "read complete");
                }
                Err(e) => tracing::error!(elapsed_ms, error = %e, "read failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn health(&mut self) -> bool {
        let healthy = self.inner.health().await;
        tracing::trace!(device = %self.device, healthy, "health checked");
        healthy
    }

    async fn disconnect(&mut self) {
        self.inner.disconnect().await;
        tracing::info_span!("adapter.disconnect", device = %self.device)
            .in_scope(|| tracing::info!("disconnected"));
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
