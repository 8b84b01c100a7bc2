// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Time-series sink.
//!
//! Converts canonical points to line protocol and writes them to the
//! configured store. `write` is atomic per batch from the caller's
//! view: it either wrote the whole batch or returned an error, and the
//! caller retains the batch for the next cycle on failure.

pub mod influx;
pub mod line;

pub use influx::InfluxSink;
pub use line::{encode_batch, LineEncoder};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSink, SinkCall};

use acqd_core::CanonicalPoint;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from sink operations.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink connection failed: {0}")]
    Connection(String),
    #[error("sink write failed: {0}")]
    Write(String),
    /// Field-type conflict within the session.
    #[error("field type conflict: {0}")]
    Schema(String),
}

/// Line-protocol time-series writer.
#[async_trait]
pub trait Sink: Send {
    async fn connect(&mut self) -> Result<(), SinkError>;

    /// Write one batch atomically. An empty batch is a no-op success.
    async fn write(&mut self, batch: &[CanonicalPoint]) -> Result<(), SinkError>;

    /// Liveness probe; returns false on any failure.
    async fn health(&mut self) -> bool;

    /// Release the connection. Idempotent, never fails.
    async fn disconnect(&mut self);
}

#[async_trait]
impl<S: Sink + ?Sized> Sink for Box<S> {
    async fn connect(&mut self) -> Result<(), SinkError> {
        (**self).connect().await
    }

    async fn write(&mut self, batch: &[CanonicalPoint]) -> Result<(), SinkError> {
        (**self).write(batch).await
    }

    async fn health(&mut self) -> bool {
        (**self).health().await
    }

    async fn disconnect(&mut self) {
        (**self).disconnect().await
    }
}
