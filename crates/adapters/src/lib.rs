// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Protocol adapters for field devices.
//!
//! Every protocol conforms to the same contract: `connect` is idempotent,
//! `read_points` can be called repeatedly on a live connection and returns
//! one reading per input point (per-point failures become `quality=bad`
//! readings, never missing entries), `health` never fails, `disconnect`
//! is idempotent and infallible.

pub mod grouper;
pub mod mc;
pub mod modbus;
pub mod mqtt;
pub mod registry;
pub mod traced;

pub use mc::McAdapter;
pub use modbus::ModbusAdapter;
pub use mqtt::MqttAdapter;
pub use registry::AdapterRegistry;
pub use traced::TracedAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{AdapterCall, FakeAdapter, FakeAdapterHandle};

use acqd_core::{Point, Reading};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport could not be established (network, auth, handshake).
    #[error("connection failed: {0}")]
    Connection(String),
    /// The entire read call failed; per-point failures are reported as
    /// bad-quality readings instead.
    #[error("read failed: {0}")]
    Read(String),
    /// The device configuration cannot produce an adapter.
    #[error("invalid device config: {0}")]
    Config(String),
}

/// Protocol driver for one device.
#[async_trait]
pub trait Adapter: Send + std::fmt::Debug {
    /// Establish the transport. Idempotent when already connected.
    async fn connect(&mut self) -> Result<(), AdapterError>;

    /// Read the given points. Must be callable repeatedly without
    /// reconnecting; each returned reading carries the exact `code` of
    /// one input point.
    async fn read_points(&mut self, points: &[Point]) -> Result<Vec<Reading>, AdapterError>;

    /// Liveness probe; returns false on any failure.
    async fn health(&mut self) -> bool;

    /// Release the transport. Idempotent, never fails.
    async fn disconnect(&mut self);
}

#[async_trait]
impl<A: Adapter + ?Sized> Adapter for Box<A> {
    async fn connect(&mut self) -> Result<(), AdapterError> {
        (**self).connect().await
    }

    async fn read_points(&mut self, points: &[Point]) -> Result<Vec<Reading>, AdapterError> {
        (**self).read_points(points).await
    }

    async fn health(&mut self) -> bool {
        (**self).health().await
    }

    async fn disconnect(&mut self) {
        (**self).disconnect().await
    }
}
