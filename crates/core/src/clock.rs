// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction.
//!
//! All reading and sink timestamps come from the engine's wall clock,
//! never from device clocks. Tests substitute a [`FakeClock`].

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of engine time, nanoseconds since the Unix epoch.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now_ns(&self) -> i64;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ns(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0)
    }
}

/// Manually-advanced clock for tests.
#[derive(Debug, Clone)]
pub struct FakeClock {
    now_ns: Arc<Mutex<i64>>,
}

impl FakeClock {
    /// Starts at 2023-11-14T22:13:20Z, comfortably inside the sink's
    /// timestamp sanity window.
    pub fn new() -> Self {
        Self::at(1_700_000_000_000_000_000)
    }

    pub fn at(now_ns: i64) -> Self {
        Self {
            now_ns: Arc::new(Mutex::new(now_ns)),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now_ns.lock() += by.as_nanos() as i64;
    }

    pub fn set(&self, now_ns: i64) {
        *self.now_ns.lock() = now_ns;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_ns(&self) -> i64 {
        *self.now_ns.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
