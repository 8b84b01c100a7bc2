// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device runtime health.
//!
//! Health entries are created at session start, updated by the device
//! workers, periodically snapshotted into the session record, and
//! discarded when the session ends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime status of a device within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Healthy,
    Error,
    Timeout,
    /// Terminal for the session: reconnect budget exhausted.
    Disconnected,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Healthy => write!(f, "healthy"),
            DeviceStatus::Error => write!(f, "error"),
            DeviceStatus::Timeout => write!(f, "timeout"),
            DeviceStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceHealth {
    pub status: DeviceStatus,
    /// Engine clock at the last successful read, nanoseconds since epoch.
    pub last_success_ns: Option<i64>,
    pub consecutive_failures: u32,
}

impl DeviceHealth {
    /// Fresh entry for a device that has not connected yet.
    pub fn connecting() -> Self {
        Self {
            status: DeviceStatus::Error,
            last_success_ns: None,
            consecutive_failures: 0,
        }
    }

    pub fn record_success(&mut self, now_ns: i64) {
        self.status = DeviceStatus::Healthy;
        self.last_success_ns = Some(now_ns);
        self.consecutive_failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.status != DeviceStatus::Disconnected {
            self.status = DeviceStatus::Error;
        }
    }

    /// Staleness check against the connection timeout.
    pub fn timed_out(&self, now_ns: i64, connection_timeout_ns: i64) -> bool {
        match self.last_success_ns {
            Some(last) => now_ns.saturating_sub(last) > connection_timeout_ns,
            None => false,
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
