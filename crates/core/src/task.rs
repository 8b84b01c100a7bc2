// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task definitions: a named set of devices and points.
//!
//! A task is an immutable snapshot for the lifetime of one session; the
//! engine never mutates it and points never migrate between devices.

use crate::device::Device;
use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Schedule selector. Only continuous polling is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    #[default]
    Continuous,
}

/// One device and the points read from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDevice {
    pub device: Device,
    pub points: Vec<Point>,
}

/// A named acquisition job over a set of devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub schedule: Schedule,
    /// Tick cadence in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_s: f64,
    pub devices: Vec<TaskDevice>,
}

fn default_poll_interval() -> f64 {
    1.0
}

impl Task {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval_s.max(0.0))
    }

    pub fn total_points(&self) -> usize {
        self.devices.iter().map(|d| d.points.len()).sum()
    }

    pub fn device(&self, code: &str) -> Option<&TaskDevice> {
        self.devices.iter().find(|d| d.device.code == code)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
