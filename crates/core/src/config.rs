// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine and sink configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration problems are fatal at validation time; they never
/// reach the acquisition loop.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Tunables of the acquisition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Buffer length that triggers a flush.
    pub batch_size: usize,
    /// Time since the last flush that triggers a flush.
    pub batch_timeout_s: f64,
    /// `last_success` staleness that marks a device `timeout`.
    pub connection_timeout_s: f64,
    /// Consecutive failures after which a device becomes `disconnected`.
    pub max_reconnect_attempts: u32,
    /// Tick cadence fallback when the task does not set one.
    pub poll_interval_s: f64,
    /// Per-call transport deadline for adapter operations.
    pub transport_timeout_s: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            batch_timeout_s: 5.0,
            connection_timeout_s: 30.0,
            max_reconnect_attempts: 3,
            poll_interval_s: 1.0,
            transport_timeout_s: 10.0,
        }
    }
}

impl EngineConfig {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.batch_timeout_s.max(0.0))
    }

    pub fn connection_timeout_ns(&self) -> i64 {
        (self.connection_timeout_s.max(0.0) * 1e9) as i64
    }

    pub fn transport_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.transport_timeout_s.max(0.0))
    }

    /// Hard cap on the retained buffer: ten batches, drop-oldest beyond.
    pub fn buffer_cap(&self) -> usize {
        self.batch_size.saturating_mul(10).max(1)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                field: "batch_size",
                reason: "must be at least 1".into(),
            });
        }
        if !self.batch_timeout_s.is_finite() || self.batch_timeout_s <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "batch_timeout_s",
                reason: format!("{} is not a positive duration", self.batch_timeout_s),
            });
        }
        if !self.poll_interval_s.is_finite() || self.poll_interval_s <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_s",
                reason: format!("{} is not a positive duration", self.poll_interval_s),
            });
        }
        Ok(())
    }
}

/// Time-series endpoint settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    /// Optional fallback write command, line protocol on stdin.
    pub fallback: Option<String>,
}

impl SinkConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::Invalid {
                field: "sink.url",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
