// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sink-shaped records.

use crate::reading::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Violations of the canonical-point invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("measurement must not be empty")]
    EmptyMeasurement,
    #[error("canonical point must carry at least one field")]
    NoFields,
}

/// A record in the shape the sink expects.
///
/// Tags are ordered so the encoded line protocol is stable; every point
/// carries at least the `site`, `device`, `point` and `quality` tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPoint {
    pub measurement: String,
    pub tags: IndexMap<String, String>,
    pub fields: IndexMap<String, Value>,
    /// Nanoseconds since the Unix epoch, engine wall clock.
    pub timestamp_ns: i64,
}

impl CanonicalPoint {
    pub fn new(
        measurement: impl Into<String>,
        tags: IndexMap<String, String>,
        fields: IndexMap<String, Value>,
        timestamp_ns: i64,
    ) -> Result<Self, CanonicalError> {
        let measurement = measurement.into();
        if measurement.is_empty() {
            return Err(CanonicalError::EmptyMeasurement);
        }
        if fields.is_empty() {
            return Err(CanonicalError::NoFields);
        }
        Ok(Self {
            measurement,
            tags,
            fields,
            timestamp_ns,
        })
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

#[cfg(test)]
#[path = "canonical_tests.rs"]
mod tests;
