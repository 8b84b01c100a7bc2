// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reading records and value scaling.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A dynamically-typed point value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
    /// Composite values (register arrays, nested payloads); the sink
    /// serializes these into a string field.
    Json(serde_json::Value),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(f) => Some(*f),
            Value::I64(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Convert a JSON scalar, normalizing booleans and integers; objects
    /// and arrays stay composite.
    pub fn from_json(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else {
                    Value::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            other => Value::Json(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I64(n) => write!(f, "{}", n),
            Value::F64(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Json(v) => write!(f, "{}", v),
        }
    }
}

/// Data quality of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Good,
    Bad,
    Uncertain,
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Good => write!(f, "good"),
            Quality::Bad => write!(f, "bad"),
            Quality::Uncertain => write!(f, "uncertain"),
        }
    }
}

/// The raw result of reading one point at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub code: String,
    pub value: Option<Value>,
    /// Engine wall clock, nanoseconds since the Unix epoch.
    pub timestamp_ns: i64,
    pub quality: Quality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Reading {
    pub fn good(code: impl Into<String>, value: Value, timestamp_ns: i64) -> Self {
        Self {
            code: code.into(),
            value: Some(value),
            timestamp_ns,
            quality: Quality::Good,
            error: None,
        }
    }

    pub fn bad(code: impl Into<String>, error: impl Into<String>, timestamp_ns: i64) -> Self {
        Self {
            code: code.into(),
            value: None,
            timestamp_ns,
            quality: Quality::Bad,
            error: Some(error.into()),
        }
    }

    pub fn is_good(&self) -> bool {
        self.quality == Quality::Good
    }
}

/// Round to `precision` decimal places, half away from zero.
fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(12) as i32);
    (value * factor).round() / factor
}

/// Integer scaling rule: scale, round, truncate back to integer.
///
/// Used for `i16` points, matching the upstream behavior where scaled
/// 16-bit counters stay integral.
pub fn scale_integer(raw: i64, coefficient: Option<f64>, precision: Option<u32>) -> Value {
    match coefficient {
        None => Value::I64(raw),
        Some(c) => {
            let scaled = round_to(raw as f64 * c, precision.unwrap_or(0));
            Value::I64(scaled as i64)
        }
    }
}

/// Float scaling rule: scale and round, keep floating.
///
/// Used for `i32`, `f32` and `f32_swapped` points.
pub fn scale_float(raw: f64, coefficient: Option<f64>, precision: Option<u32>) -> Value {
    let scaled = raw * coefficient.unwrap_or(1.0);
    match precision {
        None => Value::F64(scaled),
        Some(p) => Value::F64(round_to(scaled, p)),
    }
}

#[cfg(test)]
#[path = "reading_tests.rs"]
mod tests;
