// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-protocol encoding.
//!
//! `measurement[,tag=value,...] field=value[,...] timestamp_ns`
//!
//! The encoder also enforces the per-session field-type invariant: once
//! a `(measurement, field)` pair has been written with one concrete
//! type, a conflicting type fails the whole batch.

use crate::SinkError;
use acqd_core::{CanonicalPoint, Value};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Plausible epoch-ns window: 2020-01-01 .. 2100-01-01.
pub const MIN_TIMESTAMP_NS: i64 = 1_577_836_800_000_000_000;
pub const MAX_TIMESTAMP_NS: i64 = 4_102_444_800_000_000_000;

/// Concrete wire type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Text => "string",
        }
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace(' ', "\\ ").replace(',', "\\,")
}

fn escape_tag(s: &str) -> String {
    s.replace(' ', "\\ ").replace(',', "\\,").replace('=', "\\=")
}

fn escape_string_field(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render one field value, or `None` when it cannot be represented.
fn render_field(value: &Value) -> Option<(FieldKind, String)> {
    match value {
        Value::I64(n) => Some((FieldKind::Integer, format!("{}i", n))),
        Value::F64(x) => {
            if x.is_finite() {
                Some((FieldKind::Float, format!("{}", x)))
            } else {
                None
            }
        }
        Value::Bool(b) => Some((FieldKind::Boolean, format!("{}", b))),
        Value::Str(s) => Some((FieldKind::Text, format!("\"{}\"", escape_string_field(s)))),
        // Composites are JSON-encoded into a string field.
        Value::Json(v) => Some((
            FieldKind::Text,
            format!("\"{}\"", escape_string_field(&v.to_string())),
        )),
    }
}

/// Stateful batch encoder, one per sink connection.
#[derive(Debug, Default)]
pub struct LineEncoder {
    field_types: HashMap<(String, String), FieldKind>,
}

impl LineEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a batch into newline-separated lines.
    ///
    /// `now_ns` replaces timestamps outside the sanity window. Fields
    /// whose values cannot be represented are dropped with a warning; a
    /// point with no surviving fields is skipped. A field-type conflict
    /// fails the batch before anything is written.
    pub fn encode_batch(
        &mut self,
        batch: &[CanonicalPoint],
        now_ns: i64,
    ) -> Result<String, SinkError> {
        let mut lines = String::new();

        for point in batch {
            let mut fields = String::new();
            for (key, value) in &point.fields {
                let (kind, rendered) = match render_field(value) {
                    Some(rendered) => rendered,
                    None => {
                        tracing::warn!(
                            measurement = %point.measurement,
                            field = %key,
                            "dropping unrepresentable field value"
                        );
                        continue;
                    }
                };

                let slot = (point.measurement.clone(), key.clone());
                match self.field_types.get(&slot) {
                    Some(existing) if *existing != kind => {
                        return Err(SinkError::Schema(format!(
                            "field '{}' of '{}' changed from {} to {}",
                            key,
                            point.measurement,
                            existing.name(),
                            kind.name()
                        )));
                    }
                    Some(_) => {}
                    None => {
                        self.field_types.insert(slot, kind);
                    }
                }

                if !fields.is_empty() {
                    fields.push(',');
                }
                let _ = write!(fields, "{}={}", escape_tag(key), rendered);
            }

            if fields.is_empty() {
                tracing::warn!(
                    measurement = %point.measurement,
                    "skipping point with no representable fields"
                );
                continue;
            }

            let timestamp_ns = if (MIN_TIMESTAMP_NS..=MAX_TIMESTAMP_NS).contains(&point.timestamp_ns)
            {
                point.timestamp_ns
            } else {
                tracing::warn!(
                    measurement = %point.measurement,
                    timestamp_ns = point.timestamp_ns,
                    "timestamp outside sanity window, using server time"
                );
                now_ns
            };

            let _ = write!(lines, "{}", escape_measurement(&point.measurement));
            for (key, value) in &point.tags {
                let _ = write!(lines, ",{}={}", escape_tag(key), escape_tag(value));
            }
            let _ = writeln!(lines, " {} {}", fields, timestamp_ns);
        }

        Ok(lines)
    }
}

/// One-shot encoding without session state, for tooling and tests.
pub fn encode_batch(batch: &[CanonicalPoint], now_ns: i64) -> Result<String, SinkError> {
    LineEncoder::new().encode_batch(batch, now_ns)
}

#[cfg(test)]
#[path = "line_tests.rs"]
mod tests;
