// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reading-to-canonical conversion.

use acqd_core::{CanonicalPoint, Device, Point, Reading};
use indexmap::IndexMap;

/// Shape adapter readings into sink records for one device.
///
/// The measurement is the device's human-visible tag (falling back to
/// its code); tags carry site/device/point/quality plus the point's
/// display metadata. Readings without a value (bad quality with no
/// payload) produce nothing, since a canonical point must carry at
/// least one field. Readings whose code matches no task point are
/// dropped.
pub fn canonicalize(device: &Device, points: &[Point], readings: &[Reading]) -> Vec<CanonicalPoint> {
    let mut out = Vec::with_capacity(readings.len());

    for reading in readings {
        let point = match points.iter().find(|p| p.code == reading.code) {
            Some(point) => point,
            None => {
                tracing::debug!(code = %reading.code, "reading for unknown point dropped");
                continue;
            }
        };
        let value = match &reading.value {
            Some(value) => value.clone(),
            None => continue,
        };

        let mut tags = IndexMap::new();
        tags.insert("site".to_string(), device.site().to_string());
        tags.insert("device".to_string(), device.code.clone());
        tags.insert("point".to_string(), reading.code.clone());
        tags.insert("quality".to_string(), reading.quality.to_string());
        if let Some(name) = &point.name {
            tags.insert("cn_name".to_string(), name.clone());
        }
        if let Some(unit) = &point.unit {
            tags.insert("unit".to_string(), unit.clone());
        }

        let mut fields = IndexMap::new();
        fields.insert(reading.code.clone(), value);

        match CanonicalPoint::new(device.measurement(), tags, fields, reading.timestamp_ns) {
            Ok(point) => out.push(point),
            Err(e) => tracing::warn!(code = %reading.code, error = %e, "invalid canonical point"),
        }
    }
    out
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
