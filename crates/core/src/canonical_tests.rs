// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::indexmap;

#[test]
fn rejects_empty_measurement() {
    let result = CanonicalPoint::new(
        "",
        IndexMap::new(),
        indexmap! {"v".to_string() => Value::I64(1)},
        0,
    );
    assert_eq!(result.unwrap_err(), CanonicalError::EmptyMeasurement);
}

#[test]
fn rejects_empty_field_set() {
    let result = CanonicalPoint::new("m", IndexMap::new(), IndexMap::new(), 0);
    assert_eq!(result.unwrap_err(), CanonicalError::NoFields);
}

#[test]
fn preserves_tag_insertion_order() {
    let point = CanonicalPoint::new(
        "furnace",
        indexmap! {
            "site".to_string() => "s1".to_string(),
            "device".to_string() => "plc-01".to_string(),
            "point".to_string() => "temp".to_string(),
            "quality".to_string() => "good".to_string(),
        },
        indexmap! {"temp".to_string() => Value::F64(21.5)},
        1_700_000_000_000_000_000,
    )
    .unwrap();

    let keys: Vec<&str> = point.tags.keys().map(String::as_str).collect();
    assert_eq!(keys, ["site", "device", "point", "quality"]);
    assert_eq!(point.tag("device"), Some("plc-01"));
}
