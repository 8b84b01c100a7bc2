// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::{indexmap, IndexMap};

const NOW: i64 = 1_700_000_000_000_000_000;

fn point(measurement: &str, fields: IndexMap<String, Value>) -> CanonicalPoint {
    CanonicalPoint::new(
        measurement,
        indexmap! {
            "site".to_string() => "s1".to_string(),
            "device".to_string() => "plc-01".to_string(),
            "point".to_string() => "p1".to_string(),
            "quality".to_string() => "good".to_string(),
        },
        fields,
        NOW,
    )
    .unwrap()
}

#[test]
fn encodes_tags_fields_and_timestamp() {
    let p = point("furnace", indexmap! {"temp".to_string() => Value::I64(100)});
    let line = encode_batch(&[p], NOW).unwrap();
    assert_eq!(
        line,
        "furnace,site=s1,device=plc-01,point=p1,quality=good temp=100i 1700000000000000000\n"
    );
}

#[yare::parameterized(
    integer = { Value::I64(-5),            "v=-5i" },
    float   = { Value::F64(2.5),           "v=2.5" },
    whole_float = { Value::F64(100.0),     "v=100" },
    boolean = { Value::Bool(true),         "v=true" },
    text    = { Value::Str("ok".into()),   "v=\"ok\"" },
)]
fn field_value_rendering(value: Value, expected: &str) {
    let p = point("m", indexmap! {"v".to_string() => value});
    let line = encode_batch(&[p], NOW).unwrap();
    assert!(line.contains(expected), "{line}");
}

#[test]
fn escapes_tag_values_and_string_fields() {
    let p = CanonicalPoint::new(
        "my measurement",
        indexmap! {"loc".to_string() => "hall 1,west=a".to_string()},
        indexmap! {"msg".to_string() => Value::Str("say \"hi\" \\ done".into())},
        NOW,
    )
    .unwrap();
    let line = encode_batch(&[p], NOW).unwrap();
    assert!(line.starts_with("my\\ measurement,loc=hall\\ 1\\,west\\=a "));
    assert!(line.contains(r#"msg="say \"hi\" \\ done""#));
}

#[test]
fn composite_values_are_json_encoded_strings() {
    let p = point(
        "m",
        indexmap! {"block".to_string() => Value::Json(serde_json::json!([1, 2]))},
    );
    let line = encode_batch(&[p], NOW).unwrap();
    assert!(line.contains("block=\"[1,2]\""), "{line}");
}

#[test]
fn out_of_window_timestamp_is_replaced() {
    let mut p = point("m", indexmap! {"v".to_string() => Value::I64(1)});
    p.timestamp_ns = 1;
    let line = encode_batch(&[p], NOW).unwrap();
    assert!(line.trim_end().ends_with(&NOW.to_string()), "{line}");
}

#[test]
fn nan_field_is_dropped_point_with_no_fields_skipped() {
    let nan_only = point("m", indexmap! {"v".to_string() => Value::F64(f64::NAN)});
    let line = encode_batch(&[nan_only], NOW).unwrap();
    assert!(line.is_empty());

    let mixed = point(
        "m",
        indexmap! {
            "bad".to_string() => Value::F64(f64::INFINITY),
            "good".to_string() => Value::I64(1),
        },
    );
    let line = encode_batch(&[mixed], NOW).unwrap();
    assert!(line.contains("good=1i"));
    assert!(!line.contains("bad="));
}

#[test]
fn field_type_conflict_fails_the_batch() {
    let mut encoder = LineEncoder::new();
    let first = point("m", indexmap! {"v".to_string() => Value::I64(1)});
    encoder.encode_batch(&[first], NOW).unwrap();

    let conflicting = point("m", indexmap! {"v".to_string() => Value::Str("x".into())});
    match encoder.encode_batch(&[conflicting], NOW) {
        Err(SinkError::Schema(msg)) => {
            assert!(msg.contains("integer"));
            assert!(msg.contains("string"));
        }
        other => panic!("expected schema error, got {other:?}"),
    }
}

#[test]
fn same_field_name_may_differ_across_measurements() {
    let mut encoder = LineEncoder::new();
    let a = point("m1", indexmap! {"v".to_string() => Value::I64(1)});
    let b = point("m2", indexmap! {"v".to_string() => Value::Str("x".into())});
    assert!(encoder.encode_batch(&[a, b], NOW).is_ok());
}

#[test]
fn empty_batch_encodes_to_nothing() {
    assert_eq!(encode_batch(&[], NOW).unwrap(), "");
}
