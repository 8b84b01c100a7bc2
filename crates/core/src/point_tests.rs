// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    i16_plain     = { "i16",         PointType::I16 },
    i16_alias     = { "int16",       PointType::I16 },
    i32_alias     = { "INT32",       PointType::I32 },
    f32_plain     = { "f32",         PointType::F32 },
    f32_float     = { "float",       PointType::F32 },
    f32_swapped   = { "f32_swapped", PointType::F32Swapped },
    float2_alias  = { "float2",      PointType::F32Swapped },
    bool_plain    = { "bool",        PointType::Bool },
    str_alias     = { "string",      PointType::Str },
    hex_alias     = { "hex",         PointType::HexU32 },
)]
fn point_type_parses_aliases(tag: &str, expected: PointType) {
    assert_eq!(PointType::parse(tag), Some(expected));
}

#[test]
fn point_type_rejects_unknown_tag() {
    assert_eq!(PointType::parse("int64"), None);
    assert_eq!(PointType::parse(""), None);
}

#[test]
fn point_type_display_round_trips() {
    for pt in [
        PointType::I16,
        PointType::I32,
        PointType::F32,
        PointType::F32Swapped,
        PointType::Bool,
        PointType::Str,
        PointType::HexU32,
    ] {
        assert_eq!(PointType::parse(&pt.to_string()), Some(pt));
    }
}

#[test]
fn address_integer_accessors() {
    let addr = Address::Integer(40001);
    assert_eq!(addr.as_integer(), Some(40001));
    assert_eq!(addr.as_symbolic(), None);
    assert_eq!(addr.to_string(), "40001");
}

#[test]
fn address_symbolic_parses_digits() {
    let addr = Address::from("D100");
    assert_eq!(addr.as_integer(), None);
    assert_eq!(addr.as_symbolic(), Some("D100"));

    let numeric = Address::from("42");
    assert_eq!(numeric.as_integer(), Some(42));
}

#[yare::parameterized(
    i16_single  = { PointType::I16, 1, 1 },
    i16_block   = { PointType::I16, 4, 4 },
    i32_single  = { PointType::I32, 1, 2 },
    f32_single  = { PointType::F32, 1, 2 },
    swapped     = { PointType::F32Swapped, 1, 2 },
    str_len     = { PointType::Str, 8, 8 },
    zero_length = { PointType::I16, 0, 1 },
)]
fn register_span(point_type: PointType, length: u32, expected: u32) {
    let mut point = Point::new("p1", 40001, point_type);
    point.length = length;
    assert_eq!(point.register_span(), expected);
}

#[test]
fn point_deserializes_with_defaults() {
    let point: Point =
        serde_json::from_str(r#"{"code":"temp","address":40001,"type":"i16"}"#).unwrap();
    assert_eq!(point.length, 1);
    assert_eq!(point.coefficient, None);
    assert_eq!(point.precision, None);
    assert_eq!(point.address, Address::Integer(40001));
}

#[test]
fn point_deserializes_symbolic_address() {
    let point: Point =
        serde_json::from_str(r#"{"code":"flow","address":"D100","type":"f32","length":1}"#)
            .unwrap();
    assert_eq!(point.address.as_symbolic(), Some("D100"));
}
