// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use acqd_core::Point;
use proptest::prelude::*;

fn point(point_type: PointType) -> Point {
    Point::new("p1", 40001, point_type)
}

#[test]
fn i16_decodes_signed() {
    assert_eq!(
        decode_registers(&point(PointType::I16), &[100]).unwrap(),
        Value::I64(100)
    );
    assert_eq!(
        decode_registers(&point(PointType::I16), &[0xFFFF]).unwrap(),
        Value::I64(-1)
    );
    assert_eq!(
        decode_registers(&point(PointType::I16), &[0x8000]).unwrap(),
        Value::I64(-32768)
    );
}

#[test]
fn i16_applies_integer_scaling() {
    let mut p = point(PointType::I16);
    p.coefficient = Some(0.5);
    p.precision = Some(0);
    assert_eq!(decode_registers(&p, &[101]).unwrap(), Value::I64(51));
}

#[test]
fn i16_block_becomes_json_array() {
    let mut p = point(PointType::I16);
    p.length = 3;
    assert_eq!(
        decode_registers(&p, &[1, 2, 0xFFFF]).unwrap(),
        Value::Json(serde_json::json!([1, 2, -1]))
    );
}

#[test]
fn i32_reads_high_word_first() {
    let v = decode_registers(&point(PointType::I32), &[0x0001, 0x0000]).unwrap();
    assert_eq!(v, Value::F64(65536.0));

    let v = decode_registers(&point(PointType::I32), &[0xFFFF, 0xFFFF]).unwrap();
    assert_eq!(v, Value::F64(-1.0));
}

#[test]
fn f32_decodes_ieee754() {
    let bits = 1.5f32.to_bits();
    let regs = [(bits >> 16) as u16, (bits & 0xFFFF) as u16];
    match decode_registers(&point(PointType::F32), &regs).unwrap() {
        Value::F64(v) => assert!((v - 1.5).abs() < 1e-6),
        other => panic!("expected float, got {other:?}"),
    }
}

#[test]
fn f32_swapped_rotates_before_interpretation() {
    let bits = 21.75f32.to_bits();
    // Halves arrive swapped: low word first on the wire.
    let swapped = bits.rotate_left(16);
    let regs = [(swapped >> 16) as u16, (swapped & 0xFFFF) as u16];
    match decode_registers(&point(PointType::F32Swapped), &regs).unwrap() {
        Value::F64(v) => assert!((v - 21.75).abs() < 1e-6),
        other => panic!("expected float, got {other:?}"),
    }
}

#[test]
fn bool_register_is_nonzero_test() {
    assert_eq!(
        decode_registers(&point(PointType::Bool), &[0]).unwrap(),
        Value::Bool(false)
    );
    assert_eq!(
        decode_registers(&point(PointType::Bool), &[7]).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn string_decodes_two_bytes_per_register() {
    let mut p = point(PointType::Str);
    p.length = 2;
    // "AB" "C\0"
    let regs = [0x4142, 0x4300];
    assert_eq!(
        decode_registers(&p, &regs).unwrap(),
        Value::Str("ABC".into())
    );
}

#[test]
fn hex_u32_formats_word() {
    assert_eq!(
        decode_registers(&point(PointType::HexU32), &[0x00AB, 0xCDEF]).unwrap(),
        Value::Str("0x00ABCDEF".into())
    );
}

#[test]
fn short_slice_is_an_error() {
    assert!(decode_registers(&point(PointType::I32), &[1]).is_err());
    assert!(decode_bits(&point(PointType::Bool), &[]).is_err());
}

#[test]
fn bit_decode_maps_numeric_types_to_zero_one() {
    assert_eq!(
        decode_bits(&point(PointType::Bool), &[true]).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        decode_bits(&point(PointType::I16), &[true]).unwrap(),
        Value::I64(1)
    );
}

proptest! {
    #[test]
    fn i16_round_trips(v in i16::MIN..=i16::MAX) {
        // Encode as the little-endian byte pair, reassemble the
        // register, decode via the signed-16 rule.
        let bytes = v.to_le_bytes();
        let register = u16::from_le_bytes(bytes);
        let decoded = decode_registers(&point(PointType::I16), &[register]).unwrap();
        prop_assert_eq!(decoded, Value::I64(i64::from(v)));
    }
}
