// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Register decoding by point type.

use acqd_core::{scale_float, scale_integer, Point, PointType, Value};

/// Decode a point's value from its slice of 16-bit registers.
///
/// The slice length must match the point's register span; 32-bit types
/// read high word first. Scaling follows the per-type rules: integer
/// types stay integral, everything else rounds as floating point.
pub fn decode_registers(point: &Point, registers: &[u16]) -> Result<Value, String> {
    let span = point.register_span() as usize;
    if registers.len() < span {
        return Err(format!(
            "expected {} registers for {}, got {}",
            span,
            point.point_type,
            registers.len()
        ));
    }
    let registers = &registers[..span];

    let value = match point.point_type {
        PointType::I16 => {
            if point.length > 1 {
                // Register blocks stay raw; the sink JSON-encodes them.
                let raw: Vec<i64> = registers.iter().map(|&r| i64::from(r as i16)).collect();
                Value::Json(serde_json::json!(raw))
            } else {
                scale_integer(
                    i64::from(registers[0] as i16),
                    point.coefficient,
                    point.precision,
                )
            }
        }
        PointType::I32 => {
            let raw = word_u32(registers) as i32;
            scale_float(f64::from(raw), point.coefficient, point.precision)
        }
        PointType::F32 => {
            let raw = f32::from_bits(word_u32(registers));
            scale_float(f64::from(raw), point.coefficient, point.precision)
        }
        PointType::F32Swapped => {
            let raw = f32::from_bits(word_u32(registers).rotate_left(16));
            scale_float(f64::from(raw), point.coefficient, point.precision)
        }
        PointType::Bool => Value::Bool(registers[0] != 0),
        PointType::Str => {
            let mut bytes = Vec::with_capacity(registers.len() * 2);
            for &reg in registers {
                bytes.push((reg >> 8) as u8);
                bytes.push((reg & 0xff) as u8);
            }
            let text = String::from_utf8_lossy(&bytes)
                .trim_matches(['\0', ' '])
                .to_string();
            Value::Str(text)
        }
        PointType::HexU32 => Value::Str(format!("0x{:08X}", word_u32(registers))),
    };
    Ok(value)
}

/// Decode a bit-family point from its slice of coil/discrete bits.
pub fn decode_bits(point: &Point, bits: &[bool]) -> Result<Value, String> {
    let first = *bits
        .first()
        .ok_or_else(|| "empty bit response".to_string())?;
    let value = match point.point_type {
        PointType::Bool => Value::Bool(first),
        // Numeric types over a bit address degrade to 0/1.
        _ => scale_integer(i64::from(first), point.coefficient, point.precision),
    };
    Ok(value)
}

fn word_u32(registers: &[u16]) -> u32 {
    (u32::from(registers[0]) << 16) | u32::from(registers[1])
}

#[cfg(test)]
#[path = "decode_tests.rs"]
mod tests;
