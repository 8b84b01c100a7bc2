// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Qna-3E binary frame building and parsing.
//!
//! Batch read, word units (command 0x0401 sub 0x0000) and bit units
//! (sub 0x0001). Multi-byte fields are little-endian; bit responses
//! pack one point per nibble, first point in the high nibble.

/// Register kind addressed by a symbolic prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceSpec {
    pub prefix: char,
    /// Wire device code.
    pub code: u8,
    /// Address radix (X/Y/B/W count in hexadecimal).
    pub radix: u32,
    pub is_bit: bool,
}

const DEVICES: &[DeviceSpec] = &[
    DeviceSpec { prefix: 'D', code: 0xA8, radix: 10, is_bit: false },
    DeviceSpec { prefix: 'W', code: 0xB4, radix: 16, is_bit: false },
    DeviceSpec { prefix: 'R', code: 0xAF, radix: 10, is_bit: false },
    DeviceSpec { prefix: 'M', code: 0x90, radix: 10, is_bit: true },
    DeviceSpec { prefix: 'X', code: 0x9C, radix: 16, is_bit: true },
    DeviceSpec { prefix: 'Y', code: 0x9D, radix: 16, is_bit: true },
    DeviceSpec { prefix: 'B', code: 0xA0, radix: 16, is_bit: true },
    DeviceSpec { prefix: 'L', code: 0x92, radix: 10, is_bit: true },
    DeviceSpec { prefix: 'F', code: 0x93, radix: 10, is_bit: true },
    DeviceSpec { prefix: 'S', code: 0x98, radix: 10, is_bit: true },
];

/// Maximum word units in one batch read frame.
pub const WORD_READ_CAP: u32 = 960;
/// Maximum bit units in one batch read frame.
pub const BIT_READ_CAP: u32 = 7168;

/// Split a symbolic address like `D100` or `X1A` into its device spec
/// and numeric offset.
pub fn parse_address(address: &str) -> Result<(DeviceSpec, u32), String> {
    let mut chars = address.chars();
    let prefix = chars
        .next()
        .ok_or_else(|| "empty address".to_string())?
        .to_ascii_uppercase();
    let spec = DEVICES
        .iter()
        .find(|d| d.prefix == prefix)
        .copied()
        .ok_or_else(|| format!("unknown register prefix in '{}'", address))?;

    let digits = chars.as_str();
    if digits.is_empty() {
        return Err(format!("address '{}' has no numeric suffix", address));
    }
    let offset = u32::from_str_radix(digits, spec.radix)
        .map_err(|_| format!("address '{}' has a non-numeric suffix", address))?;
    Ok((spec, offset))
}

fn read_request(spec: DeviceSpec, head: u32, count: u16, bits: bool) -> Vec<u8> {
    let mut frame = Vec::with_capacity(21);
    frame.extend_from_slice(&[0x50, 0x00]); // subheader
    frame.push(0x00); // network
    frame.push(0xFF); // PC
    frame.extend_from_slice(&[0xFF, 0x03]); // destination module
    frame.push(0x00); // station
    frame.extend_from_slice(&12u16.to_le_bytes()); // remaining length
    frame.extend_from_slice(&0x0010u16.to_le_bytes()); // monitoring timer
    frame.extend_from_slice(&0x0401u16.to_le_bytes()); // batch read
    let sub: u16 = if bits { 0x0001 } else { 0x0000 };
    frame.extend_from_slice(&sub.to_le_bytes());
    frame.extend_from_slice(&head.to_le_bytes()[..3]);
    frame.push(spec.code);
    frame.extend_from_slice(&count.to_le_bytes());
    frame
}

/// Batch read of `count` word units starting at `head`.
pub fn build_word_read(spec: DeviceSpec, head: u32, count: u16) -> Vec<u8> {
    read_request(spec, head, count, false)
}

/// Batch read of `count` bit units starting at `head`.
pub fn build_bit_read(spec: DeviceSpec, head: u32, count: u16) -> Vec<u8> {
    read_request(spec, head, count, true)
}

/// Fixed response header length: subheader through the data-length field.
pub const RESPONSE_HEADER_LEN: usize = 9;

/// Byte count that follows a response header.
pub fn response_body_len(header: &[u8]) -> Result<usize, String> {
    if header.len() < RESPONSE_HEADER_LEN {
        return Err("short response header".to_string());
    }
    if header[0] != 0xD0 || header[1] != 0x00 {
        return Err(format!(
            "bad response subheader {:02x}{:02x}",
            header[0], header[1]
        ));
    }
    Ok(usize::from(u16::from_le_bytes([header[7], header[8]])))
}

/// Strip the end code from a response body, returning the data bytes.
pub fn response_data(body: &[u8]) -> Result<&[u8], String> {
    if body.len() < 2 {
        return Err("response body shorter than its end code".to_string());
    }
    let end_code = u16::from_le_bytes([body[0], body[1]]);
    if end_code != 0 {
        return Err(format!("plc returned end code 0x{:04X}", end_code));
    }
    Ok(&body[2..])
}

/// Little-endian words from response data.
pub fn words_from_bytes(data: &[u8]) -> Vec<u16> {
    data.chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Unpack nibble-coded bits, first point in the high nibble.
pub fn bits_from_bytes(data: &[u8], count: usize) -> Vec<bool> {
    let mut bits = Vec::with_capacity(count);
    for byte in data {
        bits.push(byte >> 4 != 0);
        if bits.len() == count {
            break;
        }
        bits.push(byte & 0x0F != 0);
        if bits.len() == count {
            break;
        }
    }
    bits
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
