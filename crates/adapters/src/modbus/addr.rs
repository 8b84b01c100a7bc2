// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Modbus display-address normalization.
//!
//! Configuration carries conventional display addresses (`40001` for the
//! first holding register); the wire wants zero-based offsets per
//! register family.

use std::fmt;

/// Register family, keyed by Modbus function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    /// Function code 1.
    Coil,
    /// Function code 2.
    Discrete,
    /// Function code 3.
    Holding,
    /// Function code 4.
    Input,
}

impl Family {
    pub fn function_code(&self) -> u8 {
        match self {
            Family::Coil => 1,
            Family::Discrete => 2,
            Family::Holding => 3,
            Family::Input => 4,
        }
    }

    pub fn is_bit(&self) -> bool {
        matches!(self, Family::Coil | Family::Discrete)
    }

    /// Transport cap per read: 125 registers for word families, 2000
    /// bits for bit families.
    pub fn read_cap(&self) -> u32 {
        if self.is_bit() {
            2000
        } else {
            125
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fc{}", self.function_code())
    }
}

/// A display address resolved to its family and zero-based offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireAddress {
    pub family: Family,
    pub offset: u16,
    /// Original display form, kept for diagnostics.
    pub display: i64,
}

/// Normalize a display address.
///
/// `40001..=49999` holding, `30001..=39999` input, `10001..=19999` coil,
/// `1..=9999` discrete, `0` an already-zero-based holding offset.
/// Anything else (`40000`, the `20000..=29999` hole, negatives, beyond
/// `49999`) is rejected so a misconfigured address surfaces instead of
/// being remapped into a neighboring family.
pub fn normalize(display: i64) -> Result<WireAddress, String> {
    let (family, offset) = match display {
        40001..=49999 => (Family::Holding, display - 40001),
        30001..=39999 => (Family::Input, display - 30001),
        10001..=19999 => (Family::Coil, display - 10001),
        1..=9999 => (Family::Discrete, display - 1),
        0 => (Family::Holding, 0),
        other => {
            return Err(format!(
                "address {} is outside every modbus display range",
                other
            ))
        }
    };
    Ok(WireAddress {
        family,
        offset: offset as u16,
        display,
    })
}

#[cfg(test)]
#[path = "addr_tests.rs"]
mod tests;
