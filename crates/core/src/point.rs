// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point definitions: the atomic reading targets of a task.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic value type of a point.
///
/// Drives register decoding in the request-response adapters and the
/// coefficient/precision post-processing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointType {
    #[serde(alias = "int16")]
    I16,
    #[serde(alias = "int32")]
    I32,
    #[serde(alias = "float", alias = "float32")]
    F32,
    /// 32-bit float whose 16-bit halves arrive swapped on the wire.
    #[serde(alias = "float2")]
    F32Swapped,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "string")]
    Str,
    #[serde(alias = "hex")]
    HexU32,
}

impl PointType {
    /// Parse a configuration tag, accepting the aliases used by upstream
    /// config exports (`int16`, `float2`, `hex`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i16" | "int16" => Some(PointType::I16),
            "i32" | "int32" => Some(PointType::I32),
            "f32" | "float" | "float32" => Some(PointType::F32),
            "f32_swapped" | "float2" => Some(PointType::F32Swapped),
            "bool" | "boolean" => Some(PointType::Bool),
            "str" | "string" => Some(PointType::Str),
            "hex_u32" | "hex" => Some(PointType::HexU32),
            _ => None,
        }
    }

    /// Number of 16-bit registers one logical unit of this type occupies.
    pub fn words_per_unit(&self) -> u32 {
        match self {
            PointType::I16 | PointType::Bool | PointType::Str => 1,
            PointType::I32 | PointType::F32 | PointType::F32Swapped | PointType::HexU32 => 2,
        }
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            PointType::I16 => "i16",
            PointType::I32 => "i32",
            PointType::F32 => "f32",
            PointType::F32Swapped => "f32_swapped",
            PointType::Bool => "bool",
            PointType::Str => "str",
            PointType::HexU32 => "hex_u32",
        };
        write!(f, "{}", tag)
    }
}

/// Protocol-specific point address.
///
/// Modbus points carry integer display addresses; MC points carry a
/// register prefix plus a numeric suffix (`D100`, `M10`); MQTT points
/// use the point code itself as the payload key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    Integer(i64),
    Symbolic(String),
}

impl Address {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Address::Integer(n) => Some(*n),
            Address::Symbolic(s) => s.parse().ok(),
        }
    }

    pub fn as_symbolic(&self) -> Option<&str> {
        match self {
            Address::Symbolic(s) => Some(s),
            Address::Integer(_) => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Integer(n) => write!(f, "{}", n),
            Address::Symbolic(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Address {
    fn from(n: i64) -> Self {
        Address::Integer(n)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Address::Symbolic(s.to_string())
    }
}

/// An atomic reading target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Stable point identifier; carried verbatim through every Reading.
    pub code: String,
    pub address: Address,
    #[serde(rename = "type")]
    pub point_type: PointType,
    /// Register count or string length (logical units).
    #[serde(default = "default_length")]
    pub length: u32,
    /// Applied post-read: `value × coefficient` rounded to `precision`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Display metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

fn default_length() -> u32 {
    1
}

impl Point {
    pub fn new(code: impl Into<String>, address: impl Into<Address>, point_type: PointType) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
            point_type,
            length: 1,
            coefficient: None,
            precision: None,
            name: None,
            unit: None,
        }
    }

    /// Total 16-bit registers this point spans on the wire.
    pub fn register_span(&self) -> u32 {
        self.length.max(1) * self.point_type.words_per_unit()
    }
}

#[cfg(test)]
#[path = "point_tests.rs"]
mod tests;
