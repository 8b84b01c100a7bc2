// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device definitions: the connection endpoints a task reads from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire protocol spoken by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    #[serde(alias = "modbus", alias = "modbustcp")]
    ModbusTcp,
    #[serde(alias = "mc", alias = "plc")]
    MitsubishiMc,
    Mqtt,
}

impl Protocol {
    /// Parse a protocol name, accepting the registry aliases used by
    /// upstream configuration (`modbus`, `plc`, ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modbus_tcp" | "modbustcp" | "modbus" => Some(Protocol::ModbusTcp),
            "mitsubishi_mc" | "mc" | "plc" => Some(Protocol::MitsubishiMc),
            "mqtt" => Some(Protocol::Mqtt),
            _ => None,
        }
    }

    /// Canonical registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::ModbusTcp => "modbus_tcp",
            Protocol::MitsubishiMc => "mitsubishi_mc",
            Protocol::Mqtt => "mqtt",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A connection endpoint owning one or more points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub code: String,
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    /// Modbus unit/slave identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slave: Option<u8>,
    /// Free-form bag: measurement tag, MQTT topics/credentials, site code.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Device {
    pub fn new(
        code: impl Into<String>,
        protocol: Protocol,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            code: code.into(),
            protocol,
            host: host.into(),
            port,
            slave: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// String metadata lookup.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Human-visible measurement tag; falls back to the device code.
    pub fn measurement(&self) -> &str {
        self.meta_str("device_a_tag").unwrap_or(&self.code)
    }

    /// Site code for the canonical tag set.
    pub fn site(&self) -> &str {
        self.meta_str("site").unwrap_or("default")
    }
}

#[cfg(test)]
#[path = "device_tests.rs"]
mod tests;
