// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol registry.
//!
//! Process-scoped factory map keyed by canonical protocol name. The
//! builtin set covers Modbus-TCP, Mitsubishi MC and MQTT; embedders can
//! construct their own registry with extra factories for tests.

use crate::{Adapter, AdapterError, McAdapter, ModbusAdapter, MqttAdapter};
use acqd_core::{Device, Protocol};
use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::Duration;

type Factory = Box<dyn Fn(&Device, Duration) -> Box<dyn Adapter> + Send + Sync>;

pub struct AdapterRegistry {
    factories: HashMap<&'static str, Factory>,
}

impl AdapterRegistry {
    /// Registry with the builtin protocol set.
    pub fn builtin() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register(Protocol::ModbusTcp.as_str(), |device, timeout| {
            Box::new(ModbusAdapter::new(device, timeout))
        });
        registry.register(Protocol::MitsubishiMc.as_str(), |device, timeout| {
            Box::new(McAdapter::new(device, timeout))
        });
        registry.register(Protocol::Mqtt.as_str(), |device, timeout| {
            Box::new(MqttAdapter::new(device, timeout))
        });
        registry
    }

    /// Shared process-wide instance, populated once at startup.
    pub fn global() -> &'static AdapterRegistry {
        static GLOBAL: OnceLock<AdapterRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::builtin)
    }

    pub fn register(
        &mut self,
        name: &'static str,
        factory: impl Fn(&Device, Duration) -> Box<dyn Adapter> + Send + Sync + 'static,
    ) {
        self.factories.insert(name, Box::new(factory));
        tracing::debug!(protocol = name, "registered protocol");
    }

    /// Build an adapter for a device.
    pub fn create(
        &self,
        device: &Device,
        timeout: Duration,
    ) -> Result<Box<dyn Adapter>, AdapterError> {
        self.create_named(device.protocol.as_str(), device, timeout)
    }

    /// Build an adapter by protocol name, accepting the usual aliases.
    pub fn create_named(
        &self,
        name: &str,
        device: &Device,
        timeout: Duration,
    ) -> Result<Box<dyn Adapter>, AdapterError> {
        let canonical = Protocol::parse(name)
            .map(|p| p.as_str())
            .unwrap_or(name);
        let factory = self.factories.get(canonical).ok_or_else(|| {
            AdapterError::Config(format!(
                "protocol '{}' not registered (available: {})",
                name,
                self.protocol_names().join(", ")
            ))
        })?;
        Ok(factory(device, timeout))
    }

    pub fn protocol_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
