// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use acqd_core::test_support::{mc_device, modbus_device, mqtt_device};

#[test]
fn builtin_covers_all_protocols() {
    let registry = AdapterRegistry::builtin();
    assert_eq!(
        registry.protocol_names(),
        vec!["mitsubishi_mc", "modbus_tcp", "mqtt"]
    );
}

#[test]
fn creates_adapters_for_each_device_protocol() {
    let registry = AdapterRegistry::builtin();
    let timeout = Duration::from_secs(1);
    assert!(registry.create(&modbus_device("d1"), timeout).is_ok());
    assert!(registry.create(&mc_device("d2"), timeout).is_ok());
    assert!(registry.create(&mqtt_device("d3"), timeout).is_ok());
}

#[yare::parameterized(
    modbus_short = { "modbus" },
    modbus_flat  = { "modbustcp" },
    plc          = { "plc" },
    mc           = { "MC" },
)]
fn aliases_resolve_to_builtin_factories(alias: &str) {
    let registry = AdapterRegistry::builtin();
    let device = modbus_device("d1");
    assert!(registry
        .create_named(alias, &device, Duration::from_secs(1))
        .is_ok());
}

#[test]
fn unknown_protocol_reports_available_set() {
    let registry = AdapterRegistry::builtin();
    let device = modbus_device("d1");
    let err = registry
        .create_named("opcua", &device, Duration::from_secs(1))
        .unwrap_err();
    assert!(err.to_string().contains("opcua"));
    assert!(err.to_string().contains("modbus_tcp"));
}

#[test]
fn global_registry_is_shared() {
    let a = AdapterRegistry::global() as *const _;
    let b = AdapterRegistry::global() as *const _;
    assert_eq!(a, b);
}
