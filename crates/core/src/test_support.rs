// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test builders for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::device::{Device, Protocol};
use crate::point::{Point, PointType};
use crate::task::{Schedule, Task, TaskDevice};

/// A holding-register point at a Modbus display address.
pub fn holding_point(code: &str, address: i64) -> Point {
    Point::new(code, address, PointType::I16)
}

/// An MC word point at a symbolic address like `D100`.
pub fn mc_point(code: &str, address: &str, point_type: PointType) -> Point {
    Point::new(code, address, point_type)
}

pub fn modbus_device(code: &str) -> Device {
    Device::new(code, Protocol::ModbusTcp, "127.0.0.1", 5020)
}

pub fn mc_device(code: &str) -> Device {
    Device::new(code, Protocol::MitsubishiMc, "127.0.0.1", 6000)
}

pub fn mqtt_device(code: &str) -> Device {
    let mut device = Device::new(code, Protocol::Mqtt, "127.0.0.1", 1883);
    device
        .metadata
        .insert("mqtt_topics".into(), serde_json::json!(["sensors/#"]));
    device
}

/// Single-device continuous task with a 1 s cadence.
pub fn task(code: &str, device: Device, points: Vec<Point>) -> Task {
    Task {
        code: code.into(),
        name: code.into(),
        schedule: Schedule::Continuous,
        poll_interval_s: 1.0,
        devices: vec![TaskDevice { device, points }],
    }
}

pub fn multi_device_task(code: &str, devices: Vec<(Device, Vec<Point>)>) -> Task {
    Task {
        code: code.into(),
        name: code.into(),
        schedule: Schedule::Continuous,
        poll_interval_s: 1.0,
        devices: devices
            .into_iter()
            .map(|(device, points)| TaskDevice { device, points })
            .collect(),
    }
}
