// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn success_resets_failure_count() {
    let mut health = DeviceHealth::connecting();
    health.record_failure();
    health.record_failure();
    assert_eq!(health.consecutive_failures, 2);
    assert_eq!(health.status, DeviceStatus::Error);

    health.record_success(1_000);
    assert_eq!(health.consecutive_failures, 0);
    assert_eq!(health.status, DeviceStatus::Healthy);
    assert_eq!(health.last_success_ns, Some(1_000));
}

#[test]
fn failure_does_not_downgrade_disconnected() {
    let mut health = DeviceHealth::connecting();
    health.status = DeviceStatus::Disconnected;
    health.record_failure();
    assert_eq!(health.status, DeviceStatus::Disconnected);
}

#[test]
fn timeout_requires_a_prior_success() {
    let mut health = DeviceHealth::connecting();
    assert!(!health.timed_out(i64::MAX, 30_000_000_000));

    health.record_success(1_000_000_000);
    assert!(!health.timed_out(30_000_000_000, 30_000_000_000));
    assert!(health.timed_out(31_000_000_001, 30_000_000_000));
}

#[test]
fn status_display_matches_wire_names() {
    assert_eq!(DeviceStatus::Healthy.to_string(), "healthy");
    assert_eq!(DeviceStatus::Disconnected.to_string(), "disconnected");
    assert_eq!(
        serde_json::to_string(&DeviceStatus::Timeout).unwrap(),
        "\"timeout\""
    );
}
