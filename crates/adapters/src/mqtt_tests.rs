// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use acqd_core::test_support::mqtt_device;
use acqd_core::PointType;

const TS: i64 = 1_700_000_000_000_000_000;

fn point(code: &str) -> Point {
    Point::new(code, code, PointType::F32)
}

#[test]
fn object_payload_maps_matching_codes() {
    let points = [point("temp"), point("rpm"), point("absent")];
    let readings = parse_payload(&points, "sensors/a", br#"{"temp": 21.5, "rpm": 900}"#, TS);

    assert_eq!(readings.len(), 2);
    assert_eq!(readings[0].code, "temp");
    assert_eq!(readings[0].value, Some(Value::F64(21.5)));
    assert_eq!(readings[1].code, "rpm");
    assert_eq!(readings[1].value, Some(Value::I64(900)));
    assert!(readings.iter().all(Reading::is_good));
}

#[test]
fn json_booleans_stay_booleans() {
    let points = [point("running")];
    let readings = parse_payload(&points, "sensors/a", br#"{"running": true}"#, TS);
    assert_eq!(readings[0].value, Some(Value::Bool(true)));
}

#[test]
fn scalar_payload_needs_exactly_one_point() {
    let one = [point("level")];
    let readings = parse_payload(&one, "tank/level", b"42.5", TS);
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].value, Some(Value::F64(42.5)));

    let two = [point("a"), point("b")];
    assert!(parse_payload(&two, "tank/level", b"42.5", TS).is_empty());
}

#[test]
fn non_json_payload_becomes_a_string() {
    let points = [point("status")];
    let readings = parse_payload(&points, "plant/status", b"running ok", TS);
    assert_eq!(readings[0].value, Some(Value::Str("running ok".into())));
}

#[test]
fn nested_payload_values_stay_composite() {
    let points = [point("axis")];
    let readings = parse_payload(&points, "robot/axis", br#"{"axis": {"x": 1, "y": 2}}"#, TS);
    assert!(matches!(readings[0].value, Some(Value::Json(_))));
}

#[test]
fn readings_carry_the_message_timestamp() {
    let points = [point("temp")];
    let readings = parse_payload(&points, "sensors/a", br#"{"temp": 1}"#, 12345);
    assert_eq!(readings[0].timestamp_ns, 12345);
}

#[tokio::test]
async fn adapter_without_topics_rejects_connect() {
    let mut device = mqtt_device("mqtt-01");
    device.metadata.remove("mqtt_topics");
    let mut adapter = MqttAdapter::new(&device, Duration::from_secs(1));

    match adapter.connect().await {
        Err(AdapterError::Config(_)) => {}
        other => panic!("expected config error, got {other:?}"),
    }
    assert!(!adapter.health().await);
}

#[tokio::test]
async fn disconnect_is_idempotent_without_connection() {
    let device = mqtt_device("mqtt-02");
    let mut adapter = MqttAdapter::new(&device, Duration::from_secs(1));
    adapter.disconnect().await;
    adapter.disconnect().await;
    assert_eq!(adapter.dropped_messages(), 0);
}
