// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    running = { SessionStatus::Running, false },
    stopped = { SessionStatus::Stopped, true },
    error   = { SessionStatus::Error,   true },
)]
fn terminal_statuses(status: SessionStatus, expected: bool) {
    assert_eq!(status.is_terminal(), expected);
}

#[yare::parameterized(
    running = { SessionStatus::Running, "running" },
    stopped = { SessionStatus::Stopped, "stopped" },
    error   = { SessionStatus::Error,   "error" },
)]
fn status_display_matches_wire_names(status: SessionStatus, expected: &str) {
    assert_eq!(status.to_string(), expected);
    assert_eq!(
        serde_json::to_string(&status).unwrap(),
        format!("\"{expected}\"")
    );
}

#[test]
fn session_ids_order_and_display() {
    let a = SessionId::new(7);
    let b = SessionId::new(8);
    assert!(b > a);
    assert_eq!(a.as_u64(), 7);
    assert_eq!(a.to_string(), "7");
}

#[test]
fn session_id_serializes_transparently() {
    let id: SessionId = serde_json::from_str("42").unwrap();
    assert_eq!(id, SessionId::new(42));
    assert_eq!(serde_json::to_string(&id).unwrap(), "42");
}
