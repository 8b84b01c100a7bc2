// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use acqd_core::test_support::holding_point;
use acqd_core::PointType;

#[test]
fn plan_groups_adjacent_holding_registers() {
    // 40001,40002,40005,40006 -> two reads: (0, len 2) and (4, len 2).
    let points = vec![
        holding_point("p1", 40001),
        holding_point("p2", 40002),
        holding_point("p3", 40005),
        holding_point("p4", 40006),
    ];
    let plan = build_plan(&points);

    assert!(plan.rejected.is_empty());
    assert_eq!(plan.requests.len(), 2);
    assert_eq!(plan.requests[0].start, 0);
    assert_eq!(plan.requests[0].count, 2);
    assert_eq!(plan.requests[0].slots, vec![(0, 0), (1, 1)]);
    assert_eq!(plan.requests[1].start, 4);
    assert_eq!(plan.requests[1].count, 2);
    assert_eq!(plan.requests[1].slots, vec![(2, 0), (3, 1)]);
}

#[test]
fn plan_partitions_by_function_code() {
    let points = vec![
        holding_point("h1", 40001),
        Point::new("i1", 30001, PointType::I16),
        Point::new("c1", 10001, PointType::Bool),
        holding_point("h2", 40002),
    ];
    let plan = build_plan(&points);

    assert_eq!(plan.requests.len(), 3);
    let families: Vec<Family> = plan.requests.iter().map(|r| r.family).collect();
    assert_eq!(families, vec![Family::Coil, Family::Holding, Family::Input]);

    let holding = &plan.requests[1];
    assert_eq!(holding.slots, vec![(0, 0), (3, 1)]);
}

#[test]
fn plan_rejects_uncovered_and_symbolic_addresses() {
    let points = vec![
        holding_point("ok", 40001),
        holding_point("hole", 40000),
        Point::new("sym", "D100", PointType::I16),
    ];
    let plan = build_plan(&points);

    assert_eq!(plan.requests.len(), 1);
    assert_eq!(plan.rejected.len(), 2);
    assert_eq!(plan.rejected[0].0, 1);
    assert!(plan.rejected[0].1.contains("40000"));
    assert_eq!(plan.rejected[1].0, 2);
}

#[test]
fn plan_splits_runs_beyond_the_register_cap() {
    let points: Vec<Point> = (0i64..126)
        .map(|i| holding_point(&format!("p{i}"), 40001 + i))
        .collect();
    let plan = build_plan(&points);

    assert_eq!(plan.requests.len(), 2);
    assert_eq!(plan.requests[0].count, 125);
    assert_eq!(plan.requests[1].start, 125);
    assert_eq!(plan.requests[1].count, 1);
}

#[test]
fn plan_accounts_for_multi_register_types() {
    // Two f32 points at 40001/40003 are contiguous (2 registers each).
    let points = vec![
        Point::new("f1", 40001, PointType::F32),
        Point::new("f2", 40003, PointType::F32),
    ];
    let plan = build_plan(&points);

    assert_eq!(plan.requests.len(), 1);
    assert_eq!(plan.requests[0].count, 4);
    assert_eq!(plan.requests[0].slots, vec![(0, 0), (1, 2)]);
}

#[test]
fn bit_family_uses_bit_lengths() {
    let points: Vec<Point> = (0i64..2001)
        .map(|i| Point::new(format!("c{i}"), 10001 + i, PointType::Bool))
        .collect();
    let plan = build_plan(&points);

    // 2001 contiguous coils split at the 2000-bit cap.
    assert_eq!(plan.requests.len(), 2);
    assert_eq!(plan.requests[0].count, 2000);
    assert_eq!(plan.requests[1].count, 1);
}

#[test]
fn duplicate_display_addresses_share_a_slot() {
    let points = vec![holding_point("a", 40003), holding_point("b", 40003)];
    let plan = build_plan(&points);

    assert_eq!(plan.requests.len(), 1);
    assert_eq!(plan.requests[0].count, 1);
    assert_eq!(plan.requests[0].slots, vec![(0, 0), (1, 0)]);
}
