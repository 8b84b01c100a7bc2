// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    first_holding  = { 40001, Family::Holding,  0 },
    mid_holding    = { 40010, Family::Holding,  9 },
    last_holding   = { 49999, Family::Holding,  9998 },
    first_input    = { 30001, Family::Input,    0 },
    last_input     = { 39999, Family::Input,    9998 },
    first_coil     = { 10001, Family::Coil,     0 },
    last_coil      = { 19999, Family::Coil,     9998 },
    first_discrete = { 1,     Family::Discrete, 0 },
    last_discrete  = { 9999,  Family::Discrete, 9998 },
    zero_based     = { 0,     Family::Holding,  0 },
)]
fn normalizes_display_ranges(display: i64, family: Family, offset: u16) {
    let wire = normalize(display).unwrap();
    assert_eq!(wire.family, family);
    assert_eq!(wire.offset, offset);
    assert_eq!(wire.display, display);
}

#[yare::parameterized(
    below_holding = { 40000 },
    range_hole    = { 25000 },
    above_holding = { 50000 },
    negative      = { -1 },
)]
fn rejects_uncovered_addresses(display: i64) {
    assert!(normalize(display).is_err());
}

#[test]
fn function_codes_and_caps() {
    assert_eq!(Family::Coil.function_code(), 1);
    assert_eq!(Family::Discrete.function_code(), 2);
    assert_eq!(Family::Holding.function_code(), 3);
    assert_eq!(Family::Input.function_code(), 4);

    assert_eq!(Family::Holding.read_cap(), 125);
    assert_eq!(Family::Input.read_cap(), 125);
    assert_eq!(Family::Coil.read_cap(), 2000);
    assert_eq!(Family::Discrete.read_cap(), 2000);
    assert!(Family::Coil.is_bit());
    assert!(!Family::Input.is_bit());
}
