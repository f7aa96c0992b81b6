//! Ambient property: the driver's `-v` repeat count maps to the expected
//! `log` level (SPEC_FULL.md §4.6).

use log::LevelFilter;
use masala::verbosity_to_level;

#[test]
fn no_flag_is_warn() {
    assert_eq!(verbosity_to_level(0), LevelFilter::Warn);
}

#[test]
fn single_v_is_info() {
    assert_eq!(verbosity_to_level(1), LevelFilter::Info);
}

#[test]
fn double_v_is_debug() {
    assert_eq!(verbosity_to_level(2), LevelFilter::Debug);
}

#[test]
fn triple_v_is_trace() {
    assert_eq!(verbosity_to_level(3), LevelFilter::Trace);
}

#[test]
fn beyond_triple_v_stays_at_trace() {
    assert_eq!(verbosity_to_level(9), LevelFilter::Trace);
}
