//! Unit tests for scheduler interval handling

use alphasignal::core::scheduler::generation_period;
use std::time::Duration;

#[test]
fn period_matches_interval_exactly() {
    // Intervals that do not divide evenly into minutes or hours must still
    // tick at their configured spacing
    assert_eq!(generation_period(90).unwrap(), Duration::from_secs(90));
    assert_eq!(generation_period(7200).unwrap(), Duration::from_secs(7200));
}

#[test]
fn sub_minute_interval_is_kept() {
    assert_eq!(generation_period(45).unwrap(), Duration::from_secs(45));
}

#[test]
fn zero_interval_is_rejected() {
    assert!(generation_period(0).is_err());
}
