//! Mapping instants to (weekday, hour) slots.
//!
//! UTC only. Weekdays count from Monday = 0; the Unix epoch
//! (1970-01-01T00:00:00Z) fell on a Thursday, so it resolves to
//! `(Weekday::THURSDAY, 0)`.

use curfew_types::{Hour, Timestamp, Weekday};

pub const SECS_PER_DAY: u64 = 86_400;
pub const SECS_PER_HOUR: u64 = 3_600;

/// Weekday index of day 0 (1970-01-01, a Thursday).
pub const EPOCH_WEEKDAY: u64 = 3;

/// Returns the UTC weekday containing `ts`.
pub fn weekday_of(ts: Timestamp) -> Weekday {
    let days = ts.as_secs() / SECS_PER_DAY;
    Weekday::from_index_wrapping(days + EPOCH_WEEKDAY)
}

/// Returns the UTC hour of day containing `ts`.
pub fn hour_of(ts: Timestamp) -> Hour {
    Hour::from_index_wrapping((ts.as_secs() % SECS_PER_DAY) / SECS_PER_HOUR)
}

/// Returns both coordinates of `ts`.
pub fn resolve(ts: Timestamp) -> (Weekday, Hour) {
    (weekday_of(ts), hour_of(ts))
}
