//! Union trading calendar across loaded instruments.
//!
//! Instruments list on different dates, delist, and gap independently;
//! the composite series walks the sorted union of all their trading
//! dates and lets per-date availability decide what contributes.

use crate::data::InstrumentSeries;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

/// Sorted union of all trading dates across the loaded series.
pub fn union_calendar(series_by_code: &HashMap<String, InstrumentSeries>) -> Vec<NaiveDate> {
    let mut all_dates = BTreeSet::new();
    for series in series_by_code.values() {
        all_dates.extend(series.dates());
    }
    all_dates.into_iter().collect()
}

/// Calendar dates belonging to one rotation period.
///
/// With a following period the window is `[start, next_start)`; the
/// final period runs through the schedule's end date inclusive.
pub fn period_window(
    calendar: &[NaiveDate],
    start: NaiveDate,
    next_start: Option<NaiveDate>,
    schedule_end: NaiveDate,
) -> &[NaiveDate] {
    let lo = calendar.partition_point(|&d| d < start);
    let hi = match next_start {
        Some(next) => calendar.partition_point(|&d| d < next),
        None => calendar.partition_point(|&d| d <= schedule_end),
    };
    &calendar[lo..hi.max(lo)]
}
