//! Equal-weighted basket aggregation for one rotation period.
//!
//! For every period date, the bar is the unweighted arithmetic mean of
//! the adjusted OHLC of the basket members that actually have data
//! that day. The weight is 1/N over that day's survivors, not the
//! nominal basket size, so missing members implicitly redistribute
//! their weight. A date with zero coverage produces no row at all.

use crate::data::InstrumentSeries;
use chrono::NaiveDate;
use std::collections::HashMap;

/// One basket-local (unscaled) OHLCV row.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBasketRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Number of basket members with data on this date.
    pub active_count: usize,
}

/// Aggregate a basket of codes over the period's calendar dates.
///
/// Output is sorted by date and contains only dates where at least one
/// member had a valid bar.
pub fn aggregate_basket(
    series_by_code: &HashMap<String, InstrumentSeries>,
    codes: &[String],
    period_dates: &[NaiveDate],
) -> Vec<RawBasketRow> {
    let mut rows = Vec::with_capacity(period_dates.len());

    for &date in period_dates {
        let mut open = 0.0;
        let mut high = 0.0;
        let mut low = 0.0;
        let mut close = 0.0;
        let mut volume: u64 = 0;
        let mut active = 0usize;

        for code in codes {
            let Some(series) = series_by_code.get(code) else {
                continue;
            };
            let Some(bar) = series.bar_on(date) else {
                continue;
            };
            if !bar.is_valid() {
                continue;
            }
            open += bar.open;
            high += bar.high;
            low += bar.low;
            close += bar.close;
            volume += bar.volume;
            active += 1;
        }

        if active == 0 {
            continue;
        }

        let n = active as f64;
        rows.push(RawBasketRow {
            date,
            open: open / n,
            high: high / n,
            low: low / n,
            close: close / n,
            volume,
            active_count: active,
        });
    }

    rows
}
