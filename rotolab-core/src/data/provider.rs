//! Instrument data provider trait and structured error types.
//!
//! The InstrumentDataProvider trait abstracts over data sources (CSV
//! directory, in-memory fixtures) so we can swap implementations and
//! mock for tests. Missing data is modeled as an explicit `Option`
//! lookup, never as a silently propagating NaN.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Daily bar for a single instrument. All OHLC fields are adjusted
/// prices (the CSV store applies the `adj_close / close` ratio to the
/// raw OHLC columns at load).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl InstrumentBar {
    /// Usable for aggregation: finite, positive adjusted close.
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Structured errors for instrument data operations.
///
/// None of these abort a build: the stitcher treats a failing
/// instrument as unavailable and excludes it from all periods.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("instrument not found: {code}")]
    NotFound { code: String },

    #[error("instrument '{code}' has no usable adjusted close column")]
    MissingAdjClose { code: String },

    #[error("format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Date-indexed, chronologically sorted daily series for one code.
#[derive(Debug, Clone)]
pub struct InstrumentSeries {
    pub code: String,
    bars: Vec<InstrumentBar>,
    index: HashMap<NaiveDate, usize>,
}

impl InstrumentSeries {
    /// Build a series from raw bars: sorts by date and drops duplicate
    /// dates, keeping the first occurrence.
    pub fn new(code: impl Into<String>, mut bars: Vec<InstrumentBar>) -> Self {
        bars.sort_by_key(|b| b.date);
        let mut deduped: Vec<InstrumentBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            if deduped.last().map(|b| b.date) != Some(bar.date) {
                deduped.push(bar);
            }
        }
        let index = deduped
            .iter()
            .enumerate()
            .map(|(i, b)| (b.date, i))
            .collect();
        Self {
            code: code.into(),
            bars: deduped,
            index,
        }
    }

    pub fn bars(&self) -> &[InstrumentBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Partial-function lookup: (code, date) → bar-or-absent.
    pub fn bar_on(&self, date: NaiveDate) -> Option<&InstrumentBar> {
        self.index.get(&date).map(|&i| &self.bars[i])
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }
}

/// Trait for instrument data providers.
///
/// Implementations return a date-range-bounded, sorted daily series
/// for one code, or a `DataError` the caller may recover from.
pub trait InstrumentDataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Load the daily series for `code` over `[start, end]`.
    fn load(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentSeries, DataError>;
}
