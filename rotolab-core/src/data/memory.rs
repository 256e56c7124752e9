//! In-memory provider and synthetic series generation.
//!
//! `MemoryProvider` backs tests and embedded callers that already hold
//! their data; `synthetic_series` produces a deterministic random walk
//! per code for development fixtures.

use super::provider::{DataError, InstrumentBar, InstrumentDataProvider, InstrumentSeries};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

/// Provider over a fixed map of code → series.
#[derive(Default)]
pub struct MemoryProvider {
    series: HashMap<String, InstrumentSeries>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(series: impl IntoIterator<Item = InstrumentSeries>) -> Self {
        let mut provider = Self::new();
        for s in series {
            provider.insert(s);
        }
        provider
    }

    pub fn insert(&mut self, series: InstrumentSeries) {
        self.series.insert(series.code.clone(), series);
    }
}

impl InstrumentDataProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentSeries, DataError> {
        let series = self.series.get(code).ok_or_else(|| DataError::NotFound {
            code: code.to_string(),
        })?;
        let bars: Vec<InstrumentBar> = series
            .bars()
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        Ok(InstrumentSeries::new(code, bars))
    }
}

/// Generate a deterministic random-walk series for a code.
///
/// Weekends are skipped. The seed is derived from the code, so the
/// same code always produces the same walk.
pub fn synthetic_series(code: &str, start: NaiveDate, end: NaiveDate) -> InstrumentSeries {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(code.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let daily_return: f64 = rng.gen_range(-0.03..0.03);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(100_000..2_000_000u64);

        bars.push(InstrumentBar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += chrono::Duration::days(1);
    }

    InstrumentSeries::new(code, bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn memory_provider_bounds_range() {
        let series = synthetic_series("AAA", d(1), d(31));
        let provider = MemoryProvider::with_series([series]);

        let loaded = provider.load("AAA", d(10), d(20)).unwrap();
        assert!(loaded.dates().all(|dt| dt >= d(10) && dt <= d(20)));
        assert!(!loaded.is_empty());
    }

    #[test]
    fn memory_provider_unknown_code_fails() {
        let provider = MemoryProvider::new();
        let err = provider.load("ZZZ", d(1), d(31)).unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
    }

    #[test]
    fn synthetic_is_deterministic() {
        let a = synthetic_series("AAA", d(1), d(31));
        let b = synthetic_series("AAA", d(1), d(31));
        assert_eq!(a.len(), b.len());
        for (x, y) in a.bars().iter().zip(b.bars()) {
            assert_eq!(x.date, y.date);
            assert_eq!(x.close, y.close);
        }
    }

    #[test]
    fn different_codes_get_different_walks() {
        let a = synthetic_series("AAA", d(1), d(31));
        let b = synthetic_series("BBB", d(1), d(31));
        assert_ne!(a.bars()[0].close, b.bars()[0].close);
    }

    #[test]
    fn synthetic_skips_weekends() {
        let s = synthetic_series("AAA", d(1), d(31));
        assert!(s
            .dates()
            .all(|dt| dt.weekday() != chrono::Weekday::Sat && dt.weekday() != chrono::Weekday::Sun));
    }
}
