//! CSV-backed instrument store.
//!
//! Layout: `{data_dir}/{CODE}.csv` with header
//! `date,open,high,low,close,volume,adj_close`.
//!
//! Raw OHLC are adjusted at load by the `adj_close / close` ratio, so
//! consumers only ever see adjusted prices. Rows without a usable
//! adjusted close are dropped; a file where no row has one is reported
//! as `MissingAdjClose` and the instrument becomes unavailable.

use super::provider::{DataError, InstrumentBar, InstrumentDataProvider, InstrumentSeries};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    #[serde(default)]
    adj_close: Option<f64>,
}

/// Read-only store over a directory of per-instrument CSV files.
pub struct CsvStore {
    data_dir: PathBuf,
}

impl CsvStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, code: &str) -> PathBuf {
        self.data_dir.join(format!("{code}.csv"))
    }
}

impl InstrumentDataProvider for CsvStore {
    fn name(&self) -> &str {
        "csv-store"
    }

    fn load(
        &self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<InstrumentSeries, DataError> {
        let path = self.path_for(code);
        if !path.exists() {
            return Err(DataError::NotFound {
                code: code.to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| DataError::Io(format!("open {}: {e}", path.display())))?;

        let mut bars = Vec::new();
        let mut saw_adj_close = false;

        for record in reader.deserialize::<CsvRow>() {
            let row = record.map_err(|e| DataError::Format(format!("{code}: {e}")))?;
            let date = NaiveDate::parse_from_str(&row.date, "%Y-%m-%d")
                .map_err(|_| DataError::Format(format!("{code}: bad date '{}'", row.date)))?;
            if date < start || date > end {
                continue;
            }

            let adj_close = match row.adj_close {
                Some(v) if v.is_finite() && v > 0.0 => {
                    saw_adj_close = true;
                    v
                }
                // No usable adjusted close that day: the date is absent
                // for this instrument, not zero.
                _ => continue,
            };

            if !(row.close.is_finite() && row.close > 0.0) {
                continue;
            }
            let ratio = adj_close / row.close;

            bars.push(InstrumentBar {
                date,
                open: row.open * ratio,
                high: row.high * ratio,
                low: row.low * ratio,
                close: adj_close,
                volume: row.volume,
            });
        }

        if !saw_adj_close {
            return Err(DataError::MissingAdjClose {
                code: code.to_string(),
            });
        }

        Ok(InstrumentSeries::new(code, bars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(dir: &Path, code: &str, body: &str) {
        let mut f = std::fs::File::create(dir.join(format!("{code}.csv"))).unwrap();
        writeln!(f, "date,open,high,low,close,volume,adj_close").unwrap();
        write!(f, "{body}").unwrap();
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn loads_and_adjusts_ohlc() {
        let dir = tempfile::tempdir().unwrap();
        // adj_close / close = 0.5: a 2:1 split adjustment
        write_csv(dir.path(), "AAA", "2024-01-02,100.0,110.0,90.0,100.0,1000,50.0\n");

        let store = CsvStore::new(dir.path());
        let series = store.load("AAA", d(1), d(31)).unwrap();

        assert_eq!(series.len(), 1);
        let bar = &series.bars()[0];
        assert!((bar.open - 50.0).abs() < 1e-10);
        assert!((bar.high - 55.0).abs() < 1e-10);
        assert!((bar.low - 45.0).abs() < 1e-10);
        assert!((bar.close - 50.0).abs() < 1e-10);
        assert_eq!(bar.volume, 1000);
    }

    #[test]
    fn filters_to_date_range() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "AAA",
            "2024-01-02,1,1,1,1.0,10,1.0\n2024-01-15,1,1,1,1.0,10,1.0\n2024-02-01,1,1,1,1.0,10,1.0\n",
        );

        let store = CsvStore::new(dir.path());
        let series = store.load("AAA", d(2), d(31)).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvStore::new(dir.path());
        let err = store.load("ZZZ", d(1), d(31)).unwrap_err();
        assert!(matches!(err, DataError::NotFound { .. }));
    }

    #[test]
    fn file_without_adj_close_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("AAA.csv")).unwrap();
        writeln!(f, "date,open,high,low,close,volume").unwrap();
        writeln!(f, "2024-01-02,1,1,1,1.0,10").unwrap();

        let store = CsvStore::new(dir.path());
        let err = store.load("AAA", d(1), d(31)).unwrap_err();
        assert!(matches!(err, DataError::MissingAdjClose { .. }));
    }

    #[test]
    fn rows_without_adj_close_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(
            dir.path(),
            "AAA",
            "2024-01-02,1,1,1,1.0,10,1.0\n2024-01-03,1,1,1,1.0,10,\n",
        );

        let store = CsvStore::new(dir.path());
        let series = store.load("AAA", d(1), d(31)).unwrap();
        assert_eq!(series.len(), 1);
        assert!(series.bar_on(d(3)).is_none());
    }
}
