//! Rotation schedule loading and validation.
//!
//! The schedule file is a JSON document produced by an upstream basket
//! selection process (this crate only consumes it):
//!
//! ```json
//! {
//!   "metadata": { "start_date": "2020-01-02", "end_date": "2024-12-30",
//!                 "rotation_count": 20 },
//!   "schedule": { "2020-01-02": ["005930", "000660"],
//!                 "2020-04-01": ["005930", "035420"] }
//! }
//! ```
//!
//! Period start dates must be distinct; the loaded schedule keeps them
//! in chronological order.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

const DATE_FMT: &str = "%Y-%m-%d";

/// Structured errors for schedule loading. All of these are fatal:
/// a malformed schedule aborts the run.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("failed to read schedule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed schedule JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("metadata field '{0}' is missing")]
    MissingMetadata(&'static str),

    #[error("schedule contains no periods")]
    EmptySchedule,

    #[error("unparseable period start date '{0}' (expected YYYY-MM-DD)")]
    BadDate(String),

    #[error("duplicate period start date {0}")]
    DuplicatePeriod(NaiveDate),

    #[error("period {0} has an empty basket")]
    EmptyBasket(NaiveDate),
}

/// One rotation period: the basket held from `start` until the next
/// period's start (or the schedule's end date for the final period).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPeriod {
    pub start: NaiveDate,
    /// Instrument codes, first-occurrence order, duplicates removed.
    pub codes: Vec<String>,
}

/// Immutable rotation schedule: metadata plus chronologically ordered
/// periods. Period starts are strictly increasing and every basket is
/// non-empty at load time (availability filtering happens later, in
/// the stitcher).
#[derive(Debug, Clone)]
pub struct RotationSchedule {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rotation_count: u32,
    pub periods: Vec<RotationPeriod>,
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    metadata: Option<RawMetadata>,
    #[serde(default)]
    schedule: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    start_date: Option<String>,
    end_date: Option<String>,
    rotation_count: Option<u32>,
}

impl RotationSchedule {
    /// Load and validate a schedule from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ScheduleError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a schedule from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ScheduleError> {
        let file: ScheduleFile = serde_json::from_str(content)?;

        let meta = file
            .metadata
            .ok_or(ScheduleError::MissingMetadata("metadata"))?;
        let start_date = parse_date(
            &meta
                .start_date
                .ok_or(ScheduleError::MissingMetadata("start_date"))?,
        )?;
        let end_date = parse_date(
            &meta
                .end_date
                .ok_or(ScheduleError::MissingMetadata("end_date"))?,
        )?;
        let rotation_count = meta
            .rotation_count
            .ok_or(ScheduleError::MissingMetadata("rotation_count"))?;

        if file.schedule.is_empty() {
            return Err(ScheduleError::EmptySchedule);
        }

        // Re-key by parsed date. String keys already sort chronologically
        // for ISO dates, but parsing may collapse differently-spelled keys
        // onto the same date, which we reject.
        let mut by_date: BTreeMap<NaiveDate, Vec<String>> = BTreeMap::new();
        for (key, codes) in file.schedule {
            let date = parse_date(&key)?;
            if by_date.insert(date, codes).is_some() {
                return Err(ScheduleError::DuplicatePeriod(date));
            }
        }

        let mut periods = Vec::with_capacity(by_date.len());
        for (start, mut codes) in by_date {
            let mut seen = BTreeSet::new();
            codes.retain(|c| seen.insert(c.clone()));
            if codes.is_empty() {
                return Err(ScheduleError::EmptyBasket(start));
            }
            periods.push(RotationPeriod { start, codes });
        }

        Ok(Self {
            start_date,
            end_date,
            rotation_count,
            periods,
        })
    }

    /// Deduplicated, sorted union of codes across all periods,
    /// for bulk loading.
    pub fn all_codes(&self) -> Vec<String> {
        let set: BTreeSet<&String> = self.periods.iter().flat_map(|p| p.codes.iter()).collect();
        set.into_iter().cloned().collect()
    }

    pub fn period_count(&self) -> usize {
        self.periods.len()
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|_| ScheduleError::BadDate(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{
        "metadata": { "start_date": "2024-01-02", "end_date": "2024-06-28", "rotation_count": 2 },
        "schedule": {
            "2024-01-02": ["AAA", "BBB"],
            "2024-04-01": ["BBB", "CCC", "BBB"]
        }
    }"#;

    #[test]
    fn loads_valid_schedule() {
        let s = RotationSchedule::from_json(VALID).unwrap();
        assert_eq!(s.start_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(s.end_date, NaiveDate::from_ymd_opt(2024, 6, 28).unwrap());
        assert_eq!(s.rotation_count, 2);
        assert_eq!(s.period_count(), 2);
        assert_eq!(s.periods[0].codes, vec!["AAA", "BBB"]);
    }

    #[test]
    fn periods_are_chronological() {
        let json = r#"{
            "metadata": { "start_date": "2024-01-02", "end_date": "2024-12-31", "rotation_count": 2 },
            "schedule": {
                "2024-07-01": ["CCC"],
                "2024-01-02": ["AAA"]
            }
        }"#;
        let s = RotationSchedule::from_json(json).unwrap();
        assert!(s.periods[0].start < s.periods[1].start);
        assert_eq!(s.periods[0].codes, vec!["AAA"]);
    }

    #[test]
    fn within_period_duplicates_removed() {
        let s = RotationSchedule::from_json(VALID).unwrap();
        assert_eq!(s.periods[1].codes, vec!["BBB", "CCC"]);
    }

    #[test]
    fn all_codes_is_sorted_union() {
        let s = RotationSchedule::from_json(VALID).unwrap();
        assert_eq!(s.all_codes(), vec!["AAA", "BBB", "CCC"]);
    }

    #[test]
    fn missing_metadata_field_fails() {
        let json = r#"{
            "metadata": { "start_date": "2024-01-02", "end_date": "2024-06-28" },
            "schedule": { "2024-01-02": ["AAA"] }
        }"#;
        let err = RotationSchedule::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ScheduleError::MissingMetadata("rotation_count")
        ));
    }

    #[test]
    fn missing_metadata_block_fails() {
        let json = r#"{ "schedule": { "2024-01-02": ["AAA"] } }"#;
        let err = RotationSchedule::from_json(json).unwrap_err();
        assert!(matches!(err, ScheduleError::MissingMetadata("metadata")));
    }

    #[test]
    fn empty_schedule_fails() {
        let json = r#"{
            "metadata": { "start_date": "2024-01-02", "end_date": "2024-06-28", "rotation_count": 0 },
            "schedule": {}
        }"#;
        let err = RotationSchedule::from_json(json).unwrap_err();
        assert!(matches!(err, ScheduleError::EmptySchedule));
    }

    #[test]
    fn empty_basket_fails() {
        let json = r#"{
            "metadata": { "start_date": "2024-01-02", "end_date": "2024-06-28", "rotation_count": 1 },
            "schedule": { "2024-01-02": [] }
        }"#;
        let err = RotationSchedule::from_json(json).unwrap_err();
        assert!(matches!(err, ScheduleError::EmptyBasket(_)));
    }

    #[test]
    fn bad_date_fails() {
        let json = r#"{
            "metadata": { "start_date": "2024-01-02", "end_date": "2024-06-28", "rotation_count": 1 },
            "schedule": { "not-a-date": ["AAA"] }
        }"#;
        let err = RotationSchedule::from_json(json).unwrap_err();
        assert!(matches!(err, ScheduleError::BadDate(_)));
    }
}
