//! Virtual series stitching — the chronological fold over rotation
//! periods.
//!
//! Each period's raw equal-weighted trajectory is rescaled onto a
//! continuous price axis anchored to the previous period's ending
//! close, minus the explicit rebalance cost. The scale factor uses
//! only the period's *first* valid close, so no value at date `d`
//! depends on data after `d` — continuity without look-ahead.

use crate::compose::aggregate::aggregate_basket;
use crate::compose::calendar::{period_window, union_calendar};
use crate::compose::cost::{RebalanceCostModel, RebalanceMode};
use crate::data::{InstrumentDataProvider, InstrumentSeries};
use crate::schedule::RotationSchedule;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::Write;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;

/// Minimum rows an instrument series needs to participate in a run.
pub const MIN_SERIES_LEN: usize = 10;

/// One row of the composed virtual series, in continuous price units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Basket members with data on this date.
    pub active_count: usize,
    /// Cost fraction charged this day; non-zero only on the first
    /// emitted row of a period.
    pub rebalance_cost: f64,
}

/// Build-time parameters. Construction parameters (schedule, provider)
/// live on the stitcher itself.
#[derive(Debug, Clone, Copy)]
pub struct BuildParams {
    pub mode: RebalanceMode,
    /// One-sided trading cost fraction.
    pub trading_cost_pct: f64,
    /// Starting price of the virtual series.
    pub base_price: f64,
}

impl Default for BuildParams {
    fn default() -> Self {
        Self {
            mode: RebalanceMode::Incremental,
            trading_cost_pct: 0.003,
            base_price: 1000.0,
        }
    }
}

/// Non-fatal diagnostics accumulated during a build.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Codes excluded from the whole run, with the reason.
    pub unavailable: Vec<(String, String)>,
    /// Period starts that contributed zero rows.
    pub skipped_periods: Vec<NaiveDate>,
    /// Human-readable warnings, in the order they occurred.
    pub warnings: Vec<String>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no valid output rows: every period was empty or unavailable")]
    NoValidOutput,
}

/// The composed series plus its build diagnostics.
#[derive(Debug, Clone)]
pub struct VirtualSeries {
    /// Date-sorted rows; every close is finite.
    pub rows: Vec<VirtualRow>,
    pub report: BuildReport,
}

impl VirtualSeries {
    /// Deterministic BLAKE3 hash over all row fields, for idempotence
    /// checks and run fingerprinting.
    pub fn series_hash(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for row in &self.rows {
            hasher.update(row.date.to_string().as_bytes());
            hasher.update(&row.open.to_le_bytes());
            hasher.update(&row.high.to_le_bytes());
            hasher.update(&row.low.to_le_bytes());
            hasher.update(&row.close.to_le_bytes());
            hasher.update(&row.volume.to_le_bytes());
            hasher.update(&(row.active_count as u64).to_le_bytes());
            hasher.update(&row.rebalance_cost.to_le_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Write the series as CSV for the downstream backtest engine.
    pub fn to_csv(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        writeln!(
            file,
            "date,open,high,low,close,volume,rebalance_cost,active_count"
        )?;
        for row in &self.rows {
            writeln!(
                file,
                "{},{:.6},{:.6},{:.6},{:.6},{},{:.6},{}",
                row.date,
                row.open,
                row.high,
                row.low,
                row.close,
                row.volume,
                row.rebalance_cost,
                row.active_count
            )?;
        }
        Ok(())
    }
}

/// Instrument data loaded once per stitcher, shared across builds.
#[derive(Debug)]
struct LoadedData {
    series: HashMap<String, InstrumentSeries>,
    calendar: Vec<NaiveDate>,
    unavailable: Vec<(String, String)>,
}

/// Orchestrates schedule + provider into a continuous virtual series.
///
/// Series are loaded lazily on the first `build()` and cached for the
/// stitcher's lifetime; repeated builds with different cost parameters
/// reuse them. All fold state (baseline price, previous basket) is
/// local to one `build()` call.
pub struct SeriesStitcher<P> {
    schedule: RotationSchedule,
    provider: P,
    loaded: OnceLock<LoadedData>,
}

impl<P: InstrumentDataProvider> SeriesStitcher<P> {
    pub fn new(schedule: RotationSchedule, provider: P) -> Self {
        Self {
            schedule,
            provider,
            loaded: OnceLock::new(),
        }
    }

    pub fn schedule(&self) -> &RotationSchedule {
        &self.schedule
    }

    /// Load every code the schedule mentions, in parallel. Failures
    /// and short histories exclude the code from the whole run.
    fn load_all(&self) -> LoadedData {
        let codes = self.schedule.all_codes();
        let provider = &self.provider;
        let (start, end) = (self.schedule.start_date, self.schedule.end_date);

        let results: Vec<(String, Result<InstrumentSeries, crate::data::DataError>)> = codes
            .into_par_iter()
            .map(|code| {
                let result = provider.load(&code, start, end);
                (code, result)
            })
            .collect();

        let mut series = HashMap::new();
        let mut unavailable = Vec::new();
        for (code, result) in results {
            match result {
                Ok(s) if s.len() >= MIN_SERIES_LEN => {
                    series.insert(code, s);
                }
                Ok(s) => {
                    unavailable.push((
                        code,
                        format!("only {} rows (minimum {MIN_SERIES_LEN})", s.len()),
                    ));
                }
                Err(e) => {
                    unavailable.push((code, e.to_string()));
                }
            }
        }

        for (code, reason) in &unavailable {
            eprintln!("WARNING: excluding instrument {code}: {reason}");
        }

        let calendar = union_calendar(&series);
        LoadedData {
            series,
            calendar,
            unavailable,
        }
    }

    /// Compose the virtual series.
    ///
    /// Walks periods chronologically; per period: filter the basket to
    /// available codes, compute the cost on *nominal* membership,
    /// aggregate, rescale onto the cost-adjusted baseline, emit. A
    /// period with no available codes or no valid date contributes
    /// nothing and leaves the baseline and the held basket unchanged.
    pub fn build(&self, params: &BuildParams) -> Result<VirtualSeries, BuildError> {
        let loaded = self.loaded.get_or_init(|| self.load_all());
        let cost_model = RebalanceCostModel::new(params.mode, params.trading_cost_pct);

        let mut report = BuildReport {
            unavailable: loaded.unavailable.clone(),
            ..Default::default()
        };
        let mut rows: Vec<VirtualRow> = Vec::new();
        let mut baseline = params.base_price;
        let mut previous_codes: Option<BTreeSet<String>> = None;

        for (i, period) in self.schedule.periods.iter().enumerate() {
            let next_start = self.schedule.periods.get(i + 1).map(|p| p.start);
            let dates = period_window(
                &loaded.calendar,
                period.start,
                next_start,
                self.schedule.end_date,
            );

            let available: Vec<String> = period
                .codes
                .iter()
                .filter(|c| loaded.series.contains_key(*c))
                .cloned()
                .collect();
            if available.is_empty() {
                skip_period(&mut report, period.start, "no available instruments");
                continue;
            }

            // Cost reflects the scheduled membership change, not what
            // the data happened to cover.
            let nominal: BTreeSet<String> = period.codes.iter().cloned().collect();
            let cost = cost_model.period_cost(previous_codes.as_ref(), &nominal);
            let adjusted_baseline = baseline * (1.0 - cost);

            let raw = aggregate_basket(&loaded.series, &available, dates);
            let Some(first) = raw.first() else {
                skip_period(&mut report, period.start, "no overlapping trading dates");
                continue;
            };

            let scale = adjusted_baseline / first.close;
            let first_date = first.date;

            for r in &raw {
                rows.push(VirtualRow {
                    date: r.date,
                    open: r.open * scale,
                    high: r.high * scale,
                    low: r.low * scale,
                    close: r.close * scale,
                    volume: r.volume,
                    active_count: r.active_count,
                    rebalance_cost: if r.date == first_date { cost } else { 0.0 },
                });
            }

            // Carry the last emitted close forward, even through gaps.
            baseline = raw.last().map(|r| r.close * scale).unwrap_or(baseline);
            previous_codes = Some(nominal);
        }

        // Defensive: the aggregator never emits a closeless row, but the
        // output invariant is non-negotiable.
        rows.retain(|r| r.close.is_finite());
        rows.sort_by_key(|r| r.date);

        if rows.is_empty() {
            return Err(BuildError::NoValidOutput);
        }
        Ok(VirtualSeries { rows, report })
    }
}

fn skip_period(report: &mut BuildReport, start: NaiveDate, reason: &str) {
    let msg = format!("skipping period {start}: {reason}");
    eprintln!("WARNING: {msg}");
    report.skipped_periods.push(start);
    report.warnings.push(msg);
}
