//! Virtual series composition: calendar, aggregation, cost model,
//! stitching.

pub mod aggregate;
pub mod calendar;
pub mod cost;
pub mod stitcher;

pub use aggregate::{aggregate_basket, RawBasketRow};
pub use calendar::{period_window, union_calendar};
pub use cost::{RebalanceCostModel, RebalanceMode};
pub use stitcher::{
    BuildError, BuildParams, BuildReport, SeriesStitcher, VirtualRow, VirtualSeries,
    MIN_SERIES_LEN,
};
