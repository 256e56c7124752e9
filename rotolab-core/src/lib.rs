//! RotoLab Core — rotation schedule loading, instrument data layer,
//! equal-weight basket aggregation, and virtual series stitching.
//!
//! The crate turns a time-varying basket of instruments (a "rotation
//! schedule") into one continuous OHLCV series that a bar-by-bar
//! backtest engine can consume like an ordinary instrument:
//! - `schedule` — the period → basket mapping and its loader
//! - `data` — provider trait, CSV store, in-memory provider
//! - `compose` — per-period aggregation, rebalance costs, stitching
//! - `config` — TOML run configuration

pub mod compose;
pub mod config;
pub mod data;
pub mod schedule;
