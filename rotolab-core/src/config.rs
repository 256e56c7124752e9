//! Serializable compose-run configuration (TOML).
//!
//! A config file bundles the construction and build parameters so a
//! run can be reproduced from one artifact:
//!
//! ```toml
//! [schedule]
//! path = "schedules/momentum_20.json"
//!
//! [data]
//! dir = "data"
//!
//! [build]
//! mode = "INCREMENTAL"
//! trading_cost_pct = 0.003
//! base_price = 1000.0
//!
//! [output]
//! path = "virtual_series.csv"
//! ```

use crate::compose::{BuildParams, RebalanceMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    pub schedule: ScheduleSection,
    pub data: DataSection,
    #[serde(default)]
    pub build: BuildSection,
    pub output: Option<OutputSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSection {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSection {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default = "default_mode")]
    pub mode: RebalanceMode,
    #[serde(default = "default_cost")]
    pub trading_cost_pct: f64,
    #[serde(default = "default_base_price")]
    pub base_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: PathBuf,
}

fn default_mode() -> RebalanceMode {
    RebalanceMode::Incremental
}

fn default_cost() -> f64 {
    0.003
}

fn default_base_price() -> f64 {
    1000.0
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            trading_cost_pct: default_cost(),
            base_price: default_base_price(),
        }
    }
}

impl BuildSection {
    pub fn to_params(&self) -> BuildParams {
        BuildParams {
            mode: self.mode,
            trading_cost_pct: self.trading_cost_pct,
            base_price: self.base_price,
        }
    }
}

impl ComposeConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read config file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse config TOML: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_roundtrips() {
        let toml_str = r#"
            [schedule]
            path = "schedules/momentum.json"

            [data]
            dir = "data"

            [build]
            mode = "FULL_LIQUIDATION"
            trading_cost_pct = 0.001
            base_price = 500.0

            [output]
            path = "out.csv"
        "#;
        let cfg = ComposeConfig::from_toml(toml_str).unwrap();
        assert_eq!(cfg.build.mode, RebalanceMode::FullLiquidation);
        assert_eq!(cfg.build.trading_cost_pct, 0.001);
        assert_eq!(cfg.build.base_price, 500.0);
        assert_eq!(cfg.output.unwrap().path, PathBuf::from("out.csv"));
    }

    #[test]
    fn build_section_defaults_apply() {
        let toml_str = r#"
            [schedule]
            path = "s.json"

            [data]
            dir = "data"
        "#;
        let cfg = ComposeConfig::from_toml(toml_str).unwrap();
        let params = cfg.build.to_params();
        assert_eq!(params.mode, RebalanceMode::Incremental);
        assert_eq!(params.trading_cost_pct, 0.003);
        assert_eq!(params.base_price, 1000.0);
        assert!(cfg.output.is_none());
    }
}
