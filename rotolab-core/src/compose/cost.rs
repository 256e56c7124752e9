//! Rebalance cost model.
//!
//! A one-time fraction of portfolio value charged at each period
//! boundary. Full liquidation always sells the whole old basket and
//! buys the whole new one; incremental rebalancing trades only the
//! symmetric difference, so high overlap costs proportionally less.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Rebalancing policy at period boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceMode {
    FullLiquidation,
    Incremental,
}

impl fmt::Display for RebalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullLiquidation => write!(f, "full_liquidation"),
            Self::Incremental => write!(f, "incremental"),
        }
    }
}

impl FromStr for RebalanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" | "full_liquidation" => Ok(Self::FullLiquidation),
            "incremental" => Ok(Self::Incremental),
            other => Err(format!(
                "unknown rebalance mode '{other}' (expected 'full_liquidation' or 'incremental')"
            )),
        }
    }
}

/// Computes the cost fraction for a basket rotation.
#[derive(Debug, Clone)]
pub struct RebalanceCostModel {
    /// One-sided trading cost fraction (e.g. 0.003 = 0.3% per side).
    pub trading_cost_pct: f64,
    pub mode: RebalanceMode,
}

impl RebalanceCostModel {
    pub fn new(mode: RebalanceMode, trading_cost_pct: f64) -> Self {
        Self {
            trading_cost_pct,
            mode,
        }
    }

    /// Cost fraction charged on the first emitted row of a period.
    ///
    /// With no previous basket the charge is one-sided (initial
    /// purchase only), independent of mode. The incremental turnover
    /// ratio divides by the *current* basket size — kept exactly as
    /// specified, even though it is sensitive to basket-size changes.
    pub fn period_cost(
        &self,
        previous: Option<&BTreeSet<String>>,
        current: &BTreeSet<String>,
    ) -> f64 {
        let Some(prev) = previous else {
            return self.trading_cost_pct;
        };

        let cost = match self.mode {
            RebalanceMode::FullLiquidation => 2.0 * self.trading_cost_pct,
            RebalanceMode::Incremental => {
                if current.is_empty() {
                    return 0.0;
                }
                let removed = prev.difference(current).count();
                let added = current.difference(prev).count();
                let turnover = (removed + added) as f64 / (2.0 * current.len() as f64);
                2.0 * turnover * self.trading_cost_pct
            }
        };
        // A cost fraction cannot exceed the whole portfolio.
        cost.min(1.0)
    }
}
