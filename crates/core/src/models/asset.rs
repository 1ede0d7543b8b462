//! Per-asset positions

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Figures reported by a per-asset summary row, before aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummarySeed {
    pub symbol: String,
    /// Block date for periodic-summary sheets
    pub date: Option<NaiveDateTime>,
    pub quantity: f64,
    pub invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    /// Portfolio share as reported by the sheet, in percent
    pub reported_share: Option<f64>,
    /// ROI as reported by the sheet, in percent (kept for reference only)
    pub reported_roi: Option<f64>,
}

impl AssetSummarySeed {
    pub fn is_blank(&self) -> bool {
        self.quantity == 0.0
            && self.invested == 0.0
            && self.current_value == 0.0
            && self.profit_loss == 0.0
    }
}

/// Aggregated position for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSummary {
    pub symbol: String,
    pub name: String,
    pub color: String,
    pub icon: String,
    pub quantity: f64,
    pub average_cost: f64,
    pub invested: f64,
    pub current_value: f64,
    pub profit_loss: f64,
    pub roi: f64,
    pub portfolio_pct: f64,
}
