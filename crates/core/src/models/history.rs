//! Price history and the derived portfolio curve

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDateTime,
    pub price: f64,
}

/// Historical prices of one symbol, sorted by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Last known price at or before `date`
    pub fn price_at(&self, date: NaiveDateTime) -> Option<f64> {
        let idx = self.points.partition_point(|p| p.date <= date);
        idx.checked_sub(1).map(|i| self.points[i].price)
    }
}

/// Portfolio value at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuePoint {
    pub date: NaiveDateTime,
    pub value: f64,
}

/// Distance below the running peak, in percent (always <= 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDateTime,
    pub drawdown_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioHistory {
    pub prices: Vec<PriceSeries>,
    pub curve: Vec<ValuePoint>,
    pub drawdown: Vec<DrawdownPoint>,
    pub max_drawdown_pct: f64,
}
