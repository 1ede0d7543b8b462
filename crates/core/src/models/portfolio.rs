//! Portfolio-wide KPIs and the dashboard snapshot

use super::{AssetSummary, PortfolioHistory, Transaction};
use crate::types::{Percent, Usd};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column layout of the source sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetLayout {
    /// One row per trade, with inline per-asset total rows
    Transaction,
    /// Dated blocks of one row per asset plus a trailing TOTAL row
    PeriodicSummary,
}

/// Derived portfolio scalars for the KPI cards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioKpis {
    pub total_invested: f64,
    pub total_value: f64,
    pub total_profit_loss: f64,
    pub total_roi: f64,
    pub asset_count: usize,
    pub transaction_count: usize,
    pub exchange_count: usize,
}

impl PortfolioKpis {
    /// Compute KPIs from the aggregated assets and the raw transaction list
    pub fn from_parts(assets: &[AssetSummary], transactions: &[Transaction]) -> Self {
        let total_invested: Usd = assets.iter().map(|a| Usd(a.invested)).sum();
        let total_value: Usd = assets.iter().map(|a| Usd(a.current_value)).sum();
        let total_profit_loss: Usd = assets.iter().map(|a| Usd(a.profit_loss)).sum();

        let exchanges: HashSet<&str> = transactions
            .iter()
            .filter_map(Transaction::exchange_name)
            .collect();

        Self {
            total_invested: total_invested.as_f64(),
            total_value: total_value.as_f64(),
            total_profit_loss: total_profit_loss.as_f64(),
            total_roi: Percent::ratio(total_profit_loss, total_invested).as_f64(),
            asset_count: assets.len(),
            transaction_count: transactions.len(),
            exchange_count: exchanges.len(),
        }
    }
}

/// Everything the rendering layer reads for one load cycle.
///
/// A pure function of the fetched text; the fetch time is tracked by
/// whoever stores the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardModel {
    pub layout: SheetLayout,
    pub assets: Vec<AssetSummary>,
    pub transactions: Vec<Transaction>,
    pub kpis: PortfolioKpis,
    #[serde(default)]
    pub history: Option<PortfolioHistory>,
}

impl DashboardModel {
    pub fn asset(&self, symbol: &str) -> Option<&AssetSummary> {
        self.assets.iter().find(|a| a.symbol == symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(symbol: &str, invested: f64, current_value: f64) -> AssetSummary {
        AssetSummary {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            color: "#888".to_string(),
            icon: "●".to_string(),
            quantity: 1.0,
            average_cost: invested,
            invested,
            current_value,
            profit_loss: current_value - invested,
            roi: 0.0,
            portfolio_pct: 0.0,
        }
    }

    #[test]
    fn test_kpis_from_parts() {
        let assets = vec![asset("BTC", 1000.0, 1200.0), asset("ETH", 500.0, 400.0)];
        let kpis = PortfolioKpis::from_parts(&assets, &[]);

        assert_eq!(kpis.total_invested, 1500.0);
        assert_eq!(kpis.total_value, 1600.0);
        assert_eq!(kpis.total_profit_loss, 100.0);
        assert!((kpis.total_roi - 100.0 / 15.0).abs() < 1e-9);
        assert_eq!(kpis.asset_count, 2);
        assert_eq!(kpis.exchange_count, 0);
    }

    #[test]
    fn test_kpis_empty_portfolio() {
        let kpis = PortfolioKpis::from_parts(&[], &[]);
        assert_eq!(kpis, PortfolioKpis::default());
    }
}
