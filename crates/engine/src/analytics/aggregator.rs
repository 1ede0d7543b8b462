//! Per-asset aggregation and portfolio KPIs

use crate::ingest::NormalizedRows;
use sheetfolio_core::{
    AssetSummary, AssetSummarySeed, DashboardConfig, Percent, PortfolioKpis, SheetLayout, Transaction,
    Usd,
};
use std::collections::HashMap;
use tracing::debug;

/// Aggregated assets plus the KPIs derived from them
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub assets: Vec<AssetSummary>,
    pub kpis: PortfolioKpis,
}

/// Running totals for one symbol
#[derive(Debug)]
struct Position<'a> {
    symbol: &'a str,
    quantity: f64,
    invested: Usd,
    value: Usd,
    reported: Option<&'a AssetSummarySeed>,
}

impl<'a> Position<'a> {
    fn new(symbol: &'a str) -> Self {
        Self {
            symbol,
            quantity: 0.0,
            invested: Usd(0.0),
            value: Usd(0.0),
            reported: None,
        }
    }

    /// Invested amount, preferring the sheet-reported total
    fn invested(&self) -> Usd {
        match self.reported {
            Some(seed) if seed.invested > 0.0 => Usd(seed.invested),
            _ => self.invested,
        }
    }

    /// Current value, preferring the sheet-reported mark
    fn current_value(&self, invested: Usd) -> Usd {
        match self.reported {
            Some(seed) if seed.current_value != 0.0 => Usd(seed.current_value),
            Some(seed) if seed.profit_loss != 0.0 && self.value.0 == 0.0 => {
                invested + Usd(seed.profit_loss)
            }
            _ => self.value,
        }
    }

    fn quantity(&self) -> f64 {
        match self.reported {
            Some(seed) if self.quantity == 0.0 => seed.quantity,
            _ => self.quantity,
        }
    }

    fn finish(&self, config: &DashboardConfig) -> Option<AssetSummary> {
        let invested = self.invested();
        let current_value = self.current_value(invested);
        if invested.0 == 0.0 && current_value.0 == 0.0 {
            return None;
        }

        let quantity = self.quantity();
        let average_cost = if quantity != 0.0 {
            invested.0 / quantity
        } else {
            0.0
        };
        let profit_loss = current_value - invested;
        let display = config.display(self.symbol);

        Some(AssetSummary {
            symbol: self.symbol.to_string(),
            name: display.name,
            color: display.color,
            icon: display.icon,
            quantity,
            average_cost,
            invested: invested.as_f64(),
            current_value: current_value.as_f64(),
            profit_loss: profit_loss.as_f64(),
            roi: Percent::roi(profit_loss, invested).as_f64(),
            portfolio_pct: 0.0,
        })
    }
}

/// Fold normalized rows into per-asset summaries and KPIs.
///
/// Transactions are summed per symbol in encounter order; a summary row for
/// the same symbol overrides the summed invested amount and current value
/// with the figures the sheet reports.
pub fn aggregate(rows: &NormalizedRows, config: &DashboardConfig) -> Aggregation {
    let mut order: Vec<Position<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tx in &rows.transactions {
        let i = slot(&tx.symbol, &mut order, &mut index);
        let pos = &mut order[i];
        pos.quantity += tx.quantity;
        pos.invested = pos.invested + Usd(tx.invested);
        pos.value = pos.value + Usd(tx.effective_value());
    }

    for seed in &rows.summary_rows {
        let i = slot(&seed.symbol, &mut order, &mut index);
        order[i].reported = Some(seed);
    }

    let mut assets: Vec<AssetSummary> = order.iter().filter_map(|p| p.finish(config)).collect();

    // sort_by is stable: equal values keep sheet order
    assets.sort_by(|a, b| b.current_value.total_cmp(&a.current_value));
    apply_portfolio_share(&mut assets);

    let kpis = PortfolioKpis::from_parts(&assets, &rows.transactions);
    debug!(
        "Aggregated {} assets: invested {:.2}, value {:.2}",
        kpis.asset_count, kpis.total_invested, kpis.total_value
    );

    Aggregation { assets, kpis }
}

/// Position index for `symbol`, appended in encounter order
fn slot<'a>(
    symbol: &'a str,
    order: &mut Vec<Position<'a>>,
    index: &mut HashMap<&'a str, usize>,
) -> usize {
    if let Some(&i) = index.get(symbol) {
        return i;
    }
    order.push(Position::new(symbol));
    index.insert(symbol, order.len() - 1);
    order.len() - 1
}

/// Aggregate a plain transaction list (no summary rows)
pub fn aggregate_transactions(transactions: &[Transaction], config: &DashboardConfig) -> Aggregation {
    let rows = NormalizedRows {
        layout: SheetLayout::Transaction,
        transactions: transactions.to_vec(),
        summary_rows: Vec::new(),
    };
    aggregate(&rows, config)
}

/// Second pass: share of each asset in the grand total value
fn apply_portfolio_share(assets: &mut [AssetSummary]) {
    let total: Usd = assets.iter().map(|a| Usd(a.current_value)).sum();
    for asset in assets.iter_mut() {
        asset.portfolio_pct = Percent::share(Usd(asset.current_value), total).as_f64();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sheetfolio_core::{ROI_CEILING, ROI_FLOOR};

    fn tx(symbol: &str, invested: f64, value: f64) -> Transaction {
        Transaction {
            date: None,
            symbol: symbol.to_string(),
            invested,
            transaction_type: None,
            order: None,
            exchange: None,
            quantity: 0.0,
            purchase_price: 0.0,
            sale_price: 0.0,
            current_price: 0.0,
            initial_value: invested,
            current_value: value,
            profit_loss: value - invested,
            variation: 0.0,
        }
    }

    fn seed(symbol: &str, invested: f64, value: f64) -> AssetSummarySeed {
        AssetSummarySeed {
            symbol: symbol.to_string(),
            date: None,
            quantity: 0.0,
            invested,
            current_value: value,
            profit_loss: value - invested,
            reported_share: None,
            reported_roi: None,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_two_btc_rows() {
        let config = DashboardConfig::default();
        let agg = aggregate_transactions(&[tx("BTC", 500.0, 550.0), tx("BTC", 300.0, 280.0)], &config);

        assert_eq!(agg.assets.len(), 1);
        let btc = &agg.assets[0];
        assert_eq!(btc.name, "Bitcoin");
        assert!(close(btc.invested, 800.0));
        assert!(close(btc.current_value, 830.0));
        assert!(close(btc.profit_loss, 30.0));
        assert!(close(btc.roi, 3.75));
        assert!(close(btc.portfolio_pct, 100.0));
        assert_eq!(agg.kpis.transaction_count, 2);
    }

    #[test]
    fn test_roi_round_trip() {
        let config = DashboardConfig::default();
        let agg = aggregate_transactions(&[tx("ETH", 1000.0, 1200.0)], &config);
        assert!(close(agg.assets[0].profit_loss, 200.0));
        assert!(close(agg.assets[0].roi, 20.0));
    }

    #[test]
    fn test_value_derived_from_price() {
        let config = DashboardConfig::default();
        let mut a = tx("SOL", 100.0, 0.0);
        a.quantity = 2.0;
        a.current_price = 60.0;
        let mut b = tx("SOL", 50.0, 0.0);
        b.quantity = 1.0;
        b.current_price = 60.0;

        let agg = aggregate_transactions(&[a, b], &config);
        let sol = &agg.assets[0];
        assert!(close(sol.quantity, 3.0));
        assert!(close(sol.current_value, 180.0));
        assert!(close(sol.average_cost, 50.0));
    }

    #[test]
    fn test_zero_quantity_average_cost() {
        let config = DashboardConfig::default();
        let agg = aggregate_transactions(&[tx("BTC", 100.0, 120.0)], &config);
        assert_eq!(agg.assets[0].average_cost, 0.0);
    }

    #[test]
    fn test_reported_figures_take_precedence() {
        let config = DashboardConfig::default();
        let rows = NormalizedRows {
            layout: SheetLayout::Transaction,
            transactions: vec![tx("BTC", 500.0, 550.0), tx("BTC", 300.0, 280.0)],
            summary_rows: vec![seed("BTC", 800.0, 900.0)],
        };
        let agg = aggregate(&rows, &config);
        let btc = &agg.assets[0];
        assert!(close(btc.current_value, 900.0));
        assert!(close(btc.profit_loss, 100.0));
        assert!(close(btc.roi, 12.5));
    }

    #[test]
    fn test_value_from_reported_pl() {
        let config = DashboardConfig::default();
        let mut s = seed("LINK", 200.0, 0.0);
        s.profit_loss = -50.0;
        let rows = NormalizedRows {
            layout: SheetLayout::PeriodicSummary,
            transactions: vec![],
            summary_rows: vec![s],
        };
        let agg = aggregate(&rows, &config);
        assert!(close(agg.assets[0].current_value, 150.0));
        assert!(close(agg.assets[0].roi, -25.0));
    }

    #[test]
    fn test_summary_only_sorted_stable() {
        let config = DashboardConfig::default();
        let rows = NormalizedRows {
            layout: SheetLayout::PeriodicSummary,
            transactions: vec![],
            summary_rows: vec![
                seed("ETH", 100.0, 100.0),
                seed("BTC", 300.0, 400.0),
                seed("SOL", 90.0, 100.0),
                seed("AVAX", 0.0, 0.0),
            ],
        };
        let agg = aggregate(&rows, &config);
        let symbols: Vec<&str> = agg.assets.iter().map(|a| a.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "ETH", "SOL"]);
        assert!(close(agg.assets[0].portfolio_pct, 66.666666));
        assert_eq!(agg.kpis.transaction_count, 0);
    }

    #[test]
    fn test_zero_total_percentages() {
        let config = DashboardConfig::default();
        let agg = aggregate_transactions(&[tx("BTC", 100.0, 0.0), tx("ETH", 50.0, 0.0)], &config);
        assert_eq!(agg.assets.len(), 2);
        assert!(agg.assets.iter().all(|a| a.portfolio_pct == 0.0));
        assert!(agg.assets.iter().all(|a| a.roi == ROI_FLOOR));
    }

    #[test]
    fn test_roi_ceiling() {
        let config = DashboardConfig::default();
        let agg = aggregate_transactions(&[tx("AVAX", 0.01, 5000.0)], &config);
        assert_eq!(agg.assets[0].roi, ROI_CEILING);
    }

    #[test]
    fn test_exchange_count() {
        let config = DashboardConfig::default();
        let mut a = tx("BTC", 10.0, 10.0);
        a.exchange = Some("Binance".to_string());
        let mut b = tx("ETH", 10.0, 10.0);
        b.exchange = Some("Binance".to_string());
        let mut c = tx("SOL", 10.0, 10.0);
        c.exchange = Some("Bybit".to_string());
        let d = tx("LINK", 10.0, 10.0);

        let agg = aggregate_transactions(&[a, b, c, d], &config);
        assert_eq!(agg.kpis.exchange_count, 2);
        assert_eq!(agg.kpis.asset_count, 4);
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let config = DashboardConfig::default();
        let txs = vec![tx("BTC", 500.0, 550.0), tx("ETH", 300.0, 280.0)];
        let first = aggregate_transactions(&txs, &config);
        let second = aggregate_transactions(&txs, &config);
        assert_eq!(first, second);
    }

    const SYMBOLS: [&str; 5] = ["BTC", "ETH", "SOL", "LINK", "AVAX"];

    proptest! {
        #[test]
        fn prop_kpis_match_asset_sums(
            entries in prop::collection::vec((0usize..5, 0.01f64..1e6, 0.0f64..1e6), 1..40)
        ) {
            let config = DashboardConfig::default();
            let txs: Vec<Transaction> = entries
                .iter()
                .map(|(s, inv, val)| tx(SYMBOLS[*s], *inv, *val))
                .collect();
            let agg = aggregate_transactions(&txs, &config);

            let invested: f64 = agg.assets.iter().map(|a| a.invested).sum();
            let value: f64 = agg.assets.iter().map(|a| a.current_value).sum();
            prop_assert!((agg.kpis.total_invested - invested).abs() <= 1e-6 * invested.max(1.0));
            prop_assert!((agg.kpis.total_value - value).abs() <= 1e-6 * value.max(1.0));

            for asset in &agg.assets {
                prop_assert!((asset.profit_loss - (asset.current_value - asset.invested)).abs() < 1e-6 * asset.invested.max(1.0));
                prop_assert!(asset.roi >= ROI_FLOOR && asset.roi <= ROI_CEILING);
            }
        }

        #[test]
        fn prop_percentages_sum_to_hundred(
            entries in prop::collection::vec((0usize..5, 0.01f64..1e6, 0.0f64..1e6), 1..40)
        ) {
            let config = DashboardConfig::default();
            let txs: Vec<Transaction> = entries
                .iter()
                .map(|(s, inv, val)| tx(SYMBOLS[*s], *inv, *val))
                .collect();
            let agg = aggregate_transactions(&txs, &config);

            let total: f64 = agg.assets.iter().map(|a| a.current_value).sum();
            let pct: f64 = agg.assets.iter().map(|a| a.portfolio_pct).sum();
            if total > 0.0 {
                prop_assert!((pct - 100.0).abs() < 1e-6);
            } else {
                prop_assert!(agg.assets.iter().all(|a| a.portfolio_pct == 0.0));
            }
        }

        #[test]
        fn prop_sorted_by_value_desc(
            entries in prop::collection::vec((0usize..5, 0.01f64..1e6, 0.0f64..1e6), 1..40)
        ) {
            let config = DashboardConfig::default();
            let txs: Vec<Transaction> = entries
                .iter()
                .map(|(s, inv, val)| tx(SYMBOLS[*s], *inv, *val))
                .collect();
            let agg = aggregate_transactions(&txs, &config);
            for pair in agg.assets.windows(2) {
                prop_assert!(pair[0].current_value >= pair[1].current_value);
            }
        }
    }
}
