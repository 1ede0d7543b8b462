//! Price history, portfolio curve and drawdown
//!
//! The history tab has a date in the first column and one closing price per
//! asset in the following columns. Headers usually come through as column
//! labels; when the sheet was queried without header detection they show up
//! as the first data row instead.

use crate::ingest::classifier::resolve_symbol;
use crate::ingest::decoder::{decode_date, decode_number, decode_text};
use chrono::NaiveDateTime;
use sheetfolio_core::{
    AssetSummary, DashboardConfig, DrawdownPoint, PortfolioHistory, PricePoint, PriceSeries, Table,
    ValuePoint,
};
use std::collections::BTreeSet;
use tracing::debug;

const DATE_COLUMN: usize = 0;

/// Per-symbol price series from the history table
pub fn parse_price_history(table: &Table, config: &DashboardConfig) -> Vec<PriceSeries> {
    let mut header: Vec<(usize, String)> = table
        .columns
        .iter()
        .enumerate()
        .skip(DATE_COLUMN + 1)
        .filter_map(|(i, col)| resolve_symbol(&col.label, config).map(|s| (i, s)))
        .collect();

    let mut data_rows = &table.rows[..];
    if header.is_empty() {
        if let Some((first, rest)) = table.rows.split_first() {
            header = (DATE_COLUMN + 1..first.cells.len())
                .filter_map(|i| {
                    decode_text(first.cell(i))
                        .and_then(|label| resolve_symbol(&label, config))
                        .map(|s| (i, s))
                })
                .collect();
            data_rows = rest;
        }
    }

    let mut series: Vec<PriceSeries> = header
        .iter()
        .map(|(_, symbol)| PriceSeries {
            symbol: symbol.clone(),
            points: Vec::new(),
        })
        .collect();

    for row in data_rows {
        let Some(date) = decode_date(row.cell(DATE_COLUMN)) else {
            continue;
        };
        for ((col, _), s) in header.iter().zip(series.iter_mut()) {
            let price = decode_number(row.cell(*col));
            if price > 0.0 {
                s.points.push(PricePoint { date, price });
            }
        }
    }

    for s in &mut series {
        s.points.sort_by_key(|p| p.date);
    }
    series.retain(|s| !s.points.is_empty());

    debug!(
        "Price history: {} series over {} rows",
        series.len(),
        data_rows.len()
    );
    series
}

/// Value of the current holdings at every date where all of them are priced
pub fn portfolio_curve(series: &[PriceSeries], assets: &[AssetSummary]) -> Vec<ValuePoint> {
    let held: Vec<(&AssetSummary, &PriceSeries)> = assets
        .iter()
        .filter(|a| a.quantity > 0.0)
        .filter_map(|a| series.iter().find(|s| s.symbol == a.symbol).map(|s| (a, s)))
        .collect();

    if held.is_empty() {
        return Vec::new();
    }

    let dates: BTreeSet<NaiveDateTime> = held
        .iter()
        .flat_map(|(_, s)| s.points.iter().map(|p| p.date))
        .collect();

    dates
        .into_iter()
        .filter_map(|date| {
            held.iter()
                .map(|(asset, s)| s.price_at(date).map(|price| asset.quantity * price))
                .sum::<Option<f64>>()
                .map(|value| ValuePoint { date, value })
        })
        .collect()
}

/// Percent distance of each point below its running peak
pub fn drawdown(curve: &[ValuePoint]) -> Vec<DrawdownPoint> {
    let mut peak = f64::MIN;
    curve
        .iter()
        .map(|point| {
            peak = peak.max(point.value);
            let drawdown_pct = if peak > 0.0 {
                (point.value - peak) / peak * 100.0
            } else {
                0.0
            };
            DrawdownPoint {
                date: point.date,
                drawdown_pct,
            }
        })
        .collect()
}

/// Deepest drawdown, 0 for an empty series
pub fn max_drawdown(points: &[DrawdownPoint]) -> f64 {
    points
        .iter()
        .map(|p| p.drawdown_pct)
        .fold(0.0, f64::min)
}

/// Full history block for the dashboard
pub fn build_history(
    table: &Table,
    assets: &[AssetSummary],
    config: &DashboardConfig,
) -> PortfolioHistory {
    let prices = parse_price_history(table, config);
    let curve = portfolio_curve(&prices, assets);
    let drawdown_points = drawdown(&curve);
    let max_drawdown_pct = max_drawdown(&drawdown_points);

    PortfolioHistory {
        prices,
        curve,
        drawdown: drawdown_points,
        max_drawdown_pct,
    }
}
