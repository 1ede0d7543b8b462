//! End-to-end load transform: raw response text in, dashboard model out

use crate::analytics::{aggregate, build_history};
use crate::ingest::{classify_and_normalize, parse_sheet_response};
use sheetfolio_core::{DashboardConfig, DashboardModel, PortfolioHistory, Result, Table};
use tracing::{debug, info};

/// Parse, classify and aggregate one response body.
///
/// Pure: the same text and config always give an equal model.
pub fn build_dashboard(raw_text: &str, config: &DashboardConfig) -> Result<DashboardModel> {
    let table = parse_sheet_response(raw_text)?;
    Ok(build_from_table(&table, config))
}

/// Classify and aggregate an already-parsed table
pub fn build_from_table(table: &Table, config: &DashboardConfig) -> DashboardModel {
    let rows = classify_and_normalize(table, config);
    debug!(
        "Normalized {} transactions and {} summary rows",
        rows.transactions.len(),
        rows.summary_rows.len()
    );

    let aggregation = aggregate(&rows, config);
    info!(
        "Dashboard built: {} assets, {} transactions, value {:.2}, P/L {:.2}",
        aggregation.kpis.asset_count,
        aggregation.kpis.transaction_count,
        aggregation.kpis.total_value,
        aggregation.kpis.total_profit_loss
    );

    DashboardModel {
        layout: rows.layout,
        assets: aggregation.assets,
        transactions: rows.transactions,
        kpis: aggregation.kpis,
        history: None,
    }
}

/// Price history for an existing model, from the history tab's response
pub fn history_for(
    model: &DashboardModel,
    raw_history_text: &str,
    config: &DashboardConfig,
) -> Result<PortfolioHistory> {
    let table = parse_sheet_response(raw_history_text)?;
    Ok(build_history(&table, &model.assets, config))
}

/// Attach price history to a model, consuming it
pub fn attach_history(
    mut model: DashboardModel,
    raw_history_text: &str,
    config: &DashboardConfig,
) -> Result<DashboardModel> {
    model.history = Some(history_for(&model, raw_history_text, config)?);
    Ok(model)
}
