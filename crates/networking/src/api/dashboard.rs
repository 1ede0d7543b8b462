//! Dashboard fetch: portfolio tab plus optional price history

use crate::http::SheetsClient;
use sheetfolio_core::{DashboardConfig, DashboardModel, Error, Result};
use sheetfolio_engine::pipeline::{attach_history, build_dashboard};
use tracing::{info, instrument, warn};

/// Fetch one tab's raw body after validating its name
pub async fn fetch_tab(client: &SheetsClient, sheet_name: &str) -> Result<String> {
    let name = sheet_name.trim();
    if name.is_empty() {
        return Err(Error::InvalidData("sheet name cannot be empty".to_string()));
    }
    client.fetch_sheet(name).await
}

/// Fetch `sheet_name` and build the dashboard model from it.
///
/// The history tab is best effort: any failure there is logged and the
/// model is returned without history.
#[instrument(skip(client, config))]
pub async fn fetch_dashboard(
    client: &SheetsClient,
    config: &DashboardConfig,
    sheet_name: &str,
) -> Result<DashboardModel> {
    let raw = fetch_tab(client, sheet_name).await?;
    let model = build_dashboard(&raw, config)?;

    let history_tab = config.sheets.history.trim();
    if history_tab.is_empty() {
        return Ok(model);
    }

    let raw_history = match fetch_tab(client, history_tab).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Price history unavailable ({}): {}", history_tab, e);
            return Ok(model);
        }
    };

    // attach_history consumes the model, so keep a copy for the fallback
    match attach_history(model.clone(), &raw_history, config) {
        Ok(with_history) => {
            info!("Attached price history from {}", history_tab);
            Ok(with_history)
        }
        Err(e) => {
            warn!("Ignoring unreadable price history ({}): {}", history_tab, e);
            Ok(model)
        }
    }
}
