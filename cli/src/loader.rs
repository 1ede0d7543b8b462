//! Load cycle: fetch, build, remember, and fall back to the last good snapshot

use chrono::{DateTime, Utc};
use serde::Serialize;
use sheetfolio_core::{DashboardConfig, DashboardModel, Error, Result};
use sheetfolio_networking::{fetch_dashboard, SheetsClient};
use sheetfolio_persistence::{
    latest_snapshot, prune_snapshots, save_snapshot, CachedSnapshot, Database, SnapshotCache,
};
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

/// Snapshots kept per sheet in the database
pub const DEFAULT_KEEP_SNAPSHOTS: u32 = 50;

/// Connection state shown next to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    #[serde(rename = "online")]
    Online,
    #[serde(rename = "offline (cached)")]
    OfflineCached,
    #[serde(rename = "error")]
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncStatus::Online => "online",
            SyncStatus::OfflineCached => "offline (cached)",
            SyncStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// Result of one load cycle
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// Freshly fetched and built
    Fresh(CachedSnapshot),
    /// Refresh failed; serving the last stored snapshot
    Cached { snapshot: CachedSnapshot, reason: String },
    /// The sheet answered with no rows
    NoData { reason: String },
    /// Nothing to show
    Failed { reason: String },
}

impl LoadOutcome {
    pub fn status(&self) -> SyncStatus {
        match self {
            LoadOutcome::Fresh(_) | LoadOutcome::NoData { .. } => SyncStatus::Online,
            LoadOutcome::Cached { .. } => SyncStatus::OfflineCached,
            LoadOutcome::Failed { .. } => SyncStatus::Error,
        }
    }

    pub fn snapshot(&self) -> Option<&CachedSnapshot> {
        match self {
            LoadOutcome::Fresh(snapshot) | LoadOutcome::Cached { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, LoadOutcome::Cached { .. })
    }

    /// Serializable view for stdout
    pub fn report(&self) -> LoadReport<'_> {
        let message = match self {
            LoadOutcome::Fresh(_) => None,
            LoadOutcome::Cached { reason, .. }
            | LoadOutcome::NoData { reason }
            | LoadOutcome::Failed { reason } => Some(reason.as_str()),
        };
        let snapshot = self.snapshot();

        LoadReport {
            status: self.status(),
            stale: self.is_stale(),
            no_data: matches!(self, LoadOutcome::NoData { .. }),
            message,
            fetched_at: snapshot.map(|s| s.fetched_at),
            dashboard: snapshot.map(|s| &s.model),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport<'a> {
    pub status: SyncStatus,
    pub stale: bool,
    pub no_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub dashboard: Option<&'a DashboardModel>,
}

/// Owns everything one load needs; cycles run one at a time
pub struct DashboardLoader {
    config: DashboardConfig,
    client: Option<SheetsClient>,
    cache: SnapshotCache,
    db: Option<Database>,
    sheet: String,
    keep_snapshots: u32,
}

impl DashboardLoader {
    /// `offline` skips the network entirely and serves stored data only
    pub fn new(config: DashboardConfig, sheet: String, db: Option<Database>, offline: bool) -> Result<Self> {
        let client = if offline {
            None
        } else {
            Some(SheetsClient::new(&config)?)
        };
        let ttl = Duration::from_secs(config.refresh_interval_secs);

        Ok(Self {
            config,
            client,
            cache: SnapshotCache::new(ttl),
            db,
            sheet,
            keep_snapshots: DEFAULT_KEEP_SNAPSHOTS,
        })
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Storage key: one history per (spreadsheet, tab)
    pub fn sheet_key(&self) -> String {
        format!("{}:{}", self.config.sheet_id, self.sheet)
    }

    /// Run one cycle. Never returns an error; failures become an outcome.
    pub async fn load_cycle(&self) -> LoadOutcome {
        let Some(client) = &self.client else {
            return self.fall_back("offline mode".to_string()).await;
        };

        match fetch_dashboard(client, &self.config, &self.sheet).await {
            Ok(model) => {
                let snapshot = CachedSnapshot::new(model, Utc::now());
                self.remember(&snapshot).await;
                info!(
                    "Loaded {} ({} assets, value {:.2})",
                    self.sheet,
                    snapshot.model.kpis.asset_count,
                    snapshot.model.kpis.total_value
                );
                LoadOutcome::Fresh(snapshot)
            }
            Err(Error::EmptySheet(reason)) => {
                warn!("Sheet {} has no data: {}", self.sheet, reason);
                LoadOutcome::NoData { reason }
            }
            Err(e) if e.allows_cache_fallback() => {
                warn!("Refresh of {} failed: {}", self.sheet, e);
                self.fall_back(e.to_string()).await
            }
            Err(e) => {
                error!("Load of {} failed: {}", self.sheet, e);
                LoadOutcome::Failed { reason: e.to_string() }
            }
        }
    }

    /// Last stored snapshot without attempting a fetch
    pub async fn stored_snapshot(&self) -> Result<Option<CachedSnapshot>> {
        let key = self.sheet_key();
        if let Some(snapshot) = self.cache.get_stale(&key) {
            return Ok(Some(snapshot));
        }
        match &self.db {
            Some(db) => latest_snapshot(db.pool(), &key).await,
            None => Ok(None),
        }
    }

    async fn fall_back(&self, reason: String) -> LoadOutcome {
        match self.stored_snapshot().await {
            Ok(Some(snapshot)) => {
                info!(
                    "Serving cached dashboard for {} from {}",
                    self.sheet,
                    snapshot.fetched_at.to_rfc3339()
                );
                LoadOutcome::Cached { snapshot, reason }
            }
            Ok(None) => LoadOutcome::Failed {
                reason: format!("{}; no cached data", reason),
            },
            Err(e) => {
                error!("Reading cached dashboard failed: {}", e);
                LoadOutcome::Failed {
                    reason: format!("{}; cache unavailable: {}", reason, e),
                }
            }
        }
    }

    async fn remember(&self, snapshot: &CachedSnapshot) {
        let key = self.sheet_key();
        self.cache.insert(&key, snapshot.clone());

        let Some(db) = &self.db else {
            return;
        };
        if let Err(e) = save_snapshot(db.pool(), &key, &snapshot.model, snapshot.fetched_at).await {
            warn!("Failed to store snapshot: {}", e);
            return;
        }
        match prune_snapshots(db.pool(), &key, self.keep_snapshots).await {
            Ok(0) => {}
            Ok(n) => info!("Pruned {} old snapshots for {}", n, key),
            Err(e) => warn!("Failed to prune snapshots: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn wrap(table: &str) -> String {
        format!(
            "/*O_o*/\ngoogle.visualization.Query.setResponse({{\"version\":\"0.6\",\"status\":\"ok\",\"table\":{}}});",
            table
        )
    }

    const SUMMARY_TABLE: &str = r#"{
        "cols":[{"id":"A","label":"Fecha","type":"date"},{"id":"B","label":"Activo","type":"string"},
                {"id":"C","label":"Cantidad","type":"number"},{"id":"D","label":"Invertido","type":"number"},
                {"id":"E","label":"Valor","type":"number"},{"id":"F","label":"PL","type":"number"}],
        "rows":[{"c":[{"v":"Date(2024,9,23)"},{"v":"ETH"},{"v":0.5},{"v":1000.0},{"v":1250.0},{"v":250.0}]}]
    }"#;

    const EMPTY_TABLE: &str = r#"{"cols":[{"id":"A","label":"Fecha","type":"date"}],"rows":[]}"#;

    fn config_for(server: &ServerGuard) -> DashboardConfig {
        let mut config = DashboardConfig {
            sheet_id: "sheet1".to_string(),
            base_url: server.url(),
            request_timeout_secs: 5,
            ..Default::default()
        };
        // Keep tests to a single tab
        config.sheets.history = String::new();
        config
    }

    async fn mock_body(server: &mut ServerGuard, status: usize, body: String) -> mockito::Mock {
        server
            .mock("GET", "/spreadsheets/d/sheet1/gviz/tq")
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(body)
            .create_async()
            .await
    }

    async fn loader_for(server: &ServerGuard) -> DashboardLoader {
        let db = Database::connect_in_memory().await.unwrap();
        DashboardLoader::new(config_for(server), "Resumen_Activo".to_string(), Some(db), false).unwrap()
    }

    #[tokio::test]
    async fn test_fresh_load_is_stored() {
        let mut server = Server::new_async().await;
        let _mock = mock_body(&mut server, 200, wrap(SUMMARY_TABLE)).await;
        let loader = loader_for(&server).await;

        let outcome = loader.load_cycle().await;
        assert_eq!(outcome.status(), SyncStatus::Online);
        assert!(!outcome.is_stale());
        assert_eq!(outcome.snapshot().unwrap().model.assets[0].symbol, "ETH");

        let stored = loader.stored_snapshot().await.unwrap().unwrap();
        assert_eq!(stored.model.kpis.total_value, 1250.0);
    }

    #[tokio::test]
    async fn test_network_failure_falls_back_to_last_snapshot() {
        let mut server = Server::new_async().await;
        let ok = mock_body(&mut server, 200, wrap(SUMMARY_TABLE)).await;
        let loader = loader_for(&server).await;
        assert!(matches!(loader.load_cycle().await, LoadOutcome::Fresh(_)));

        ok.remove_async().await;
        let _down = mock_body(&mut server, 503, String::new()).await;

        let outcome = loader.load_cycle().await;
        assert_eq!(outcome.status(), SyncStatus::OfflineCached);
        assert!(outcome.is_stale());
        assert_eq!(outcome.snapshot().unwrap().model.assets[0].symbol, "ETH");
    }

    #[tokio::test]
    async fn test_malformed_without_cache_is_error() {
        let mut server = Server::new_async().await;
        let _mock = mock_body(&mut server, 200, "<html></html>".to_string()).await;
        let loader = loader_for(&server).await;

        let outcome = loader.load_cycle().await;
        assert_eq!(outcome.status(), SyncStatus::Error);
        assert!(outcome.snapshot().is_none());
    }

    #[tokio::test]
    async fn test_empty_sheet_does_not_fall_back() {
        let mut server = Server::new_async().await;
        let ok = mock_body(&mut server, 200, wrap(SUMMARY_TABLE)).await;
        let loader = loader_for(&server).await;
        assert!(matches!(loader.load_cycle().await, LoadOutcome::Fresh(_)));

        ok.remove_async().await;
        let _empty = mock_body(&mut server, 200, wrap(EMPTY_TABLE)).await;

        let outcome = loader.load_cycle().await;
        assert!(matches!(outcome, LoadOutcome::NoData { .. }));
        assert!(outcome.snapshot().is_none());

        let report = serde_json::to_value(outcome.report()).unwrap();
        assert_eq!(report["status"], "online");
        assert_eq!(report["noData"], true);
    }

    #[tokio::test]
    async fn test_offline_mode_reads_database() {
        let server = Server::new_async().await;
        let db = Database::connect_in_memory().await.unwrap();
        let config = config_for(&server);
        let seed = DashboardLoader::new(config.clone(), "Resumen_Activo".to_string(), None, true).unwrap();
        let key = seed.sheet_key();

        let model = sheetfolio_engine::build_dashboard(&wrap(SUMMARY_TABLE), &config).unwrap();
        save_snapshot(db.pool(), &key, &model, Utc::now()).await.unwrap();

        let loader = DashboardLoader::new(config, "Resumen_Activo".to_string(), Some(db), true).unwrap();
        let outcome = loader.load_cycle().await;

        assert_eq!(outcome.status(), SyncStatus::OfflineCached);
        assert_eq!(outcome.report().status.to_string(), "offline (cached)");
        assert_eq!(outcome.snapshot().unwrap().model, model);
    }
}
