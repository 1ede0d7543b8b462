//! Last-known-good dashboard snapshots
//!
//! Each successful load appends one row; the newest row per sheet is what
//! the loader falls back to when a refresh fails.

use crate::snapshot::CachedSnapshot;
use chrono::{DateTime, Utc};
use sheetfolio_core::{DashboardModel, Error, Result, SheetLayout};
use sqlx::SqlitePool;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SnapshotRow {
    payload: String,
    fetched_at: String,
}

impl SnapshotRow {
    fn into_snapshot(self) -> Result<CachedSnapshot> {
        let model: DashboardModel = serde_json::from_str(&self.payload)?;
        let fetched_at = DateTime::parse_from_rfc3339(&self.fetched_at)
            .map_err(|e| Error::DatabaseError(format!("bad fetched_at '{}': {}", self.fetched_at, e)))?
            .with_timezone(&Utc);
        Ok(CachedSnapshot { model, fetched_at })
    }
}

fn layout_name(layout: SheetLayout) -> &'static str {
    match layout {
        SheetLayout::Transaction => "transaction",
        SheetLayout::PeriodicSummary => "periodic_summary",
    }
}

/// Store a dashboard for `sheet_key`, returning the new row id
pub async fn save_snapshot(
    pool: &SqlitePool,
    sheet_key: &str,
    model: &DashboardModel,
    fetched_at: DateTime<Utc>,
) -> Result<i64> {
    let payload = serde_json::to_string(model)?;

    let result = sqlx::query(
        r#"
        INSERT INTO snapshots (sheet_key, layout, total_value, payload, fetched_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(sheet_key)
    .bind(layout_name(model.layout))
    .bind(model.kpis.total_value)
    .bind(payload)
    .bind(fetched_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.last_insert_rowid())
}

/// Newest snapshot for `sheet_key`
pub async fn latest_snapshot(pool: &SqlitePool, sheet_key: &str) -> Result<Option<CachedSnapshot>> {
    let row = sqlx::query_as::<_, SnapshotRow>(
        "SELECT payload, fetched_at FROM snapshots WHERE sheet_key = ? ORDER BY id DESC LIMIT 1",
    )
    .bind(sheet_key)
    .fetch_optional(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    row.map(SnapshotRow::into_snapshot).transpose()
}

/// Keep only the newest `keep` snapshots for `sheet_key`; returns rows deleted
pub async fn prune_snapshots(pool: &SqlitePool, sheet_key: &str, keep: u32) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM snapshots
        WHERE sheet_key = ?
          AND id NOT IN (
              SELECT id FROM snapshots WHERE sheet_key = ? ORDER BY id DESC LIMIT ?
          )
        "#,
    )
    .bind(sheet_key)
    .bind(sheet_key)
    .bind(i64::from(keep))
    .execute(pool)
    .await
    .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(result.rows_affected())
}

/// Number of stored snapshots for `sheet_key`
pub async fn count_snapshots(pool: &SqlitePool, sheet_key: &str) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM snapshots WHERE sheet_key = ?")
        .bind(sheet_key)
        .fetch_one(pool)
        .await
        .map_err(|e| Error::DatabaseError(e.to_string()))?;

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::Database;
    use chrono::TimeZone;
    use sheetfolio_core::{AssetSummary, PortfolioKpis};

    fn model(value: f64) -> DashboardModel {
        let asset = AssetSummary {
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            color: "#F7931A".to_string(),
            icon: "₿".to_string(),
            quantity: 0.015625,
            average_cost: 51_200.0,
            invested: 800.0,
            current_value: value,
            profit_loss: value - 800.0,
            roi: (value - 800.0) / 800.0 * 100.0,
            portfolio_pct: 100.0,
        };
        DashboardModel {
            layout: SheetLayout::Transaction,
            assets: vec![asset],
            transactions: Vec::new(),
            kpis: PortfolioKpis {
                total_invested: 800.0,
                total_value: value,
                total_profit_loss: value - 800.0,
                total_roi: (value - 800.0) / 800.0 * 100.0,
                asset_count: 1,
                transaction_count: 0,
                exchange_count: 0,
            },
            history: None,
        }
    }

    #[tokio::test]
    async fn test_latest_snapshot_roundtrip() {
        let db = Database::connect_in_memory().await.unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 10, 23, 19, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 10, 23, 19, 5, 0).unwrap();

        save_snapshot(db.pool(), "sheet", &model(830.0), t1).await.unwrap();
        save_snapshot(db.pool(), "sheet", &model(845.5), t2).await.unwrap();

        let latest = latest_snapshot(db.pool(), "sheet").await.unwrap().unwrap();
        assert_eq!(latest.fetched_at, t2);
        assert_eq!(latest.model, model(845.5));

        assert!(latest_snapshot(db.pool(), "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let db = Database::connect_in_memory().await.unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for i in 0..5 {
            save_snapshot(db.pool(), "sheet", &model(800.0 + i as f64), now)
                .await
                .unwrap();
        }
        save_snapshot(db.pool(), "other", &model(1.0), now).await.unwrap();

        let deleted = prune_snapshots(db.pool(), "sheet", 2).await.unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(count_snapshots(db.pool(), "sheet").await.unwrap(), 2);
        assert_eq!(count_snapshots(db.pool(), "other").await.unwrap(), 1);

        let latest = latest_snapshot(db.pool(), "sheet").await.unwrap().unwrap();
        assert_eq!(latest.model.kpis.total_value, 804.0);
    }
}
