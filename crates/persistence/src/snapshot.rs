//! A stored dashboard plus the time it was fetched

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetfolio_core::DashboardModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedSnapshot {
    pub model: DashboardModel,
    pub fetched_at: DateTime<Utc>,
}

impl CachedSnapshot {
    pub fn new(model: DashboardModel, fetched_at: DateTime<Utc>) -> Self {
        Self { model, fetched_at }
    }
}
