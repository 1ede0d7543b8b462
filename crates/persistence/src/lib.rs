//! Sheetfolio Persistence - Snapshot cache and SQLite store for last-known-good dashboards

pub mod cache;
pub mod snapshot;
pub mod sqlite;

pub use cache::SnapshotCache;
pub use snapshot::CachedSnapshot;
pub use sqlite::{
    count_snapshots, get_setting, latest_snapshot, prune_snapshots, save_snapshot, set_setting,
    Database,
};
