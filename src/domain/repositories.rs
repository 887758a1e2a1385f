//! Repository interfaces for tracked products and ranking history
//!
//! The store is an external collaborator: calls are synchronous and a failed
//! write surfaces as an error rather than being dropped.

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::tracked_product::{NewTrackedProduct, RankingHistoryEntry, TrackedProduct};

pub trait TrackedProductStore: Send + Sync {
    // Batch contract
    fn list_active_scheduled(&self) -> Result<Vec<TrackedProduct>>;
    fn deactivate(&self, id: i64) -> Result<()>;
    fn backfill_name(&self, id: i64, name: &str) -> Result<()>;
    fn append_history(
        &self,
        keyword: &str,
        target_id: &str,
        name: &str,
        position: Option<u32>,
        absolute_position: Option<u32>,
        timestamp: DateTime<Utc>,
    ) -> Result<()>;

    // Management
    fn insert(&self, product: NewTrackedProduct) -> Result<TrackedProduct>;
    fn get(&self, id: i64) -> Result<Option<TrackedProduct>>;
    fn list(&self, include_inactive: bool) -> Result<Vec<TrackedProduct>>;
    fn set_schedule_enabled(&self, id: i64, enabled: bool) -> Result<()>;
    /// Newest first; `None` returns every target.
    fn history(&self, target_id: Option<&str>) -> Result<Vec<RankingHistoryEntry>>;
}
