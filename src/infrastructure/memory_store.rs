//! In-memory tracked-product store
//!
//! Process-local implementation of [`TrackedProductStore`] used by the binary
//! and the tests. Ids are assigned from 1 upward and never reused; listings
//! are newest first.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::{NewTrackedProduct, RankingHistoryEntry, TrackedProduct, TrackedProductStore};

#[derive(Default)]
struct StoreState {
    next_id: i64,
    products: Vec<TrackedProduct>,
    history: Vec<RankingHistoryEntry>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>> {
        self.state.lock().map_err(|_| anyhow!("tracked-product store lock poisoned"))
    }

    fn with_product<T>(&self, id: i64, op: impl FnOnce(&mut TrackedProduct) -> T) -> Result<T> {
        let mut state = self.lock()?;
        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("tracked product {id} not found"))?;
        Ok(op(product))
    }
}

impl TrackedProductStore for InMemoryStore {
    fn list_active_scheduled(&self) -> Result<Vec<TrackedProduct>> {
        let state = self.lock()?;
        Ok(state
            .products
            .iter()
            .filter(|p| p.active && p.schedule_enabled)
            .cloned()
            .collect())
    }

    fn deactivate(&self, id: i64) -> Result<()> {
        self.with_product(id, |p| p.active = false)?;
        debug!("Deactivated tracked product {}", id);
        Ok(())
    }

    fn backfill_name(&self, id: i64, name: &str) -> Result<()> {
        self.with_product(id, |p| p.product_name = Some(name.to_string()))
    }

    fn append_history(
        &self,
        keyword: &str,
        target_id: &str,
        name: &str,
        position: Option<u32>,
        absolute_position: Option<u32>,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.lock()?.history.push(RankingHistoryEntry {
            keyword: keyword.to_string(),
            target_id: target_id.to_string(),
            product_name: name.to_string(),
            position,
            absolute_position,
            checked_at: timestamp,
        });
        Ok(())
    }

    fn insert(&self, product: NewTrackedProduct) -> Result<TrackedProduct> {
        let mut state = self.lock()?;
        state.next_id += 1;
        let row = TrackedProduct {
            id: state.next_id,
            keyword: product.keyword,
            target_id: product.target_id,
            product_url: product.product_url,
            product_name: product.product_name,
            active: true,
            created_at: product.created_at,
            stop_after_days: product.stop_after_days,
            schedule_enabled: false,
        };
        state.products.push(row.clone());
        Ok(row)
    }

    fn get(&self, id: i64) -> Result<Option<TrackedProduct>> {
        Ok(self.lock()?.products.iter().find(|p| p.id == id).cloned())
    }

    fn list(&self, include_inactive: bool) -> Result<Vec<TrackedProduct>> {
        Ok(self
            .lock()?
            .products
            .iter()
            .rev()
            .filter(|p| include_inactive || p.active)
            .cloned()
            .collect())
    }

    fn set_schedule_enabled(&self, id: i64, enabled: bool) -> Result<()> {
        self.with_product(id, |p| p.schedule_enabled = enabled)
    }

    fn history(&self, target_id: Option<&str>) -> Result<Vec<RankingHistoryEntry>> {
        let state = self.lock()?;
        let mut entries: Vec<_> = state
            .history
            .iter()
            .filter(|h| target_id.is_none_or(|t| h.target_id == t))
            .cloned()
            .collect();
        // Newest first, later inserts ahead on equal timestamps
        entries.sort_by_key(|h| h.checked_at);
        entries.reverse();
        Ok(entries)
    }
}
