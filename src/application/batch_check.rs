//! Batch check over every active, schedule-enabled tracked product
//!
//! Each entry is handled independently: an expired entry is deactivated
//! without a check, and a failing entry becomes an error outcome while the
//! rest of the batch carries on.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tracing::{error, info};

use super::clock::Clock;
use super::ranking_locator::RankingLocator;
use super::scheduler::ScheduledJob;
use crate::domain::{
    BatchOutcome, BatchSummary, LocateResult, TrackedProduct, TrackedProductStore, TrackerError, name_from_url,
};

/// Name written to history for one check.
///
/// The stored name wins over the URL-derived one, and a located name wins
/// over both unless it is the sentinel.
pub fn history_name(entry: &TrackedProduct, result: &LocateResult) -> String {
    if let Some(product) = result.product.as_ref().filter(|p| p.has_resolved_name()) {
        return product.name.clone();
    }
    entry
        .stored_name()
        .map_or_else(|| name_from_url(&entry.product_url), str::to_string)
}

pub struct BatchChecker {
    store: Arc<dyn TrackedProductStore>,
    locator: Arc<RankingLocator>,
    clock: Arc<dyn Clock>,
    max_pages: u32,
}

impl BatchChecker {
    pub fn new(
        store: Arc<dyn TrackedProductStore>,
        locator: Arc<RankingLocator>,
        clock: Arc<dyn Clock>,
        max_pages: u32,
    ) -> Self {
        Self {
            store,
            locator,
            clock,
            max_pages,
        }
    }

    /// Check every active, schedule-enabled entry once.
    pub async fn run(&self) -> Result<Vec<BatchOutcome>, TrackerError> {
        let entries = self
            .store
            .list_active_scheduled()
            .map_err(|e| TrackerError::store(format!("{e:#}")))?;
        info!("🚀 Batch check of {} tracked products", entries.len());

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            outcomes.push(self.check_entry(&entry).await);
        }
        Ok(outcomes)
    }

    async fn check_entry(&self, entry: &TrackedProduct) -> BatchOutcome {
        if entry.is_expired(self.clock.now()) {
            return match self.store.deactivate(entry.id) {
                Ok(()) => BatchOutcome::DeactivatedExpired {
                    id: entry.id,
                    keyword: entry.keyword.clone(),
                    target_id: entry.target_id.clone(),
                },
                Err(e) => Self::failed(entry, &TrackerError::entry_check(entry.id, format!("{e:#}"))),
            };
        }

        match self.check_and_record(entry).await {
            Ok(result) => BatchOutcome::Checked {
                id: entry.id,
                keyword: entry.keyword.clone(),
                target_id: entry.target_id.clone(),
                position: result.position,
                absolute_position: result.absolute_position,
                total_scanned: result.total_scanned,
            },
            Err(e) => Self::failed(entry, &TrackerError::entry_check(entry.id, format!("{e:#}"))),
        }
    }

    /// Locate, append history, and backfill an empty stored name.
    pub async fn check_and_record(&self, entry: &TrackedProduct) -> anyhow::Result<LocateResult> {
        let result = self
            .locator
            .locate(&entry.keyword, &entry.target_id, self.max_pages)
            .await?;

        let name = history_name(entry, &result);
        self.store
            .append_history(
                &entry.keyword,
                &entry.target_id,
                &name,
                result.position,
                result.absolute_position,
                self.clock.now(),
            )
            .context("Failed to append ranking history")?;

        let stored_empty = entry.product_name.as_deref().is_none_or(str::is_empty);
        if let (true, Some(product)) = (stored_empty, result.product.as_ref()) {
            self.store
                .backfill_name(entry.id, &product.name)
                .context("Failed to backfill product name")?;
        }

        Ok(result)
    }

    fn failed(entry: &TrackedProduct, err: &TrackerError) -> BatchOutcome {
        BatchOutcome::Error {
            id: entry.id,
            keyword: entry.keyword.clone(),
            target_id: entry.target_id.clone(),
            error: err.to_string(),
        }
    }
}

/// Log the per-entry lines and the summary counts of one batch.
pub fn log_batch_outcomes(outcomes: &[BatchOutcome]) {
    let summary = BatchSummary::from_outcomes(outcomes);
    info!(
        "📊 Batch finished: {} successful, {} errors, {} deactivated",
        summary.successful, summary.errors, summary.deactivated
    );
    for outcome in outcomes {
        match outcome {
            BatchOutcome::Error { id, keyword, error: message, .. } => {
                error!("❌ Tracked product {} ('{}'): {}", id, keyword, message);
            }
            BatchOutcome::DeactivatedExpired { id, keyword, .. } => {
                info!("⏹️ Tracked product {} ('{}') expired and was deactivated", id, keyword);
            }
            BatchOutcome::Checked {
                id,
                keyword,
                absolute_position,
                total_scanned,
                ..
            } => match absolute_position {
                Some(position) => info!("✅ Tracked product {} ('{}'): position {}", id, keyword, position),
                None => info!(
                    "✅ Tracked product {} ('{}'): not in top {} results",
                    id, keyword, total_scanned
                ),
            },
        }
    }
}

#[async_trait]
impl ScheduledJob for BatchChecker {
    async fn run_once(&self) -> anyhow::Result<()> {
        let outcomes = self.run().await?;
        log_batch_outcomes(&outcomes);
        Ok(())
    }
}
