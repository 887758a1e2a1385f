//! Tracker service facade
//!
//! The single entry point a request layer or the CLI calls: locate on demand,
//! manage tracked products, run the batch, and control the recurring trigger.

use std::sync::Arc;

use tracing::{info, warn};

use super::batch_check::{BatchChecker, history_name, log_batch_outcomes};
use super::clock::{Clock, SystemClock};
use super::ranking_locator::RankingLocator;
use super::scheduler::{RecurringTrigger, SchedulePlan, TriggerSettings, TriggerStatus};
use crate::domain::{
    BatchOutcome, LocateResult, NewTrackedProduct, RankingHistoryEntry, TargetId, TrackedProduct,
    TrackedProductStore, TrackerError, name_from_url,
};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::fetching::{FetcherFactory, StrategySet};
use crate::infrastructure::parsing::{ParsingConfig, ResultExtractor};

/// Pages scanned when looking for a better display name of a new entry
const NAME_PROBE_PAGES: u32 = 1;

fn store_error(e: anyhow::Error) -> TrackerError {
    TrackerError::store(format!("{e:#}"))
}

pub struct TrackerService {
    store: Arc<dyn TrackedProductStore>,
    locator: Arc<RankingLocator>,
    batch: Arc<BatchChecker>,
    trigger: RecurringTrigger,
    clock: Arc<dyn Clock>,
    max_pages: u32,
}

impl TrackerService {
    pub fn new(
        store: Arc<dyn TrackedProductStore>,
        fetchers: Arc<dyn FetcherFactory>,
        extractor: ResultExtractor,
        clock: Arc<dyn Clock>,
        max_pages: u32,
        trigger_settings: TriggerSettings,
    ) -> Self {
        let locator = Arc::new(RankingLocator::new(fetchers, extractor));
        let batch = Arc::new(BatchChecker::new(
            Arc::clone(&store),
            Arc::clone(&locator),
            Arc::clone(&clock),
            max_pages,
        ));
        let trigger = RecurringTrigger::new(batch.clone(), Arc::clone(&clock), trigger_settings);
        Self {
            store,
            locator,
            batch,
            trigger,
            clock,
            max_pages,
        }
    }

    /// Wire the production strategies, extractor, and wall clock from configuration.
    pub fn from_config(config: &AppConfig, store: Arc<dyn TrackedProductStore>) -> Result<Self, TrackerError> {
        let fetchers: Arc<dyn FetcherFactory> = Arc::new(StrategySet::from_config(config)?);
        let parsing = ParsingConfig::for_site(&config.site.base_url, &config.site.product_path_marker);
        let extractor = ResultExtractor::with_config(&parsing)
            .map_err(|e| TrackerError::config("parsing.selectors", e.to_string()))?;

        Ok(Self::new(
            store,
            fetchers,
            extractor,
            Arc::new(SystemClock),
            config.locator.max_pages,
            TriggerSettings::from_config(&config.scheduler)?,
        ))
    }

    /// On-demand locate; `max_pages` defaults to the configured limit.
    pub async fn locate(
        &self,
        keyword: &str,
        target: &str,
        max_pages: Option<u32>,
    ) -> Result<LocateResult, TrackerError> {
        self.locator
            .locate(keyword, target, max_pages.unwrap_or(self.max_pages))
            .await
    }

    /// Run the batch immediately, outside the schedule.
    pub async fn run_batch_now(&self) -> Result<Vec<BatchOutcome>, TrackerError> {
        let outcomes = self.batch.run().await?;
        log_batch_outcomes(&outcomes);
        Ok(outcomes)
    }

    /// Check one tracked entry now and record the result.
    pub async fn check_now(&self, id: i64) -> Result<LocateResult, TrackerError> {
        let entry = self.tracked(id)?;
        let result = self
            .locator
            .locate(&entry.keyword, &entry.target_id, self.max_pages)
            .await?;
        let name = history_name(&entry, &result);
        self.store
            .append_history(
                &entry.keyword,
                &entry.target_id,
                &name,
                result.position,
                result.absolute_position,
                self.clock.now(),
            )
            .map_err(store_error)?;
        Ok(result)
    }

    /// Start tracking `product_url` under `keyword`.
    ///
    /// The display name comes from the URL unless a one-page lookup finds a
    /// resolved name for the product.
    pub async fn add_tracked_product(
        &self,
        keyword: &str,
        product_url: &str,
        stop_after_days: Option<u32>,
    ) -> Result<TrackedProduct, TrackerError> {
        let keyword = keyword.trim();
        let product_url = product_url.trim();
        if keyword.is_empty() || product_url.is_empty() {
            return Err(TrackerError::validation(
                &format!("{keyword}|{product_url}"),
                "keyword and product_url are required",
            ));
        }
        let target = TargetId::from_url(product_url)?;

        let mut name = name_from_url(product_url);
        match self.locator.locate(keyword, target.as_str(), NAME_PROBE_PAGES).await {
            Ok(LocateResult {
                product: Some(product), ..
            }) if product.has_resolved_name() => {
                info!("✅ Found better name from listing: {}", product.name);
                name = product.name;
            }
            Ok(_) => info!("ℹ️ Using URL-derived name: {}", name),
            Err(e) => warn!("⚠️ Name lookup failed, using URL-derived name: {}", e),
        }

        let created = self
            .store
            .insert(NewTrackedProduct {
                keyword: keyword.to_string(),
                target_id: target.into(),
                product_url: product_url.to_string(),
                product_name: Some(name),
                created_at: self.clock.now(),
                stop_after_days,
            })
            .map_err(store_error)?;
        info!("➕ Tracking product {} for '{}' (id {})", created.target_id, created.keyword, created.id);
        Ok(created)
    }

    /// Soft delete: the entry stays in the store, inactive.
    pub fn remove_tracked_product(&self, id: i64) -> Result<(), TrackerError> {
        self.store.deactivate(id).map_err(store_error)
    }

    /// Flip the per-entry schedule flag and return its new value.
    pub fn toggle_schedule(&self, id: i64) -> Result<bool, TrackerError> {
        let enabled = !self.tracked(id)?.schedule_enabled;
        self.store.set_schedule_enabled(id, enabled).map_err(store_error)?;
        Ok(enabled)
    }

    pub fn list_tracked(&self, include_inactive: bool) -> Result<Vec<TrackedProduct>, TrackerError> {
        self.store.list(include_inactive).map_err(store_error)
    }

    pub fn history(&self, target_id: Option<&str>) -> Result<Vec<RankingHistoryEntry>, TrackerError> {
        self.store.history(target_id).map_err(store_error)
    }

    pub fn start_trigger(&self) -> bool {
        self.trigger.start()
    }

    pub async fn stop_trigger(&self) -> bool {
        self.trigger.stop().await
    }

    pub fn trigger_status(&self) -> TriggerStatus {
        self.trigger.status()
    }

    /// Configured schedule with the next run computed from the service clock
    pub fn schedule_plan(&self) -> SchedulePlan {
        self.trigger.plan()
    }

    fn tracked(&self, id: i64) -> Result<TrackedProduct, TrackerError> {
        self.store
            .get(id)
            .map_err(store_error)?
            .ok_or_else(|| TrackerError::store(format!("tracked product {id} not found")))
    }
}
