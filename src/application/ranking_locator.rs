//! Ranking locator
//!
//! Drives fetcher + extractor page by page for one keyword until the target
//! shows up, the pages run out, or a page fails. Strategies run in fallback
//! order; a later strategy only runs while the target is still missing, and
//! replaces the earlier scan when it extracted at least one record.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{LocateResult, ProductRecord, TargetId, TargetMatch, TrackerError};
use crate::infrastructure::fetching::{FetcherFactory, PageFetcher};
use crate::infrastructure::parsing::ResultExtractor;

/// Records and match state accumulated by one strategy
#[derive(Debug, Default)]
struct Scan {
    records: Vec<ProductRecord>,
    matched: TargetMatch,
}

impl Scan {
    fn into_result(self, target: &TargetId) -> LocateResult {
        let total_scanned = u32::try_from(self.records.len()).unwrap_or(u32::MAX);
        if !self.matched.found {
            return LocateResult::not_found(total_scanned);
        }
        LocateResult {
            position: self.matched.position_on_page,
            absolute_position: self.matched.absolute_position,
            page: self.matched.page,
            product: self.records.into_iter().find(|r| r.id == target.as_str()),
            total_scanned,
        }
    }
}

pub struct RankingLocator {
    fetchers: Arc<dyn FetcherFactory>,
    extractor: ResultExtractor,
}

impl RankingLocator {
    pub fn new(fetchers: Arc<dyn FetcherFactory>, extractor: ResultExtractor) -> Self {
        Self { fetchers, extractor }
    }

    /// Find `target` (a bare identifier or a product URL) in the results for `keyword`.
    ///
    /// Only input validation fails; transport and browser trouble degrade to
    /// a not-found result.
    pub async fn locate(&self, keyword: &str, target: &str, max_pages: u32) -> Result<LocateResult, TrackerError> {
        let target: TargetId = target.parse()?;
        if keyword.trim().is_empty() {
            return Err(TrackerError::validation(keyword, "keyword must not be empty"));
        }

        info!("🎯 Looking for product {} in '{}' search results", target, keyword);
        let mut kept: Option<Scan> = None;

        for mut fetcher in self.fetchers.fallback_chain() {
            if kept.as_ref().is_some_and(|scan| scan.matched.found) {
                break;
            }

            let scan = self.scan(fetcher.as_mut(), keyword, &target, max_pages).await;
            fetcher.release().await;

            kept = match kept {
                None => Some(scan),
                Some(_) if !scan.records.is_empty() => {
                    debug!("{} strategy results replace the earlier scan", fetcher.kind());
                    Some(scan)
                }
                previous => previous,
            };
        }

        let result = kept.map_or_else(|| LocateResult::not_found(0), |scan| scan.into_result(&target));
        match (result.absolute_position, result.page, result.position) {
            (Some(absolute), Some(page), Some(position)) => info!(
                "🎉 Found at position {} (page {}, position {} on page)",
                absolute, page, position
            ),
            _ => info!("❌ Product not found in top {} results", result.total_scanned),
        }
        Ok(result)
    }

    /// One strategy's page loop. Pages are fetched strictly in order.
    async fn scan(&self, fetcher: &mut dyn PageFetcher, keyword: &str, target: &TargetId, max_pages: u32) -> Scan {
        let kind = fetcher.kind();
        let mut scan = Scan::default();

        for page in 1..=max_pages {
            let markup = match fetcher.fetch_page(keyword, page).await {
                Ok(markup) => markup,
                Err(e) if e.is_unavailable() => {
                    info!("⏭️ {} strategy unavailable: {}", kind, e);
                    break;
                }
                Err(e) => {
                    warn!("❌ {} fetch of page {} failed: {}", kind, page, e);
                    break;
                }
            };

            let page_records = self.extractor.extract(&markup);
            let records_before = u32::try_from(scan.records.len()).unwrap_or(u32::MAX);
            let hit = page_records.iter().position(|r| r.id == target.as_str());
            let page_len = page_records.len();
            scan.records.extend(page_records);
            debug!("📄 {} page {}: {} products (total {})", kind, page, page_len, scan.records.len());

            if let Some(index) = hit {
                let position = u32::try_from(index + 1).unwrap_or(u32::MAX);
                scan.matched = TargetMatch::found_at(page, position, records_before);
                break;
            }
            if page_len == 0 && fetcher.stops_on_empty_page() {
                info!("⚠️ No products on page {} ({}), stopping", page, kind);
                break;
            }
        }

        info!("📊 {} strategy scanned {} products", kind, scan.records.len());
        scan
    }
}
