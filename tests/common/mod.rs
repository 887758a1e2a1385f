//! Shared fixtures: scripted page fetchers and listing markup builders
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use rank_tracker::domain::TrackerError;
use rank_tracker::infrastructure::fetching::{FetcherFactory, PageFetcher, StrategyKind};

/// Page `n` of a script is entry `n - 1`; pages past the end are empty listings.
#[derive(Clone)]
pub struct StrategyScript {
    pub kind: StrategyKind,
    pub pages: Vec<Result<String, TrackerError>>,
    pub stops_on_empty_page: bool,
    pub calls: Arc<AtomicU32>,
    pub releases: Arc<AtomicU32>,
}

impl StrategyScript {
    pub fn lightweight(pages: Vec<Result<String, TrackerError>>) -> Self {
        Self {
            kind: StrategyKind::Lightweight,
            pages,
            stops_on_empty_page: false,
            calls: Arc::default(),
            releases: Arc::default(),
        }
    }

    pub fn rendered(pages: Vec<Result<String, TrackerError>>) -> Self {
        Self {
            kind: StrategyKind::Rendered,
            pages,
            stops_on_empty_page: true,
            calls: Arc::default(),
            releases: Arc::default(),
        }
    }

    pub fn rendered_unavailable() -> Self {
        Self::rendered(vec![Err(TrackerError::automation_unavailable("no browser in tests"))])
    }

    pub fn fetches(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }
}

struct ScriptedFetcher {
    script: StrategyScript,
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    fn kind(&self) -> StrategyKind {
        self.script.kind
    }

    fn stops_on_empty_page(&self) -> bool {
        self.script.stops_on_empty_page
    }

    async fn fetch_page(&mut self, _keyword: &str, page: u32) -> Result<String, TrackerError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_else(|| Ok(listing_page(&[])))
    }

    async fn release(&mut self) {
        self.script.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fallback chain built from scripts, in order
pub struct ScriptedFactory {
    scripts: Vec<StrategyScript>,
}

impl ScriptedFactory {
    pub fn new(scripts: Vec<StrategyScript>) -> Arc<Self> {
        Arc::new(Self { scripts })
    }
}

impl FetcherFactory for ScriptedFactory {
    fn fallback_chain(&self) -> Vec<Box<dyn PageFetcher>> {
        self.scripts
            .iter()
            .cloned()
            .map(|script| Box::new(ScriptedFetcher { script }) as Box<dyn PageFetcher>)
            .collect()
    }
}

/// `count` distinct 16-digit identifiers starting at `start`
pub fn ids(start: u64, count: u64) -> Vec<String> {
    (start..start + count).map(|n| format!("{:016}", 9_200_000_000_000_000 + n)).collect()
}

/// Search-results markup with one product link per identifier, in order
pub fn listing_page(ids: &[String]) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<li class="product-item"><a href="/nl/nl/p/product-{id}/{id}/"><h2>Product {id}</h2></a>
                   <a href="/nl/nl/p/product-{id}/{id}/">Meer verkopers</a></li>"#
            )
        })
        .collect();
    format!("<html><body><ul>{cards}</ul></body></html>")
}

pub fn page(ids: &[String]) -> Result<String, TrackerError> {
    Ok(listing_page(ids))
}

pub fn http_failure(status: u16) -> Result<String, TrackerError> {
    Err(TrackerError::http_status("https://www.bol.com/nl/nl/s/", status))
}
