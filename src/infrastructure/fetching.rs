//! Page fetching strategies
//!
//! Both strategies retrieve one search-results page of raw markup for a
//! keyword and page number. [`FetchStrategy`] is the closed set of variants;
//! [`FetcherFactory`] hands the ranking locator a fresh fallback chain for
//! every run so no browser outlives the run that launched it.

pub mod lightweight;
pub mod rendered;

use std::fmt;

use async_trait::async_trait;
use tracing::info;

pub use lightweight::LightweightFetcher;
pub use rendered::RenderedFetcher;

use crate::domain::TrackerError;
use crate::infrastructure::config::{AppConfig, BrowserConfig, SiteConfig};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Lightweight,
    Rendered,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lightweight => write!(f, "lightweight"),
            Self::Rendered => write!(f, "rendered"),
        }
    }
}

/// Retrieves one page of search-result markup.
#[async_trait]
pub trait PageFetcher: Send {
    fn kind(&self) -> StrategyKind;

    /// An empty page ends this strategy's scan.
    fn stops_on_empty_page(&self) -> bool {
        false
    }

    async fn fetch_page(&mut self, keyword: &str, page: u32) -> Result<String, TrackerError>;

    /// Release held resources. Called once at the end of every scan.
    async fn release(&mut self) {}
}

/// The two interchangeable fetch strategies
pub enum FetchStrategy {
    Lightweight(LightweightFetcher),
    Rendered(RenderedFetcher),
}

#[async_trait]
impl PageFetcher for FetchStrategy {
    fn kind(&self) -> StrategyKind {
        match self {
            Self::Lightweight(f) => f.kind(),
            Self::Rendered(f) => f.kind(),
        }
    }

    fn stops_on_empty_page(&self) -> bool {
        match self {
            Self::Lightweight(f) => f.stops_on_empty_page(),
            Self::Rendered(f) => f.stops_on_empty_page(),
        }
    }

    async fn fetch_page(&mut self, keyword: &str, page: u32) -> Result<String, TrackerError> {
        match self {
            Self::Lightweight(f) => f.fetch_page(keyword, page).await,
            Self::Rendered(f) => f.fetch_page(keyword, page).await,
        }
    }

    async fn release(&mut self) {
        match self {
            Self::Lightweight(f) => f.release().await,
            Self::Rendered(f) => f.release().await,
        }
    }
}

/// Builds the ordered fallback chain for one locate run.
pub trait FetcherFactory: Send + Sync {
    fn fallback_chain(&self) -> Vec<Box<dyn PageFetcher>>;
}

/// Default factory: lightweight first, then rendered when enabled.
pub struct StrategySet {
    client: HttpClient,
    site: SiteConfig,
    browser: BrowserConfig,
}

impl StrategySet {
    pub fn from_config(config: &AppConfig) -> Result<Self, TrackerError> {
        let client = HttpClient::with_config(HttpClientConfig::from_fetch_config(&config.fetch))?;
        let set = Self {
            client,
            site: config.site.clone(),
            browser: config.browser.clone(),
        };
        info!(
            "🔧 Fetch strategies: lightweight{}",
            if set.rendered_enabled() { " → rendered" } else { "" }
        );
        Ok(set)
    }

    pub const fn rendered_enabled(&self) -> bool {
        self.browser.enabled && RenderedFetcher::backend_compiled()
    }
}

impl FetcherFactory for StrategySet {
    fn fallback_chain(&self) -> Vec<Box<dyn PageFetcher>> {
        let mut chain: Vec<Box<dyn PageFetcher>> = vec![Box::new(FetchStrategy::Lightweight(
            LightweightFetcher::new(self.client.clone(), self.site.clone()),
        ))];
        if self.rendered_enabled() {
            chain.push(Box::new(FetchStrategy::Rendered(RenderedFetcher::new(
                self.site.clone(),
                self.browser.clone(),
            ))));
        }
        chain
    }
}
