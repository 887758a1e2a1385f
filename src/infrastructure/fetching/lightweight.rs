//! Lightweight fetch: one paced HTTP request per page with a mobile identity.

use async_trait::async_trait;
use tracing::debug;

use super::{PageFetcher, StrategyKind};
use crate::domain::TrackerError;
use crate::infrastructure::config::SiteConfig;
use crate::infrastructure::http_client::{HttpClient, search_url};

pub struct LightweightFetcher {
    client: HttpClient,
    site: SiteConfig,
}

impl LightweightFetcher {
    pub const fn new(client: HttpClient, site: SiteConfig) -> Self {
        Self { client, site }
    }
}

#[async_trait]
impl PageFetcher for LightweightFetcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Lightweight
    }

    async fn fetch_page(&mut self, keyword: &str, page: u32) -> Result<String, TrackerError> {
        let url = search_url(&self.site, keyword, page)?;
        debug!("Lightweight fetch of page {} for '{}'", page, keyword);
        self.client.fetch_html_string(&url).await
    }
}
