//! Rendered fetch: full page rendering in a headless browser.
//!
//! The browser is launched on the first page of a run and torn down by
//! [`PageFetcher::release`] (or on drop). Builds without the `browser`
//! feature, and hosts where no browser can be launched, report
//! [`TrackerError::AutomationUnavailable`].

use async_trait::async_trait;
#[cfg(feature = "browser")]
use tracing::{debug, info};

use super::{PageFetcher, StrategyKind};
use crate::domain::TrackerError;
use crate::infrastructure::config::{BrowserConfig, SiteConfig};
use crate::infrastructure::http_client::search_url;

pub struct RenderedFetcher {
    site: SiteConfig,
    #[cfg_attr(not(feature = "browser"), allow(dead_code))]
    settings: BrowserConfig,
    #[cfg(feature = "browser")]
    session: Option<backend::BrowserSession>,
}

impl RenderedFetcher {
    pub const fn new(site: SiteConfig, settings: BrowserConfig) -> Self {
        Self {
            site,
            settings,
            #[cfg(feature = "browser")]
            session: None,
        }
    }

    /// Whether this build carries a browser backend at all
    pub const fn backend_compiled() -> bool {
        cfg!(feature = "browser")
    }
}

#[async_trait]
impl PageFetcher for RenderedFetcher {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Rendered
    }

    fn stops_on_empty_page(&self) -> bool {
        true
    }

    async fn fetch_page(&mut self, keyword: &str, page: u32) -> Result<String, TrackerError> {
        let url = search_url(&self.site, keyword, page)?;
        self.render(url).await
    }

    async fn release(&mut self) {
        self.close_session();
    }
}

#[cfg(not(feature = "browser"))]
impl RenderedFetcher {
    async fn render(&mut self, _url: String) -> Result<String, TrackerError> {
        Err(TrackerError::automation_unavailable(
            "built without the `browser` feature",
        ))
    }

    fn close_session(&mut self) {}
}

#[cfg(feature = "browser")]
impl RenderedFetcher {
    fn close_session(&mut self) {
        if self.session.take().is_some() {
            info!("🧹 Headless browser closed");
        }
    }

    async fn render(&mut self, url: String) -> Result<String, TrackerError> {
        let tab = match &self.session {
            Some(session) => session.tab(),
            None => {
                let settings = self.settings.clone();
                let session = tokio::task::spawn_blocking(move || backend::BrowserSession::launch(&settings))
                    .await
                    .map_err(|e| TrackerError::automation_unavailable(e.to_string()))?
                    .map_err(|e| TrackerError::automation_unavailable(format!("{e:#}")))?;
                info!("🧭 Headless browser launched");
                let tab = session.tab();
                self.session = Some(session);
                tab
            }
        };

        debug!("Rendering {}", url);
        backend::on_tab(&tab, move |tab| {
            tab.navigate_to(&url)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await?;
        tokio::time::sleep(self.settings.settle_delay.sample()).await;

        let labels = self.settings.consent_labels.clone();
        let dismissed = backend::on_tab(&tab, move |tab| Ok(backend::dismiss_consent(tab, &labels))).await?;
        if dismissed {
            debug!("Consent overlay dismissed");
            tokio::time::sleep(std::time::Duration::from_millis(self.settings.consent_pause_ms)).await;
        }

        for fraction in self.settings.scroll_fractions.clone() {
            backend::on_tab(&tab, move |tab| {
                tab.evaluate(
                    &format!("window.scrollTo(0, document.body.scrollHeight * {fraction});"),
                    false,
                )?;
                Ok(())
            })
            .await?;
            tokio::time::sleep(self.settings.scroll_pause.sample()).await;
        }

        backend::on_tab(&tab, |tab| tab.get_content()).await
    }
}

#[cfg(feature = "browser")]
mod backend {
    use std::ffi::OsStr;
    use std::sync::Arc;
    use std::time::Duration;

    use headless_chrome::protocol::cdp::types::Method;
    use headless_chrome::{Browser, LaunchOptions, Tab};
    use serde::{Deserialize, Serialize};

    use crate::domain::TrackerError;
    use crate::infrastructure::config::BrowserConfig;

    /// `Emulation.setDeviceMetricsOverride` with only the fields a phone profile needs
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MobileMetrics {
        pub width: u32,
        pub height: u32,
        pub device_scale_factor: f64,
        pub mobile: bool,
    }

    #[derive(Debug, Deserialize)]
    pub struct MetricsApplied {}

    impl Method for MobileMetrics {
        const NAME: &'static str = "Emulation.setDeviceMetricsOverride";
        type ReturnObject = MetricsApplied;
    }

    impl MobileMetrics {
        pub fn from_config(settings: &BrowserConfig) -> Self {
            Self {
                width: settings.viewport_width,
                height: settings.viewport_height,
                device_scale_factor: settings.device_scale_factor,
                mobile: true,
            }
        }
    }

    pub struct BrowserSession {
        // Dropping the browser terminates the process
        _browser: Browser,
        tab: Arc<Tab>,
    }

    impl BrowserSession {
        pub fn launch(settings: &BrowserConfig) -> anyhow::Result<Self> {
            let user_agent = format!("--user-agent={}", settings.user_agent);
            let scale = format!("--force-device-scale-factor={}", settings.device_scale_factor);
            let args = vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new(&user_agent),
                OsStr::new(&scale),
            ];

            let browser = Browser::new(LaunchOptions {
                headless: true,
                window_size: Some((settings.viewport_width, settings.viewport_height)),
                args,
                idle_browser_timeout: Duration::from_secs(settings.navigation_timeout_seconds.max(60) * 4),
                ..Default::default()
            })?;

            let tab = browser.new_tab()?;
            tab.set_default_timeout(Duration::from_secs(settings.navigation_timeout_seconds));
            // Touch viewport and mobile layout, not just a phone user agent
            tab.call_method(MobileMetrics::from_config(settings))?;
            Ok(Self { _browser: browser, tab })
        }

        pub fn tab(&self) -> Arc<Tab> {
            Arc::clone(&self.tab)
        }
    }

    /// Run a blocking browser call off the async runtime.
    pub async fn on_tab<T, F>(tab: &Arc<Tab>, op: F) -> Result<T, TrackerError>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = Arc::clone(tab);
        tokio::task::spawn_blocking(move || op(&tab))
            .await
            .map_err(|e| TrackerError::browser(format!("browser task failed: {e}")))?
            .map_err(|e| TrackerError::browser(format!("{e:#}")))
    }

    /// Click the first button whose visible text is an affirmative label.
    ///
    /// An overlay that is absent or cannot be clicked is not an error.
    pub fn dismiss_consent(tab: &Tab, labels: &[String]) -> bool {
        let Ok(buttons) = tab.find_elements("button") else {
            return false;
        };
        for button in buttons {
            let Ok(text) = button.get_inner_text() else {
                continue;
            };
            let text = text.trim().to_lowercase();
            if labels.iter().any(|label| label.to_lowercase() == text) {
                return button.click().is_ok();
            }
        }
        false
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn mobile_metrics_follow_the_configured_viewport() {
            let settings = BrowserConfig::default();
            let metrics = MobileMetrics::from_config(&settings);

            assert_eq!(MobileMetrics::NAME, "Emulation.setDeviceMetricsOverride");
            assert_eq!(
                serde_json::to_value(&metrics).unwrap(),
                serde_json::json!({
                    "width": settings.viewport_width,
                    "height": settings.viewport_height,
                    "deviceScaleFactor": settings.device_scale_factor,
                    "mobile": true,
                })
            );
        }
    }
}
