//! Configuration infrastructure
//!
//! Contains configuration loading and management for rank tracking.
//!
//! Configuration is organized by concern:
//! 1. Site layout (search URL, product path marker)
//! 2. Fetch strategies (lightweight HTTP, rendered browser)
//! 3. Locator and scheduler behavior
//! 4. Logging

#![allow(clippy::derivable_impls)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::TrackerError;

/// Environment variable that force-enables the scheduler at launch
pub const ENABLE_SCHEDULER_ENV: &str = "RANK_TRACKER_ENABLE_SCHEDULER";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub fetch: FetchConfig,
    pub browser: BrowserConfig,
    pub locator: LocatorConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// Search site layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host, no trailing slash
    pub base_url: String,

    /// Path of the search-results page
    pub search_path: String,

    /// Path segment that marks a product-page link
    pub product_path_marker: String,
}

/// Lightweight fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// User agent presented to the site (mobile Safari)
    pub user_agent: String,

    /// Accept-Language header value
    pub accept_language: String,

    /// Randomized wait before every page request
    pub page_delay: DelayWindow,
}

/// Rendered (headless browser) fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Allow the rendered strategy when a backend is present
    pub enabled: bool,

    /// Emulated mobile user agent
    pub user_agent: String,

    /// Viewport width in CSS pixels
    pub viewport_width: u32,

    /// Viewport height in CSS pixels
    pub viewport_height: u32,

    /// Device pixel ratio
    pub device_scale_factor: f64,

    /// Wait after navigation before interacting
    pub settle_delay: DelayWindow,

    /// Affirmative consent button labels (compared case-insensitively)
    pub consent_labels: Vec<String>,

    /// Pause after clicking a consent button in milliseconds
    pub consent_pause_ms: u64,

    /// Fractions of page height scrolled to, in order
    pub scroll_fractions: Vec<f64>,

    /// Pause after each scroll step
    pub scroll_pause: DelayWindow,

    /// Navigation timeout in seconds
    pub navigation_timeout_seconds: u64,
}

/// Ranking locator settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// Pages scanned per strategy before giving up
    pub max_pages: u32,
}

/// Recurring trigger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Start the trigger when the process launches
    pub start_on_launch: bool,

    /// Local hour (0-23) of the daily run
    pub run_hour: u32,

    /// IANA timezone the run hour is interpreted in
    pub timezone: String,

    /// Backoff after an error in the loop's own scheduling arithmetic
    pub error_backoff_seconds: u64,

    /// Bounded wait when joining the loop on stop
    pub stop_join_timeout_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log file name inside the log directory
    pub file_name: String,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

/// Uniform random wait between two bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayWindow {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayWindow {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// No wait at all
    pub const fn none() -> Self {
        Self { min_ms: 0, max_ms: 0 }
    }

    pub fn sample(&self) -> Duration {
        let (low, high) = if self.min_ms <= self.max_ms {
            (self.min_ms, self.max_ms)
        } else {
            (self.max_ms, self.min_ms)
        };
        Duration::from_millis(fastrand::u64(low..=high))
    }

    pub const fn is_zero(&self) -> bool {
        self.min_ms == 0 && self.max_ms == 0
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            fetch: FetchConfig::default(),
            browser: BrowserConfig::default(),
            locator: LocatorConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: bol::BASE_URL.to_string(),
            search_path: bol::SEARCH_PATH.to_string(),
            product_path_marker: bol::PRODUCT_PATH_MARKER.to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::MOBILE_USER_AGENT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            page_delay: DelayWindow::new(defaults::PAGE_DELAY_MIN_MS, defaults::PAGE_DELAY_MAX_MS),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user_agent: defaults::MOBILE_USER_AGENT.to_string(),
            viewport_width: defaults::VIEWPORT_WIDTH,
            viewport_height: defaults::VIEWPORT_HEIGHT,
            device_scale_factor: defaults::DEVICE_SCALE_FACTOR,
            settle_delay: DelayWindow::new(defaults::SETTLE_DELAY_MIN_MS, defaults::SETTLE_DELAY_MAX_MS),
            consent_labels: defaults::CONSENT_LABELS.iter().map(|s| (*s).to_string()).collect(),
            consent_pause_ms: defaults::CONSENT_PAUSE_MS,
            scroll_fractions: defaults::SCROLL_FRACTIONS.to_vec(),
            scroll_pause: DelayWindow::new(defaults::SCROLL_PAUSE_MIN_MS, defaults::SCROLL_PAUSE_MAX_MS),
            navigation_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_pages: defaults::MAX_PAGES,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            start_on_launch: false,
            run_hour: defaults::RUN_HOUR,
            timezone: defaults::SCHEDULER_TIMEZONE.to_string(),
            error_backoff_seconds: defaults::SCHEDULER_ERROR_BACKOFF_SECONDS,
            stop_join_timeout_seconds: defaults::STOP_JOIN_TIMEOUT_SECONDS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: true,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "info".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("h2".to_string(), "warn".to_string());
                filters.insert("tokio".to_string(), "info".to_string());
                filters.insert("headless_chrome".to_string(), "warn".to_string());
                filters.insert("tungstenite".to_string(), "warn".to_string());
                filters.insert("rank_tracker".to_string(), "info".to_string());
                filters
            },
        }
    }
}

impl SchedulerConfig {
    /// Parsed scheduler timezone
    pub fn tz(&self) -> Result<Tz, TrackerError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| TrackerError::config("scheduler.timezone", format!("{}: {e}", self.timezone)))
    }

    pub const fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_seconds)
    }

    pub const fn stop_join_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_join_timeout_seconds)
    }
}

impl AppConfig {
    /// Reject values the runtime cannot honor
    pub fn validate(&self) -> Result<(), TrackerError> {
        self.scheduler.tz()?;
        if self.scheduler.run_hour > 23 {
            return Err(TrackerError::config(
                "scheduler.run_hour",
                format!("{} is not an hour of the day", self.scheduler.run_hour),
            ));
        }
        if self.site.base_url.is_empty() || !self.site.base_url.starts_with("http") {
            return Err(TrackerError::config("site.base_url", "must be an absolute http(s) URL"));
        }
        if self.site.product_path_marker.is_empty() {
            return Err(TrackerError::config("site.product_path_marker", "must not be empty"));
        }
        if let Some(bad) = self
            .browser
            .scroll_fractions
            .iter()
            .find(|f| !(0.0..=1.0).contains(*f))
        {
            return Err(TrackerError::config(
                "browser.scroll_fractions",
                format!("{bad} is outside 0.0..=1.0"),
            ));
        }
        Ok(())
    }

    /// Apply process-environment overrides on top of the file contents
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(ENABLE_SCHEDULER_ENV) {
            self.scheduler.start_on_launch = env_flag(&value);
        }
    }
}

/// `1`, `true`, `yes` (any case, surrounding whitespace ignored)
pub fn env_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("rank-tracker");
        Ok(config_dir)
    }

    /// Create a new configuration manager at the per-user location
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self::with_path(config_dir.join("rank_tracker_config.json")))
    }

    /// Create a configuration manager for an explicit file
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration parse error: {}", parse_error);
                warn!("⚠️  Resetting to default configuration");

                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                } else {
                    info!("Backed up corrupted config to: {:?}", backup_path);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;
                info!("✅ Reset to default configuration");
                Ok(default_config)
            }
        }
    }

    /// Load, apply environment overrides, and validate
    pub async fn load_effective_config(&self) -> Result<AppConfig> {
        let mut config = self.load_config().await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub const fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

/// bol.com URLs and layout constants
pub mod bol {
    /// Base URL for the storefront
    pub const BASE_URL: &str = "https://www.bol.com";

    /// Search-results page path
    pub const SEARCH_PATH: &str = "/nl/nl/s/";

    /// Path segment shared by every product page link
    pub const PRODUCT_PATH_MARKER: &str = "/p/";
}

/// Default configuration values
pub mod defaults {
    /// Pages scanned per strategy
    pub const MAX_PAGES: u32 = 50;

    /// Request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// iPhone Safari
    pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

    /// Randomized wait before each lightweight page request
    pub const PAGE_DELAY_MIN_MS: u64 = 2000;
    pub const PAGE_DELAY_MAX_MS: u64 = 4000;

    /// Mobile viewport
    pub const VIEWPORT_WIDTH: u32 = 390;
    pub const VIEWPORT_HEIGHT: u32 = 844;
    pub const DEVICE_SCALE_FACTOR: f64 = 3.0;

    /// Wait after browser navigation
    pub const SETTLE_DELAY_MIN_MS: u64 = 2000;
    pub const SETTLE_DELAY_MAX_MS: u64 = 3000;

    pub const CONSENT_LABELS: [&str; 4] = ["akkoord", "accept", "accepteer alles", "alles accepteren"];
    pub const CONSENT_PAUSE_MS: u64 = 800;

    pub const SCROLL_FRACTIONS: [f64; 3] = [0.3, 0.6, 0.9];
    pub const SCROLL_PAUSE_MIN_MS: u64 = 600;
    pub const SCROLL_PAUSE_MAX_MS: u64 = 1000;

    /// Daily run at 09:00 Dutch time
    pub const RUN_HOUR: u32 = 9;
    pub const SCHEDULER_TIMEZONE: &str = "Europe/Amsterdam";
    pub const SCHEDULER_ERROR_BACKOFF_SECONDS: u64 = 3600;
    pub const STOP_JOIN_TIMEOUT_SECONDS: u64 = 5;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FILE_NAME: &str = "rank-tracker.log";
    pub const LOG_MAX_FILES: u32 = 10;
}
