//! Infrastructure layer for configuration, logging, fetching, and parsing
//!
//! This module provides the configuration manager, the tracing setup, the
//! mobile HTTP client, both page-fetch strategies, the search-result
//! extractor, and the in-memory tracked-product store.

pub mod config; // Configuration sections and the JSON config manager
pub mod fetching; // Lightweight and rendered page fetchers
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod memory_store;
pub mod parsing; // Result extraction and name resolution

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, bol};
pub use fetching::{FetchStrategy, FetcherFactory, PageFetcher, StrategyKind, StrategySet};
pub use http_client::{HttpClient, HttpClientConfig, search_url};
pub use logging::{get_log_directory, init_logging_with_config};
pub use memory_store::InMemoryStore;
pub use parsing::{ParsingConfig, ResultExtractor};
