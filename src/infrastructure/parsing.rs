//! HTML parsing infrastructure for search-result pages
//!
//! Selector configuration, the ordered name-resolution chain, and the
//! two-pass result extractor.

pub mod config;
pub mod name_resolution;
pub mod result_extractor;

// Re-export public types
pub use config::{NamingRules, ParsingConfig, ResultSelectors};
pub use result_extractor::ResultExtractor;
