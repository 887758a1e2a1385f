//! Rank Tracker - search-result ranking locator for e-commerce listings
//!
//! Finds where a product ranks in a keyword's paginated search results,
//! records that rank over time, and re-checks tracked products daily.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{RankingLocator, TrackerService};
pub use domain::{LocateResult, ProductRecord, TargetId, TrackerError};
