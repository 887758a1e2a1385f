//! Domain module - core ranking entities and contracts
//!
//! This module contains the value objects, result shapes, and repository
//! contracts that the ranking locator, batch checker, and scheduler share.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod errors;
pub mod product;
pub mod product_url;
pub mod ranking;
pub mod repositories;
pub mod tracked_product;

// Re-export commonly used items for convenience
pub use errors::TrackerError;
pub use product::{ProductRecord, UNKNOWN_PRODUCT_NAME};
pub use product_url::{TargetId, canonical_product_url, name_from_url};
pub use ranking::{LocateResult, TargetMatch};
pub use repositories::TrackedProductStore;
pub use tracked_product::{BatchOutcome, BatchSummary, NewTrackedProduct, RankingHistoryEntry, TrackedProduct};
