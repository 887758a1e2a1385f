//! Ranking outcome shapes

use serde::{Deserialize, Serialize};

use super::product::ProductRecord;

/// Where the target surfaced within one strategy's scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMatch {
    pub found: bool,
    pub page: Option<u32>,
    pub position_on_page: Option<u32>,
    pub absolute_position: Option<u32>,
}

impl TargetMatch {
    pub const fn not_found() -> Self {
        Self {
            found: false,
            page: None,
            position_on_page: None,
            absolute_position: None,
        }
    }

    /// `records_before_page` counts every record from pages strictly before `page`;
    /// `position_on_page` is 1-based.
    pub const fn found_at(page: u32, position_on_page: u32, records_before_page: u32) -> Self {
        Self {
            found: true,
            page: Some(page),
            position_on_page: Some(position_on_page),
            absolute_position: Some(records_before_page + position_on_page),
        }
    }
}

/// Externally visible outcome of one ranking check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocateResult {
    /// 1-based position on the page where the target was found
    pub position: Option<u32>,
    /// 1-based rank across every scanned page
    pub absolute_position: Option<u32>,
    pub page: Option<u32>,
    pub product: Option<ProductRecord>,
    pub total_scanned: u32,
}

impl LocateResult {
    pub const fn not_found(total_scanned: u32) -> Self {
        Self {
            position: None,
            absolute_position: None,
            page: None,
            product: None,
            total_scanned,
        }
    }

    pub const fn is_found(&self) -> bool {
        self.position.is_some()
    }
}
