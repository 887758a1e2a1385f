use serde::{Deserialize, Serialize};

/// Placeholder name for a record whose display name could not be resolved.
/// Callers treat it as "extraction failed to find a name".
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// Product card as seen on one search-results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Site-assigned numeric identifier (10+ digits)
    pub id: String,
    pub name: String,
    pub url: String,
}

impl ProductRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn has_resolved_name(&self) -> bool {
        !self.name.is_empty() && self.name != UNKNOWN_PRODUCT_NAME
    }
}
