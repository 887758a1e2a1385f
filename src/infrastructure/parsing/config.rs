//! Parsing configuration for search-result extraction
//!
//! Centralized configuration for CSS selectors and naming rules.

use serde::{Deserialize, Serialize};

use crate::infrastructure::config::bol;

/// Main extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// Base URL for resolving relative product links
    pub base_url: String,

    /// Path segment every product-page link contains
    pub product_path_marker: String,

    /// Selectors for result cards and their names
    pub selectors: ResultSelectors,

    /// Rules applied while resolving a record's display name
    pub naming: NamingRules,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            base_url: bol::BASE_URL.to_string(),
            product_path_marker: bol::PRODUCT_PATH_MARKER.to_string(),
            selectors: ResultSelectors::default(),
            naming: NamingRules::default(),
        }
    }
}

impl ParsingConfig {
    pub fn for_site(base_url: &str, product_path_marker: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            product_path_marker: product_path_marker.to_string(),
            ..Self::default()
        }
    }
}

/// CSS selectors for search-result pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSelectors {
    /// Hyperlink-like elements scanned in the first pass
    pub product_link: Vec<String>,

    /// Heading elements nested inside a product link, in priority order
    pub link_heading: Vec<String>,

    /// Elements carrying an explicit product identifier (second pass)
    pub product_card: Vec<String>,

    /// Name candidates inside a card or a link's parent, in priority order
    pub card_name: Vec<String>,
}

impl Default for ResultSelectors {
    fn default() -> Self {
        Self {
            product_link: vec!["a[href]".to_string()],
            link_heading: vec!["h2".to_string(), "h3".to_string()],
            product_card: vec!["[data-product-id]".to_string()],
            card_name: vec!["h2".to_string(), "h3".to_string(), "span".to_string()],
        }
    }
}

/// Display-name rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingRules {
    /// Names are truncated to this many characters
    pub max_name_chars: usize,

    /// A link's own text shorter than this is not a name
    pub min_link_text_chars: usize,

    /// A card name candidate must be longer than this
    pub min_card_name_chars: usize,

    /// Generic UI labels that never name a product (compared case-insensitively)
    pub denied_link_labels: Vec<String>,

    /// Attribute marking an element as a product card
    pub card_marker_attribute: String,

    /// Attribute holding the identifier in the second pass
    pub product_id_attribute: String,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            max_name_chars: 100,
            min_link_text_chars: 10,
            min_card_name_chars: 3,
            denied_link_labels: vec![
                "more sellers".to_string(),
                "view product".to_string(),
                "view details".to_string(),
                "meer verkopers".to_string(),
                "bekijk product".to_string(),
                "bekijk details".to_string(),
            ],
            card_marker_attribute: "data-testid".to_string(),
            product_id_attribute: "data-product-id".to_string(),
        }
    }
}

impl NamingRules {
    pub fn is_denied_label(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.denied_link_labels.iter().any(|label| label.to_lowercase() == lowered)
    }
}
