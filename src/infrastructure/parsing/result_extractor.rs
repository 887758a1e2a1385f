//! Search-result extractor
//!
//! Turns one page of markup into an ordered, deduplicated list of product
//! records. Markup that lacks the expected structure never errors: it yields
//! fewer records or records carrying the sentinel name.

use std::collections::HashSet;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::config::{NamingRules, ParsingConfig};
use super::name_resolution::{NameContext, resolve_card_name, resolve_link_name};
use crate::domain::{ProductRecord, TargetId, canonical_product_url};

static PRODUCT_ID_IN_HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{10,})/").expect("static regex"));

/// Extractor for search-result listing pages
#[derive(Debug)]
pub struct ResultExtractor {
    base_url: String,
    product_path_marker: String,
    product_link_selectors: Vec<Selector>,
    link_heading_selectors: Vec<Selector>,
    product_card_selectors: Vec<Selector>,
    card_name_selectors: Vec<Selector>,
    naming: NamingRules,
}

impl ResultExtractor {
    /// Create an extractor with default selectors
    pub fn new() -> Result<Self> {
        Self::with_config(&ParsingConfig::default())
    }

    /// Create an extractor with custom selector configuration
    pub fn with_config(config: &ParsingConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            product_path_marker: config.product_path_marker.clone(),
            product_link_selectors: Self::compile_selectors(&config.selectors.product_link)?,
            link_heading_selectors: Self::compile_selectors(&config.selectors.link_heading)?,
            product_card_selectors: Self::compile_selectors(&config.selectors.product_card)?,
            card_name_selectors: Self::compile_selectors(&config.selectors.card_name)?,
            naming: config.naming.clone(),
        })
    }

    /// Compile multiple selector strings into Selector objects
    fn compile_selectors(selector_strings: &[String]) -> Result<Vec<Selector>> {
        let mut selectors = Vec::new();
        let mut errors = Vec::new();

        for selector_str in selector_strings {
            match Selector::parse(selector_str) {
                Ok(selector) => selectors.push(selector),
                Err(e) => {
                    warn!("Failed to compile selector '{}': {}", selector_str, e);
                    errors.push(format!("'{selector_str}': {e}"));
                }
            }
        }

        if selectors.is_empty() {
            return Err(anyhow::anyhow!(
                "No valid selectors compiled. Errors: {}",
                errors.join(", ")
            ));
        }

        Ok(selectors)
    }

    /// Extract product records in document order, deduplicated by identifier.
    pub fn extract(&self, markup: &str) -> Vec<ProductRecord> {
        let document = Html::parse_document(markup);
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        self.collect_linked_products(&document, &mut seen_ids, &mut records);
        let linked = records.len();
        self.collect_attributed_cards(&document, &mut seen_ids, &mut records);

        debug!(
            "Extracted {} records ({} from links, {} from id attributes)",
            records.len(),
            linked,
            records.len() - linked
        );
        records
    }

    /// First pass: hyperlinks whose path contains the product marker.
    fn collect_linked_products(
        &self,
        document: &Html,
        seen_ids: &mut HashSet<String>,
        records: &mut Vec<ProductRecord>,
    ) {
        for selector in &self.product_link_selectors {
            for link in document.select(selector) {
                let Some(href) = link.value().attr("href") else {
                    continue;
                };
                if !href.contains(&self.product_path_marker) {
                    continue;
                }
                let Some(id) = product_id_from_href(href) else {
                    continue;
                };
                if seen_ids.contains(id) {
                    continue;
                }

                let name = resolve_link_name(&NameContext {
                    element: link,
                    link_heading: &self.link_heading_selectors,
                    card_name: &self.card_name_selectors,
                    rules: &self.naming,
                });
                seen_ids.insert(id.to_string());
                records.push(ProductRecord::new(id, name, self.resolve_url(href)));
            }
        }
    }

    /// Second pass: cards that carry the identifier as an attribute.
    fn collect_attributed_cards(
        &self,
        document: &Html,
        seen_ids: &mut HashSet<String>,
        records: &mut Vec<ProductRecord>,
    ) {
        for selector in &self.product_card_selectors {
            for card in document.select(selector) {
                let Some(id) = card.value().attr(&self.naming.product_id_attribute) else {
                    continue;
                };
                if !TargetId::is_valid_raw(id) || seen_ids.contains(id) {
                    continue;
                }

                let name = resolve_card_name(card, &self.card_name_selectors, &self.naming);
                seen_ids.insert(id.to_string());
                records.push(ProductRecord::new(id, name, canonical_product_url(&self.base_url, id)));
            }
        }
    }

    /// Resolve relative URLs to absolute URLs
    fn resolve_url(&self, href: &str) -> String {
        if href.starts_with("http") {
            href.to_string()
        } else if href.starts_with('/') {
            format!("{}{}", self.base_url, href)
        } else {
            format!("{}/{}", self.base_url, href)
        }
    }
}

fn product_id_from_href(href: &str) -> Option<&str> {
    PRODUCT_ID_IN_HREF
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UNKNOWN_PRODUCT_NAME;
    use proptest::prelude::*;

    fn extractor() -> ResultExtractor {
        ResultExtractor::new().unwrap()
    }

    #[test]
    fn test_extractor_creation() {
        assert!(ResultExtractor::new().is_ok());
    }

    #[test]
    fn extracts_links_in_document_order() {
        let html = r#"
            <ul>
                <li><a href="/nl/nl/p/lenor-geurbooster/9300000170626119/"><h2>Lenor Geurbooster</h2></a></li>
                <li><a href="https://www.bol.com/nl/nl/p/ariel-pods/9200000012345678/?cid=1"><h3>Ariel Pods</h3></a></li>
                <li><a href="/nl/nl/l/wasmiddel/12345/">category link</a></li>
            </ul>
        "#;
        let records = extractor().extract(html);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "9300000170626119");
        assert_eq!(records[0].name, "Lenor Geurbooster");
        assert_eq!(records[0].url, "https://www.bol.com/nl/nl/p/lenor-geurbooster/9300000170626119/");
        assert_eq!(records[1].id, "9200000012345678");
        assert_eq!(records[1].url, "https://www.bol.com/nl/nl/p/ariel-pods/9200000012345678/?cid=1");
    }

    #[test]
    fn duplicate_links_keep_first_extraction() {
        let html = r#"
            <div><a href="/nl/nl/p/lenor/9300000170626119/" data-testid="product-image"></a></div>
            <a href="/nl/nl/p/lenor/9300000170626119/"><h2>Second Name</h2></a>
            <a href="/nl/nl/p/lenor/9300000170626119/">Meer verkopers</a>
        "#;
        let records = extractor().extract(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, UNKNOWN_PRODUCT_NAME);
    }

    #[test]
    fn attribute_pass_appends_unseen_cards_with_canonical_url() {
        let html = r#"
            <a href="/nl/nl/p/lenor/9300000170626119/"><h2>Lenor</h2></a>
            <div data-product-id="9300000170626119"><h2>Dup</h2></div>
            <div data-product-id="9300000099999999"><span>Robijn Wasverzachter</span></div>
            <div data-product-id="12345"><span>too short id</span></div>
        "#;
        let records = extractor().extract(html);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, "9300000099999999");
        assert_eq!(records[1].name, "Robijn Wasverzachter");
        assert_eq!(records[1].url, "https://www.bol.com/nl/nl/p/9300000099999999/");
    }

    #[test]
    fn markup_without_products_yields_nothing() {
        assert!(extractor().extract("<html><body><p>Geen resultaten</p></body></html>").is_empty());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn ids_shorter_than_ten_digits_are_ignored() {
        let html = r#"<a href="/nl/nl/p/thing/123456789/">Thing with a long enough name</a>"#;
        assert!(extractor().extract(html).is_empty());
    }

    fn page_from_ids(ids: &[u64]) -> String {
        ids.iter()
            .map(|id| format!(r#"<a href="/nl/nl/p/item/{id}/"><h2>Item {id}</h2></a>"#))
            .collect()
    }

    proptest! {
        #[test]
        fn extracted_ids_are_unique_and_first_seen(ids in proptest::collection::vec(1_000_000_000u64..1_000_000_050u64, 0..60)) {
            let records = extractor().extract(&page_from_ids(&ids));

            let mut expected: Vec<String> = Vec::new();
            for id in &ids {
                let id = id.to_string();
                if !expected.contains(&id) {
                    expected.push(id);
                }
            }
            let got: Vec<String> = records.into_iter().map(|r| r.id).collect();
            prop_assert_eq!(got, expected);
        }
    }
}
