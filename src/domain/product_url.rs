//! Product URL helpers
//!
//! Target identifiers live in the product page path as a run of 10+ digits
//! between two `/` delimiters, e.g.
//! `/nl/nl/p/lenor-geurbooster-voor-je-was/9300000170626119/?cid=...`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::TrackerError;

static PRODUCT_ID_IN_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{10,})/").expect("static regex"));
static PRODUCT_SLUG_AND_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/p/([^/]+)/(\d{10,})/").expect("static regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Segments that never carry a product name.
const NON_NAME_SEGMENTS: [&str; 5] = ["nl", "p", "www.bol.com", "https:", "http:"];

/// Fallback when the URL has no usable segment.
pub const URL_NAME_FALLBACK: &str = "Product from URL";

/// Validated site product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetId(String);

impl TargetId {
    /// Extract the identifier from a product URL.
    pub fn from_url(url: &str) -> Result<Self, TrackerError> {
        PRODUCT_ID_IN_PATH
            .captures(url)
            .and_then(|caps| caps.get(1))
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| TrackerError::validation(url, "could not extract product ID from URL"))
    }

    /// Identifier of an element attribute or bare input: all digits, 10 or more.
    pub fn is_valid_raw(raw: &str) -> bool {
        raw.len() >= 10 && raw.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TargetId {
    type Err = TrackerError;

    /// Accepts a bare identifier or any URL that embeds one.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if Self::is_valid_raw(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        Self::from_url(trimmed)
            .map_err(|_| TrackerError::validation(trimmed, "expected a 10+ digit product id or a product URL"))
    }
}

impl TryFrom<String> for TargetId {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetId> for String {
    fn from(id: TargetId) -> Self {
        id.0
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical product page URL for an identifier found without a link.
pub fn canonical_product_url(base_url: &str, id: &str) -> String {
    format!("{}/nl/nl/p/{}/", base_url.trim_end_matches('/'), id)
}

/// Human-readable name derived from the URL structure.
///
/// `/p/<slug>/<id>/` wins; otherwise the first descriptive path segment.
pub fn name_from_url(product_url: &str) -> String {
    if let Some(slug) = PRODUCT_SLUG_AND_ID.captures(product_url).and_then(|caps| caps.get(1)) {
        return humanize_slug(slug.as_str());
    }

    product_url
        .split('/')
        .find(|part| {
            !part.is_empty()
                && !part.bytes().all(|b| b.is_ascii_digit())
                && part.chars().count() > 5
                && !NON_NAME_SEGMENTS.contains(part)
        })
        .map_or_else(|| URL_NAME_FALLBACK.to_string(), humanize_slug)
}

fn humanize_slug(slug: &str) -> String {
    let spaced = title_case(&slug.replace('-', " "));
    WHITESPACE_RUN.replace_all(&spaced, " ").trim().to_string()
}

/// Upper-cases every letter that follows a non-letter, lower-cases the rest.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut previous_is_letter = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if previous_is_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(ch);
            previous_is_letter = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const LENOR_URL: &str = "https://www.bol.com/nl/nl/p/lenor-geurbooster-voor-je-was-orchidee-en-amber-voordeelverpakking-6-x-235g/9300000170626119/?cid=1758284946748-3945200593830&bltgh=54e38dc7.ProductList_Middle.0.ProductImage";

    #[test]
    fn extracts_id_from_product_url() {
        let id = TargetId::from_url(LENOR_URL).unwrap();
        assert_eq!(id.as_str(), "9300000170626119");
    }

    #[rstest]
    #[case("9300000170626119", "9300000170626119")]
    #[case("  9300000170626119 ", "9300000170626119")]
    #[case("/nl/nl/p/x/1234567890/", "1234567890")]
    fn parses_bare_ids_and_urls(#[case] input: &str, #[case] expected: &str) {
        let id: TargetId = input.parse().unwrap();
        assert_eq!(id.as_str(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("123456789")]
    #[case("https://www.bol.com/nl/nl/p/no-id-here/")]
    #[case("https://www.bol.com/nl/nl/p/slug/123456789/")]
    #[case("93000001706261a9")]
    fn rejects_malformed_targets(#[case] input: &str) {
        let err = input.parse::<TargetId>().unwrap_err();
        assert!(matches!(err, TrackerError::Validation { .. }));
    }

    #[test]
    fn name_from_slug_is_title_cased() {
        assert_eq!(
            name_from_url(LENOR_URL),
            "Lenor Geurbooster Voor Je Was Orchidee En Amber Voordeelverpakking 6 X 235G"
        );
    }

    #[test]
    fn name_from_descriptive_segment_without_slug_shape() {
        assert_eq!(
            name_from_url("https://www.bol.com/nl/nl/l/wasverzachters/12345/"),
            "Wasverzachters"
        );
    }

    #[test]
    fn name_from_url_falls_back_to_placeholder() {
        assert_eq!(name_from_url("https://a.b/nl/p/1234567890/"), URL_NAME_FALLBACK);
    }

    #[test]
    fn canonical_url_trims_base_slash() {
        assert_eq!(
            canonical_product_url("https://www.bol.com/", "9300000170626119"),
            "https://www.bol.com/nl/nl/p/9300000170626119/"
        );
    }
}
