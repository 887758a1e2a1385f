//! Display-name resolution for extracted product records
//!
//! Each rule is a pure function over one link element. Rules run in order and
//! the first usable value wins; when none applies the record carries
//! [`UNKNOWN_PRODUCT_NAME`].

use scraper::{ElementRef, Selector};

use super::config::NamingRules;
use crate::domain::UNKNOWN_PRODUCT_NAME;

/// Everything a rule may look at for one link
pub struct NameContext<'a> {
    pub element: ElementRef<'a>,
    pub link_heading: &'a [Selector],
    pub card_name: &'a [Selector],
    pub rules: &'a NamingRules,
}

pub type NameRule = fn(&NameContext<'_>) -> Option<String>;

/// Resolution order for names of product links
pub const LINK_NAME_RULES: [(&str, NameRule); 5] = [
    ("nested_heading", nested_heading),
    ("title_attribute", title_attribute),
    ("link_text", link_text),
    ("aria_label", aria_label),
    ("card_context", card_context),
];

pub fn resolve_link_name(ctx: &NameContext<'_>) -> String {
    LINK_NAME_RULES
        .iter()
        .find_map(|(_, rule)| rule(ctx))
        .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string())
}

/// Name for a card found through its identifier attribute.
pub fn resolve_card_name(card: ElementRef<'_>, card_name: &[Selector], rules: &NamingRules) -> String {
    first_text_in(card, card_name)
        .filter(|text| text.chars().count() > rules.min_card_name_chars)
        .map(|text| bounded(&text, rules.max_name_chars))
        .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string())
}

fn nested_heading(ctx: &NameContext<'_>) -> Option<String> {
    first_text_in(ctx.element, ctx.link_heading).map(|text| bounded(&text, ctx.rules.max_name_chars))
}

fn title_attribute(ctx: &NameContext<'_>) -> Option<String> {
    attribute_text(ctx.element, "title", ctx.rules.max_name_chars)
}

fn link_text(ctx: &NameContext<'_>) -> Option<String> {
    let text = collapsed_text(ctx.element);
    let usable = !text.is_empty()
        && text.chars().count() >= ctx.rules.min_link_text_chars
        && !text.chars().all(|c| c.is_ascii_digit() || c.is_whitespace())
        && !ctx.rules.is_denied_label(&text);
    usable.then(|| bounded(&text, ctx.rules.max_name_chars))
}

fn aria_label(ctx: &NameContext<'_>) -> Option<String> {
    attribute_text(ctx.element, "aria-label", ctx.rules.max_name_chars)
}

fn card_context(ctx: &NameContext<'_>) -> Option<String> {
    let marked_as_card = ctx
        .element
        .value()
        .attr(&ctx.rules.card_marker_attribute)
        .is_some_and(|marker| marker.contains("product"));
    if !marked_as_card {
        return None;
    }

    let parent = ctx.element.parent().and_then(ElementRef::wrap)?;
    first_text_in(parent, ctx.card_name).map(|text| bounded(&text, ctx.rules.max_name_chars))
}

/// Text of the first descendant matching any selector, tried in order.
pub fn first_text_in(element: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|selector| {
        element
            .select(selector)
            .map(collapsed_text)
            .find(|text| !text.is_empty())
    })
}

/// Whitespace-normalized text content of an element.
pub fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn attribute_text(element: ElementRef<'_>, name: &str, max_chars: usize) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| bounded(value, max_chars))
}

fn bounded(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
