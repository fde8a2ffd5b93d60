//! Strategy 3: visible-text price matching.
//!
//! Finds the tightest elements whose text reads like a dinar price and names
//! each one after the closest heading.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{clean_text, ExtractStrategy};
use crate::normalize::{parse_currency_amount, to_ascii_digits, valid_price};
use crate::types::ExtractedItem;

const MAX_CANDIDATES: usize = 200;
const MAX_ITEMS: usize = 20;
const MAX_ANCESTOR_HOPS: usize = 4;
/// Longer text is a paragraph, not a price tag.
const MAX_PRICE_TEXT_CHARS: usize = 64;

const SKIPPED_TAGS: [&str; 6] = ["script", "style", "noscript", "head", "template", "svg"];

static PRICE_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\d+(?:[.,٫]\d+)?\s*(?:KWD|KD|د\.?ك|ك\.?د)|(?:KWD|KD)\s*\d+(?:[.,]\d+)?")
        .expect("valid regex")
});
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h2, h3, h4, h5, [itemprop=name]").expect("valid heading selector")
});

pub struct VisibleTextStrategy;

impl ExtractStrategy for VisibleTextStrategy {
    fn name(&self) -> &'static str {
        "visible_text"
    }

    fn extract(&self, html: &str) -> Vec<ExtractedItem> {
        let document = Html::parse_document(html);
        let mut items = Vec::new();

        for element in price_elements(&document).into_iter().take(MAX_CANDIDATES) {
            let text = clean_text(&element.text().collect::<String>());
            let Some(price) = parse_currency_amount(&text).and_then(valid_price) else {
                continue;
            };
            let Some(name) = nearest_heading(element) else {
                continue;
            };
            items.push(ExtractedItem {
                name,
                price,
                currency: Some("KWD".to_string()),
                url: None,
            });
            if items.len() >= MAX_ITEMS {
                break;
            }
        }

        items
    }
}

/// Elements whose own short text matches the price pattern while none of
/// their child elements do, in document order.
fn price_elements(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| !is_skipped(*el))
        .filter(|el| matches_price_text(*el))
        .filter(|el| !el.child_elements().any(matches_price_text))
        .collect()
}

fn is_skipped(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .chain(std::iter::once(el))
        .any(|e| SKIPPED_TAGS.contains(&e.value().name()))
}

fn matches_price_text(el: ElementRef<'_>) -> bool {
    let text = clean_text(&el.text().collect::<String>());
    if text.is_empty() || text.chars().count() > MAX_PRICE_TEXT_CHARS {
        return false;
    }
    PRICE_TEXT_RE.is_match(&to_ascii_digits(&text))
}

/// First heading inside the closest of up to four ancestors, else the nearest
/// heading among the element's preceding siblings.
fn nearest_heading(el: ElementRef<'_>) -> Option<String> {
    let from_ancestors = el
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(MAX_ANCESTOR_HOPS)
        .find_map(|ancestor| ancestor.select(&HEADING_SELECTOR).find_map(heading_text));
    if from_ancestors.is_some() {
        return from_ancestors;
    }

    el.prev_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sib| HEADING_SELECTOR.matches(sib))
        .and_then(heading_text)
}

fn heading_text(el: ElementRef<'_>) -> Option<String> {
    let text = clean_text(&el.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}
