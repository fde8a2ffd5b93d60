//! Price extraction cascade.
//!
//! Strategies run in priority order and the first one that produces at
//! least one valid candidate wins:
//!
//! 1. `jsonld`: schema.org `Product` / `MenuItem` / offer-bearing nodes
//! 2. `app_state`: `__NEXT_DATA__` and `window.__*_STATE__` payloads
//! 3. `visible_text`: number-plus-currency text with a nearby heading

mod app_state;
pub(crate) mod json_scan;
mod jsonld;
mod visible;

use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::types::ExtractedItem;

pub use app_state::AppStateStrategy;
pub use jsonld::JsonLdStrategy;
pub use visible::VisibleTextStrategy;

static OG_TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("valid og:title selector")
});
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid title selector"));

/// One way of pulling priced items out of a page body.
///
/// Implementations must not fail: malformed input yields an empty list.
pub trait ExtractStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, html: &str) -> Vec<ExtractedItem>;
}

/// Items found on a page and the strategy that found them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub strategy: Option<&'static str>,
    pub items: Vec<ExtractedItem>,
}

pub struct PriceExtractor {
    strategies: Vec<Box<dyn ExtractStrategy>>,
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(JsonLdStrategy),
            Box::new(AppStateStrategy),
            Box::new(VisibleTextStrategy),
        ])
    }
}

impl PriceExtractor {
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn ExtractStrategy>>) -> Self {
        Self { strategies }
    }

    /// Run the cascade over `html`, returning the first non-empty result.
    #[must_use]
    pub fn extract(&self, html: &str) -> Extraction {
        for strategy in &self.strategies {
            let items: Vec<ExtractedItem> = strategy
                .extract(html)
                .into_iter()
                .filter(|item| {
                    !item.name.trim().is_empty() && item.price > 0.0 && item.priced_in_kwd()
                })
                .collect();
            if !items.is_empty() {
                tracing::debug!(
                    strategy = strategy.name(),
                    count = items.len(),
                    "extraction strategy matched"
                );
                return Extraction {
                    strategy: Some(strategy.name()),
                    items,
                };
            }
        }
        Extraction::default()
    }
}

/// Restaurant or store name for a page: `og:title`, else `<title>`, cut at
/// the first `|` separator.
#[must_use]
pub fn page_group_label(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let og_title = document
        .select(&OG_TITLE_SELECTOR)
        .find_map(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let title = og_title.or_else(|| {
        document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>())
    })?;

    let label = title.split('|').next().unwrap_or_default().trim();
    if label.is_empty() {
        None
    } else {
        Some(label.to_string())
    }
}

/// Collapse runs of whitespace and trim.
pub(crate) fn clean_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Vec<ExtractedItem>);

    impl ExtractStrategy for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn extract(&self, _html: &str) -> Vec<ExtractedItem> {
            self.1.clone()
        }
    }

    fn item(name: &str, price: f64) -> ExtractedItem {
        ExtractedItem {
            name: name.to_string(),
            price,
            currency: None,
            url: None,
        }
    }

    #[test]
    fn cascade_stops_at_first_strategy_with_valid_items() {
        let extractor = PriceExtractor::new(vec![
            Box::new(Fixed("empty", vec![])),
            Box::new(Fixed("blank_names", vec![item("  ", 1.0)])),
            Box::new(Fixed("good", vec![item("Falafel", 0.5)])),
            Box::new(Fixed("never", vec![item("Other", 2.0)])),
        ]);
        let extraction = extractor.extract("<html></html>");
        assert_eq!(extraction.strategy, Some("good"));
        assert_eq!(extraction.items, vec![item("Falafel", 0.5)]);
    }

    #[test]
    fn plain_page_extracts_nothing() {
        let html = "<html><body><h1>About us</h1><p>Open daily from 10am.</p></body></html>";
        let extraction = PriceExtractor::default().extract(html);
        assert!(extraction.items.is_empty());
        assert_eq!(extraction.strategy, None);
    }

    #[test]
    fn jsonld_wins_over_visible_text() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"Product","name":"iPhone 15","offers":{"price":"299.900","priceCurrency":"KWD"}}</script>
            </head><body><h3>Case</h3><span>5 KWD</span></body></html>"#;
        let extraction = PriceExtractor::default().extract(html);
        assert_eq!(extraction.strategy, Some("jsonld"));
        assert_eq!(extraction.items.len(), 1);
        assert_eq!(extraction.items[0].name, "iPhone 15");
    }

    #[test]
    fn foreign_currency_offers_fall_through_to_next_strategy() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"Product","name":"iPhone","offers":{"price":"999","priceCurrency":"USD"}}</script>
            </head><body></body></html>"#;
        let extraction = PriceExtractor::default().extract(html);
        assert!(extraction.items.is_empty());

        let mixed = r#"<script type="application/ld+json">[
            {"@type":"Product","name":"iPhone US","offers":{"price":"999","priceCurrency":"USD"}},
            {"@type":"Product","name":"iPhone KW","offers":{"price":"299.9","priceCurrency":"KWD"}}
        ]</script>"#;
        let extraction = PriceExtractor::default().extract(mixed);
        let names: Vec<&str> = extraction.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["iPhone KW"]);
    }

    #[test]
    fn group_label_prefers_og_title_and_trims_suffix() {
        let html = r#"<html><head><title>Ignored</title>
            <meta property="og:title" content="Shawarma House | Order online | Talabat"></head></html>"#;
        assert_eq!(page_group_label(html).as_deref(), Some("Shawarma House"));
    }

    #[test]
    fn group_label_falls_back_to_title() {
        let html = "<html><head><title>  Burger Joint | Deliveroo </title></head></html>";
        assert_eq!(page_group_label(html).as_deref(), Some("Burger Joint"));
    }

    #[test]
    fn group_label_none_without_titles() {
        assert_eq!(page_group_label("<html><body></body></html>"), None);
    }
}
