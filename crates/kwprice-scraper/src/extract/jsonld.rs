//! Strategy 1: schema.org JSON-LD extraction.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::json_scan::{json_price, walk_objects};
use super::{clean_text, ExtractStrategy};
use crate::types::ExtractedItem;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

const PRICED_TYPES: [&str; 3] = ["Product", "MenuItem", "IndividualProduct"];

pub struct JsonLdStrategy;

impl ExtractStrategy for JsonLdStrategy {
    fn name(&self) -> &'static str {
        "jsonld"
    }

    fn extract(&self, html: &str) -> Vec<ExtractedItem> {
        let mut results = Vec::new();

        for cap in SCRIPT_RE.captures_iter(html) {
            let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
            if raw.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<Value>(raw) else {
                continue;
            };
            // Top-level objects, arrays, and `@graph` containers are all
            // reached by the walk.
            walk_objects(&value, |map| {
                if let Some(item) = jsonld_node_to_item(map) {
                    results.push(item);
                }
            });
        }

        results
    }
}

fn jsonld_node_to_item(node: &Map<String, Value>) -> Option<ExtractedItem> {
    let offers = node.get("offers");
    if !has_priced_type(node.get("@type")) && offers.is_none() {
        return None;
    }

    let name = node
        .get("name")
        .and_then(Value::as_str)
        .map(clean_text)
        .filter(|n| !n.is_empty())?;

    let offer = offers.and_then(|o| match o {
        Value::Array(items) => items.first(),
        other => Some(other),
    });
    let price = offer
        .and_then(|o| o.get("price").or_else(|| o.get("lowPrice")))
        .and_then(json_price)
        .or_else(|| node.get("price").and_then(json_price))?;
    let currency = offer
        .and_then(|o| o.get("priceCurrency"))
        .or_else(|| node.get("priceCurrency"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let url = node
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ExtractedItem {
        name,
        price,
        currency,
        url,
    })
}

/// `@type` may be a plain string or an array of strings.
fn has_priced_type(type_node: Option<&Value>) -> bool {
    let matches = |s: &str| PRICED_TYPES.iter().any(|t| s.eq_ignore_ascii_case(t));
    match type_node {
        Some(Value::String(s)) => matches(s),
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> Vec<ExtractedItem> {
        JsonLdStrategy.extract(html)
    }

    #[test]
    fn product_with_offer_object() {
        let html = r#"<script type="application/ld+json">
            {"@context":"https://schema.org","@type":"Product","name":"Galaxy S24",
             "offers":{"@type":"Offer","price":"279.900","priceCurrency":"KWD"}}
        </script>"#;
        let items = extract(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Galaxy S24");
        assert!((items[0].price - 279.9).abs() < 1e-9);
        assert_eq!(items[0].currency.as_deref(), Some("KWD"));
    }

    #[test]
    fn offer_array_and_low_price() {
        let html = r#"<script type="application/ld+json">
            {"@type":["Product"],"name":"AirPods Pro","offers":[{"@type":"AggregateOffer","lowPrice":69.5}]}
        </script>"#;
        let items = extract(html);
        assert_eq!(items.len(), 1);
        assert!((items[0].price - 69.5).abs() < 1e-9);
    }

    #[test]
    fn menu_items_nested_in_graph_sections() {
        let html = r#"<script type='application/ld+json'>
            {"@graph":[{"@type":"Restaurant","name":"Shawarma House",
              "hasMenu":{"@type":"Menu","hasMenuSection":[{"@type":"MenuSection","name":"Wraps",
                "hasMenuItem":[
                  {"@type":"MenuItem","name":"Chicken Shawarma","offers":{"price":"1.250"}},
                  {"@type":"MenuItem","name":"Beef Shawarma","price":1.5}
                ]}]}}]}
        </script>"#;
        let items = extract(html);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Chicken Shawarma", "Beef Shawarma"]);
    }

    #[test]
    fn malformed_block_is_skipped_but_others_parse() {
        let html = r#"
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">{"@type":"MenuItem","name":"Tea","offers":{"price":0.3}}</script>
        "#;
        let items = extract(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Tea");
    }

    #[test]
    fn unpriced_and_untyped_nodes_are_ignored() {
        let html = r#"<script type="application/ld+json">
            [{"@type":"Organization","name":"Xcite","price":5},
             {"@type":"Product","name":"Cable"},
             {"@type":"Product","name":"Free Gift","offers":{"price":"0.000"}}]
        </script>"#;
        assert!(extract(html).is_empty());
    }
}
