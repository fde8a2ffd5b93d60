//! Bounded walk over arbitrary JSON, used for embedded app state and
//! suggest-endpoint payloads.

use serde_json::{Map, Value};

use crate::normalize::{parse_currency_amount, valid_price};
use crate::types::ExtractedItem;

pub(crate) const MAX_DEPTH: usize = 64;
pub(crate) const MAX_NODES: usize = 50_000;

const NAME_KEYS: [&str; 2] = ["name", "title"];
const PRICE_KEYS: [&str; 3] = ["price", "amount", "priceString"];
const URL_KEYS: [&str; 3] = ["url", "link", "href"];

/// Visit every object reachable from `root`, depth-first, stopping once
/// [`MAX_NODES`] values have been seen. Children deeper than [`MAX_DEPTH`]
/// are not descended into.
pub(crate) fn walk_objects<'a>(root: &'a Value, mut visit: impl FnMut(&'a Map<String, Value>)) {
    let mut stack: Vec<(&'a Value, usize)> = vec![(root, 0)];
    let mut visited = 0usize;

    while let Some((value, depth)) = stack.pop() {
        visited += 1;
        if visited > MAX_NODES {
            tracing::debug!(max_nodes = MAX_NODES, "json scan node budget exhausted");
            break;
        }
        let children: Box<dyn Iterator<Item = &'a Value>> = match value {
            Value::Object(map) => {
                visit(map);
                Box::new(map.values())
            }
            Value::Array(items) => Box::new(items.iter()),
            _ => continue,
        };
        if depth >= MAX_DEPTH {
            continue;
        }
        // Reverse so the first child is visited first.
        let mut pending: Vec<&'a Value> = children.collect();
        pending.reverse();
        stack.extend(pending.into_iter().map(|child| (child, depth + 1)));
    }
}

/// Collect every object that carries both a name-like and a price-like key.
pub(crate) fn scan_priced_nodes(root: &Value) -> Vec<ExtractedItem> {
    let mut out = Vec::new();
    walk_objects(root, |map| {
        if let Some(item) = priced_node(map) {
            out.push(item);
        }
    });
    out
}

fn priced_node(map: &Map<String, Value>) -> Option<ExtractedItem> {
    let name = NAME_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(|v| v.as_str().map(str::trim).filter(|s| !s.is_empty()))?;
    let price = PRICE_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(json_price)?;
    let url = URL_KEYS
        .iter()
        .filter_map(|k| map.get(*k))
        .find_map(|v| v.as_str().map(str::trim).filter(|s| !s.is_empty()))
        .map(str::to_string);
    let currency = map
        .get("currency")
        .or_else(|| map.get("priceCurrency"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ExtractedItem {
        name: name.to_string(),
        price,
        currency,
        url,
    })
}

/// Read a price from a JSON number or a currency string.
pub(crate) fn json_price(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_currency_amount(s),
        _ => None,
    }?;
    valid_price(raw)
}
