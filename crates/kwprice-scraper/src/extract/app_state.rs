//! Strategy 2: embedded single-page-app state.
//!
//! Next.js ships its props in `<script id="__NEXT_DATA__">`; Redux and Nuxt
//! sites assign an object literal to `window.__INITIAL_STATE__` and friends.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::json_scan::scan_priced_nodes;
use super::ExtractStrategy;
use crate::types::ExtractedItem;

static NEXT_DATA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("script#__NEXT_DATA__").expect("valid __NEXT_DATA__ selector")
});
static WINDOW_STATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"window\.(?:__INITIAL_STATE__|__PRELOADED_STATE__|__NUXT__)\s*=\s*")
        .expect("valid regex")
});

pub struct AppStateStrategy;

impl ExtractStrategy for AppStateStrategy {
    fn name(&self) -> &'static str {
        "app_state"
    }

    fn extract(&self, html: &str) -> Vec<ExtractedItem> {
        if let Some(raw) = next_data_text(html) {
            return match serde_json::from_str(&raw) {
                Ok(value) => scan_priced_nodes(&value),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to parse __NEXT_DATA__");
                    Vec::new()
                }
            };
        }

        let mut results = Vec::new();
        for m in WINDOW_STATE_RE.find_iter(html) {
            let tail = &html[m.end()..];
            let Some(literal) = extract_balanced(tail) else {
                continue;
            };
            match serde_json::from_str(literal) {
                Ok(value) => results.extend(scan_priced_nodes(&value)),
                Err(e) => tracing::debug!(error = %e, "window state is not plain JSON"),
            }
        }
        results
    }
}

fn next_data_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let text: String = document.select(&NEXT_DATA_SELECTOR).next()?.text().collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Return the balanced `{...}` or `[...]` literal at the start of `s`.
///
/// Brackets inside single- or double-quoted strings are ignored.
pub(crate) fn extract_balanced(s: &str) -> Option<&str> {
    if !s.starts_with('{') && !s.starts_with('[') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if let Some(q) = quote {
            match c {
                '\\' => escape = true,
                c if c == q => quote = None,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_data_menu_is_scanned() {
        let html = r#"<html><body><script id="__NEXT_DATA__" type="application/json">
            {"props":{"pageProps":{"restaurant":{"menu":{"sections":[
              {"items":[{"name":"Mandi Chicken","price":2.75},{"name":"Laban","price":"0.250 KD"}]}
            ]}}}}}
        </script></body></html>"#;
        let items = AppStateStrategy.extract(html);
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Mandi Chicken", "Laban"]);
    }

    #[test]
    fn window_initial_state_literal_is_recovered() {
        let html = r#"<script>
            window.__INITIAL_STATE__ = {"search":{"results":[{"title":"PS5 Slim","amount":"149.900 KWD","note":"has } brace"}]}};
            window.dataLayer = [];
        </script>"#;
        let items = AppStateStrategy.extract(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "PS5 Slim");
        assert!((items[0].price - 149.9).abs() < 1e-9);
    }

    #[test]
    fn broken_next_data_yields_nothing() {
        let html = r#"<script id="__NEXT_DATA__">{"props": </script>"#;
        assert!(AppStateStrategy.extract(html).is_empty());
    }

    #[test]
    fn nuxt_function_payload_is_ignored() {
        let html = "<script>window.__NUXT__=(function(a){return {x:a}}(1));</script>";
        assert!(AppStateStrategy.extract(html).is_empty());
    }

    #[test]
    fn balanced_scan_handles_nesting_and_strings() {
        let s = r#"{"a":[1,{"b":"]}"}],"c":'x}'} trailing"#;
        assert_eq!(extract_balanced(s), Some(r#"{"a":[1,{"b":"]}"}],"c":'x}'}"#));
    }

    #[test]
    fn balanced_scan_rejects_unterminated_input() {
        assert_eq!(extract_balanced(r#"{"a": [1, 2"#), None);
        assert_eq!(extract_balanced("no brace"), None);
    }
}
