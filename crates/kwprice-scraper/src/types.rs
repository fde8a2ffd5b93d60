//! Data types shared by the extraction, discovery, and aggregation stages.

use kwprice_core::Vertical;
use serde::Serialize;

use crate::normalize::is_kwd_currency;

/// Longest query accepted, in characters.
pub const MAX_QUERY_CHARS: usize = 120;

/// One aggregation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub vertical: Vertical,
    /// Locality hint; only carried for the food vertical.
    pub city: Option<String>,
    pub debug: bool,
}

impl Query {
    /// Build a query from raw user input.
    ///
    /// The text is trimmed and truncated to [`MAX_QUERY_CHARS`] characters.
    /// Returns `None` when nothing remains.
    #[must_use]
    pub fn new(raw: &str, vertical: Vertical) -> Option<Self> {
        let text: String = raw.trim().chars().take(MAX_QUERY_CHARS).collect();
        let text = text.trim_end().to_string();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text,
            vertical,
            city: None,
            debug: false,
        })
    }

    /// Attach a city for food queries, defaulting when absent or blank.
    /// Product queries ignore the city entirely.
    #[must_use]
    pub fn with_city(mut self, city: Option<&str>, default_city: &str) -> Self {
        if self.vertical == Vertical::Food {
            let city = city
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(default_city);
            self.city = Some(city.to_string());
        }
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// A (name, price) pair recovered from a page or JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedItem {
    pub name: String,
    /// Always finite and strictly positive.
    pub price: f64,
    pub currency: Option<String>,
    /// Item link found alongside the price, if any.
    pub url: Option<String>,
}

impl ExtractedItem {
    /// Items without a currency are assumed to be priced in KWD.
    #[must_use]
    pub fn priced_in_kwd(&self) -> bool {
        self.currency.as_deref().is_none_or(is_kwd_currency)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub name: String,
    pub price_num: Option<f64>,
    /// Display price, e.g. `"1.25 KWD"`.
    pub price: String,
    pub url: String,
    pub source_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMeta {
    pub discovered: usize,
    pub used: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    pub fast_path: bool,
    pub took_ms: u64,
}

/// What a source returns on success.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceOutcome {
    pub items: Vec<ResultItem>,
    pub meta: SourceMeta,
    pub debug_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReport {
    pub identifier: String,
    pub domain: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub took_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<SourceMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub items: Vec<ResultItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_urls: Option<Vec<String>>,
}

impl SourceReport {
    #[must_use]
    pub fn success(identifier: &str, domain: &str, outcome: SourceOutcome, debug: bool) -> Self {
        Self {
            identifier: identifier.to_string(),
            domain: domain.to_string(),
            ok: true,
            took_ms: Some(outcome.meta.took_ms),
            meta: Some(outcome.meta),
            error: None,
            items: outcome.items,
            debug_urls: debug.then_some(outcome.debug_urls),
        }
    }

    #[must_use]
    pub fn failure(identifier: &str, domain: &str, error: String) -> Self {
        Self {
            identifier: identifier.to_string(),
            domain: domain.to_string(),
            ok: false,
            took_ms: None,
            meta: None,
            error: Some(error),
            items: Vec::new(),
            debug_urls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    #[serde(rename = "type")]
    pub vertical: Vertical,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub currency: &'static str,
    pub took_ms: u64,
    pub sources: Vec<SourceReport>,
    pub results: Vec<ResultItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_trimmed_and_truncated() {
        let long = format!("  {}  ", "a".repeat(200));
        let query = Query::new(&long, Vertical::Products).unwrap();
        assert_eq!(query.text.chars().count(), MAX_QUERY_CHARS);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let arabic = "شاورما ".repeat(40);
        let query = Query::new(&arabic, Vertical::Food).unwrap();
        assert!(query.text.chars().count() <= MAX_QUERY_CHARS);
    }

    #[test]
    fn blank_query_is_rejected() {
        assert!(Query::new("   ", Vertical::Food).is_none());
        assert!(Query::new("", Vertical::Products).is_none());
    }

    #[test]
    fn food_query_defaults_city() {
        let query = Query::new("burger", Vertical::Food)
            .unwrap()
            .with_city(Some("  "), "Kuwait");
        assert_eq!(query.city.as_deref(), Some("Kuwait"));
    }

    #[test]
    fn product_query_drops_city() {
        let query = Query::new("iphone", Vertical::Products)
            .unwrap()
            .with_city(Some("Salmiya"), "Kuwait");
        assert_eq!(query.city, None);
    }

    #[test]
    fn foreign_currency_items_are_not_kwd() {
        let mut item = ExtractedItem {
            name: "iPhone".to_string(),
            price: 999.0,
            currency: Some("USD".to_string()),
            url: None,
        };
        assert!(!item.priced_in_kwd());
        item.currency = Some(" kwd ".to_string());
        assert!(item.priced_in_kwd());
        item.currency = None;
        assert!(item.priced_in_kwd());
    }

    #[test]
    fn report_serializes_camel_case_and_omits_absent_fields() {
        let report = SourceReport::failure("jahez", "jahez.net", "boom".to_string());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["identifier"], "jahez");
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "boom");
        assert!(json.get("tookMs").is_none());
        assert!(json.get("debugUrls").is_none());
    }

    #[test]
    fn debug_urls_only_emitted_in_debug_mode() {
        let outcome = SourceOutcome {
            debug_urls: vec!["https://x.example/menu".to_string()],
            ..SourceOutcome::default()
        };
        let quiet = SourceReport::success("x", "x.example", outcome.clone(), false);
        let loud = SourceReport::success("x", "x.example", outcome, true);
        assert!(quiet.debug_urls.is_none());
        assert_eq!(loud.debug_urls.unwrap().len(), 1);
    }
}
