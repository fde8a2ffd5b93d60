//! Per-target orchestration: suggest fast path, discovery, fetch,
//! extraction, labelling, and de-duplication.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use kwprice_core::TargetSite;
use regex::Regex;
use reqwest::Url;

use crate::discover::urls::{render_template, resolve_url, DEFAULT_LINK_RE};
use crate::discover::SourceDiscoverer;
use crate::error::ScraperError;
use crate::extract::json_scan::scan_priced_nodes;
use crate::extract::{page_group_label, PriceExtractor};
use crate::fetch::{elapsed_ms, HttpFetcher};
use crate::normalize::{format_kwd, normalize_text};
use crate::types::{ExtractedItem, Query, ResultItem, SourceMeta, SourceOutcome};

/// Anything the aggregator can ask for prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn identifier(&self) -> &str;
    fn domain(&self) -> &str;

    /// Collect priced items for `query`.
    ///
    /// Per-URL failures are absorbed into the outcome's metadata; an `Err`
    /// means the source as a whole could not run.
    async fn collect(&self, query: &Query) -> Result<SourceOutcome, ScraperError>;
}

/// Configuration-driven adapter for one [`TargetSite`].
pub struct SiteAdapter {
    target: TargetSite,
    fetcher: HttpFetcher,
    discoverer: Arc<SourceDiscoverer>,
    extractor: Arc<PriceExtractor>,
    item_limit: usize,
    search_timeout: Duration,
}

impl SiteAdapter {
    #[must_use]
    pub fn new(
        target: TargetSite,
        fetcher: HttpFetcher,
        discoverer: Arc<SourceDiscoverer>,
        extractor: Arc<PriceExtractor>,
        item_limit: usize,
        search_timeout: Duration,
    ) -> Self {
        Self {
            target,
            fetcher,
            discoverer,
            extractor,
            item_limit,
            search_timeout,
        }
    }

    #[must_use]
    pub fn target(&self) -> &TargetSite {
        &self.target
    }

    fn link_pattern(&self) -> Result<Regex, ScraperError> {
        match self.target.link_pattern.as_deref() {
            Some(pattern) => Regex::new(pattern).map_err(|e| ScraperError::InvalidPattern {
                source_name: self.target.name.clone(),
                reason: e.to_string(),
            }),
            None => Ok(DEFAULT_LINK_RE.clone()),
        }
    }

    fn render(&self, template: &str, query: &Query) -> Result<String, ScraperError> {
        let rendered = render_template(template, &query.text, query.city.as_deref());
        Url::parse(&rendered).map_err(|e| ScraperError::InvalidUrl {
            url: rendered.clone(),
            reason: e.to_string(),
        })?;
        Ok(rendered)
    }

    /// Query the JSON suggest endpoint. `None` means fall back to discovery.
    async fn fast_path(&self, suggest_url: &str) -> Option<Vec<ResultItem>> {
        let value = match self.fetcher.fetch_json(suggest_url, self.search_timeout).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    source = %self.target.name,
                    url = %suggest_url,
                    error = %e,
                    "suggest endpoint failed; falling back to discovery"
                );
                return None;
            }
        };

        let items: Vec<ResultItem> = scan_priced_nodes(&value)
            .into_iter()
            .filter(ExtractedItem::priced_in_kwd)
            .map(|item| {
                let url = item
                    .url
                    .as_deref()
                    .and_then(|u| resolve_url(u, suggest_url))
                    .unwrap_or_else(|| suggest_url.to_string());
                self.to_result(item, &url, None)
            })
            .collect();
        (!items.is_empty()).then_some(items)
    }

    fn to_result(&self, item: ExtractedItem, url: &str, group_label: Option<&str>) -> ResultItem {
        ResultItem {
            name: item.name.split_whitespace().collect::<Vec<_>>().join(" "),
            price_num: Some(item.price),
            price: format_kwd(item.price),
            url: url.to_string(),
            source_identifier: self.target.name.clone(),
            group_label: group_label.map(str::to_string),
            score: 0.0,
        }
    }

    fn finish(&self, items: Vec<ResultItem>) -> Vec<ResultItem> {
        let mut items = dedupe_items(items);
        items.truncate(self.item_limit);
        items
    }
}

#[async_trait]
impl PriceSource for SiteAdapter {
    fn identifier(&self) -> &str {
        &self.target.name
    }

    fn domain(&self) -> &str {
        &self.target.domain
    }

    async fn collect(&self, query: &Query) -> Result<SourceOutcome, ScraperError> {
        let started = Instant::now();
        let link_pattern = self.link_pattern()?;
        let search_urls = self
            .target
            .search_urls
            .iter()
            .map(|t| self.render(t, query))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(template) = self.target.suggest_url.as_deref() {
            let suggest_url = self.render(template, query)?;
            if let Some(items) = self.fast_path(&suggest_url).await {
                tracing::info!(
                    source = %self.target.name,
                    count = items.len(),
                    "suggest fast path produced items"
                );
                return Ok(SourceOutcome {
                    items: self.finish(items),
                    meta: SourceMeta {
                        discovered: 1,
                        used: 1,
                        failed: 0,
                        strategy: Some("suggest".to_string()),
                        fast_path: true,
                        took_ms: elapsed_ms(started),
                    },
                    debug_urls: vec![suggest_url],
                });
            }
        }

        let discovery = self
            .discoverer
            .discover(&self.target, query, &self.fetcher, &search_urls, &link_pattern)
            .await;

        let mut items = Vec::new();
        let mut used = 0usize;
        let mut failed = 0usize;
        for url in &discovery.urls {
            used += 1;
            let page = match self.fetcher.fetch(url).await {
                Ok(page) => page,
                Err(e) => {
                    failed += 1;
                    tracing::debug!(source = %self.target.name, url = %url, error = %e, "page fetch failed");
                    continue;
                }
            };

            let extraction = self.extractor.extract(&page.body);
            let label = page_group_label(&page.body);
            tracing::debug!(
                source = %self.target.name,
                url = %page.final_url,
                strategy = extraction.strategy.unwrap_or("none"),
                count = extraction.items.len(),
                elapsed_ms = page.elapsed_ms,
                "page extracted"
            );
            items.extend(
                extraction
                    .items
                    .into_iter()
                    .map(|item| self.to_result(item, &page.final_url, label.as_deref())),
            );
            if items.len() >= self.item_limit {
                break;
            }
        }

        Ok(SourceOutcome {
            items: self.finish(items),
            meta: SourceMeta {
                discovered: discovery.urls.len(),
                used,
                failed,
                strategy: discovery.strategy.map(str::to_string),
                fast_path: false,
                took_ms: elapsed_ms(started),
            },
            debug_urls: discovery.urls,
        })
    }
}

/// Keep the first item per (source, normalized group label, normalized name).
pub(crate) fn dedupe_items(items: Vec<ResultItem>) -> Vec<ResultItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| {
            seen.insert((
                item.source_identifier.clone(),
                normalize_text(item.group_label.as_deref().unwrap_or_default()),
                normalize_text(&item.name),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, label: Option<&str>, price: f64) -> ResultItem {
        ResultItem {
            name: name.to_string(),
            price_num: Some(price),
            price: format_kwd(price),
            url: "https://x.example/menu".to_string(),
            source_identifier: "x".to_string(),
            group_label: label.map(str::to_string),
            score: 0.0,
        }
    }

    #[test]
    fn dedupe_collapses_normalized_duplicates() {
        let items = vec![
            result("Chicken Shawarma", Some("Shawarma House"), 1.25),
            result("chicken  shawarma!", Some("SHAWARMA HOUSE"), 1.5),
            result("Chicken Shawarma", Some("Other Place"), 1.0),
            result("Chicken Shawarma", None, 1.1),
        ];
        let deduped = dedupe_items(items);
        assert_eq!(deduped.len(), 3);
        assert!((deduped[0].price_num.unwrap() - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn dedupe_keeps_distinct_sources_apart() {
        let mut other = result("Tea", None, 0.2);
        other.source_identifier = "y".to_string();
        let deduped = dedupe_items(vec![result("Tea", None, 0.2), other]);
        assert_eq!(deduped.len(), 2);
    }
}
