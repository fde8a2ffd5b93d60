//! Concurrent fan-out over all price sources and merging of their items
//! into one ranked list.

use std::any::Any;
use std::cmp::Ordering;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::FutureExt;
use kwprice_core::{AppConfig, TargetSite};

use crate::adapter::{PriceSource, SiteAdapter};
use crate::discover::SourceDiscoverer;
use crate::error::ScraperError;
use crate::extract::PriceExtractor;
use crate::fetch::{elapsed_ms, HttpFetcher};
use crate::normalize::relevance_score;
use crate::types::{AggregationResult, Query, ResultItem, SourceReport};

pub const CURRENCY: &str = "KWD";

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub min_relevance: f64,
    pub max_results: usize,
    /// Overall budget for one source's `collect`.
    pub source_timeout: Duration,
}

impl AggregateOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            min_relevance: config.min_relevance,
            max_results: config.max_results,
            source_timeout: Duration::from_secs(config.source_timeout_secs),
        }
    }
}

pub struct Aggregator {
    sources: Vec<Arc<dyn PriceSource>>,
    options: AggregateOptions,
}

impl Aggregator {
    #[must_use]
    pub fn new(sources: Vec<Arc<dyn PriceSource>>, options: AggregateOptions) -> Self {
        Self { sources, options }
    }

    /// One [`SiteAdapter`] per target, sharing a fetcher, discoverer, and
    /// extractor.
    #[must_use]
    pub fn for_targets(
        targets: &[TargetSite],
        config: &AppConfig,
        fetcher: &HttpFetcher,
        discoverer: &Arc<SourceDiscoverer>,
    ) -> Self {
        let extractor = Arc::new(PriceExtractor::default());
        let sources = targets
            .iter()
            .map(|target| {
                Arc::new(SiteAdapter::new(
                    target.clone(),
                    fetcher.clone(),
                    Arc::clone(discoverer),
                    Arc::clone(&extractor),
                    config.items_per_source,
                    Duration::from_secs(config.search_timeout_secs),
                )) as Arc<dyn PriceSource>
            })
            .collect();
        Self::new(sources, AggregateOptions::from_config(config))
    }

    #[must_use]
    pub fn sources(&self) -> &[Arc<dyn PriceSource>] {
        &self.sources
    }

    /// Run every source concurrently and merge the results.
    ///
    /// A failing, stalled, or panicking source becomes an `ok: false` report;
    /// it never cancels its siblings.
    pub async fn run(&self, query: &Query) -> AggregationResult {
        let started = Instant::now();

        let tasks = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            async move {
                let collect = AssertUnwindSafe(source.collect(query)).catch_unwind();
                let outcome = match tokio::time::timeout(self.options.source_timeout, collect).await
                {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(panic)) => Err(ScraperError::SourcePanicked {
                        source_name: source.identifier().to_string(),
                        message: panic_message(panic.as_ref()),
                    }),
                    Err(_) => Err(ScraperError::SourceTimeout {
                        source_name: source.identifier().to_string(),
                        timeout_secs: self.options.source_timeout.as_secs(),
                    }),
                };
                (source, outcome)
            }
        });

        let sources: Vec<SourceReport> = join_all(tasks)
            .await
            .into_iter()
            .map(|(source, outcome)| match outcome {
                Ok(mut outcome) => {
                    for item in &mut outcome.items {
                        item.score = relevance_score(&query.text, &item.name);
                    }
                    SourceReport::success(source.identifier(), source.domain(), outcome, query.debug)
                }
                Err(e) => {
                    tracing::warn!(source = source.identifier(), error = %e, "source failed");
                    SourceReport::failure(source.identifier(), source.domain(), e.to_string())
                }
            })
            .collect();

        let results = rank_results(&sources, self.options.min_relevance, self.options.max_results);
        let took_ms = elapsed_ms(started);

        tracing::info!(
            vertical = %query.vertical,
            query = %query.text,
            sources = sources.len(),
            ok = sources.iter().filter(|s| s.ok).count(),
            results = results.len(),
            took_ms,
            "aggregation finished"
        );

        AggregationResult {
            vertical: query.vertical,
            query: query.text.clone(),
            city: query.city.clone(),
            currency: CURRENCY,
            took_ms,
            sources,
            results,
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// Scored items from successful reports at or above `min_relevance`, cheapest
/// first, capped at `max_results`.
pub(crate) fn rank_results(
    reports: &[SourceReport],
    min_relevance: f64,
    max_results: usize,
) -> Vec<ResultItem> {
    let mut results: Vec<ResultItem> = reports
        .iter()
        .filter(|r| r.ok)
        .flat_map(|r| r.items.iter().cloned())
        .filter(|item| item.score >= min_relevance)
        .collect();
    // Stable sort: equal prices keep source order.
    results.sort_by(|a, b| compare_prices(a.price_num, b.price_num));
    results.truncate(max_results);
    results
}

fn compare_prices(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
