//! Candidate-URL discovery for one target site.
//!
//! Strategies form a fallback chain; the first one that still has URLs
//! after post-filtering ends the chain. A failing strategy is logged and
//! treated as having found nothing.

mod duckduckgo;
mod google_cse;
mod onsite;
mod site_search;
pub(crate) mod urls;

use std::time::Duration;

use async_trait::async_trait;
use kwprice_core::{AppConfig, TargetSite};
use regex::Regex;

use crate::error::ScraperError;
use crate::fetch::HttpFetcher;
use crate::types::Query;

pub use duckduckgo::DuckDuckGoStrategy;
pub use google_cse::GoogleCseStrategy;
pub use onsite::OnsiteSearchStrategy;
pub use site_search::SiteSearchStrategy;

pub const GOOGLE_CSE_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
pub const DUCKDUCKGO_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Everything a strategy needs to search for one target.
pub struct DiscoveryContext<'a> {
    pub target: &'a TargetSite,
    pub query: &'a Query,
    pub fetcher: &'a HttpFetcher,
    /// Rendered `search_urls` templates for the target.
    pub search_urls: &'a [String],
    /// Link filter for the target's own search pages.
    pub link_pattern: &'a Regex,
    pub search_timeout: Duration,
    pub max_urls: usize,
}

impl DiscoveryContext<'_> {
    /// `site:<domain> <query> "<city>"`, the scoped query sent to search engines.
    #[must_use]
    pub fn scoped_query(&self) -> String {
        match self.query.city.as_deref() {
            Some(city) if !city.is_empty() => {
                format!("site:{} {} \"{city}\"", self.target.domain, self.query.text)
            }
            _ => format!("site:{} {}", self.target.domain, self.query.text),
        }
    }
}

#[async_trait]
pub trait DiscoveryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn discover(&self, ctx: &DiscoveryContext<'_>) -> Result<Vec<String>, ScraperError>;
}

/// URLs found for a target and which strategy found them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub strategy: Option<&'static str>,
    pub urls: Vec<String>,
}

/// Search-engine base URLs; overridable so tests can point them at a mock.
#[derive(Debug, Clone)]
pub struct DiscoveryEndpoints {
    pub google_cse: String,
    pub duckduckgo: String,
}

impl Default for DiscoveryEndpoints {
    fn default() -> Self {
        Self {
            google_cse: GOOGLE_CSE_ENDPOINT.to_string(),
            duckduckgo: DUCKDUCKGO_ENDPOINT.to_string(),
        }
    }
}

pub struct SourceDiscoverer {
    strategies: Vec<Box<dyn DiscoveryStrategy>>,
    search_timeout: Duration,
    max_urls: usize,
}

impl SourceDiscoverer {
    /// The standard chain: site search, Google CSE (only with credentials),
    /// DuckDuckGo, then the generic on-site search page.
    #[must_use]
    pub fn from_config(config: &AppConfig, endpoints: DiscoveryEndpoints) -> Self {
        let mut strategies: Vec<Box<dyn DiscoveryStrategy>> = vec![Box::new(SiteSearchStrategy)];
        if let Some((api_key, cse_id)) = config.google_cse_credentials() {
            strategies.push(Box::new(GoogleCseStrategy::new(
                &endpoints.google_cse,
                api_key,
                cse_id,
            )));
        }
        strategies.push(Box::new(DuckDuckGoStrategy::new(&endpoints.duckduckgo)));
        strategies.push(Box::new(OnsiteSearchStrategy));

        Self::new(
            strategies,
            Duration::from_secs(config.search_timeout_secs),
            config.discovery_max_urls,
        )
    }

    #[must_use]
    pub fn new(
        strategies: Vec<Box<dyn DiscoveryStrategy>>,
        search_timeout: Duration,
        max_urls: usize,
    ) -> Self {
        Self {
            strategies,
            search_timeout,
            max_urls,
        }
    }

    #[must_use]
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Walk the chain for one target.
    pub async fn discover(
        &self,
        target: &TargetSite,
        query: &Query,
        fetcher: &HttpFetcher,
        search_urls: &[String],
        link_pattern: &Regex,
    ) -> Discovery {
        let ctx = DiscoveryContext {
            target,
            query,
            fetcher,
            search_urls,
            link_pattern,
            search_timeout: self.search_timeout,
            max_urls: self.max_urls,
        };

        for strategy in &self.strategies {
            let found = match strategy.discover(&ctx).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(
                        source = %target.name,
                        strategy = strategy.name(),
                        error = %e,
                        "discovery strategy failed"
                    );
                    continue;
                }
            };
            let urls = urls::post_filter(found, link_pattern, self.max_urls);
            if urls.is_empty() {
                tracing::debug!(
                    source = %target.name,
                    strategy = strategy.name(),
                    "discovery strategy found nothing"
                );
                continue;
            }
            tracing::debug!(
                source = %target.name,
                strategy = strategy.name(),
                count = urls.len(),
                "discovered candidate urls"
            );
            return Discovery {
                strategy: Some(strategy.name()),
                urls,
            };
        }

        Discovery::default()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use kwprice_core::Vertical;

    use super::*;
    use crate::fetch::FetchSettings;

    struct Canned {
        name: &'static str,
        result: Result<Vec<&'static str>, ()>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DiscoveryStrategy for Canned {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn discover(&self, _ctx: &DiscoveryContext<'_>) -> Result<Vec<String>, ScraperError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(urls) => Ok(urls.iter().map(|u| (*u).to_string()).collect()),
                Err(()) => Err(ScraperError::UnexpectedStatus {
                    status: 503,
                    url: "https://search.example".to_string(),
                }),
            }
        }
    }

    fn canned(
        name: &'static str,
        result: Result<Vec<&'static str>, ()>,
    ) -> (Box<dyn DiscoveryStrategy>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let strategy = Canned {
            name,
            result,
            calls: Arc::clone(&calls),
        };
        (Box::new(strategy), calls)
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&FetchSettings {
            user_agent: "kwprice-test/0.1".to_string(),
            accept_language: "en".to_string(),
            request_timeout: Duration::from_secs(1),
            max_redirects: 1,
        })
        .unwrap()
    }

    async fn run(discoverer: &SourceDiscoverer) -> Discovery {
        let target = TargetSite::new("shop", "shop.example", "https://shop.example");
        let query = Query::new("tea", Vertical::Food).unwrap();
        discoverer
            .discover(&target, &query, &fetcher(), &[], &urls::DEFAULT_LINK_RE)
            .await
    }

    #[tokio::test]
    async fn errors_and_filtered_out_results_fall_through() {
        let (failing, _) = canned("failing", Err(()));
        let (irrelevant, _) = canned("irrelevant", Ok(vec!["https://shop.example/about"]));
        let (good, _) = canned(
            "good",
            Ok(vec!["https://shop.example/menu/1", "https://shop.example/menu/1"]),
        );
        let (never, never_calls) = canned("never", Ok(vec!["https://shop.example/menu/9"]));
        let discoverer = SourceDiscoverer::new(
            vec![failing, irrelevant, good, never],
            Duration::from_secs(1),
            8,
        );

        let discovery = run(&discoverer).await;
        assert_eq!(discovery.strategy, Some("good"));
        assert_eq!(discovery.urls, vec!["https://shop.example/menu/1"]);
        assert_eq!(never_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn urls_are_capped_and_match_content_pattern() {
        let many: Vec<&'static str> = vec![
            "https://shop.example/menu/1",
            "https://shop.example/menu/2",
            "https://shop.example/contact",
            "https://shop.example/menu/3",
            "https://shop.example/item/4",
        ];
        let (strategy, _) = canned("many", Ok(many));
        let discoverer = SourceDiscoverer::new(vec![strategy], Duration::from_secs(1), 3);
        let discovery = run(&discoverer).await;
        assert_eq!(discovery.urls.len(), 3);
        assert!(discovery.urls.iter().all(|u| urls::looks_like_content_url(u)));
    }

    #[tokio::test]
    async fn exhausted_chain_returns_empty_discovery() {
        let (empty, _) = canned("empty", Ok(vec![]));
        let discoverer = SourceDiscoverer::new(vec![empty], Duration::from_secs(1), 8);
        assert_eq!(run(&discoverer).await, Discovery::default());
    }

    #[test]
    fn google_cse_only_in_chain_with_credentials() {
        let mut config = test_config();
        let without = SourceDiscoverer::from_config(&config, DiscoveryEndpoints::default());
        assert_eq!(
            without.strategy_names(),
            vec!["site_search", "duckduckgo", "onsite_search"]
        );

        config.google_api_key = Some("key".to_string());
        config.google_cse_id = Some("cx".to_string());
        let with = SourceDiscoverer::from_config(&config, DiscoveryEndpoints::default());
        assert_eq!(
            with.strategy_names(),
            vec!["site_search", "google_cse", "duckduckgo", "onsite_search"]
        );
    }

    #[test]
    fn scoped_query_includes_city_when_present() {
        let target = TargetSite::new("talabat", "talabat.com", "https://www.talabat.com");
        let query = Query::new("shawarma", Vertical::Food)
            .unwrap()
            .with_city(None, "Kuwait");
        let fetcher = fetcher();
        let ctx = DiscoveryContext {
            target: &target,
            query: &query,
            fetcher: &fetcher,
            search_urls: &[],
            link_pattern: &urls::DEFAULT_LINK_RE,
            search_timeout: Duration::from_secs(1),
            max_urls: 8,
        };
        assert_eq!(ctx.scoped_query(), "site:talabat.com shawarma \"Kuwait\"");
    }

    fn test_config() -> AppConfig {
        kwprice_core::build_app_config(|_| Err(std::env::VarError::NotPresent)).unwrap()
    }
}
