//! Strategy 3: DuckDuckGo's keyless HTML results page.

use std::sync::LazyLock;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::urls::{decode_search_redirect, encode_component, host_matches};
use super::{DiscoveryContext, DiscoveryStrategy};
use crate::error::ScraperError;

static RESULT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"a.result__a, a[href*="duckduckgo.com/l/"]"#)
        .expect("valid duckduckgo result selector")
});

pub struct DuckDuckGoStrategy {
    endpoint: String,
}

impl DuckDuckGoStrategy {
    #[must_use]
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl DiscoveryStrategy for DuckDuckGoStrategy {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn discover(&self, ctx: &DiscoveryContext<'_>) -> Result<Vec<String>, ScraperError> {
        let url = format!("{}?q={}", self.endpoint, encode_component(&ctx.scoped_query()));
        let page = ctx.fetcher.fetch_with_timeout(&url, ctx.search_timeout).await?;
        Ok(parse_results(&page.body, &ctx.target.domain))
    }
}

/// Result links on a DuckDuckGo HTML page that point at `domain`.
fn parse_results(html: &str, domain: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(decode_search_redirect)
        .filter(|url| host_matches(url, domain))
        .collect()
}
