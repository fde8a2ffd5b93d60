//! Strategy 1: the target's own search pages.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};

use super::urls::{host_matches, path_and_query, resolve_url};
use super::{DiscoveryContext, DiscoveryStrategy};
use crate::error::ScraperError;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid anchor selector"));

/// Fetches every rendered `search_urls` template and keeps same-site links
/// matching the target's link pattern, plus each search page's final URL
/// (its embedded state often carries priced results).
pub struct SiteSearchStrategy;

#[async_trait]
impl DiscoveryStrategy for SiteSearchStrategy {
    fn name(&self) -> &'static str {
        "site_search"
    }

    async fn discover(&self, ctx: &DiscoveryContext<'_>) -> Result<Vec<String>, ScraperError> {
        let mut urls = Vec::new();
        for search_url in ctx.search_urls {
            match ctx.fetcher.fetch(search_url).await {
                Ok(page) => {
                    urls.extend(same_site_links(
                        &page.body,
                        &page.final_url,
                        &ctx.target.domain,
                        ctx.link_pattern,
                    ));
                    urls.push(page.final_url);
                }
                Err(e) => {
                    tracing::debug!(
                        source = %ctx.target.name,
                        url = %search_url,
                        error = %e,
                        "site search page failed"
                    );
                }
            }
        }
        Ok(urls)
    }
}

/// Links on `html` that stay on `domain` and whose path matches `pattern`.
pub(crate) fn same_site_links(
    html: &str,
    page_url: &str,
    domain: &str,
    pattern: &Regex,
) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_url(href, page_url))
        .filter(|url| host_matches(url, domain))
        .filter(|url| path_and_query(url).is_some_and(|pq| pattern.is_match(&pq)))
        .collect()
}
