//! Strategy 4: generic `<base>/search?q=` page, last in the chain.

use async_trait::async_trait;

use super::site_search::same_site_links;
use super::urls::{encode_component, DEFAULT_LINK_RE};
use super::{DiscoveryContext, DiscoveryStrategy};
use crate::error::ScraperError;

pub struct OnsiteSearchStrategy;

#[async_trait]
impl DiscoveryStrategy for OnsiteSearchStrategy {
    fn name(&self) -> &'static str {
        "onsite_search"
    }

    async fn discover(&self, ctx: &DiscoveryContext<'_>) -> Result<Vec<String>, ScraperError> {
        let url = format!(
            "{}/search?q={}",
            ctx.target.base_url.trim_end_matches('/'),
            encode_component(&ctx.query.text)
        );
        let page = ctx.fetcher.fetch(&url).await?;
        Ok(same_site_links(
            &page.body,
            &page.final_url,
            &ctx.target.domain,
            &DEFAULT_LINK_RE,
        ))
    }
}
