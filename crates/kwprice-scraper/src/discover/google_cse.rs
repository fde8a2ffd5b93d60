//! Strategy 2: Google Custom Search JSON API, scoped with `site:`.

use async_trait::async_trait;
use serde::Deserialize;

use super::urls::encode_component;
use super::{DiscoveryContext, DiscoveryStrategy};
use crate::error::ScraperError;

/// The API refuses `num` above ten.
const MAX_RESULTS_PER_CALL: usize = 10;

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    link: Option<String>,
}

pub struct GoogleCseStrategy {
    endpoint: String,
    api_key: String,
    cse_id: String,
}

impl GoogleCseStrategy {
    #[must_use]
    pub fn new(endpoint: &str, api_key: &str, cse_id: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            cse_id: cse_id.to_string(),
        }
    }

    fn request_url(&self, ctx: &DiscoveryContext<'_>) -> String {
        format!(
            "{}?key={}&cx={}&q={}&num={}&safe=off",
            self.endpoint,
            encode_component(&self.api_key),
            encode_component(&self.cse_id),
            encode_component(&ctx.scoped_query()),
            ctx.max_urls.clamp(1, MAX_RESULTS_PER_CALL),
        )
    }
}

#[async_trait]
impl DiscoveryStrategy for GoogleCseStrategy {
    fn name(&self) -> &'static str {
        "google_cse"
    }

    async fn discover(&self, ctx: &DiscoveryContext<'_>) -> Result<Vec<String>, ScraperError> {
        let value = ctx
            .fetcher
            .fetch_json(&self.request_url(ctx), ctx.search_timeout)
            .await?;
        let response: CseResponse =
            serde_json::from_value(value).map_err(|source| ScraperError::Deserialize {
                context: "google custom search response".to_string(),
                source,
            })?;
        Ok(response
            .items
            .into_iter()
            .filter_map(|item| item.link)
            .collect())
    }
}
