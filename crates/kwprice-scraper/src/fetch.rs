//! HTTP page fetching with bounded redirects, per-request timeouts, and
//! bot-challenge detection.

use std::time::{Duration, Instant};

use kwprice_core::AppConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL};
use reqwest::{redirect, Client};

use crate::error::ScraperError;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub accept_language: String,
    pub request_timeout: Duration,
    pub max_redirects: usize,
}

impl FetchSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_redirects: config.max_redirects,
        }
    }
}

/// Body and provenance of one successful GET.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// URL after redirects.
    pub final_url: String,
    pub status: u16,
    pub body: String,
    pub elapsed_ms: u64,
}

/// Shared HTTP fetcher. Cloning is cheap: the connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    request_timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher that sends the configured `User-Agent` and
    /// `Accept-Language` on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidHeader`] if a configured header value is
    /// not valid HTTP, or [`ScraperError::Http`] if the client cannot be built.
    pub fn new(settings: &FetchSettings) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language).map_err(|e| {
                ScraperError::InvalidHeader {
                    name: "Accept-Language",
                    reason: e.to_string(),
                }
            })?,
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(settings.max_redirects))
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            request_timeout: settings.request_timeout,
        })
    }

    /// GET an HTML page with the default request timeout.
    ///
    /// # Errors
    ///
    /// See [`HttpFetcher::fetch_with_timeout`].
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, ScraperError> {
        self.fetch_with_timeout(url, self.request_timeout).await
    }

    /// GET an HTML page, accepting any final status in 200–399.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] on transport failure or timeout,
    /// [`ScraperError::UnexpectedStatus`] for other statuses, and
    /// [`ScraperError::BotChallenge`] when the body is an anti-bot interstitial.
    pub async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<FetchResult, ScraperError> {
        let started = Instant::now();
        let response = self
            .client
            .get(url)
            .header(ACCEPT, HTML_ACCEPT)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        if !(200..400).contains(&status) {
            return Err(ScraperError::UnexpectedStatus {
                status,
                url: final_url,
            });
        }

        let body = response.text().await?;
        if looks_like_bot_challenge(&body) {
            return Err(ScraperError::BotChallenge { url: final_url });
        }

        Ok(FetchResult {
            final_url,
            status,
            body,
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// GET and parse a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] on transport failure,
    /// [`ScraperError::UnexpectedStatus`] for non-2xx responses, and
    /// [`ScraperError::Deserialize`] when the body is not JSON.
    pub async fn fetch_json(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<serde_json::Value, ScraperError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_owned(),
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ScraperError::Deserialize {
            context: url.to_owned(),
            source,
        })
    }
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub(crate) fn looks_like_bot_challenge(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");

    has_cloudflare_banner
        || has_challenge_platform
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}
