use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub targets_path: PathBuf,
    pub user_agent: String,
    pub accept_language: String,
    /// Per-request timeout for target pages.
    pub request_timeout_secs: u64,
    /// Per-request timeout for external search engines.
    pub search_timeout_secs: u64,
    /// Upper bound on one source's whole contribution to a run.
    pub source_timeout_secs: u64,
    pub max_redirects: usize,
    pub discovery_max_urls: usize,
    pub items_per_source: usize,
    pub min_relevance: f64,
    pub max_results: usize,
    pub default_city: String,
    pub rate_limit_per_minute: usize,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub zyda_domains: Option<String>,
    pub ordable_domains: Option<String>,
}

impl AppConfig {
    /// Google Custom Search credentials, when both halves are configured.
    #[must_use]
    pub fn google_cse_credentials(&self) -> Option<(&str, &str)> {
        match (&self.google_api_key, &self.google_cse_id) {
            (Some(key), Some(cx)) if !key.is_empty() && !cx.is_empty() => {
                Some((key.as_str(), cx.as_str()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("targets_path", &self.targets_path)
            .field("user_agent", &self.user_agent)
            .field("accept_language", &self.accept_language)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("source_timeout_secs", &self.source_timeout_secs)
            .field("max_redirects", &self.max_redirects)
            .field("discovery_max_urls", &self.discovery_max_urls)
            .field("items_per_source", &self.items_per_source)
            .field("min_relevance", &self.min_relevance)
            .field("max_results", &self.max_results)
            .field("default_city", &self.default_city)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("google_cse_id", &self.google_cse_id)
            .field("zyda_domains", &self.zyda_domains)
            .field("ordable_domains", &self.ordable_domains)
            .finish()
    }
}
