use std::str::FromStr;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124 Safari/537.36 (+kuwait-price-compare/1.2)";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-KW,en;q=0.8,ar;q=0.6";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };
    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let env = parse_environment(&or_default("KWPRICE_ENV", "development"))?;
    let bind_addr: SocketAddr = parse_value(
        "KWPRICE_BIND_ADDR",
        &or_default("KWPRICE_BIND_ADDR", "0.0.0.0:3000"),
    )?;
    let log_level = or_default("KWPRICE_LOG_LEVEL", "info");
    let targets_path = PathBuf::from(or_default("KWPRICE_TARGETS_PATH", "./config/targets.yaml"));
    let user_agent = or_default("KWPRICE_USER_AGENT", DEFAULT_USER_AGENT);
    let accept_language = or_default("KWPRICE_ACCEPT_LANGUAGE", DEFAULT_ACCEPT_LANGUAGE);

    let request_timeout_secs: u64 = parse_value(
        "KWPRICE_REQUEST_TIMEOUT_SECS",
        &or_default("KWPRICE_REQUEST_TIMEOUT_SECS", "15"),
    )?;
    let search_timeout_secs: u64 = parse_value(
        "KWPRICE_SEARCH_TIMEOUT_SECS",
        &or_default("KWPRICE_SEARCH_TIMEOUT_SECS", "10"),
    )?;
    let source_timeout_secs: u64 = parse_value(
        "KWPRICE_SOURCE_TIMEOUT_SECS",
        &or_default("KWPRICE_SOURCE_TIMEOUT_SECS", "60"),
    )?;
    let max_redirects: usize = parse_value(
        "KWPRICE_MAX_REDIRECTS",
        &or_default("KWPRICE_MAX_REDIRECTS", "5"),
    )?;
    let discovery_max_urls: usize = parse_value(
        "KWPRICE_DISCOVERY_MAX_URLS",
        &or_default("KWPRICE_DISCOVERY_MAX_URLS", "8"),
    )?;
    let items_per_source: usize = parse_value(
        "KWPRICE_ITEMS_PER_SOURCE",
        &or_default("KWPRICE_ITEMS_PER_SOURCE", "8"),
    )?;
    let min_relevance: f64 = parse_value(
        "KWPRICE_MIN_RELEVANCE",
        &or_default("KWPRICE_MIN_RELEVANCE", "0.25"),
    )?;
    let max_results: usize = parse_value(
        "KWPRICE_MAX_RESULTS",
        &or_default("KWPRICE_MAX_RESULTS", "30"),
    )?;
    let rate_limit_per_minute: usize = parse_value(
        "KWPRICE_RATE_LIMIT_PER_MINUTE",
        &or_default("KWPRICE_RATE_LIMIT_PER_MINUTE", "120"),
    )?;
    let default_city = or_default("KWPRICE_DEFAULT_CITY", "Kuwait");

    if !min_relevance.is_finite() || min_relevance < 0.0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "KWPRICE_MIN_RELEVANCE".to_string(),
            reason: format!("must be a non-negative number, got {min_relevance}"),
        });
    }
    require_positive("KWPRICE_DISCOVERY_MAX_URLS", discovery_max_urls)?;
    require_positive("KWPRICE_ITEMS_PER_SOURCE", items_per_source)?;
    require_positive("KWPRICE_MAX_RESULTS", max_results)?;
    require_positive("KWPRICE_RATE_LIMIT_PER_MINUTE", rate_limit_per_minute)?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        targets_path,
        user_agent,
        accept_language,
        request_timeout_secs,
        search_timeout_secs,
        source_timeout_secs,
        max_redirects,
        discovery_max_urls,
        items_per_source,
        min_relevance,
        max_results,
        default_city,
        rate_limit_per_minute,
        google_api_key: optional("GOOGLE_API_KEY"),
        google_cse_id: optional("GOOGLE_CSE_ID"),
        zyda_domains: optional("ZYDA_DOMAINS"),
        ordable_domains: optional("ORDABLE_DOMAINS"),
    })
}

fn parse_value<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn require_positive(var: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(())
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "KWPRICE_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
