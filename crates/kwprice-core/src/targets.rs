//! Target-site definitions: the retailers and delivery platforms queried
//! for prices, grouped by vertical.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AppConfig, ConfigError};

/// Built-in target set, used when no targets file is present on disk.
const DEFAULT_TARGETS_YAML: &str = include_str!("../../../config/targets.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Products,
    Food,
}

impl std::fmt::Display for Vertical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vertical::Products => write!(f, "products"),
            Vertical::Food => write!(f, "food"),
        }
    }
}

/// One retailer or delivery platform queried for price data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSite {
    /// Source identifier reported to clients (e.g. `talabat`).
    pub name: String,
    pub domain: String,
    pub base_url: String,
    /// Native search page templates; `{query}` and `{city}` are substituted
    /// percent-encoded.
    #[serde(default)]
    pub search_urls: Vec<String>,
    /// Regex over hrefs that marks a content link on the site's own search
    /// page. Falls back to the generic content-path pattern when absent.
    #[serde(default)]
    pub link_pattern: Option<String>,
    /// JSON suggest/autocomplete endpoint tried before discovery.
    #[serde(default)]
    pub suggest_url: Option<String>,
}

impl TargetSite {
    /// A target with no per-site overrides.
    #[must_use]
    pub fn new(name: &str, domain: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            search_urls: Vec::new(),
            link_pattern: None,
            suggest_url: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetsFile {
    #[serde(default)]
    pub products: Vec<TargetSite>,
    #[serde(default)]
    pub food: Vec<TargetSite>,
}

impl TargetsFile {
    #[must_use]
    pub fn for_vertical(&self, vertical: Vertical) -> &[TargetSite] {
        match vertical {
            Vertical::Products => &self.products,
            Vertical::Food => &self.food,
        }
    }

    /// Append env-provided storefront domains to the food vertical.
    pub fn extend_food(&mut self, extra: impl IntoIterator<Item = TargetSite>) {
        for target in extra {
            let duplicate = self
                .food
                .iter()
                .any(|t| t.name == target.name && t.domain.eq_ignore_ascii_case(&target.domain));
            if duplicate {
                continue;
            }
            self.food.push(target);
        }
    }
}

/// Load and validate the targets configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_targets(path: &Path) -> Result<TargetsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TargetsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_targets(&content)
}

/// Load targets from `path`, falling back to the built-in set when the file
/// does not exist.
///
/// # Errors
///
/// Returns `ConfigError` if an existing file is unreadable or invalid.
pub fn load_targets_or_default(path: &Path) -> Result<TargetsFile, ConfigError> {
    if path.exists() {
        load_targets(path)
    } else {
        parse_targets(DEFAULT_TARGETS_YAML)
    }
}

fn parse_targets(content: &str) -> Result<TargetsFile, ConfigError> {
    let mut targets: TargetsFile = serde_yaml::from_str(content)?;
    for target in targets.products.iter_mut().chain(targets.food.iter_mut()) {
        target.base_url = target.base_url.trim_end_matches('/').to_string();
    }
    validate_targets(&targets)?;
    Ok(targets)
}

/// Load the configured targets plus the Zyda and Ordable storefront domains
/// listed in the environment.
///
/// # Errors
///
/// Returns `ConfigError` if the targets file is unreadable or invalid.
pub fn load_configured_targets(config: &AppConfig) -> Result<TargetsFile, ConfigError> {
    let mut targets = load_targets_or_default(&config.targets_path)?;
    targets.extend_food(extra_targets_from_env(
        "zyda",
        config.zyda_domains.as_deref(),
    ));
    targets.extend_food(extra_targets_from_env(
        "ordable",
        config.ordable_domains.as_deref(),
    ));
    Ok(targets)
}

/// Build targets from a comma-separated domain list such as `ZYDA_DOMAINS`.
///
/// Blank entries are skipped; every domain becomes `https://<domain>`.
#[must_use]
pub fn extra_targets_from_env(name: &str, raw: Option<&str>) -> Vec<TargetSite> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|domain| {
            let domain = domain
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/');
            TargetSite::new(name, domain, &format!("https://{domain}"))
        })
        .collect()
}

fn validate_targets(targets: &TargetsFile) -> Result<(), ConfigError> {
    for (vertical, list) in [
        (Vertical::Products, &targets.products),
        (Vertical::Food, &targets.food),
    ] {
        let mut seen = HashSet::new();
        for target in list {
            if target.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{vertical} target name must be non-empty"
                )));
            }
            if target.domain.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{vertical} target '{}' has an empty domain",
                    target.name
                )));
            }
            if !target.base_url.starts_with("https://") && !target.base_url.starts_with("http://") {
                return Err(ConfigError::Validation(format!(
                    "{vertical} target '{}' base_url must be http(s), got '{}'",
                    target.name, target.base_url
                )));
            }
            let key = (target.name.to_lowercase(), target.domain.to_lowercase());
            if !seen.insert(key) {
                return Err(ConfigError::Validation(format!(
                    "duplicate {vertical} target: '{}' ({})",
                    target.name, target.domain
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "targets_test.rs"]
mod tests;
