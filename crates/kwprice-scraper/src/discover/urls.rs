//! URL rendering, resolution, and filtering for discovery.

use std::sync::LazyLock;

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use regex::Regex;
use reqwest::Url;

/// Path+query pattern for pages likely to list priced items.
static CONTENT_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(menu|item|product|order|restaurant|brand|search|categor)")
        .expect("valid regex")
});

/// Default link pattern for a site's own search results.
pub(crate) static DEFAULT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/(menu|product|item|restaurant)").expect("valid regex")
});

pub(crate) fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string()
}

/// Substitute percent-encoded `{query}` and `{city}` into a URL template.
pub(crate) fn render_template(template: &str, query: &str, city: Option<&str>) -> String {
    template
        .replace("{query}", &encode_component(query))
        .replace("{city}", &encode_component(city.unwrap_or_default()))
}

/// Resolve an href against the page it was found on. Only http(s) results
/// survive; fragments are dropped.
pub(crate) fn resolve_url(raw: &str, base: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    let mut url = if raw.starts_with("http://") || raw.starts_with("https://") {
        Url::parse(raw).ok()?
    } else {
        Url::parse(base).ok()?.join(raw).ok()?
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}

/// True when `url`'s host is `domain` or one of its subdomains.
pub(crate) fn host_matches(url: &str, domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let domain = domain.trim().trim_start_matches("www.").to_ascii_lowercase();
    let host = host.trim_start_matches("www.");
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Path plus query of an absolute URL, or `None` if it is not http(s).
pub(crate) fn path_and_query(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    Some(match parsed.query() {
        Some(q) => format!("{}?{q}", parsed.path()),
        None => parsed.path().to_string(),
    })
}

pub(crate) fn looks_like_content_url(url: &str) -> bool {
    path_and_query(url).is_some_and(|pq| CONTENT_PATH_RE.is_match(&pq))
}

/// Keep http(s) URLs whose path+query matches the content pattern or the
/// target's own `link_pattern`, de-duplicated in first-seen order, capped at
/// `max_urls`.
pub(crate) fn post_filter(urls: Vec<String>, link_pattern: &Regex, max_urls: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    urls.into_iter()
        .filter(|u| {
            path_and_query(u)
                .is_some_and(|pq| CONTENT_PATH_RE.is_match(&pq) || link_pattern.is_match(&pq))
        })
        .filter(|u| seen.insert(u.clone()))
        .take(max_urls)
        .collect()
}

/// Unwrap a DuckDuckGo redirect (`//duckduckgo.com/l/?uddg=<encoded>&...`).
/// Direct links pass through; protocol-relative links gain `https:`.
pub(crate) fn decode_search_redirect(href: &str) -> Option<String> {
    if let Some(start) = href.find("uddg=") {
        let encoded = &href[start + 5..];
        let end = encoded.find('&').unwrap_or(encoded.len());
        return percent_decode_str(&encoded[..end])
            .decode_utf8()
            .ok()
            .map(std::borrow::Cow::into_owned);
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        Some(href.to_string())
    } else if let Some(rest) = href.strip_prefix("//") {
        Some(format!("https://{rest}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_template_encodes_placeholders() {
        let url = render_template(
            "https://x.example/search?q={query}&c={city}",
            "chicken & rice",
            Some("Kuwait City"),
        );
        assert_eq!(
            url,
            "https://x.example/search?q=chicken%20%26%20rice&c=Kuwait%20City"
        );
    }

    #[test]
    fn render_template_without_city_leaves_empty_value() {
        let url = render_template("https://x.example/s?q={query}&c={city}", "tea", None);
        assert_eq!(url, "https://x.example/s?q=tea&c=");
    }

    #[test]
    fn resolve_relative_and_absolute_links() {
        let base = "https://www.talabat.com/kuwait/search?q=tea";
        assert_eq!(
            resolve_url("/kuwait/restaurant/123/tea-house", base).as_deref(),
            Some("https://www.talabat.com/kuwait/restaurant/123/tea-house")
        );
        assert_eq!(
            resolve_url("https://www.talabat.com/menu#top", base).as_deref(),
            Some("https://www.talabat.com/menu")
        );
        assert_eq!(resolve_url("javascript:void(0)", base), None);
        assert_eq!(resolve_url("mailto:hi@example.com", base), None);
        assert_eq!(resolve_url("#reviews", base), None);
    }

    #[test]
    fn host_matching_accepts_subdomains_only() {
        assert!(host_matches("https://www.talabat.com/x", "talabat.com"));
        assert!(host_matches("https://kw.talabat.com/x", "talabat.com"));
        assert!(!host_matches("https://nottalabat.com/x", "talabat.com"));
        assert!(!host_matches("not a url", "talabat.com"));
    }

    #[test]
    fn post_filter_dedups_filters_and_caps() {
        let urls = vec![
            "https://a.example/menu/1".to_string(),
            "https://a.example/about".to_string(),
            "https://a.example/menu/1".to_string(),
            "ftp://a.example/menu/2".to_string(),
            "https://a.example/search?q=tea".to_string(),
            "https://a.example/products/3".to_string(),
            "https://a.example/brands/4".to_string(),
        ];
        let filtered = post_filter(urls, &DEFAULT_LINK_RE, 3);
        assert_eq!(
            filtered,
            vec![
                "https://a.example/menu/1",
                "https://a.example/search?q=tea",
                "https://a.example/products/3",
            ]
        );
    }

    #[test]
    fn post_filter_accepts_site_link_pattern() {
        let xcite = Regex::new(r"(?i)/(p|product|products)/").unwrap();
        let urls = vec![
            "https://www.xcite.com/p/iphone-15".to_string(),
            "https://www.xcite.com/about".to_string(),
        ];
        assert_eq!(
            post_filter(urls.clone(), &xcite, 8),
            vec!["https://www.xcite.com/p/iphone-15"]
        );
        assert!(post_filter(urls, &DEFAULT_LINK_RE, 8).is_empty());
    }

    #[test]
    fn content_pattern_ignores_host_name() {
        assert!(!looks_like_content_url("https://menu.example.com/about"));
    }

    #[test]
    fn redirect_decoding() {
        assert_eq!(
            decode_search_redirect(
                "//duckduckgo.com/l/?uddg=https%3A%2F%2Fdeliveroo.com.kw%2Fmenu%2Fkuwait%2Fx&rut=abc"
            )
            .as_deref(),
            Some("https://deliveroo.com.kw/menu/kuwait/x")
        );
        assert_eq!(
            decode_search_redirect("https://jahez.net/menu").as_deref(),
            Some("https://jahez.net/menu")
        );
        assert_eq!(
            decode_search_redirect("//jahez.net/item").as_deref(),
            Some("https://jahez.net/item")
        );
        assert_eq!(decode_search_redirect("/relative"), None);
    }
}
