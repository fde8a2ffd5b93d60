use std::path::Path;

use super::*;

#[test]
fn builtin_targets_cover_both_verticals() {
    let targets = parse_targets(DEFAULT_TARGETS_YAML).expect("built-in targets parse");
    let product_names: Vec<&str> = targets.products.iter().map(|t| t.name.as_str()).collect();
    let food_names: Vec<&str> = targets.food.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(product_names, vec!["xcite", "blink", "eureka"]);
    assert_eq!(food_names, vec!["talabat", "deliveroo", "jahez"]);
}

#[test]
fn load_targets_from_real_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("targets.yaml");
    let result = load_targets(&path);
    assert!(result.is_ok(), "failed to load targets.yaml: {result:?}");
}

#[test]
fn missing_file_falls_back_to_builtin_set() {
    let targets = load_targets_or_default(Path::new("/definitely/not/here/targets.yaml"))
        .expect("fallback targets");
    assert!(!targets.food.is_empty());
}

#[test]
fn trailing_slash_is_stripped_from_base_url() {
    let yaml = r"
products:
  - name: shop
    domain: shop.example.com
    base_url: https://shop.example.com/
";
    let targets = parse_targets(yaml).unwrap();
    assert_eq!(targets.products[0].base_url, "https://shop.example.com");
}

#[test]
fn validate_rejects_non_http_base_url() {
    let yaml = r"
food:
  - name: bad
    domain: bad.example.com
    base_url: ftp://bad.example.com
";
    let err = parse_targets(yaml).unwrap_err();
    assert!(err.to_string().contains("must be http(s)"));
}

#[test]
fn validate_rejects_duplicate_name_and_domain() {
    let yaml = r"
food:
  - name: talabat
    domain: talabat.com
    base_url: https://www.talabat.com
  - name: Talabat
    domain: TALABAT.com
    base_url: https://talabat.com
";
    let err = parse_targets(yaml).unwrap_err();
    assert!(err.to_string().contains("duplicate food target"));
}

#[test]
fn validate_rejects_empty_name() {
    let yaml = r"
products:
  - name: '  '
    domain: x.example.com
    base_url: https://x.example.com
";
    let err = parse_targets(yaml).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn extra_targets_parse_comma_separated_domains() {
    let extra = extra_targets_from_env("zyda", Some(" burgerhub.zyda.com, ,https://pizza.zyda.com/ "));
    assert_eq!(extra.len(), 2);
    assert_eq!(extra[0].name, "zyda");
    assert_eq!(extra[0].domain, "burgerhub.zyda.com");
    assert_eq!(extra[0].base_url, "https://burgerhub.zyda.com");
    assert_eq!(extra[1].domain, "pizza.zyda.com");
    assert_eq!(extra[1].base_url, "https://pizza.zyda.com");
}

#[test]
fn extra_targets_empty_when_unset() {
    assert!(extra_targets_from_env("ordable", None).is_empty());
}

#[test]
fn extend_food_skips_duplicates() {
    let mut targets = TargetsFile::default();
    targets.extend_food(extra_targets_from_env("zyda", Some("a.zyda.com,a.zyda.com")));
    assert_eq!(targets.food.len(), 1);
    assert_eq!(targets.for_vertical(Vertical::Food).len(), 1);
    assert!(targets.for_vertical(Vertical::Products).is_empty());
}

#[test]
fn vertical_display() {
    assert_eq!(Vertical::Products.to_string(), "products");
    assert_eq!(Vertical::Food.to_string(), "food");
}

#[test]
fn configured_targets_append_storefront_domains() {
    let config = crate::build_app_config(|key| match key {
        "KWPRICE_TARGETS_PATH" => Ok("/nonexistent/targets.yaml".to_string()),
        "ZYDA_DOMAINS" => Ok("shop-one.zyda.com".to_string()),
        "ORDABLE_DOMAINS" => Ok("cafe.ordable.co, talabat.com".to_string()),
        _ => Err(std::env::VarError::NotPresent),
    })
    .expect("config");
    let targets = load_configured_targets(&config).expect("targets");
    let food: Vec<(&str, &str)> = targets
        .food
        .iter()
        .map(|t| (t.name.as_str(), t.domain.as_str()))
        .collect();
    assert!(food.contains(&("zyda", "shop-one.zyda.com")));
    assert!(food.contains(&("ordable", "cafe.ordable.co")));
    assert_eq!(targets.products.len(), 3);
}
