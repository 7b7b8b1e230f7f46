use link_flow::engine::normalization::{is_internal, normalize_url, page_key};
use url::Url;

// * URL normalization and page keys

fn base() -> Url {
    Url::parse("https://example.com").unwrap()
}

#[test]
fn test_basic_normalization() {
    assert_eq!(normalize_url("page", "https://example.com").unwrap(), "https://example.com/page");
}

#[test]
fn test_strip_fragment() {
    assert_eq!(
        normalize_url("page#section1", "https://example.com").unwrap(),
        "https://example.com/page"
    );
}

#[test]
fn test_lowercase_host() {
    assert_eq!(normalize_url("/page", "https://EXAMPLE.com").unwrap(), "https://example.com/page");
}

#[test]
fn test_tracking_param_removal() {
    let normalized = normalize_url(
        "/product?id=123&utm_source=google&ref=landing&gclid=xyz&sort=asc",
        "https://example.com",
    )
    .unwrap();

    assert!(normalized.contains("id=123"));
    assert!(normalized.contains("sort=asc"));
    assert!(!normalized.contains("utm_source"));
    assert!(!normalized.contains("gclid"));
}

#[test]
fn test_query_sorting() {
    assert_eq!(
        normalize_url("/search?b=2&a=1&c=3", "https://example.com").unwrap(),
        "https://example.com/search?a=1&b=2&c=3"
    );
}

#[test]
fn test_invalid_base() {
    assert_eq!(normalize_url("page", "not_a_url"), None);
}

#[test]
fn test_page_key_collapses_trailing_slash_and_origin() {
    let base = base();
    assert_eq!(page_key("/services/ai-strategy/", &base), "/services/ai-strategy");
    assert_eq!(page_key("https://example.com/services/ai-strategy", &base), "/services/ai-strategy");
    assert_eq!(page_key("/", &base), "/");
    assert_eq!(page_key("https://example.com", &base), "/");
}

#[test]
fn test_external_urls_keep_full_form() {
    let base = base();
    assert!(!is_internal("https://jobs.example.com/", &base));
    assert_eq!(page_key("https://jobs.example.com/", &base), "https://jobs.example.com/");
    assert!(is_internal("/contact/", &base));
}
