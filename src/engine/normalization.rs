use std::collections::{BTreeMap, HashSet};
use url::Url;

// * Normalizes a URL to a unique, deterministic representation.
// * Used to compare suggestion targets with known pages and redirect destinations with sources.
// *
// * Logic:
// * 1. Join href with base_url.
// * 2. Strip Fragment (#).
// * 3. Lowercase Hostname.
// * 4. Remove Tracking Parameters (utm_*, gclid, etc.).
// * 5. Sort Query Parameters alphabetically.
pub fn normalize_url(href: &str, base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    let mut url = base.join(href).ok()?;

    url.set_fragment(None);

    if let Some(host) = url.host_str() {
        let lower_host = host.to_lowercase();
        if url.set_host(Some(&lower_host)).is_err() {
            return None;
        }
    }

    // * BTreeMap keeps keys sorted
    let mut clean_pairs = BTreeMap::new();

    // ! Add new tracking params here as they are discovered.
    let drop_params: HashSet<&str> = [
        "utm_source", "utm_medium", "utm_campaign", "utm_term", "utm_content",
        "gclid", "fbclid", "yclid", "_ga",
    ]
    .into();

    for (k, v) in url.query_pairs() {
        let key_lower = k.to_lowercase();
        if !drop_params.contains(key_lower.as_str()) {
            clean_pairs.insert(k.into_owned(), v.into_owned());
        }
    }

    if clean_pairs.is_empty() {
        url.set_query(None);
    } else {
        let mut serializer = url.query_pairs_mut();
        serializer.clear();
        for (k, v) in clean_pairs {
            serializer.append_pair(&k, &v);
        }
    }

    Some(url.to_string())
}

// * Resolves a possibly relative URL against the base origin
pub fn absolutize(href: &str, base: &Url) -> Option<Url> {
    match Url::parse(href) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base.join(href).ok(),
        Err(_) => None,
    }
}

// * Returns true if the URL points at the same origin as the base (relative URLs are internal)
pub fn is_internal(href: &str, base: &Url) -> bool {
    match absolutize(href, base) {
        Some(url) => {
            url.scheme() == base.scheme()
                && url.host_str().map(str::to_lowercase) == base.host_str().map(str::to_lowercase)
                && url.port_or_known_default() == base.port_or_known_default()
        }
        None => false,
    }
}

// * Computes the key a page is known by in the link graph.
// * Same-origin URLs collapse to their path without trailing slash (root stays "/"),
// * external URLs keep their full normalized form.
pub fn page_key(href: &str, base: &Url) -> String {
    let Some(url) = absolutize(href, base) else {
        return href.trim().to_string();
    };

    if is_internal(url.as_str(), base) {
        let path = url.path();
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        normalize_url(url.as_str(), base.as_str()).unwrap_or_else(|| url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_page_key_collapses_trailing_slash() {
        assert_eq!(page_key("/services/ai-strategy/", &base()), "/services/ai-strategy");
        assert_eq!(page_key("https://example.com/services/ai-strategy", &base()), "/services/ai-strategy");
    }

    #[test]
    fn test_page_key_root() {
        assert_eq!(page_key("/", &base()), "/");
        assert_eq!(page_key("https://example.com", &base()), "/");
    }

    #[test]
    fn test_page_key_external_keeps_origin() {
        assert_eq!(page_key("https://other.org/page#x", &base()), "https://other.org/page");
    }

    #[test]
    fn test_is_internal() {
        assert!(is_internal("/contact", &base()));
        assert!(is_internal("https://EXAMPLE.com/contact", &base()));
        assert!(!is_internal("https://other.org/contact", &base()));
        assert!(!is_internal("http://example.com/contact", &base()));
    }

    #[test]
    fn test_absolutize_relative() {
        let url = absolutize("services/", &base()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/services/");
    }
}
