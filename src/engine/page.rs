// * Page Context
// * Immutable snapshot of a page handed to the linking pipeline by the caller

use serde::{Deserialize, Serialize};

/// Kind of page, used by rule scopes that target specific sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Home,
    Service,
    Industry,
    UseCase,
    CaseStudy,
    Insight,
    About,
    Contact,
    Other,
}

impl PageType {
    /// Infers the page type from the URL path
    pub fn from_url(url: &str) -> Self {
        let path = match url::Url::parse(url) {
            Ok(parsed) => parsed.path().to_lowercase(),
            Err(_) => url.split(['?', '#']).next().unwrap_or("").to_lowercase(),
        };

        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return PageType::Home;
        }

        if trimmed.starts_with("/services") {
            PageType::Service
        } else if trimmed.starts_with("/industries") {
            PageType::Industry
        } else if trimmed.starts_with("/use-cases") {
            PageType::UseCase
        } else if trimmed.starts_with("/case-studies") {
            PageType::CaseStudy
        } else if trimmed.starts_with("/insights") || trimmed.starts_with("/blog") {
            PageType::Insight
        } else if trimmed.starts_with("/about") {
            PageType::About
        } else if trimmed.starts_with("/contact") {
            PageType::Contact
        } else {
            PageType::Other
        }
    }
}

/// A page as seen by the linker. Never mutated by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub page_type: Option<PageType>,
}

impl PageContext {
    /// Creates a context with the page type inferred from the URL
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        let url = url.into();
        let page_type = Some(PageType::from_url(&url));
        Self {
            url,
            title: String::new(),
            content: content.into(),
            categories: Vec::new(),
            industries: Vec::new(),
            use_cases: Vec::new(),
            page_type,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_page_type(mut self, page_type: PageType) -> Self {
        self.page_type = Some(page_type);
        self
    }

    /// Page type as given, or inferred from the URL when the caller left it out
    pub fn effective_page_type(&self) -> PageType {
        self.page_type.unwrap_or_else(|| PageType::from_url(&self.url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_type_inference() {
        assert_eq!(PageType::from_url("/"), PageType::Home);
        assert_eq!(PageType::from_url("https://example.com"), PageType::Home);
        assert_eq!(PageType::from_url("/services/ai-strategy/"), PageType::Service);
        assert_eq!(PageType::from_url("/industries/healthcare"), PageType::Industry);
        assert_eq!(PageType::from_url("/case-studies/retail?ref=nav"), PageType::CaseStudy);
        assert_eq!(PageType::from_url("/blog/2024/llm-adoption"), PageType::Insight);
        assert_eq!(PageType::from_url("/pricing"), PageType::Other);
    }

    #[test]
    fn test_deserialize_minimal_page() {
        let page: PageContext =
            serde_json::from_str(r#"{"url": "/about", "content": "We help teams adopt AI."}"#).unwrap();
        assert_eq!(page.page_type, None);
        assert_eq!(page.effective_page_type(), PageType::About);
        assert!(page.categories.is_empty());
    }
}
