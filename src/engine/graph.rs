// * Link Graph Analyzer
// * Aggregates per-page suggestions into a site-wide graph: orphans, hubs, top targets, BFS depth

use crate::config::LinkingConfig;
use crate::engine::normalization::{is_internal, page_key};
use crate::engine::ranker::LinkSuggestion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use tracing::info;
use url::Url;

/// A link target and how many distinct pages point at it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedTarget {
    pub url: String,
    pub referrers: usize,
}

/// Site-wide linking analysis, derived fresh on every run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkingAnalysis {
    pub total_pages: usize,
    pub total_links: usize,
    pub internal_links: usize,
    /// Known pages no other page suggests a link to
    pub orphan_pages: Vec<String>,
    /// Pages whose own outbound suggestion count reaches the hub threshold
    pub hub_pages: Vec<String>,
    pub top_linked_pages: Vec<LinkedTarget>,
    /// Hops from the root; a page missing here is unreachable from the root
    pub link_depth: BTreeMap<String, usize>,
    /// Known pages missing from `link_depth`
    pub unreachable_pages: Vec<String>,
    pub recommendations: Vec<String>,
}

impl LinkingAnalysis {
    /// Share of suggested links that stay on the site
    pub fn internal_ratio(&self) -> f64 {
        if self.total_links == 0 {
            1.0
        } else {
            self.internal_links as f64 / self.total_links as f64
        }
    }
}

/// Outbound suggestions of one known page
#[derive(Debug, Clone)]
pub struct PageLinks<'a> {
    pub url: &'a str,
    pub suggestions: &'a [LinkSuggestion],
}

/// Builds a `LinkingAnalysis` from every page's suggestions
#[derive(Debug, Clone)]
pub struct LinkGraphAnalyzer<'a> {
    config: &'a LinkingConfig,
    base: &'a Url,
    root_url: &'a str,
}

impl<'a> LinkGraphAnalyzer<'a> {
    pub fn new(config: &'a LinkingConfig, base: &'a Url, root_url: &'a str) -> Self {
        Self {
            config,
            base,
            root_url,
        }
    }

    pub fn analyze(&self, pages: &[PageLinks<'_>]) -> LinkingAnalysis {
        let mut analysis = LinkingAnalysis {
            total_pages: pages.len(),
            ..Default::default()
        };

        // * Known pages in input order, deduplicated by key
        let mut known: Vec<String> = Vec::new();
        let mut known_set: HashSet<String> = HashSet::new();
        for page in pages {
            let key = page_key(page.url, self.base);
            if known_set.insert(key.clone()) {
                known.push(key);
            }
        }

        let mut referrers: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        let mut pages_without_links = 0usize;

        for page in pages {
            let source = page_key(page.url, self.base);
            let outbound = page.suggestions.len();

            if outbound == 0 {
                pages_without_links += 1;
            }
            if outbound >= self.config.hub_threshold && !analysis.hub_pages.contains(&source) {
                analysis.hub_pages.push(source.clone());
            }

            for suggestion in page.suggestions {
                analysis.total_links += 1;
                if !is_internal(&suggestion.target_url, self.base) {
                    continue;
                }
                analysis.internal_links += 1;

                let target = page_key(&suggestion.target_url, self.base);
                if target != source {
                    referrers.entry(target.clone()).or_default().insert(source.clone());
                }
                adjacency.entry(source.clone()).or_default().push(target);
            }
        }

        analysis.orphan_pages = known
            .iter()
            .filter(|key| referrers.get(*key).map_or(true, |r| r.is_empty()))
            .cloned()
            .collect();

        let mut top: Vec<LinkedTarget> = referrers
            .iter()
            .map(|(url, refs)| LinkedTarget {
                url: url.clone(),
                referrers: refs.len(),
            })
            .collect();
        top.sort_by(|a, b| b.referrers.cmp(&a.referrers).then_with(|| a.url.cmp(&b.url)));
        top.truncate(self.config.top_linked_limit);
        analysis.top_linked_pages = top;

        analysis.link_depth = self.link_depth(&adjacency);
        analysis.unreachable_pages = known
            .iter()
            .filter(|key| !analysis.link_depth.contains_key(*key))
            .cloned()
            .collect();

        analysis.recommendations = self.recommendations(&analysis, pages_without_links);

        info!(
            pages = analysis.total_pages,
            links = analysis.total_links,
            orphans = analysis.orphan_pages.len(),
            hubs = analysis.hub_pages.len(),
            "Site linking analyzed"
        );

        analysis
    }

    // * Breadth-first traversal from the root over page -> target edges
    fn link_depth(&self, adjacency: &HashMap<String, Vec<String>>) -> BTreeMap<String, usize> {
        let root = page_key(self.root_url, self.base);
        let mut depth = BTreeMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue = VecDeque::new();

        visited.insert(root.clone());
        queue.push_back((root, 0usize));

        while let Some((node, level)) = queue.pop_front() {
            if let Some(targets) = adjacency.get(&node) {
                for target in targets {
                    if visited.insert(target.clone()) {
                        queue.push_back((target.clone(), level + 1));
                    }
                }
            }
            depth.insert(node, level);
        }

        depth
    }

    fn recommendations(&self, analysis: &LinkingAnalysis, pages_without_links: usize) -> Vec<String> {
        let mut out = Vec::new();

        if !analysis.orphan_pages.is_empty() {
            let sample: Vec<&str> = analysis.orphan_pages.iter().take(5).map(String::as_str).collect();
            out.push(format!(
                "{} page(s) receive no internal links; add contextual links to {}",
                analysis.orphan_pages.len(),
                sample.join(", ")
            ));
        }

        let deep = analysis
            .link_depth
            .values()
            .filter(|d| **d > self.config.max_recommended_depth)
            .count();
        if deep > 0 {
            out.push(format!(
                "{} page(s) are more than {} hops from the root page; link them from higher-level pages",
                deep, self.config.max_recommended_depth
            ));
        }

        if !analysis.unreachable_pages.is_empty() {
            out.push(format!(
                "{} page(s) cannot be reached from {} through suggested links",
                analysis.unreachable_pages.len(),
                self.root_url
            ));
        }

        if analysis.total_links > 0 && analysis.internal_ratio() < self.config.internal_ratio_target {
            out.push(format!(
                "Fewer than {:.0}% of suggested links are internal ({:.0}%); prefer internal targets",
                self.config.internal_ratio_target * 100.0,
                analysis.internal_ratio() * 100.0
            ));
        }

        if !analysis.hub_pages.is_empty() {
            out.push(format!(
                "{} hub page(s) carry {} or more outbound links; review them for link dilution",
                analysis.hub_pages.len(),
                self.config.hub_threshold
            ));
        }

        if pages_without_links > 0 {
            out.push(format!(
                "{} page(s) produced no link suggestions; add rules for their key topics",
                pages_without_links
            ));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com").unwrap()
    }

    fn link(target: &str) -> LinkSuggestion {
        LinkSuggestion {
            rule_id: format!("rule-{target}"),
            keyword: "kw".to_string(),
            target_url: target.to_string(),
            anchor_text: format!("anchor {target}"),
            confidence: 0.8,
            seo_value: 1.0,
            position: 0,
            length: 2,
            context: String::new(),
            reason: String::new(),
        }
    }

    #[test]
    fn test_orphans_depth_and_unreachable() {
        let config = LinkingConfig::default();
        let base = base();
        let home = vec![link("/services/"), link("https://other.org/paper")];
        let services = vec![link("/services/ai-strategy/")];
        let strategy = vec![link("/services/")];
        let lonely: Vec<LinkSuggestion> = vec![];

        let pages = vec![
            PageLinks { url: "/", suggestions: &home },
            PageLinks { url: "/services/", suggestions: &services },
            PageLinks { url: "/services/ai-strategy", suggestions: &strategy },
            PageLinks { url: "/about", suggestions: &lonely },
        ];

        let analysis = LinkGraphAnalyzer::new(&config, &base, "/").analyze(&pages);

        assert_eq!(analysis.total_pages, 4);
        assert_eq!(analysis.total_links, 4);
        assert_eq!(analysis.internal_links, 3);
        assert_eq!(analysis.orphan_pages, vec!["/".to_string(), "/about".to_string()]);

        assert_eq!(analysis.link_depth.get("/"), Some(&0));
        assert_eq!(analysis.link_depth.get("/services"), Some(&1));
        assert_eq!(analysis.link_depth.get("/services/ai-strategy"), Some(&2));
        assert!(!analysis.link_depth.contains_key("/about"));
        assert_eq!(analysis.unreachable_pages, vec!["/about".to_string()]);

        assert_eq!(analysis.top_linked_pages[0].url, "/services");
        assert_eq!(analysis.top_linked_pages[0].referrers, 2);
        assert!(analysis.recommendations.iter().any(|r| r.contains("receive no internal links")));
        assert!(analysis.recommendations.iter().any(|r| r.contains("Fewer than 80%")));
    }

    #[test]
    fn test_hub_detection() {
        let config = LinkingConfig::default();
        let base = base();
        let many: Vec<LinkSuggestion> = (0..10).map(|i| link(&format!("/p{i}"))).collect();
        let pages = vec![PageLinks { url: "/", suggestions: &many }];

        let analysis = LinkGraphAnalyzer::new(&config, &base, "/").analyze(&pages);
        assert_eq!(analysis.hub_pages, vec!["/".to_string()]);
    }

    #[test]
    fn test_empty_site() {
        let config = LinkingConfig::default();
        let base = base();
        let analysis = LinkGraphAnalyzer::new(&config, &base, "/").analyze(&[]);

        assert_eq!(analysis.total_links, 0);
        assert!((analysis.internal_ratio() - 1.0).abs() < f64::EPSILON);
        assert!(analysis.orphan_pages.is_empty());
    }

    #[test]
    fn test_deep_pages_recommended() {
        let config = LinkingConfig::default();
        let base = base();
        let a = vec![link("/a")];
        let b = vec![link("/b")];
        let c = vec![link("/c")];
        let d = vec![link("/d")];
        let pages = vec![
            PageLinks { url: "/", suggestions: &a },
            PageLinks { url: "/a", suggestions: &b },
            PageLinks { url: "/b", suggestions: &c },
            PageLinks { url: "/c", suggestions: &d },
        ];

        let analysis = LinkGraphAnalyzer::new(&config, &base, "/").analyze(&pages);
        assert_eq!(analysis.link_depth.get("/d"), Some(&4));
        assert!(analysis.recommendations.iter().any(|r| r.contains("more than 3 hops")));
    }
}
