use link_flow::redirect::{
    RedirectIssueKind, RedirectManager, RedirectRule, RedirectStore, RequestContext, ServerType,
};
use link_flow::Settings;

// * Redirect resolution, validation and export through the manager

fn manager(rules: Vec<RedirectRule>) -> RedirectManager {
    RedirectManager::new(RedirectStore::from_rules(rules), &Settings::default()).unwrap()
}

#[test]
fn test_old_services_pattern_redirect() {
    let manager = RedirectManager::with_defaults();
    let found = manager.find_redirect("/old-services/consulting", None).unwrap();

    assert_eq!(found.rule.id, "old-services");
    assert_eq!(found.destination, "https://example.com/services/consulting/");
    assert_eq!(found.status_code, 301);
    assert_eq!(found.captures, vec![Some("consulting".to_string())]);
}

#[test]
fn test_blog_redirect_keeps_query() {
    let manager = RedirectManager::with_defaults();
    let found = manager.find_redirect("/blog/llm-roadmap?ref=newsletter", None).unwrap();

    assert_eq!(found.destination, "https://example.com/insights/llm-roadmap?ref=newsletter");
}

#[test]
fn test_unknown_path_has_no_redirect() {
    let manager = RedirectManager::with_defaults();
    assert!(manager
        .find_redirect("/services/ai-strategy/", Some(&RequestContext::new()))
        .is_none());
}

#[test]
fn test_two_rule_cycle_reported_as_loop() {
    let manager = manager(vec![
        RedirectRule::exact("/a", "/b").with_id("a"),
        RedirectRule::exact("/b", "/a").with_id("b"),
    ]);

    let validation = manager.validate_redirects();
    assert!(!validation.valid);
    assert!(validation
        .issues
        .iter()
        .any(|issue| issue.kind == RedirectIssueKind::Loop && issue.rule_id == "a"));
}

#[test]
fn test_default_rules_validate_and_export() {
    let manager = RedirectManager::with_defaults();
    assert!(manager.validate_redirects().valid);

    let nginx = manager.generate_server_config(ServerType::Nginx).unwrap();
    assert!(nginx.contains("location = /ai-consulting"));

    let vercel = manager.generate_server_config(ServerType::Vercel).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&vercel).unwrap();
    assert_eq!(parsed["redirects"].as_array().unwrap().len(), 5);
}
