// * Scope Filter
// * Pure predicate deciding whether a rule may fire on a given page

use crate::engine::page::PageType;
use crate::engine::rules::RuleScope;

/// Returns true if a rule with `scope` applies to the page at `url`.
///
/// - no scope admits every page
/// - a non-empty include list requires the URL to contain one entry
/// - any exclude entry contained in the URL rejects
/// - a non-empty page-type list rejects pages of other known types
pub fn admits(scope: Option<&RuleScope>, url: &str, page_type: Option<PageType>) -> bool {
    let Some(scope) = scope else {
        return true;
    };

    if !scope.include_pages.is_empty()
        && !scope.include_pages.iter().any(|entry| url.contains(entry.as_str()))
    {
        return false;
    }

    if scope.exclude_pages.iter().any(|entry| url.contains(entry.as_str())) {
        return false;
    }

    if let Some(page_type) = page_type {
        if !scope.page_types.is_empty() && !scope.page_types.contains(&page_type) {
            return false;
        }
    }

    true
}
