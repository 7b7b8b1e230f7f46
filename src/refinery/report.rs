// * Schema Audit Reports
// * Per-page validation of extracted structured data and aggregation across many URLs

use crate::config::constants::COMMON_ISSUES_LIMIT;
use crate::config::FetchConfig;
use crate::network::{NetworkError, PageFetcher};
use crate::ops::clock::now_unix;
use crate::refinery::extractor::{extract_structured_data, SchemaSource};
use crate::refinery::validator::{SchemaValidation, SchemaValidator};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// One validated schema object and where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedSchema {
    pub source: SchemaSource,
    pub validation: SchemaValidation,
}

/// Validation of every structured-data object on one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageValidation {
    pub url: String,
    /// True when the page has structured data and every object validates
    pub valid: bool,
    /// Mean score of the page's objects (0 when there are none)
    pub score: u32,
    pub schemas: Vec<ValidatedSchema>,
    /// Extraction problems such as unparseable JSON-LD blocks
    pub extraction_issues: Vec<String>,
}

impl PageValidation {
    pub fn error_count(&self) -> usize {
        self.schemas.iter().map(|s| s.validation.errors.len()).sum::<usize>()
            + self.extraction_issues.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUrl {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCount {
    pub issue: String,
    pub count: usize,
}

/// Aggregate audit across many URLs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub generated_at: u64,
    pub total_urls: usize,
    pub validated_urls: usize,
    pub failed_urls: Vec<FailedUrl>,
    pub total_schemas: usize,
    pub valid_schemas: usize,
    pub invalid_schemas: usize,
    pub average_score: f64,
    /// Schema type -> number of objects seen
    pub schema_types: BTreeMap<String, usize>,
    /// Most frequent errors and warnings, most frequent first
    pub common_issues: Vec<IssueCount>,
    pub recommendations: Vec<String>,
    pub pages: Vec<PageValidation>,
}

impl ValidationReport {
    /// Builds the report from already validated pages and fetch failures
    pub fn from_results(pages: Vec<PageValidation>, failed_urls: Vec<FailedUrl>) -> Self {
        let mut report = ValidationReport {
            generated_at: now_unix(),
            total_urls: pages.len() + failed_urls.len(),
            validated_urls: pages.len(),
            failed_urls,
            ..Default::default()
        };

        let mut issue_counts: HashMap<&str, usize> = HashMap::new();
        let mut score_sum = 0u64;

        for page in &pages {
            for schema in &page.schemas {
                let validation = &schema.validation;
                report.total_schemas += 1;
                if validation.valid {
                    report.valid_schemas += 1;
                } else {
                    report.invalid_schemas += 1;
                }
                score_sum += validation.score as u64;

                let schema_type = validation.schema_type.clone().unwrap_or_else(|| "unknown".to_string());
                *report.schema_types.entry(schema_type).or_insert(0) += 1;

                for issue in validation.errors.iter().chain(validation.warnings.iter()) {
                    *issue_counts.entry(issue.as_str()).or_insert(0) += 1;
                }
            }
        }

        if report.total_schemas > 0 {
            report.average_score = score_sum as f64 / report.total_schemas as f64;
        }

        let mut common: Vec<IssueCount> = issue_counts
            .into_iter()
            .map(|(issue, count)| IssueCount {
                issue: issue.to_string(),
                count,
            })
            .collect();
        common.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.issue.cmp(&b.issue)));
        common.truncate(COMMON_ISSUES_LIMIT);
        report.common_issues = common;

        report.recommendations = recommendations(&report, &pages);
        report.pages = pages;
        report
    }

    /// True when any page or schema failed validation
    pub fn has_errors(&self) -> bool {
        self.invalid_schemas > 0 || self.pages.iter().any(|p| !p.extraction_issues.is_empty())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn recommendations(report: &ValidationReport, pages: &[PageValidation]) -> Vec<String> {
    let mut out = Vec::new();

    let without_data = pages.iter().filter(|p| p.schemas.is_empty()).count();
    if without_data > 0 {
        out.push(format!(
            "{} page(s) have no structured data; add at least WebPage and Organization markup",
            without_data
        ));
    }
    if report.invalid_schemas > 0 {
        out.push(format!(
            "Fix {} invalid schema object(s) so they are eligible for rich results",
            report.invalid_schemas
        ));
    }
    if report.total_schemas > 0 && report.average_score < 70.0 {
        out.push(format!(
            "Average schema score is {:.0}; add recommended and AI-oriented fields such as knowsAbout and about",
            report.average_score
        ));
    }
    if let Some(top) = report.common_issues.first() {
        out.push(format!("Most common issue ({}x): {}", top.count, top.issue));
    }
    if !report.failed_urls.is_empty() {
        out.push(format!(
            "{} URL(s) could not be fetched; re-run the audit once they are reachable",
            report.failed_urls.len()
        ));
    }

    out
}

/// Extracts and validates structured data, from HTML or from live URLs
#[derive(Debug, Clone)]
pub struct SchemaAuditor {
    fetcher: PageFetcher,
    validator: SchemaValidator,
}

impl SchemaAuditor {
    pub fn new(config: &FetchConfig) -> Result<Self, NetworkError> {
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
            validator: SchemaValidator::new(),
        })
    }

    pub fn with_validator(mut self, validator: SchemaValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Validates the structured data found in `html`
    pub fn validate_html(&self, url: &str, html: &str) -> PageValidation {
        validate_html_with(&self.validator, url, html)
    }

    /// Fetches `url` and validates its structured data; transport failures propagate
    pub async fn validate_url(&self, url: &str) -> Result<PageValidation, NetworkError> {
        let html = self.fetcher.fetch(url).await?;
        Ok(self.validate_html(url, &html))
    }

    /// Audits `urls` one after another; fetch failures are recorded, not fatal
    pub async fn generate_validation_report(&self, urls: &[String]) -> ValidationReport {
        let outcomes: Vec<(String, Result<PageValidation, NetworkError>)> = stream::iter(urls)
            .then(|url| async move { (url.clone(), self.validate_url(url).await) })
            .collect()
            .await;

        let mut pages = Vec::new();
        let mut failed = Vec::new();
        for (url, outcome) in outcomes {
            match outcome {
                Ok(page) => pages.push(page),
                Err(e) => {
                    warn!(url = %url, error = %e, "Schema audit fetch failed");
                    failed.push(FailedUrl {
                        url,
                        error: e.to_string(),
                    });
                }
            }
        }

        let report = ValidationReport::from_results(pages, failed);
        info!(
            urls = report.total_urls,
            failed = report.failed_urls.len(),
            schemas = report.total_schemas,
            average_score = report.average_score,
            "Schema validation report generated"
        );
        report
    }
}

/// Validates the structured data in `html` with `validator`
pub fn validate_html_with(validator: &SchemaValidator, url: &str, html: &str) -> PageValidation {
    let extraction = extract_structured_data(html);

    let schemas: Vec<ValidatedSchema> = extraction
        .schemas
        .iter()
        .map(|schema| ValidatedSchema {
            source: schema.source,
            validation: validator.validate(&schema.data),
        })
        .collect();

    let score = if schemas.is_empty() {
        0
    } else {
        let total: u32 = schemas.iter().map(|s| s.validation.score).sum();
        total / schemas.len() as u32
    };

    PageValidation {
        url: url.to_string(),
        valid: !schemas.is_empty()
            && extraction.issues.is_empty()
            && schemas.iter().all(|s| s.validation.valid),
        score,
        schemas,
        extraction_issues: extraction.issues,
    }
}
