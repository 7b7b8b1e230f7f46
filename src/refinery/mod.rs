// * The Refinery (Structured-Data Audit)
// * Goal: Extract JSON-LD and microdata from HTML, score every object against schema.org
// * expectations and aggregate the results into audit reports.

pub mod extractor;
pub mod report;
pub mod requirements;
pub mod validator;

// * Re-exports for convenient access
pub use extractor::{extract_structured_data, schema_type_of, ExtractedSchema, SchemaSource, StructuredDataExtraction};
pub use report::{
    validate_html_with, FailedUrl, IssueCount, PageValidation, SchemaAuditor, ValidatedSchema,
    ValidationReport,
};
pub use requirements::{requirements_for, SchemaRequirements};
pub use validator::{is_valid_iso_date, is_valid_url, SchemaValidation, SchemaValidator};

use serde_json::Value;

/// Validates one schema object with default settings
pub fn validate_schema(schema: &Value) -> SchemaValidation {
    SchemaValidator::new().validate(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_html() -> &'static str {
        r#"
        <html lang="en">
        <head>
            <title>Acme AI - Services</title>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "Service",
                "name": "AI strategy consulting",
                "provider": {"@type": "Organization", "name": "Acme AI", "url": "https://acme.test"},
                "areaServed": "EU",
                "audience": {"@type": "BusinessAudience", "audienceType": "Enterprises"}
            }
            </script>
        </head>
        <body>
            <div itemscope itemtype="https://schema.org/Person">
                <span itemprop="name">Ada Lovelace</span>
                <span itemprop="jobTitle">Principal Consultant</span>
            </div>
        </body>
        </html>
        "#
    }

    #[test]
    fn test_extract_then_validate() {
        let extraction = extract_structured_data(sample_html());
        assert_eq!(extraction.schemas.len(), 2);

        let results: Vec<SchemaValidation> = extraction
            .schemas
            .iter()
            .map(|s| validate_schema(&s.data))
            .collect();

        assert!(results.iter().all(|r| r.valid));
        assert_eq!(results[0].schema_type.as_deref(), Some("Service"));
        assert_eq!(results[1].schema_type.as_deref(), Some("Person"));
    }

    #[test]
    fn test_page_validation_serialization() {
        let page = validate_html_with(&SchemaValidator::new(), "https://acme.test/services", sample_html());
        let json = serde_json::to_string(&page).unwrap();

        assert!(json.contains("\"source\":\"json_ld\""));
        assert!(json.contains("\"source\":\"microdata\""));
    }
}
