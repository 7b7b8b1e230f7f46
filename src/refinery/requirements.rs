// * Schema Requirement Tables
// * Per-type required / recommended / AI-oriented fields driving the structured-data score

/// Field expectations for one schema.org type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaRequirements {
    pub schema_type: &'static str,
    pub required: &'static [&'static str],
    pub recommended: &'static [&'static str],
    /// Optional fields that help AI assistants and answer engines understand the entity
    pub ai_fields: &'static [&'static str],
}

const ARTICLE_REQUIRED: &[&str] = &["headline", "author", "datePublished"];
const ARTICLE_RECOMMENDED: &[&str] = &["image", "dateModified", "publisher", "description", "mainEntityOfPage"];
const ARTICLE_AI: &[&str] = &["about", "mentions", "keywords", "abstract"];

pub const REQUIREMENTS: &[SchemaRequirements] = &[
    SchemaRequirements {
        schema_type: "Organization",
        required: &["name", "url"],
        recommended: &["logo", "description", "sameAs", "contactPoint", "address"],
        ai_fields: &["knowsAbout", "areaServed", "hasOfferCatalog", "slogan"],
    },
    SchemaRequirements {
        schema_type: "ProfessionalService",
        required: &["name", "url"],
        recommended: &["logo", "description", "address", "telephone", "priceRange"],
        ai_fields: &["knowsAbout", "areaServed", "hasOfferCatalog"],
    },
    SchemaRequirements {
        schema_type: "WebSite",
        required: &["name", "url"],
        recommended: &["description", "publisher", "potentialAction", "inLanguage"],
        ai_fields: &["about", "keywords"],
    },
    SchemaRequirements {
        schema_type: "WebPage",
        required: &["name"],
        recommended: &["description", "url", "breadcrumb", "dateModified"],
        ai_fields: &["about", "mentions", "speakable", "significantLink"],
    },
    SchemaRequirements {
        schema_type: "Article",
        required: ARTICLE_REQUIRED,
        recommended: ARTICLE_RECOMMENDED,
        ai_fields: ARTICLE_AI,
    },
    SchemaRequirements {
        schema_type: "BlogPosting",
        required: ARTICLE_REQUIRED,
        recommended: ARTICLE_RECOMMENDED,
        ai_fields: ARTICLE_AI,
    },
    SchemaRequirements {
        schema_type: "Service",
        required: &["name", "provider"],
        recommended: &["description", "serviceType", "areaServed", "url"],
        ai_fields: &["audience", "hasOfferCatalog", "category", "termsOfService"],
    },
    SchemaRequirements {
        schema_type: "Person",
        required: &["name"],
        recommended: &["jobTitle", "url", "image", "sameAs", "worksFor"],
        ai_fields: &["knowsAbout", "alumniOf", "hasCredential"],
    },
    SchemaRequirements {
        schema_type: "FAQPage",
        required: &["mainEntity"],
        recommended: &["name", "description"],
        ai_fields: &["about", "speakable"],
    },
    SchemaRequirements {
        schema_type: "BreadcrumbList",
        required: &["itemListElement"],
        recommended: &[],
        ai_fields: &[],
    },
    SchemaRequirements {
        schema_type: "Event",
        required: &["name", "startDate", "location"],
        recommended: &["endDate", "description", "image", "organizer", "eventStatus"],
        ai_fields: &["about", "audience"],
    },
];

/// Looks up the requirements for a schema type
pub fn requirements_for(schema_type: &str) -> Option<&'static SchemaRequirements> {
    REQUIREMENTS.iter().find(|r| r.schema_type == schema_type)
}

/// Schema types with a requirement table
pub fn supported_types() -> impl Iterator<Item = &'static str> {
    REQUIREMENTS.iter().map(|r| r.schema_type)
}
