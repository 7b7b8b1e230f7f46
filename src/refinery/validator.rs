// * Structured-Data Validator
// * Scores one schema object against its requirement table plus a handful of heuristic checks

use crate::config::constants::{
    AI_FIELD_POINTS, MAX_SCHEMA_DEPTH, MAX_SCHEMA_SCORE, MIN_DESCRIPTION_LENGTH, PASSED_CHECK_POINTS,
    RECOMMENDED_FIELD_POINTS, REQUIRED_FIELD_POINTS,
};
use crate::ops::telemetry;
use crate::refinery::extractor::schema_type_of;
use crate::refinery::requirements::requirements_for;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

static ISO_8601: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .expect("! CRITICAL: ISO-8601 regex")
});

const URL_FIELDS: &[&str] = &["url", "logo", "sameAs", "mainEntityOfPage", "contentUrl", "thumbnailUrl"];
const DATE_FIELDS: &[&str] = &[
    "datePublished",
    "dateModified",
    "dateCreated",
    "foundingDate",
    "startDate",
    "endDate",
    "uploadDate",
];

/// Validation outcome for one schema object; `valid` iff `errors` is empty
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaValidation {
    pub schema_type: Option<String>,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    /// 0 - 100
    pub score: u32,
}

impl SchemaValidation {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Read-only validator; never mutates the input object
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    max_depth: usize,
    min_description: usize,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_SCHEMA_DEPTH,
            min_description: MIN_DESCRIPTION_LENGTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self, schema: &Value) -> SchemaValidation {
        let mut result = SchemaValidation::default();

        let Some(object) = schema.as_object() else {
            result.errors.push("Schema must be a JSON object".to_string());
            self.finish(&mut result, 0);
            return result;
        };

        let mut score = 0u32;
        result.schema_type = schema_type_of(schema).map(str::to_string);

        match object.get("@context").and_then(Value::as_str) {
            None if !object.contains_key("@context") => {
                result.warnings.push("Missing @context".to_string());
            }
            Some(ctx) if !ctx.contains("schema.org") => {
                result.warnings.push(format!("Unexpected @context '{}'", ctx));
            }
            _ => {}
        }

        match result.schema_type.as_deref() {
            None => result.errors.push("Missing @type".to_string()),
            Some(schema_type) => match requirements_for(schema_type) {
                Some(req) => {
                    for field in req.required {
                        if has_value(object, field) {
                            score += REQUIRED_FIELD_POINTS;
                        } else {
                            result.errors.push(format!("Missing required field: {}", field));
                        }
                    }
                    for field in req.recommended {
                        if has_value(object, field) {
                            score += RECOMMENDED_FIELD_POINTS;
                        } else {
                            result.warnings.push(format!("Missing recommended field: {}", field));
                        }
                    }
                    for field in req.ai_fields {
                        if has_value(object, field) {
                            score += AI_FIELD_POINTS;
                        } else {
                            result.recommendations.push(format!(
                                "Add {} to help AI systems understand this {}",
                                field, schema_type
                            ));
                        }
                    }
                }
                None => result
                    .warnings
                    .push(format!("No validation rules for type {}", schema_type)),
            },
        }

        let passed = [
            self.check_description(object, &mut result),
            check_urls(object, &mut result),
            check_dates(object, &mut result),
            check_image(object, &mut result),
            self.check_structure(object, &mut result),
        ];
        score += passed.iter().filter(|p| **p).count() as u32 * PASSED_CHECK_POINTS;

        self.finish(&mut result, score);
        result
    }

    fn finish(&self, result: &mut SchemaValidation, score: u32) {
        result.valid = result.errors.is_empty();
        result.score = score.min(MAX_SCHEMA_SCORE);

        debug!(
            schema_type = result.schema_type.as_deref().unwrap_or("unknown"),
            valid = result.valid,
            score = result.score,
            errors = result.errors.len(),
            "Schema validated"
        );
        telemetry::record_schema_validation(result.valid, result.score);
    }

    fn check_description(&self, object: &Map<String, Value>, result: &mut SchemaValidation) -> bool {
        match object.get("description").and_then(Value::as_str) {
            Some(text) if text.chars().count() >= self.min_description => true,
            Some(_) => {
                result.recommendations.push(format!(
                    "Expand description to at least {} characters",
                    self.min_description
                ));
                false
            }
            None => false,
        }
    }

    // * Empty nested objects, `@id` self-references and excessive nesting
    fn check_structure(&self, object: &Map<String, Value>, result: &mut SchemaValidation) -> bool {
        let mut ids: Vec<&str> = Vec::new();
        let before = (result.errors.len(), result.warnings.len());
        self.walk(object, "$", 0, &mut ids, result);
        (result.errors.len(), result.warnings.len()) == before
    }

    fn walk<'v>(
        &self,
        object: &'v Map<String, Value>,
        path: &str,
        depth: usize,
        ids: &mut Vec<&'v str>,
        result: &mut SchemaValidation,
    ) {
        if depth > self.max_depth {
            result.errors.push(format!(
                "Nesting deeper than {} levels at {} (possible circular reference)",
                self.max_depth, path
            ));
            return;
        }

        let own_id = object.get("@id").and_then(Value::as_str);
        if let Some(id) = own_id {
            if depth > 0 && ids.contains(&id) {
                // * A node holding only `@id` is a plain JSON-LD reference
                if object.len() > 1 {
                    result.warnings.push(format!(
                        "Node at {} redefines ancestor @id {}; reference it with {{\"@id\"}} only",
                        path, id
                    ));
                }
                return;
            }
            ids.push(id);
        }

        for (key, value) in object {
            let child_path = format!("{}.{}", path, key);
            self.walk_value(value, &child_path, depth, ids, result);
        }

        if own_id.is_some() {
            ids.pop();
        }
    }

    fn walk_value<'v>(
        &self,
        value: &'v Value,
        path: &str,
        depth: usize,
        ids: &mut Vec<&'v str>,
        result: &mut SchemaValidation,
    ) {
        match value {
            Value::Object(child) if child.is_empty() => {
                result.warnings.push(format!("Empty object at {}", path));
            }
            Value::Object(child) => self.walk(child, path, depth + 1, ids, result),
            Value::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    self.walk_value(item, &format!("{}[{}]", path, i), depth, ids, result);
                }
            }
            _ => {}
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn has_value(object: &Map<String, Value>, field: &str) -> bool {
    match object.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// Absolute URL with a host
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|u| u.has_host())
}

/// ISO-8601 calendar date, optionally with time and offset, with range checks
pub fn is_valid_iso_date(value: &str) -> bool {
    let Some(caps) = ISO_8601.captures(value.trim()) else {
        return false;
    };
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let (Some(year), Some(month), Some(day)) = (num(1), num(2), num(3)) else {
        return false;
    };
    if !(1..=12).contains(&month) || day == 0 || day > days_in_month(year, month) {
        return false;
    }

    let hour_ok = num(4).map_or(true, |h| h < 24);
    let minute_ok = num(5).map_or(true, |m| m < 60);
    let second_ok = num(6).map_or(true, |s| s <= 60);
    hour_ok && minute_ok && second_ok
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if (year % 4 == 0 && year % 100 != 0) || year % 400 == 0 => 29,
        2 => 28,
        _ => 31,
    }
}

fn string_values(value: &Value) -> Vec<&str> {
    match value {
        Value::String(s) => vec![s.as_str()],
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn check_urls(object: &Map<String, Value>, result: &mut SchemaValidation) -> bool {
    let mut checked = 0usize;
    let mut all_valid = true;

    for field in URL_FIELDS {
        let Some(value) = object.get(*field) else {
            continue;
        };
        for url in string_values(value) {
            checked += 1;
            if !is_valid_url(url) {
                all_valid = false;
                result.errors.push(format!("Invalid URL in {}: {}", field, url));
            }
        }
    }

    checked > 0 && all_valid
}

fn check_dates(object: &Map<String, Value>, result: &mut SchemaValidation) -> bool {
    let mut checked = 0usize;
    let mut all_valid = true;

    for field in DATE_FIELDS {
        let Some(value) = object.get(*field) else {
            continue;
        };
        for date in string_values(value) {
            checked += 1;
            if !is_valid_iso_date(date) {
                all_valid = false;
                result
                    .errors
                    .push(format!("Invalid ISO 8601 date in {}: {}", field, date));
            }
        }
    }

    checked > 0 && all_valid
}

fn check_image(object: &Map<String, Value>, result: &mut SchemaValidation) -> bool {
    let image = object.get("image").or_else(|| object.get("logo"));

    match image {
        Some(Value::String(url)) => {
            if !is_valid_url(url) {
                result.errors.push(format!("Invalid image URL: {}", url));
            } else {
                result
                    .recommendations
                    .push("Use an ImageObject with url, width and height for images".to_string());
            }
            false
        }
        Some(Value::Object(img)) if !img.is_empty() => {
            let mut complete = true;
            match img.get("url").and_then(Value::as_str) {
                Some(url) if is_valid_url(url) => {}
                Some(url) => {
                    complete = false;
                    result.errors.push(format!("Invalid image URL: {}", url));
                }
                None => {
                    complete = false;
                    result.errors.push("Image object is missing url".to_string());
                }
            }
            for dimension in ["width", "height"] {
                if !has_value(img, dimension) {
                    complete = false;
                    result.warnings.push(format!("Image object is missing {}", dimension));
                }
            }
            complete
        }
        _ => false,
    }
}
