// * Structured-Data Extraction
// * JSON-LD scripts and schema.org microdata items, returned as raw JSON objects

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;

// * Precompiled selectors
static SELECTOR_JSON_LD: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("! CRITICAL: JSON-LD selector")
});
static SELECTOR_ITEMSCOPE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[itemscope]").expect("! CRITICAL: itemscope selector"));

/// Where a schema object was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSource {
    JsonLd,
    Microdata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSchema {
    pub source: SchemaSource,
    pub data: Value,
}

impl ExtractedSchema {
    /// First `@type` of the object, if any
    pub fn schema_type(&self) -> Option<&str> {
        schema_type_of(&self.data)
    }
}

/// Everything found on one page; malformed blocks are reported, not fatal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDataExtraction {
    pub schemas: Vec<ExtractedSchema>,
    pub issues: Vec<String>,
}

impl StructuredDataExtraction {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Returns the first `@type` of a schema object (string or array form)
pub fn schema_type_of(value: &Value) -> Option<&str> {
    match value.get("@type")? {
        Value::String(t) => Some(t.as_str()),
        Value::Array(types) => types.iter().find_map(Value::as_str),
        _ => None,
    }
}

/// Extracts JSON-LD and microdata objects from `html`
pub fn extract_structured_data(html: &str) -> StructuredDataExtraction {
    let document = Html::parse_document(html);
    let mut extraction = StructuredDataExtraction::default();

    for (index, script) in document.select(&SELECTOR_JSON_LD).enumerate() {
        let raw: String = script.text().collect();
        let raw = raw.trim();
        if raw.is_empty() {
            extraction.issues.push(format!("JSON-LD block {} is empty", index + 1));
            continue;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(value) => flatten_json_ld(value, None, index, &mut extraction),
            Err(e) => extraction
                .issues
                .push(format!("Invalid JSON-LD in block {}: {}", index + 1, e)),
        }
    }

    // * Only top-level items; nested items become property values of their parent
    for item in document
        .select(&SELECTOR_ITEMSCOPE)
        .filter(|el| el.value().attr("itemprop").is_none())
    {
        extraction.schemas.push(ExtractedSchema {
            source: SchemaSource::Microdata,
            data: microdata_item(item),
        });
    }

    extraction
}

// * Top-level arrays and `@graph` containers are split into their member objects
fn flatten_json_ld(
    value: Value,
    context: Option<&Value>,
    index: usize,
    extraction: &mut StructuredDataExtraction,
) {
    match value {
        Value::Array(items) => {
            for item in items {
                flatten_json_ld(item, context, index, extraction);
            }
        }
        Value::Object(mut object) => {
            if let Some(Value::Array(graph)) = object.remove("@graph") {
                let graph_context = object.get("@context").cloned().or_else(|| context.cloned());
                for item in graph {
                    flatten_json_ld(item, graph_context.as_ref(), index, extraction);
                }
                return;
            }

            if let Some(ctx) = context {
                object.entry("@context").or_insert_with(|| ctx.clone());
            }
            extraction.schemas.push(ExtractedSchema {
                source: SchemaSource::JsonLd,
                data: Value::Object(object),
            });
        }
        other => extraction.issues.push(format!(
            "JSON-LD block {} contains a non-object value: {}",
            index + 1,
            other
        )),
    }
}

fn microdata_item(item: ElementRef<'_>) -> Value {
    let mut object = Map::new();

    if let Some(item_type) = item.value().attr("itemtype") {
        let (context, name) = split_item_type(item_type);
        if let Some(context) = context {
            object.insert("@context".to_string(), Value::String(context));
        }
        object.insert("@type".to_string(), Value::String(name));
    }
    if let Some(id) = item.value().attr("itemid") {
        object.insert("@id".to_string(), Value::String(id.to_string()));
    }

    collect_properties(item, &mut object);
    Value::Object(object)
}

// * Walks descendants until the next nested itemscope, which owns its own properties
fn collect_properties(element: ElementRef<'_>, object: &mut Map<String, Value>) {
    for child in element.children().filter_map(ElementRef::wrap) {
        let is_scope = child.value().attr("itemscope").is_some();

        if let Some(props) = child.value().attr("itemprop") {
            let value = if is_scope {
                microdata_item(child)
            } else {
                Value::String(property_value(child))
            };
            for name in props.split_whitespace() {
                insert_property(object, name, value.clone());
            }
        }

        if !is_scope {
            collect_properties(child, object);
        }
    }
}

fn property_value(element: ElementRef<'_>) -> String {
    let el = element.value();
    let attr = match el.name() {
        "meta" => el.attr("content"),
        "a" | "link" | "area" => el.attr("href"),
        "img" | "audio" | "video" | "source" | "iframe" | "embed" => el.attr("src"),
        "object" => el.attr("data"),
        "time" => el.attr("datetime"),
        "data" | "meter" => el.attr("value"),
        _ => el.attr("content"),
    };

    match attr {
        Some(value) => value.trim().to_string(),
        None => element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    }
}

// * Repeated properties become arrays
fn insert_property(object: &mut Map<String, Value>, name: &str, value: Value) {
    match object.get_mut(name) {
        Some(Value::Array(values)) => values.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            object.insert(name.to_string(), value);
        }
    }
}

// * "https://schema.org/Organization" -> (Some("https://schema.org"), "Organization")
fn split_item_type(item_type: &str) -> (Option<String>, String) {
    let first = item_type.split_whitespace().next().unwrap_or(item_type);
    match first.rsplit_once('/') {
        Some((context, name)) if !name.is_empty() => (Some(context.to_string()), name.to_string()),
        _ => (None, first.to_string()),
    }
}
