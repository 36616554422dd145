//! Typed decode of the barnsworthburning search API response.
//!
//! The upstream envelope is `{ "results": [ <item>... ] }`. Decoding is
//! strict: wrong types, out-of-range values, and uncoercible dates fail the
//! whole response with a [`SchemaError`] naming the offending JSON path.
//! Unknown keys are ignored for forward compatibility with the API.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::SchemaError;

/// Lightweight reference (id + name) to another catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedRecord {
    pub id: String,
    pub name: String,
}

/// An image asset attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub id: String,
    pub url: String,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u64>,
}

/// One search result record.
///
/// Only `id` and the two audit dates are required. List fields stay
/// `Option<Vec<_>>` because the formatter distinguishes a missing key from
/// an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultItem {
    pub id: String,
    pub extracted_on: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creators: Option<Vec<LinkedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spaces: Option<Vec<LinkedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<LinkedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<LinkedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_creators: Option<Vec<LinkedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<LinkedRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<Attachment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub michelin_stars: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_on: Option<DateTime<Utc>>,
}

/// The full decoded response envelope for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchResultItem>,
}

/// Decode a full response envelope from an arbitrary JSON value.
pub fn decode_results(value: &Value) -> Result<SearchResults, SchemaError> {
    let obj = as_object(value, "$")?;
    let results_val = obj
        .get("results")
        .ok_or_else(|| SchemaError::new("$.results", "array", "missing"))?;
    let arr = results_val
        .as_array()
        .ok_or_else(|| SchemaError::new("$.results", "array", type_name(results_val)))?;

    let mut results = Vec::with_capacity(arr.len());
    for (i, item) in arr.iter().enumerate() {
        results.push(decode_item(item, &format!("$.results[{i}]"))?);
    }

    Ok(SearchResults { results })
}

fn decode_item(value: &Value, path: &str) -> Result<SearchResultItem, SchemaError> {
    let obj = as_object(value, path)?;

    Ok(SearchResultItem {
        id: req_string(obj, path, "id")?,
        extracted_on: req_date(obj, path, "extractedOn")?,
        last_updated: req_date(obj, path, "lastUpdated")?,
        title: opt_string(obj, path, "title")?,
        creators: opt_list(obj, path, "creators", decode_linked)?,
        spaces: opt_list(obj, path, "spaces", decode_linked)?,
        connections: opt_list(obj, path, "connections", decode_linked)?,
        parent: opt_field(obj, path, "parent", decode_linked)?,
        parent_creators: opt_list(obj, path, "parentCreators", decode_linked)?,
        children: opt_list(obj, path, "children", decode_linked)?,
        extract: opt_string(obj, path, "extract")?,
        notes: opt_string(obj, path, "notes")?,
        images: opt_list(obj, path, "images", decode_attachment)?,
        image_caption: opt_string(obj, path, "imageCaption")?,
        michelin_stars: opt_stars(obj, path, "michelinStars")?,
        source: opt_url(obj, path, "source")?,
        format: opt_string(obj, path, "format")?,
        published_on: opt_date(obj, path, "publishedOn")?,
    })
}

fn decode_linked(value: &Value, path: &str) -> Result<LinkedRecord, SchemaError> {
    let obj = as_object(value, path)?;
    Ok(LinkedRecord {
        id: req_string(obj, path, "id")?,
        name: req_string(obj, path, "name")?,
    })
}

fn decode_attachment(value: &Value, path: &str) -> Result<Attachment, SchemaError> {
    let obj = as_object(value, path)?;
    Ok(Attachment {
        id: req_string(obj, path, "id")?,
        url: req_url(obj, path, "url")?,
        filename: req_string(obj, path, "filename")?,
        size: opt_u64(obj, path, "size")?,
        mime_type: req_string(obj, path, "type")?,
        width: opt_u64(obj, path, "width")?,
        height: opt_u64(obj, path, "height")?,
    })
}

// ---------------------------------------------------------------------------
// Date coercion
// ---------------------------------------------------------------------------

/// Decode-boundary union for date-coercible JSON values.
#[derive(Debug)]
enum DateInput {
    Iso(String),
    EpochMillis(i64),
}

impl DateInput {
    fn classify(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Iso(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::EpochMillis),
            _ => None,
        }
    }

    /// Resolve to a canonical UTC date value, if coercible.
    fn resolve(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Iso(s) => DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|| {
                    NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|ndt| Utc.from_utc_datetime(&ndt))
                }),
            Self::EpochMillis(ms) => Utc.timestamp_millis_opt(ms).single(),
        }
    }
}

const DATE_EXPECTATION: &str = "date (ISO-8601 string or epoch milliseconds)";

fn coerce_date(value: &Value, path: &str) -> Result<DateTime<Utc>, SchemaError> {
    DateInput::classify(value)
        .and_then(DateInput::resolve)
        .ok_or_else(|| SchemaError::new(path, DATE_EXPECTATION, type_name(value)))
}

// ---------------------------------------------------------------------------
// Field decode helpers
// ---------------------------------------------------------------------------

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a serde_json::Map<String, Value>, SchemaError> {
    value
        .as_object()
        .ok_or_else(|| SchemaError::new(path, "object", type_name(value)))
}

fn field_path(path: &str, key: &str) -> String {
    format!("{path}.{key}")
}

fn req_string(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<String, SchemaError> {
    let fp = field_path(path, key);
    let value = obj
        .get(key)
        .ok_or_else(|| SchemaError::new(&fp, "string", "missing"))?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SchemaError::new(&fp, "string", type_name(value)))
}

fn opt_string(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Option<String>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => {
            let fp = field_path(path, key);
            value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| SchemaError::new(fp, "string", type_name(value)))
        }
    }
}

fn valid_url(raw: &str, path: &str) -> Result<String, SchemaError> {
    Url::parse(raw)
        .map(|_| raw.to_string())
        .map_err(|_| SchemaError::new(path, "valid URL", format!("\"{raw}\"")))
}

fn req_url(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<String, SchemaError> {
    let raw = req_string(obj, path, key)?;
    valid_url(&raw, &field_path(path, key))
}

fn opt_url(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Option<String>, SchemaError> {
    match opt_string(obj, path, key)? {
        None => Ok(None),
        Some(raw) => valid_url(&raw, &field_path(path, key)).map(Some),
    }
}

fn opt_u64(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Option<u64>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| {
                SchemaError::new(
                    field_path(path, key),
                    "non-negative integer",
                    type_name(value),
                )
            }),
    }
}

fn opt_stars(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Option<u8>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => match value.as_i64() {
            Some(n) if (0..=3).contains(&n) => Ok(Some(n as u8)),
            _ => Err(SchemaError::new(
                field_path(path, key),
                "integer between 0 and 3",
                type_name(value),
            )),
        },
    }
}

fn req_date(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<DateTime<Utc>, SchemaError> {
    let fp = field_path(path, key);
    let value = obj
        .get(key)
        .ok_or_else(|| SchemaError::new(&fp, DATE_EXPECTATION, "missing"))?;
    coerce_date(value, &fp)
}

fn opt_date(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<Option<DateTime<Utc>>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => coerce_date(value, &field_path(path, key)).map(Some),
    }
}

fn opt_field<T>(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    decode: fn(&Value, &str) -> Result<T, SchemaError>,
) -> Result<Option<T>, SchemaError> {
    match obj.get(key) {
        None => Ok(None),
        Some(value) => decode(value, &field_path(path, key)).map(Some),
    }
}

fn opt_list<T>(
    obj: &serde_json::Map<String, Value>,
    path: &str,
    key: &str,
    decode: fn(&Value, &str) -> Result<T, SchemaError>,
) -> Result<Option<Vec<T>>, SchemaError> {
    let value = match obj.get(key) {
        None => return Ok(None),
        Some(v) => v,
    };

    let fp = field_path(path, key);
    let arr = value
        .as_array()
        .ok_or_else(|| SchemaError::new(&fp, "array", type_name(value)))?;

    // One invalid element fails the whole array.
    let mut out = Vec::with_capacity(arr.len());
    for (i, elem) in arr.iter().enumerate() {
        out.push(decode(elem, &format!("{fp}[{i}]"))?);
    }
    Ok(Some(out))
}
