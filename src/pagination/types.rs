//! Page types and response extraction

use crate::error::{Error, Result};
use crate::types::Record;
use serde_json::Value;

/// One decoded API reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResponse {
    /// Records in the order the API returned them
    pub records: Vec<Record>,
    /// Continuation token for the next page, if any
    pub next_cursor: Option<String>,
}

impl PageResponse {
    /// Create a page response
    pub fn new(records: Vec<Record>, next_cursor: Option<String>) -> Self {
        Self {
            records,
            next_cursor,
        }
    }

    /// Number of records on this page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page carried no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Pulls the records array and the continuation token out of a JSON body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageExtractor {
    /// Dot path to the records array (e.g. `people`)
    pub records_path: String,
    /// Dot path to the continuation token (e.g. `_metadata.next`)
    pub cursor_path: String,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new("people", "_metadata.next")
    }
}

impl PageExtractor {
    /// Create a new extractor
    pub fn new(records_path: impl Into<String>, cursor_path: impl Into<String>) -> Self {
        Self {
            records_path: records_path.into(),
            cursor_path: cursor_path.into(),
        }
    }

    /// Decode a response body into a page
    ///
    /// A missing records array is treated as an empty page. Anything other
    /// than an array of objects at the records path is an error.
    pub fn extract(&self, body: &Value) -> Result<PageResponse> {
        let records = match extract_path(body, &self.records_path) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| match item {
                    Value::Object(obj) => Ok(obj.clone()),
                    other => Err(Error::extraction(
                        &self.records_path,
                        format!("item {idx} is not an object: {other}"),
                    )),
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(Error::extraction(
                    &self.records_path,
                    format!("expected an array, found {}", type_name(other)),
                ))
            }
        };

        let next_cursor = extract_path(body, &self.cursor_path).and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(PageResponse::new(records, next_cursor))
    }
}

/// Resolve a simple dot path (optionally prefixed with `$.`) in a JSON value
pub fn extract_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, part| match current {
        Value::Object(map) => map.get(part),
        _ => None,
    })
}

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
