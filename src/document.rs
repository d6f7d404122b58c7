use serde_json::Value;

use crate::{GraylogError, Result};

/// Parsed JSON response body with no assumed schema.
///
/// Paths are dot-separated keys; numeric segments index into arrays, e.g.
/// `"messages.0.message.source"`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document(Value);

impl Document {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub(crate) fn parse(body: &str) -> Result<Self> {
        if body.trim().is_empty() {
            return Ok(Self(Value::Null));
        }
        serde_json::from_str(body).map(Self).map_err(|err| {
            GraylogError::Decode(format!("invalid response JSON: {err}; body: {body}"))
        })
    }

    /// Returns the value at `path`, or `None` if any segment is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.0);
        }
        path.split('.').try_fold(&self.0, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn i64_at(&self, path: &str) -> Option<i64> {
        self.get(path)?.as_i64()
    }

    pub fn u64_at(&self, path: &str) -> Option<u64> {
        self.get(path)?.as_u64()
    }

    pub fn bool_at(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Returns the array at `path` as owned sub-documents.
    pub fn array_at(&self, path: &str) -> Option<Vec<Document>> {
        self.get(path)?
            .as_array()
            .map(|items| items.iter().cloned().map(Self).collect())
    }

    /// Like [`Document::str_at`], but a missing or non-string value is a decode error.
    pub fn require_str(&self, path: &str) -> Result<&str> {
        self.str_at(path).ok_or_else(|| {
            GraylogError::Decode(format!("missing string field '{path}' in response"))
        })
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
