//! Vector and metadata types passed to insert and search calls

use crate::error::{MilvusError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// A dense float vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vector {
    data: Vec<f32>,
}

impl Vector {
    /// Create a new vector from a Vec<f32>
    pub fn new(data: Vec<f32>) -> Self {
        Self { data }
    }

    /// Get the dimension of the vector
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Get the underlying data as a slice
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }
}

impl From<Vec<f32>> for Vector {
    fn from(data: Vec<f32>) -> Self {
        Self::new(data)
    }
}

/// Parse a vector from a comma-separated string such as `"1.0, 2.0, 3.0"`
impl FromStr for Vector {
    type Err = MilvusError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Err(MilvusError::InvalidArgument(
                "Vector string is empty".to_string(),
            ));
        }
        let data: Result<Vec<f32>> = s
            .split(',')
            .map(|x| {
                x.trim()
                    .parse::<f32>()
                    .map_err(|_| MilvusError::InvalidArgument(format!("Invalid float: {}", x)))
            })
            .collect();
        Ok(Vector::new(data?))
    }
}

/// Key/value metadata stored alongside a vector as Milvus dynamic fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Metadata {
    fields: Map<String, Value>,
}

impl Metadata {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the row sent to `entities/insert`: the metadata fields plus the
    /// vector under `vector_field`. The vector always wins over a metadata
    /// key of the same name.
    pub(crate) fn into_row(self, vector_field: &str, vector: Vector) -> Map<String, Value> {
        let mut row = self.fields;
        row.insert(vector_field.to_string(), serde_json::json!(vector.data));
        row
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// Parse `key=value` into a metadata entry. Values that parse as JSON
/// (numbers, booleans, quoted strings) keep their type; anything else is
/// stored as a plain string.
pub fn parse_metadata_pair(s: &str) -> Result<(String, Value)> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| MilvusError::InvalidArgument(format!("Expected key=value, got: {}", s)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(MilvusError::InvalidArgument(format!(
            "Empty metadata key in: {}",
            s
        )));
    }
    let raw = raw.trim();
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
