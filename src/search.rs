//! Primary keys and search hits returned by the server

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A primary key assigned by Milvus.
///
/// INT64 keys may arrive as JSON numbers or, when the server protects
/// clients from precision loss, as decimal strings. Both decode to `Int`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    Int(i64),
    Str(String),
}

impl<'de> Deserialize<'de> for PrimaryKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(id) => PrimaryKey::Int(id),
            Raw::Str(s) => match s.parse::<i64>() {
                Ok(id) => PrimaryKey::Int(id),
                Err(_) => PrimaryKey::Str(s),
            },
        })
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Int(id) => write!(f, "{}", id),
            PrimaryKey::Str(id) => f.write_str(id),
        }
    }
}

/// One nearest-neighbor hit: id, distance, and any requested output fields.
/// Serializes as a flat map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: PrimaryKey,
    pub distance: f32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SearchHit {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Keep only `output_fields`, filling in `null` for any the server
    /// left out of the hit.
    pub(crate) fn project(mut self, output_fields: &[String]) -> Self {
        let mut fields = Map::new();
        for name in output_fields {
            let value = self.fields.remove(name).unwrap_or(Value::Null);
            fields.insert(name.clone(), value);
        }
        self.fields = fields;
        self
    }
}

/// `data` of a successful `entities/insert`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertResult {
    #[serde(default)]
    pub insert_count: u64,
    #[serde(default)]
    pub insert_ids: Vec<PrimaryKey>,
}

/// `data` of `collections/get_stats`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CollectionStats {
    pub row_count: u64,
}

/// `data` of `collections/get_load_state`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoadState {
    pub load_state: String,
    #[serde(default)]
    pub load_progress: Option<u32>,
}

impl LoadState {
    pub fn is_loaded(&self) -> bool {
        self.load_state == "LoadStateLoaded"
    }
}
