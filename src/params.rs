//! Index and search parameters understood by the Milvus server

use crate::error::{MilvusError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

/// Distance metrics supported by Milvus float-vector indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MetricType {
    /// Euclidean (L2) distance
    #[default]
    #[serde(rename = "L2")]
    L2,
    /// Inner product
    #[serde(rename = "IP")]
    Ip,
    /// Cosine similarity
    #[serde(rename = "COSINE")]
    Cosine,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::L2 => "L2",
            MetricType::Ip => "IP",
            MetricType::Cosine => "COSINE",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index algorithms that can be requested for the vector field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndexType {
    #[serde(rename = "FLAT")]
    Flat,
    #[default]
    #[serde(rename = "IVF_FLAT")]
    IvfFlat,
    #[serde(rename = "IVF_SQ8")]
    IvfSq8,
    #[serde(rename = "IVF_PQ")]
    IvfPq,
    #[serde(rename = "HNSW")]
    Hnsw,
    #[serde(rename = "AUTOINDEX")]
    AutoIndex,
}

impl IndexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexType::Flat => "FLAT",
            IndexType::IvfFlat => "IVF_FLAT",
            IndexType::IvfSq8 => "IVF_SQ8",
            IndexType::IvfPq => "IVF_PQ",
            IndexType::Hnsw => "HNSW",
            IndexType::AutoIndex => "AUTOINDEX",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexType {
    type Err = MilvusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "FLAT" => Ok(IndexType::Flat),
            "IVF_FLAT" => Ok(IndexType::IvfFlat),
            "IVF_SQ8" => Ok(IndexType::IvfSq8),
            "IVF_PQ" => Ok(IndexType::IvfPq),
            "HNSW" => Ok(IndexType::Hnsw),
            "AUTOINDEX" => Ok(IndexType::AutoIndex),
            _ => Err(MilvusError::InvalidArgument(format!(
                "Unknown index type: {}",
                s
            ))),
        }
    }
}

/// One entry of the `indexParams` array of `indexes/create`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexParams {
    pub field_name: String,
    pub index_name: String,
    pub index_type: IndexType,
    pub metric_type: MetricType,
    pub params: Map<String, Value>,
}

impl IndexParams {
    /// Parameters for an index on `field` named after the field. `nlist`
    /// only applies to the IVF family; other algorithms get no tuning
    /// parameters beyond `index_type`.
    pub fn new(field: &str, index_type: IndexType, metric_type: MetricType, nlist: u32) -> Self {
        let mut params = Map::new();
        params.insert("index_type".to_string(), json!(index_type.as_str()));
        if matches!(
            index_type,
            IndexType::IvfFlat | IndexType::IvfSq8 | IndexType::IvfPq
        ) {
            params.insert("nlist".to_string(), json!(nlist));
        }
        Self {
            field_name: field.to_string(),
            index_name: field.to_string(),
            index_type,
            metric_type,
            params,
        }
    }
}

/// The `searchParams` object of `entities/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub metric_type: MetricType,
    pub params: Map<String, Value>,
}

impl SearchParams {
    pub fn with_nprobe(metric_type: MetricType, nprobe: u32) -> Self {
        let mut params = Map::new();
        params.insert("nprobe".to_string(), json!(nprobe));
        Self {
            metric_type,
            params,
        }
    }
}
