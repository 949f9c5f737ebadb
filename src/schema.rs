//! Collection schemas: the body sent to `collections/create` and the
//! description returned by `collections/describe`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Milvus field data types, named as the REST API names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float,
    Double,
    VarChar,
    #[serde(rename = "JSON")]
    Json,
    Array,
    FloatVector,
    BinaryVector,
    Float16Vector,
    BFloat16Vector,
    SparseFloatVector,
    #[serde(other)]
    Unknown,
}

impl DataType {
    /// Upper-case name, e.g. `INT64` or `FLOAT_VECTOR`
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "BOOL",
            DataType::Int8 => "INT8",
            DataType::Int16 => "INT16",
            DataType::Int32 => "INT32",
            DataType::Int64 => "INT64",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::VarChar => "VARCHAR",
            DataType::Json => "JSON",
            DataType::Array => "ARRAY",
            DataType::FloatVector => "FLOAT_VECTOR",
            DataType::BinaryVector => "BINARY_VECTOR",
            DataType::Float16Vector => "FLOAT16_VECTOR",
            DataType::BFloat16Vector => "BFLOAT16_VECTOR",
            DataType::SparseFloatVector => "SPARSE_FLOAT_VECTOR",
            DataType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// --- collections/create ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FieldDefinition {
    pub field_name: String,
    pub data_type: DataType,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_primary: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub element_type_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaDefinition {
    pub auto_id: bool,
    pub enable_dynamic_field: bool,
    pub fields: Vec<FieldDefinition>,
}

impl SchemaDefinition {
    /// Auto-id INT64 primary key plus a float vector of `dim`, with dynamic
    /// fields enabled so arbitrary metadata can ride along with each row.
    pub fn vector_collection(primary_field: &str, vector_field: &str, dim: u32) -> Self {
        let mut dim_params = BTreeMap::new();
        dim_params.insert("dim".to_string(), dim.to_string());
        Self {
            auto_id: true,
            enable_dynamic_field: true,
            fields: vec![
                FieldDefinition {
                    field_name: primary_field.to_string(),
                    data_type: DataType::Int64,
                    is_primary: true,
                    element_type_params: BTreeMap::new(),
                },
                FieldDefinition {
                    field_name: vector_field.to_string(),
                    data_type: DataType::FloatVector,
                    is_primary: false,
                    element_type_params: dim_params,
                },
            ],
        }
    }
}

// --- collections/describe ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_id: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Vec<KeyValue>,
}

impl FieldDescription {
    /// Vector dimension, when the field declares one
    pub fn dim(&self) -> Option<u32> {
        self.params
            .iter()
            .find(|p| p.key == "dim")
            .and_then(|p| p.value.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescription {
    pub field_name: String,
    pub index_name: String,
    #[serde(default)]
    pub metric_type: Option<String>,
}

/// What `collections/describe` reports about a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescription {
    pub collection_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub auto_id: bool,
    #[serde(default)]
    pub enable_dynamic_field: bool,
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
    #[serde(default)]
    pub indexes: Vec<IndexDescription>,
    #[serde(default)]
    pub load: Option<String>,
}

/// A lookup handle for a remote collection, as returned by
/// [`MilvusClient::get_collection`](crate::MilvusClient::get_collection).
#[derive(Debug, Clone, PartialEq)]
pub struct Collection {
    pub name: String,
    pub description: CollectionDescription,
}

impl Collection {
    pub fn has_index(&self) -> bool {
        !self.description.indexes.is_empty()
    }

    /// Dimension of the first float-vector field
    pub fn dim(&self) -> Option<u32> {
        self.description
            .fields
            .iter()
            .find(|f| f.data_type == DataType::FloatVector)
            .and_then(FieldDescription::dim)
    }
}

/// Per-field summary in a [`CollectionSchema`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    #[serde(rename = "type")]
    pub data_type: String,
    pub is_primary: bool,
    pub auto_id: bool,
}

/// Flattened schema: field name to type/primary/auto-id, plus description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub fields: BTreeMap<String, FieldInfo>,
    pub description: String,
}

impl From<&CollectionDescription> for CollectionSchema {
    fn from(desc: &CollectionDescription) -> Self {
        let fields = desc
            .fields
            .iter()
            .map(|f| {
                let info = FieldInfo {
                    data_type: f.data_type.name().to_string(),
                    is_primary: f.primary_key,
                    auto_id: f.auto_id || (f.primary_key && desc.auto_id),
                };
                (f.name.clone(), info)
            })
            .collect();
        Self {
            fields,
            description: desc.description.clone(),
        }
    }
}
