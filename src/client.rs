//! The Milvus client wrapper.
//!
//! Each public operation validates its arguments, forwards to the server and
//! maps the answer to a plain value. Apart from `connect` and
//! `create_collection`, failures are logged and turned into a sentinel
//! (`None`, `false` or an empty `Vec`) instead of being returned.

use crate::config::ConnectionConfig;
use crate::error::{MilvusError, Result};
use crate::params::{IndexParams, IndexType, MetricType, SearchParams};
use crate::rest::RestTransport;
use crate::schema::{Collection, CollectionDescription, CollectionSchema, SchemaDefinition};
use crate::search::{CollectionStats, InsertResult, LoadState, PrimaryKey, SearchHit};
use crate::vector::{Metadata, Vector};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Name of the auto-id primary key field
pub const PRIMARY_FIELD: &str = "id";
/// Name of the float-vector field
pub const VECTOR_FIELD: &str = "vector";
pub const DEFAULT_DIM: u32 = 64;
pub const DEFAULT_NLIST: u32 = 128;
pub const DEFAULT_TOP_K: usize = 5;
/// `nprobe` used for every search
pub const SEARCH_NPROBE: u32 = 10;
/// Metric used both for index builds and searches
pub const METRIC: MetricType = MetricType::L2;
/// Pause between `get_load_state` polls while a load is in progress
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Follow-up actions after an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOptions {
    /// Seal the inserted rows so they are persisted and counted
    pub auto_flush: bool,
    /// Load the collection so the new rows are searchable
    pub auto_load: bool,
}

impl Default for InsertOptions {
    fn default() -> Self {
        Self {
            auto_flush: true,
            auto_load: true,
        }
    }
}

/// A connection to one Milvus server
#[derive(Debug, Clone)]
pub struct MilvusClient {
    transport: RestTransport,
    config: ConnectionConfig,
}

impl MilvusClient {
    /// Connect to the server described by `config`.
    ///
    /// The server is probed with a collection listing; an unreachable or
    /// misbehaving server is reported as an error.
    pub async fn connect(config: ConnectionConfig) -> Result<Self> {
        match Self::open(config).await {
            Ok(client) => {
                info!(
                    alias = %client.config.alias,
                    "Connected to Milvus at {}:{}",
                    client.config.host,
                    client.config.port
                );
                Ok(client)
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to Milvus");
                Err(e)
            }
        }
    }

    async fn open(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;
        let transport = RestTransport::new(&config)?;
        let client = Self { transport, config };
        client.try_list_collections().await?;
        Ok(client)
    }

    /// Connect using `MILVUS_*` environment variables
    pub async fn from_env() -> Result<Self> {
        Self::connect(ConnectionConfig::from_env()).await
    }

    pub fn alias(&self) -> &str {
        &self.config.alias
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Close the connection. The REST API keeps no session, so this only
    /// releases the local HTTP pool.
    pub fn disconnect(self) {
        info!(alias = %self.config.alias, "Disconnected from Milvus");
    }

    /// Look up a collection, or `None` if it does not exist
    pub async fn get_collection(&self, name: &str) -> Option<Collection> {
        match self.try_get_collection(name).await {
            Ok(collection) => Some(collection),
            Err(MilvusError::CollectionNotFound { .. }) => {
                warn!("Collection '{}' does not exist.", name);
                None
            }
            Err(e) => {
                error!(collection = %name, error = %e, "Failed to look up collection");
                None
            }
        }
    }

    /// Create a collection with an auto-id primary key and a `dim`-wide
    /// float vector. Does nothing if the collection already exists.
    pub async fn create_collection(&self, name: &str, dim: u32) -> Result<()> {
        if self.has_collection(name).await? {
            info!("Collection '{}' already exists.", name);
            return Ok(());
        }

        if dim == 0 {
            return Err(MilvusError::InvalidArgument(
                "dimension must be positive".to_string(),
            ));
        }

        let body = json!({
            "collectionName": name,
            "description": format!("Collection '{}' with dim={}", name, dim),
            "schema": SchemaDefinition::vector_collection(PRIMARY_FIELD, VECTOR_FIELD, dim),
        });
        self.transport
            .post::<Value>("collections/create", body)
            .await?;

        info!("Created collection '{}' with dimension {}.", name, dim);
        Ok(())
    }

    /// Build an index on the vector field. Returns `false` when the
    /// collection is missing, already indexed, or the build request fails.
    pub async fn create_index(&self, name: &str, index_type: IndexType, nlist: u32) -> bool {
        let Some(collection) = self.get_collection(name).await else {
            return false;
        };

        if collection.has_index() {
            info!("Collection '{}' already has an index.", name);
            return false;
        }

        let params = IndexParams::new(VECTOR_FIELD, index_type, METRIC, nlist);
        let body = json!({
            "collectionName": name,
            "indexParams": [params],
        });
        match self.transport.post::<Value>("indexes/create", body).await {
            Ok(_) => {
                info!(index_type = %index_type, "Created index for collection '{}'.", name);
                true
            }
            Err(e) => {
                error!(collection = %name, error = %e, "Failed to create index");
                false
            }
        }
    }

    /// Insert vectors with optional per-vector metadata.
    ///
    /// Returns the primary keys the server assigned, or `None` when the
    /// collection is missing, the batch is empty, vector and metadata counts
    /// differ, or the insert is rejected. A failed flush or load after a
    /// successful insert is logged but does not discard the keys.
    pub async fn insert_vectors(
        &self,
        name: &str,
        vectors: Vec<Vector>,
        metadata: Option<Vec<Metadata>>,
        options: InsertOptions,
    ) -> Option<Vec<PrimaryKey>> {
        self.get_collection(name).await?;

        let metadata = metadata.unwrap_or_else(|| vec![Metadata::new(); vectors.len()]);
        if vectors.len() != metadata.len() {
            let e = MilvusError::CountMismatch {
                vectors: vectors.len(),
                metadata: metadata.len(),
            };
            error!(collection = %name, error = %e, "Rejected insert");
            return None;
        }
        if vectors.is_empty() {
            error!(collection = %name, "Rejected insert: no vectors given");
            return None;
        }

        match self.try_insert(name, vectors, metadata).await {
            Ok(ids) => {
                self.after_insert(name, options).await;
                Some(ids)
            }
            Err(e) => {
                error!("Insert failed for collection '{}': {}", name, e);
                None
            }
        }
    }

    /// Nearest-neighbor search for a single query vector.
    ///
    /// Always returns a list: a missing collection, a dimension mismatch or
    /// any server error yields an empty one.
    pub async fn search_vectors(
        &self,
        name: &str,
        query: &Vector,
        top_k: usize,
        output_fields: &[String],
        filter_expr: Option<&str>,
    ) -> Vec<SearchHit> {
        if self.get_collection(name).await.is_none() {
            return vec![];
        }

        match self
            .try_search(name, query, top_k, output_fields, filter_expr)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                error!("Search failed in '{}': {}", name, e);
                vec![]
            }
        }
    }

    /// Number of rows in the collection, or `None` if it is missing or the
    /// count fails
    pub async fn count_entities(&self, name: &str) -> Option<u64> {
        self.get_collection(name).await?;

        match self.try_count(name).await {
            Ok(count) => Some(count),
            Err(e) => {
                error!("Count failed for '{}': {}", name, e);
                None
            }
        }
    }

    /// Drop a collection. Returns `false` if it did not exist or the drop
    /// failed.
    pub async fn delete_collection(&self, name: &str) -> bool {
        match self.has_collection(name).await {
            Ok(true) => {}
            Ok(false) => {
                warn!("Collection '{}' does not exist.", name);
                return false;
            }
            Err(e) => {
                error!("Failed to delete collection '{}': {}", name, e);
                return false;
            }
        }

        let body = json!({ "collectionName": name });
        match self.transport.post::<Value>("collections/drop", body).await {
            Ok(_) => {
                info!("Deleted collection '{}'.", name);
                true
            }
            Err(e) => {
                error!("Failed to delete collection '{}': {}", name, e);
                false
            }
        }
    }

    /// Names of all collections in the configured database
    pub async fn list_collections(&self) -> Vec<String> {
        match self.try_list_collections().await {
            Ok(names) => names,
            Err(e) => {
                error!("Failed to list collections: {}", e);
                vec![]
            }
        }
    }

    /// Field types and description of a collection, or `None` if it cannot
    /// be described
    pub async fn get_collection_schema(&self, name: &str) -> Option<CollectionSchema> {
        match self.try_describe(name).await {
            Ok(desc) => Some(CollectionSchema::from(&desc)),
            Err(e) => {
                error!("Failed to get schema for '{}': {}", name, e);
                None
            }
        }
    }

    // --- Fallible building blocks ---

    async fn try_list_collections(&self) -> Result<Vec<String>> {
        let names: Option<Vec<String>> = self.transport.post("collections/list", json!({})).await?;
        Ok(names.unwrap_or_default())
    }

    async fn has_collection(&self, name: &str) -> Result<bool> {
        Ok(self.try_list_collections().await?.iter().any(|n| n == name))
    }

    async fn try_describe(&self, name: &str) -> Result<CollectionDescription> {
        let body = json!({ "collectionName": name });
        self.transport.post("collections/describe", body).await
    }

    async fn try_get_collection(&self, name: &str) -> Result<Collection> {
        if !self.has_collection(name).await? {
            return Err(MilvusError::CollectionNotFound {
                name: name.to_string(),
            });
        }
        let description = self.try_describe(name).await?;
        Ok(Collection {
            name: name.to_string(),
            description,
        })
    }

    /// Request a load and wait until the server reports it finished.
    /// `collections/load` only queues the load, so the state is polled
    /// until it is `LoadStateLoaded` or the connection timeout runs out.
    async fn try_load(&self, name: &str) -> Result<()> {
        let body = json!({ "collectionName": name });
        self.transport
            .post::<Value>("collections/load", body)
            .await?;

        let timeout = self.config.timeout();
        let deadline = Instant::now().checked_add(timeout);
        loop {
            let state = self.try_load_state(name).await?;
            if state.is_loaded() {
                return Ok(());
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(MilvusError::Timeout {
                    operation: format!("load of '{}' ({})", name, state.load_state),
                    timeout_ms: self.config.timeout_ms,
                });
            }
            debug!(
                collection = %name,
                state = %state.load_state,
                progress = ?state.load_progress,
                "Waiting for collection to load"
            );
            tokio::time::sleep(LOAD_POLL_INTERVAL.min(timeout)).await;
        }
    }

    async fn try_load_state(&self, name: &str) -> Result<LoadState> {
        let body = json!({ "collectionName": name });
        self.transport.post("collections/get_load_state", body).await
    }

    async fn try_flush(&self, name: &str) -> Result<()> {
        let body = json!({ "collectionName": name });
        self.transport
            .post::<Value>("collections/flush", body)
            .await?;
        Ok(())
    }

    async fn try_insert(
        &self,
        name: &str,
        vectors: Vec<Vector>,
        metadata: Vec<Metadata>,
    ) -> Result<Vec<PrimaryKey>> {
        let rows: Vec<Value> = vectors
            .into_iter()
            .zip(metadata)
            .map(|(v, meta)| Value::Object(meta.into_row(VECTOR_FIELD, v)))
            .collect();
        let body = json!({
            "collectionName": name,
            "data": rows,
        });
        let result: InsertResult = self.transport.post("entities/insert", body).await?;
        debug!(
            collection = %name,
            count = result.insert_count,
            "Inserted rows"
        );
        Ok(result.insert_ids)
    }

    async fn after_insert(&self, name: &str, options: InsertOptions) {
        if options.auto_flush {
            if let Err(e) = self.try_flush(name).await {
                warn!(collection = %name, error = %e, "Flush after insert failed");
            }
        }
        if options.auto_load {
            if let Err(e) = self.try_load(name).await {
                warn!(collection = %name, error = %e, "Load after insert failed");
            }
        }
    }

    async fn try_search(
        &self,
        name: &str,
        query: &Vector,
        top_k: usize,
        output_fields: &[String],
        filter_expr: Option<&str>,
    ) -> Result<Vec<SearchHit>> {
        self.try_load(name).await?;

        let mut body = json!({
            "collectionName": name,
            "data": [query],
            "annsField": VECTOR_FIELD,
            "limit": top_k,
            "searchParams": SearchParams::with_nprobe(METRIC, SEARCH_NPROBE),
        });
        if !output_fields.is_empty() {
            body["outputFields"] = json!(output_fields);
        }
        if let Some(filter) = filter_expr {
            body["filter"] = json!(filter);
        }

        let hits: Option<Vec<SearchHit>> = self.transport.post("entities/search", body).await?;
        Ok(hits
            .unwrap_or_default()
            .into_iter()
            .map(|hit| hit.project(output_fields))
            .collect())
    }

    async fn try_count(&self, name: &str) -> Result<u64> {
        self.try_load(name).await?;
        let body = json!({ "collectionName": name });
        let stats: CollectionStats = self.transport.post("collections/get_stats", body).await?;
        Ok(stats.row_count)
    }
}
