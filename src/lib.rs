//! # milvus_helper
//!
//! A thin convenience client for the [Milvus](https://milvus.io) vector
//! database, speaking its RESTful API v2.
//!
//! This library provides:
//! - Connection setup with optional token auth
//! - Collection create / describe / drop / list
//! - Index builds on the vector field
//! - Vector insert with dynamic-field metadata
//! - Top-K nearest-neighbor search
//!
//! All storage, indexing and query execution happens on the server.
//!
//! ## Example
//!
//! ```no_run
//! use milvus_helper::{ConnectionConfig, IndexType, InsertOptions, MilvusClient, Vector};
//!
//! # async fn run() -> milvus_helper::Result<()> {
//! let client = MilvusClient::connect(ConnectionConfig::default()).await?;
//! client.create_collection("docs", 3).await?;
//! client.create_index("docs", IndexType::IvfFlat, 128).await;
//!
//! let ids = client
//!     .insert_vectors("docs", vec![Vector::new(vec![1.0, 2.0, 3.0])], None, InsertOptions::default())
//!     .await;
//!
//! let hits = client
//!     .search_vectors("docs", &Vector::new(vec![1.1, 2.1, 3.1]), 5, &[], None)
//!     .await;
//! for hit in hits {
//!     println!("{} at {}", hit.id, hit.distance);
//! }
//! # let _ = ids;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod params;
pub mod rest;
pub mod schema;
pub mod search;
pub mod vector;

pub use client::{InsertOptions, MilvusClient};
pub use config::ConnectionConfig;
pub use error::{MilvusError, Result};
pub use params::{IndexType, MetricType};
pub use schema::{Collection, CollectionSchema, DataType, FieldInfo};
pub use search::{PrimaryKey, SearchHit};
pub use vector::{Metadata, Vector};
