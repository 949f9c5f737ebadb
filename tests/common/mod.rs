//! In-process stand-in for the Milvus RESTful API v2.
//!
//! Implements just enough of the server for the client's endpoints:
//! collections are kept in memory and searched brute-force with squared L2
//! distance, which is what Milvus reports for the `L2` metric. Loading a
//! collection without an index fails the way the real server does, and a
//! load only completes `load_delay` after it was requested.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use milvus_helper::ConnectionConfig;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(150);

const CODE_COLLECTION_NOT_FOUND: i64 = 100;
const CODE_NOT_LOADED: i64 = 101;
const CODE_INDEX_NOT_FOUND: i64 = 700;
const CODE_INVALID_PARAMETER: i64 = 1100;

#[derive(Debug, Clone)]
pub struct Row {
    pub id: i64,
    pub vector: Vec<f32>,
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct MockCollection {
    pub dim: usize,
    pub description: String,
    pub index: Option<Value>,
    /// When the requested load completes
    pub loaded_at: Option<Instant>,
    pub rows: Vec<Row>,
}

impl MockCollection {
    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some_and(|at| Instant::now() >= at)
    }

    fn load_state(&self) -> &'static str {
        match self.loaded_at {
            None => "LoadStateNotLoad",
            Some(_) if self.is_loaded() => "LoadStateLoaded",
            Some(_) => "LoadStateLoading",
        }
    }
}

#[derive(Debug, Default)]
pub struct MockMilvus {
    pub collections: BTreeMap<String, MockCollection>,
    /// Every request seen, as (endpoint, body)
    pub requests: Vec<(String, Value)>,
    /// Answer every request with HTTP 503
    pub unavailable: bool,
    pub load_delay: Duration,
    next_id: i64,
}

pub type Shared = Arc<Mutex<MockMilvus>>;

pub struct MockServer {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl MockServer {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockMilvus {
            next_id: 450_000_000_000_000_000,
            load_delay: DEFAULT_LOAD_DELAY,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/v2/vectordb/:group/:action", post(handle))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn config(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.addr.ip().to_string(), self.addr.port(), "test")
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn set_load_delay(&self, delay: Duration) {
        self.state.lock().unwrap().load_delay = delay;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().unavailable = unavailable;
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(name)
            .is_some_and(MockCollection::is_loaded)
    }

    pub fn row_count(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(name)
            .map(|c| c.rows.len())
            .unwrap_or(0)
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({"code": 0, "data": data}))
}

fn fail(code: i64, message: impl Into<String>) -> Json<Value> {
    Json(json!({"code": code, "message": message.into()}))
}

fn not_found(name: &str) -> Json<Value> {
    fail(
        CODE_COLLECTION_NOT_FOUND,
        format!("collection not found[collection={}]", name),
    )
}

/// Squared Euclidean distance
fn l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn parse_vector(value: &Value) -> Option<Vec<f32>> {
    value
        .as_array()?
        .iter()
        .map(|x| x.as_f64().map(|f| f as f32))
        .collect()
}

/// Supports `field == <json literal>` only
fn matches_filter(row: &Row, filter: &str) -> Option<bool> {
    let (field, literal) = filter.split_once("==")?;
    let expected: Value = serde_json::from_str(literal.trim()).ok()?;
    Some(row.fields.get(field.trim()) == Some(&expected))
}

async fn handle(
    State(state): State<Shared>,
    Path((group, action)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let endpoint = format!("{}/{}", group, action);
    let mut milvus = state.lock().unwrap();
    milvus.requests.push((endpoint.clone(), body.clone()));

    if milvus.unavailable {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "service unavailable"})),
        );
    }
    (StatusCode::OK, dispatch(&mut milvus, &endpoint, &body))
}

fn dispatch(milvus: &mut MockMilvus, endpoint: &str, body: &Value) -> Json<Value> {
    let name = body["collectionName"].as_str().unwrap_or_default().to_string();

    match endpoint {
        "collections/list" => ok(json!(milvus.collections.keys().collect::<Vec<_>>())),
        "collections/create" => create(milvus, &name, body),
        "collections/describe" => match milvus.collections.get(&name) {
            Some(c) => ok(describe(&name, c)),
            None => not_found(&name),
        },
        "collections/drop" => {
            milvus.collections.remove(&name);
            ok(json!({}))
        }
        "collections/load" => {
            let delay = milvus.load_delay;
            load(milvus, &name, delay)
        }
        "collections/get_load_state" => match milvus.collections.get(&name) {
            Some(c) => {
                let progress = if c.is_loaded() { 100 } else { 0 };
                ok(json!({"loadState": c.load_state(), "loadProgress": progress}))
            }
            None => not_found(&name),
        },
        "collections/flush" => match milvus.collections.get(&name) {
            Some(_) => ok(json!({})),
            None => not_found(&name),
        },
        "collections/get_stats" => match milvus.collections.get(&name) {
            Some(c) => ok(json!({"rowCount": c.rows.len()})),
            None => not_found(&name),
        },
        "indexes/create" => match milvus.collections.get_mut(&name) {
            Some(c) => {
                c.index = body["indexParams"].get(0).cloned();
                ok(json!({}))
            }
            None => not_found(&name),
        },
        "entities/insert" => insert(milvus, &name, body),
        "entities/search" => match milvus.collections.get(&name) {
            Some(c) => search(c, body),
            None => not_found(&name),
        },
        _ => fail(CODE_INVALID_PARAMETER, format!("unknown endpoint {}", endpoint)),
    }
}

/// Queue a load that completes after `delay`. Repeated requests keep the
/// original completion time.
fn load(milvus: &mut MockMilvus, name: &str, delay: Duration) -> Json<Value> {
    match milvus.collections.get_mut(name) {
        None => not_found(name),
        Some(c) if c.index.is_none() => fail(
            CODE_INDEX_NOT_FOUND,
            format!("index not found[collection={}]", name),
        ),
        Some(c) => {
            c.loaded_at.get_or_insert_with(|| Instant::now() + delay);
            ok(json!({}))
        }
    }
}

fn create(milvus: &mut MockMilvus, name: &str, body: &Value) -> Json<Value> {
    if milvus.collections.contains_key(name) {
        return ok(json!({}));
    }
    let dim = body["schema"]["fields"]
        .as_array()
        .and_then(|fields| {
            fields
                .iter()
                .find(|f| f["dataType"] == "FloatVector")
                .and_then(|f| f["elementTypeParams"]["dim"].as_str())
                .and_then(|d| d.parse::<usize>().ok())
        })
        .filter(|&d| d > 0);

    let Some(dim) = dim else {
        return fail(CODE_INVALID_PARAMETER, "invalid dimension");
    };
    milvus.collections.insert(
        name.to_string(),
        MockCollection {
            dim,
            description: body["description"].as_str().unwrap_or_default().to_string(),
            index: None,
            loaded_at: None,
            rows: Vec::new(),
        },
    );
    ok(json!({}))
}

fn describe(name: &str, c: &MockCollection) -> Value {
    let indexes: Vec<Value> = c
        .index
        .iter()
        .map(|i| {
            json!({
                "fieldName": "vector",
                "indexName": "vector",
                "metricType": i["metricType"],
            })
        })
        .collect();
    let load = c.load_state();
    json!({
        "collectionName": name,
        "description": c.description,
        "autoId": true,
        "enableDynamicField": true,
        "fields": [
            {"name": "id", "type": "Int64", "primaryKey": true, "autoId": true},
            {"name": "vector", "type": "FloatVector", "primaryKey": false,
             "params": [{"key": "dim", "value": c.dim.to_string()}]}
        ],
        "indexes": indexes,
        "load": load,
        "shardsNum": 1
    })
}

fn insert(milvus: &mut MockMilvus, name: &str, body: &Value) -> Json<Value> {
    let Some(collection) = milvus.collections.get(name) else {
        return not_found(name);
    };
    let dim = collection.dim;
    let rows = body["data"].as_array().cloned().unwrap_or_default();
    if rows.is_empty() {
        return fail(CODE_INVALID_PARAMETER, "no data to insert");
    }

    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        let Value::Object(mut fields) = row else {
            return fail(CODE_INVALID_PARAMETER, "row is not an object");
        };
        let vector = fields.remove("vector").as_ref().and_then(parse_vector);
        match vector {
            Some(v) if v.len() == dim => parsed.push((v, fields)),
            _ => return fail(CODE_INVALID_PARAMETER, "the dim of vector is not matched"),
        }
    }

    let mut ids = Vec::with_capacity(parsed.len());
    for (vector, fields) in parsed {
        let id = milvus.next_id;
        milvus.next_id += 1;
        ids.push(id);
        if let Some(c) = milvus.collections.get_mut(name) {
            c.rows.push(Row { id, vector, fields });
        }
    }

    // Large INT64 keys go back as strings, as Milvus does for clients that
    // may lose precision.
    let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    ok(json!({"insertCount": ids.len(), "insertIds": id_strings}))
}

fn search(c: &MockCollection, body: &Value) -> Json<Value> {
    if !c.is_loaded() {
        return fail(CODE_NOT_LOADED, "collection not loaded");
    }
    let Some(query) = body["data"].get(0).and_then(parse_vector) else {
        return fail(CODE_INVALID_PARAMETER, "missing query vector");
    };
    if query.len() != c.dim {
        return fail(CODE_INVALID_PARAMETER, "vector dimension mismatch");
    }
    let limit = body["limit"].as_u64().unwrap_or(10) as usize;
    let filter = body["filter"].as_str();
    let output_fields: Vec<String> = body["outputFields"]
        .as_array()
        .map(|a| a.iter().filter_map(|f| f.as_str().map(String::from)).collect())
        .unwrap_or_default();

    let mut scored = Vec::new();
    for row in &c.rows {
        if let Some(filter) = filter {
            match matches_filter(row, filter) {
                Some(true) => {}
                Some(false) => continue,
                None => return fail(CODE_INVALID_PARAMETER, "cannot parse expression"),
            }
        }
        scored.push((row, l2(&query, &row.vector)));
    }
    scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    scored.truncate(limit);

    let hits: Vec<Value> = scored
        .into_iter()
        .map(|(row, distance)| {
            let mut hit = Map::new();
            hit.insert("id".to_string(), json!(row.id));
            hit.insert("distance".to_string(), json!(distance));
            for field in &output_fields {
                if let Some(value) = row.fields.get(field) {
                    hit.insert(field.clone(), value.clone());
                }
            }
            Value::Object(hit)
        })
        .collect();
    ok(Value::Array(hits))
}
