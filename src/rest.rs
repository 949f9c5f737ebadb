//! Thin JSON transport over the Milvus RESTful API v2.
//!
//! Every call is a `POST {base}/v2/vectordb/{endpoint}` whose response is an
//! envelope `{"code": 0, "data": ...}`; a non-zero code carries a `message`.

use crate::config::ConnectionConfig;
use crate::error::{MilvusError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

const API_PREFIX: &str = "/v2/vectordb";

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        // v2 reports success as 0; some gateways still answer with 200.
        if self.code != 0 && self.code != 200 {
            return Err(MilvusError::Server {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        Ok(serde_json::from_value(self.data)?)
    }
}

/// HTTP session bound to one Milvus server and database
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: Client,
    base_url: String,
    db_name: String,
}

impl RestTransport {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("accept-type-allow-int64", HeaderValue::from_static("true"));
        if let Some(ref token) = config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
                MilvusError::InvalidConfig("token contains invalid header characters".to_string())
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            db_name: config.db_name.clone(),
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}/{}", self.base_url, API_PREFIX, endpoint)
    }

    /// POST `body` to `endpoint` and decode the envelope's `data` as `T`.
    /// `dbName` is added to object bodies that do not set it.
    pub async fn post<T: DeserializeOwned>(&self, endpoint: &str, mut body: Value) -> Result<T> {
        if let Value::Object(ref mut map) = body {
            map.entry("dbName")
                .or_insert_with(|| Value::String(self.db_name.clone()));
        }

        let url = self.endpoint_url(endpoint);
        debug!(url = %url, "POST");

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MilvusError::Http {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let envelope: Envelope = response.json().await?;
        envelope.into_data()
    }
}
