//! Connection settings for a Milvus server

use crate::error::{MilvusError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 19530;
pub const DEFAULT_ALIAS: &str = "default";
pub const DEFAULT_DB_NAME: &str = "default";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Where and how to reach Milvus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    /// Name used to tell connections apart in logs
    pub alias: String,
    /// Bearer token; either an API key or `user:password`
    pub token: Option<String>,
    pub db_name: String,
    pub timeout_ms: u64,
    pub secure: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            alias: DEFAULT_ALIAS.to_string(),
            token: None,
            db_name: DEFAULT_DB_NAME.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            secure: false,
        }
    }
}

impl ConnectionConfig {
    pub fn new(host: impl Into<String>, port: u16, alias: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            alias: alias.into(),
            ..Default::default()
        }
    }

    /// Defaults overridden by `MILVUS_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("MILVUS_HOST") {
            config.host = host;
        }
        if let Some(port) = std::env::var("MILVUS_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            config.port = port;
        }
        if let Ok(alias) = std::env::var("MILVUS_ALIAS") {
            config.alias = alias;
        }
        if let Ok(token) = std::env::var("MILVUS_TOKEN") {
            config.token = Some(token);
        } else if let (Ok(user), Ok(password)) =
            (std::env::var("MILVUS_USER"), std::env::var("MILVUS_PASSWORD"))
        {
            config.token = Some(format!("{}:{}", user, password));
        }
        if let Ok(db_name) = std::env::var("MILVUS_DB_NAME") {
            config.db_name = db_name;
        }
        if let Some(timeout) = std::env::var("MILVUS_TIMEOUT_MS")
            .ok()
            .and_then(|t| t.parse().ok())
        {
            config.timeout_ms = timeout;
        }
        if let Ok(secure) = std::env::var("MILVUS_SECURE") {
            config.secure = matches!(secure.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_credentials(mut self, user: &str, password: &str) -> Self {
        self.token = Some(format!("{}:{}", user, password));
        self
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(MilvusError::InvalidConfig("host cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(MilvusError::InvalidConfig("port cannot be 0".to_string()));
        }
        if self.alias.trim().is_empty() {
            return Err(MilvusError::InvalidConfig("alias cannot be empty".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(MilvusError::InvalidConfig("timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Base URL of the REST API, e.g. `http://localhost:19530`
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
