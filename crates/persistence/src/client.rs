//! HTTP client for the hosted store's REST query API
//!
//! Tables are exposed PostgREST-style: `GET {base}/{table}?select=*&col=eq.value`
//! with the service key sent both as `apikey` and as a bearer token.

use crate::error::PersistenceError;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// REST store configuration
#[derive(Debug, Clone)]
pub struct RestConfig {
    /// Base URL, e.g. `https://db.example.com/rest/v1`
    pub base_url: String,
    pub service_key: Option<String>,
    pub timeout: Duration,
}

impl RestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        self.service_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Equality filter on one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &'static str, value: impl ToString) -> Self {
        Self {
            column,
            value: value.to_string(),
        }
    }

    fn query_pair(&self) -> (String, String) {
        (self.column.to_string(), format!("eq.{}", self.value))
    }
}

/// Shared REST client
#[derive(Clone)]
pub struct RestClient {
    http: Client,
    config: Arc<RestConfig>,
}

impl RestClient {
    pub fn new(config: RestConfig) -> Result<Self, PersistenceError> {
        if config.base_url.is_empty() {
            return Err(PersistenceError::Configuration(
                "store base URL is empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PersistenceError::Configuration(e.to_string()))?;

        tracing::info!(base_url = %config.base_url, "REST store client created");

        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Select all rows of `table` matching every filter
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[Filter],
    ) -> Result<Vec<T>, PersistenceError> {
        let url = format!("{}/{}", self.config.base_url, table);

        let mut query: Vec<(String, String)> = vec![("select".to_string(), "*".to_string())];
        query.extend(filters.iter().map(Filter::query_pair));

        let mut request = self
            .http
            .get(&url)
            .query(&query)
            .header("Accept", "application/json");

        if let Some(key) = &self.config.service_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let started = std::time::Instant::now();
        let response = request.send().await?;
        let status = response.status();

        tracing::debug!(
            table = %table,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Store select"
        );

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(table = %table, status = status.as_u16(), "Store select failed");
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let rows = serde_json::from_slice(&bytes)
            .map_err(|e| PersistenceError::InvalidData(format!("{table}: {e}")))?;
        Ok(rows)
    }

    /// Reachability probe; any non-5xx answer counts as up
    pub async fn ping(&self) -> Result<(), PersistenceError> {
        let mut request = self.http.get(format!("{}/", self.config.base_url));
        if let Some(key) = &self.config.service_key {
            request = request.header("apikey", key).bearer_auth(key);
        }
        let status = request.send().await?.status();
        if status.is_server_error() {
            return Err(PersistenceError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }
        Ok(())
    }
}
