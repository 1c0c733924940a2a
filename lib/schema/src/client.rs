//! Search-engine client seam.
//!
//! The schema only needs two engine calls: the index mapping and an
//! aggregation search. Both are blocking; callers inside an async runtime
//! must run them on a blocking pool. No call is retried.

use crate::registry::validate_index_name;
use elastic_dql_core::{ConfigError, Result, SchemaError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub trait SearchClient: Send + Sync {
    /// Raw `GET /{index}/_mapping` response
    fn get_mapping(&self, index: &str) -> Result<Value>;

    /// Run `query` with `aggregations` against `index`, returning the raw response
    fn search(&self, index: &str, query: &Value, aggregations: &Value) -> Result<Value>;
}

/// Builds one fresh client per schema
pub trait ClientFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn SearchClient>>;
}

/// Engine connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URLs, used round-robin
    #[serde(default = "default_hosts")]
    pub hosts: Vec<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Sent as `Authorization: ApiKey <key>`; takes precedence over basic auth
    #[serde(default)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_hosts() -> Vec<String> {
    vec!["http://localhost:9200".to_string()]
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hosts: default_hosts(),
            username: None,
            password: None,
            api_key: None,
            timeout_secs: None,
        }
    }
}

/// Blocking HTTP client for the engine's REST API
pub struct HttpSearchClient {
    http: reqwest::blocking::Client,
    hosts: Vec<String>,
    next_host: AtomicUsize,
    username: Option<String>,
    password: Option<String>,
    api_key: Option<String>,
}

impl HttpSearchClient {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        if config.hosts.is_empty() {
            return Err(ConfigError::Invalid("connection.hosts must not be empty".to_string()).into());
        }

        let mut builder = reqwest::blocking::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            hosts: config
                .hosts
                .iter()
                .map(|h| h.trim_end_matches('/').to_string())
                .collect(),
            next_host: AtomicUsize::new(0),
            username: config.username.clone(),
            password: config.password.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        let i = self.next_host.fetch_add(1, Ordering::Relaxed) % self.hosts.len();
        format!("{}/{}", self.hosts[i], path)
    }

    fn authorize(&self, request: reqwest::blocking::RequestBuilder) -> reqwest::blocking::RequestBuilder {
        if let Some(key) = &self.api_key {
            request.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", key))
        } else if let Some(user) = &self.username {
            request.basic_auth(user, self.password.as_ref())
        } else {
            request
        }
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> std::result::Result<Value, reqwest::Error> {
        self.authorize(request).send()?.error_for_status()?.json::<Value>()
    }
}

impl SearchClient for HttpSearchClient {
    fn get_mapping(&self, index: &str) -> Result<Value> {
        validate_index_name(index)?;
        let request = self.http.get(self.url(&format!("{}/_mapping", index)));
        self.send(request)
            .map_err(|e| SchemaError::MappingFetch(e.to_string()).into())
    }

    fn search(&self, index: &str, query: &Value, aggregations: &Value) -> Result<Value> {
        let body = json!({
            "size": 0,
            "query": query,
            "aggs": aggregations,
        });
        validate_index_name(index)?;
        let request = self.http.post(self.url(&format!("{}/_search", index))).json(&body);
        self.send(request)
            .map_err(|e| SchemaError::Search(e.to_string()).into())
    }
}

/// Creates [`HttpSearchClient`]s from connection settings
#[derive(Debug, Clone, Default)]
pub struct HttpClientFactory {
    config: ConnectionConfig,
}

impl HttpClientFactory {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self) -> Result<Arc<dyn SearchClient>> {
        Ok(Arc::new(HttpSearchClient::new(&self.config)?))
    }
}

/// Client serving canned mappings and search responses from memory.
///
/// Used for offline compilation against a known mapping and in tests; it
/// records how often each call was made.
#[derive(Default)]
pub struct InMemoryClient {
    mappings: HashMap<String, Value>,
    search_response: Value,
    mapping_fetches: AtomicUsize,
    searches: Mutex<Vec<(String, Value, Value)>>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the `mappings` body of `index`
    pub fn with_mapping(mut self, index: impl Into<String>, mappings: Value) -> Self {
        self.mappings.insert(index.into(), mappings);
        self
    }

    pub fn with_search_response(mut self, response: Value) -> Self {
        self.search_response = response;
        self
    }

    pub fn mapping_fetches(&self) -> usize {
        self.mapping_fetches.load(Ordering::SeqCst)
    }

    /// `(index, query, aggregations)` of every search made so far
    pub fn searches(&self) -> Vec<(String, Value, Value)> {
        self.searches.lock().clone()
    }
}

impl SearchClient for InMemoryClient {
    fn get_mapping(&self, index: &str) -> Result<Value> {
        self.mapping_fetches.fetch_add(1, Ordering::SeqCst);
        self.mappings
            .get(index)
            .map(|mappings| json!({ index: { "mappings": mappings } }))
            .ok_or_else(|| SchemaError::MappingFetch(format!("no such index [{}]", index)).into())
    }

    fn search(&self, index: &str, query: &Value, aggregations: &Value) -> Result<Value> {
        self.searches
            .lock()
            .push((index.to_string(), query.clone(), aggregations.clone()));
        Ok(self.search_response.clone())
    }
}

/// Hands out the same shared client for every schema
pub struct SharedClientFactory {
    client: Arc<dyn SearchClient>,
}

impl SharedClientFactory {
    pub fn new(client: Arc<dyn SearchClient>) -> Self {
        Self { client }
    }
}

impl ClientFactory for SharedClientFactory {
    fn create(&self) -> Result<Arc<dyn SearchClient>> {
        Ok(self.client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_defaults() {
        let config: ConnectionConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.hosts, vec!["http://localhost:9200"]);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_http_client_requires_hosts() {
        let config = ConnectionConfig {
            hosts: Vec::new(),
            ..ConnectionConfig::default()
        };
        assert!(HttpSearchClient::new(&config).is_err());
    }

    #[test]
    fn test_http_client_round_robin_urls() {
        let config = ConnectionConfig {
            hosts: vec!["http://a:9200/".to_string(), "http://b:9200".to_string()],
            ..ConnectionConfig::default()
        };
        let client = HttpSearchClient::new(&config).unwrap();
        assert_eq!(client.url("idx/_mapping"), "http://a:9200/idx/_mapping");
        assert_eq!(client.url("idx/_mapping"), "http://b:9200/idx/_mapping");
        assert_eq!(client.url("idx/_mapping"), "http://a:9200/idx/_mapping");
    }

    #[test]
    fn test_http_client_refuses_path_and_pattern_names() {
        let client = HttpSearchClient::new(&ConnectionConfig::default()).unwrap();
        for index in ["x/../secret", "secre*", "a,b"] {
            assert!(matches!(
                client.get_mapping(index),
                Err(elastic_dql_core::Error::Schema(SchemaError::InvalidIndexName(_)))
            ));
            assert!(matches!(
                client.search(index, &json!({}), &json!({})),
                Err(elastic_dql_core::Error::Schema(SchemaError::InvalidIndexName(_)))
            ));
        }
    }

    #[test]
    fn test_in_memory_client_wraps_mapping_response() {
        let client = InMemoryClient::new().with_mapping("books", json!({"properties": {}}));
        let response = client.get_mapping("books").unwrap();
        assert_eq!(response, json!({"books": {"mappings": {"properties": {}}}}));
        assert_eq!(client.mapping_fetches(), 1);
        assert!(client.get_mapping("other").is_err());
    }
}
