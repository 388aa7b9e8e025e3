//! Elasticsearch client and configuration.

use std::collections::HashSet;
use std::fmt::Debug;
use std::time::Duration;

use elasticsearch::Elasticsearch;
use elasticsearch::auth::Credentials;
use elasticsearch::cert::CertificateValidation;
use elasticsearch::http::transport::{SingleNodeConnectionPool, TransportBuilder};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{EntityDescriptor, descriptors};
use crate::error::{BackendError, StorageError, StorageResult};

use super::schema;

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the Elasticsearch index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Elasticsearch node URLs (e.g., `["http://localhost:9200"]`).
    /// Currently uses the first node (single-node connection pool).
    pub nodes: Vec<String>,

    /// Index name prefix (default: `"plates"`).
    /// Indices are named: `{prefix}_{entity}`
    #[serde(default = "default_index_prefix")]
    pub index_prefix: String,

    /// Number of primary shards per index (default: 1).
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replica shards per index (default: 1).
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,

    /// Refresh interval (default: "1s").
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: String,

    /// Maximum result window size (default: 10000).
    #[serde(default = "default_max_result_window")]
    pub max_result_window: u64,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_index_prefix() -> String {
    "plates".to_string()
}

fn default_shards() -> u32 {
    1
}

fn default_replicas() -> u32 {
    1
}

fn default_refresh_interval() -> String {
    "1s".to_string()
}

fn default_max_result_window() -> u64 {
    10000
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            nodes: vec!["http://localhost:9200".to_string()],
            index_prefix: default_index_prefix(),
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
            refresh_interval: default_refresh_interval(),
            max_result_window: default_max_result_window(),
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

pub(crate) fn internal_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::Internal {
        backend_name: "elasticsearch".to_string(),
        message,
        source: None,
    })
}

/// Elasticsearch-backed [`SearchIndex`](crate::core::SearchIndex).
pub struct ElasticsearchIndex {
    client: Elasticsearch,
    config: ElasticsearchConfig,
    /// Indices known to exist, so writes skip the existence check.
    known_indices: RwLock<HashSet<String>>,
}

impl Debug for ElasticsearchIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchIndex")
            .field("config", &self.config)
            .field("known_indices", &self.known_indices.read().len())
            .finish_non_exhaustive()
    }
}

impl ElasticsearchIndex {
    /// Creates a new index client with the given configuration.
    ///
    /// No request is sent until the first operation.
    pub fn new(config: ElasticsearchConfig) -> StorageResult<Self> {
        let client = Self::build_client(&config)?;
        Ok(Self {
            client,
            config,
            known_indices: RwLock::new(HashSet::new()),
        })
    }

    /// Builds the Elasticsearch client from configuration.
    fn build_client(config: &ElasticsearchConfig) -> StorageResult<Elasticsearch> {
        let url = config
            .nodes
            .first()
            .cloned()
            .unwrap_or_else(|| "http://localhost:9200".to_string());

        let parsed_url: elasticsearch::http::Url = url.parse().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "elasticsearch".to_string(),
                message: format!("Invalid URL: {}", e),
            })
        })?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);

        let mut builder = TransportBuilder::new(conn_pool)
            .timeout(Duration::from_millis(config.request_timeout_ms));

        if config.disable_certificate_validation {
            builder = builder.cert_validation(CertificateValidation::None);
        }

        if let Some(ref auth) = config.auth {
            builder = match auth {
                ElasticsearchAuth::Basic { username, password } => {
                    builder.auth(Credentials::Basic(username.clone(), password.clone()))
                }
                ElasticsearchAuth::Bearer { token } => {
                    builder.auth(Credentials::Bearer(token.clone()))
                }
            };
        }

        let transport = builder.build().map_err(|e| {
            StorageError::Backend(BackendError::ConnectionFailed {
                backend_name: "elasticsearch".to_string(),
                message: format!("Failed to build transport: {}", e),
            })
        })?;

        Ok(Elasticsearch::new(transport))
    }

    /// Creates the index of every entity type. Idempotent.
    pub async fn initialize(&self) -> StorageResult<()> {
        for entity in descriptors() {
            self.ensure_index(entity).await?;
        }
        tracing::info!(
            prefix = %self.config.index_prefix,
            "Elasticsearch indices ready"
        );
        Ok(())
    }

    /// Returns the Elasticsearch client.
    pub(crate) fn client(&self) -> &Elasticsearch {
        &self.client
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// Returns the index name for an entity type.
    pub fn index_name(&self, entity: &EntityDescriptor) -> String {
        format!("{}_{}", self.config.index_prefix, entity.index)
    }

    /// Creates the entity's index unless it is already known to exist.
    pub(crate) async fn ensure_index(&self, entity: &EntityDescriptor) -> StorageResult<()> {
        let index = self.index_name(entity);
        if self.known_indices.read().contains(&index) {
            return Ok(());
        }
        schema::ensure_index(self, entity).await?;
        self.known_indices.write().insert(index);
        Ok(())
    }

    /// Forgets that an index exists, after it was deleted.
    pub(crate) fn forget_index(&self, entity: &EntityDescriptor) {
        self.known_indices.write().remove(&self.index_name(entity));
    }

    /// Checks cluster health. A red cluster counts as unavailable.
    pub(crate) async fn cluster_health(&self) -> StorageResult<()> {
        let response = self
            .client
            .cluster()
            .health(elasticsearch::cluster::ClusterHealthParts::None)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(BackendError::Unavailable {
                    backend_name: "elasticsearch".to_string(),
                    message: format!("Health check failed: {}", e),
                })
            })?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(StorageError::Backend(BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message: format!("Cluster health returned status {}", status),
            }));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| internal_error(format!("Failed to parse health response: {}", e)))?;

        let cluster_status = body
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or("unknown");

        if cluster_status == "red" {
            return Err(StorageError::Backend(BackendError::Unavailable {
                backend_name: "elasticsearch".to_string(),
                message: "Cluster status is red".to_string(),
            }));
        }

        Ok(())
    }
}
