//! Server configuration for the plates REST API.
//!
//! This module provides configuration types for the REST server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `REST_SERVER_PORT` | 8080 | Server port |
//! | `REST_SERVER_HOST` | 127.0.0.1 | Host to bind |
//! | `REST_LOG_LEVEL` | info | Log level |
//! | `REST_MAX_BODY_SIZE` | 10485760 | Max request body (bytes) |
//! | `REST_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `REST_ENABLE_CORS` | true | Enable CORS |
//! | `REST_CORS_ORIGINS` | * | Allowed origins |
//! | `REST_CORS_METHODS` | GET,POST,PUT,DELETE,OPTIONS | Allowed methods |
//! | `REST_CORS_HEADERS` | Content-Type,Authorization,Accept | Allowed headers |
//! | `REST_BASE_URL` | http://localhost:8080 | Server base URL |
//! | `REST_APP_NAME` | platesApp | Prefix of alert headers and keys |
//! | `REST_DATABASE_PATH` | plates.db | SQLite file, or `:memory:` |
//! | `REST_DEFAULT_PAGE_SIZE` | 20 | Page size when `size` is absent |
//! | `REST_MAX_PAGE_SIZE` | 2000 | Upper bound for `size` |
//! | `REST_SEARCH_BACKEND` | memory | `memory` or `elasticsearch` |
//! | `REST_ELASTICSEARCH_NODES` | http://localhost:9200 | Comma-separated node URLs |
//! | `REST_ELASTICSEARCH_INDEX_PREFIX` | plates | Index name prefix |
//! | `REST_CACHE_TTL` | 1h | Entity cache time-to-live |
//! | `REST_CACHE_MAX_ENTRIES` | 100 | Entity cache capacity per type |
//!
//! # Example
//!
//! ```rust
//! use plates_rest::ServerConfig;
//!
//! // Create from environment
//! let config = ServerConfig::from_env();
//!
//! // Or create programmatically
//! let config = ServerConfig {
//!     port: 3000,
//!     host: "0.0.0.0".to_string(),
//!     enable_cors: true,
//!     ..Default::default()
//! };
//! ```

use std::fmt;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use plates_persistence::CacheConfig;

/// Which implementation backs the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SearchBackend {
    /// In-process index, lost on restart.
    #[default]
    Memory,
    /// Elasticsearch cluster (requires the `elasticsearch` feature).
    Elasticsearch,
}

impl fmt::Display for SearchBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchBackend::Memory => write!(f, "memory"),
            SearchBackend::Elasticsearch => write!(f, "elasticsearch"),
        }
    }
}

/// Server configuration for the plates REST API.
///
/// This struct can be constructed from environment variables using [`ServerConfig::from_env`],
/// from command line arguments using [`ServerConfig::parse`], or programmatically.
#[derive(Debug, Clone, Parser)]
#[command(name = "plates")]
#[command(about = "Plates CRUD server")]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "REST_SERVER_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "REST_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "REST_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "REST_MAX_BODY_SIZE", default_value = "10485760")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "REST_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "REST_ENABLE_CORS", default_value = "true")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "REST_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(
        long,
        env = "REST_CORS_METHODS",
        default_value = "GET,POST,PUT,DELETE,OPTIONS"
    )]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "REST_CORS_HEADERS",
        default_value = "Content-Type,Authorization,Accept"
    )]
    pub cors_headers: String,

    /// Enable request ID tracking.
    #[arg(long, env = "REST_ENABLE_REQUEST_ID", default_value = "true")]
    pub enable_request_id: bool,

    /// Base URL for the server (used in Link headers).
    #[arg(long, env = "REST_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Application name used in alert header names and message keys.
    #[arg(long, env = "REST_APP_NAME", default_value = "platesApp")]
    pub app_name: String,

    /// SQLite database file, or `:memory:`.
    #[arg(long, env = "REST_DATABASE_PATH", default_value = "plates.db")]
    pub database_path: String,

    /// Default page size for lists and searches.
    #[arg(long, env = "REST_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: u64,

    /// Maximum page size for lists and searches.
    #[arg(long, env = "REST_MAX_PAGE_SIZE", default_value = "2000")]
    pub max_page_size: u64,

    /// Search index implementation.
    #[arg(long, env = "REST_SEARCH_BACKEND", value_enum, default_value_t = SearchBackend::Memory)]
    pub search_backend: SearchBackend,

    /// Elasticsearch node URLs (comma-separated).
    #[arg(
        long,
        env = "REST_ELASTICSEARCH_NODES",
        default_value = "http://localhost:9200"
    )]
    pub elasticsearch_nodes: String,

    /// Elasticsearch index name prefix.
    #[arg(long, env = "REST_ELASTICSEARCH_INDEX_PREFIX", default_value = "plates")]
    pub elasticsearch_index_prefix: String,

    /// Elasticsearch username for basic auth.
    #[arg(long, env = "REST_ELASTICSEARCH_USERNAME")]
    pub elasticsearch_username: Option<String>,

    /// Elasticsearch password for basic auth.
    #[arg(long, env = "REST_ELASTICSEARCH_PASSWORD")]
    pub elasticsearch_password: Option<String>,

    /// Time-to-live of cached entities (e.g. `30s`, `1h`).
    #[arg(long, env = "REST_CACHE_TTL", default_value = "1h", value_parser = humantime::parse_duration)]
    pub cache_ttl: Duration,

    /// Maximum cached entities per entity type.
    #[arg(long, env = "REST_CACHE_MAX_ENTRIES", default_value = "100")]
    pub cache_max_entries: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 10 * 1024 * 1024, // 10MB
            request_timeout: 30,
            enable_cors: true,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,PUT,DELETE,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization,Accept".to_string(),
            enable_request_id: true,
            base_url: "http://localhost:8080".to_string(),
            app_name: "platesApp".to_string(),
            database_path: "plates.db".to_string(),
            default_page_size: 20,
            max_page_size: 2000,
            search_backend: SearchBackend::Memory,
            elasticsearch_nodes: "http://localhost:9200".to_string(),
            elasticsearch_index_prefix: "plates".to_string(),
            elasticsearch_username: None,
            elasticsearch_password: None,
            cache_ttl: Duration::from_secs(3600),
            cache_max_entries: 100,
        }
    }
}

impl ServerConfig {
    /// Creates a new ServerConfig from environment variables.
    ///
    /// This is a convenience method that parses environment variables without
    /// requiring command line arguments.
    pub fn from_env() -> Self {
        // Try to parse from environment, falling back to defaults
        Self::try_parse().unwrap_or_default()
    }

    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns true if the database lives in memory only.
    pub fn is_memory_database(&self) -> bool {
        self.database_path == ":memory:"
    }

    /// Returns the configured Elasticsearch nodes.
    pub fn elasticsearch_node_list(&self) -> Vec<String> {
        self.elasticsearch_nodes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the entity cache configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(self.cache_ttl, self.cache_max_entries)
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.default_page_size > self.max_page_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if self.app_name.trim().is_empty()
            || !self
                .app_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.push("App name must be a non-empty header token".to_string());
        }

        if self.database_path.trim().is_empty() {
            errors.push("Database path cannot be empty".to_string());
        }

        if url::Url::parse(&self.base_url).is_err() {
            errors.push(format!("Base URL is not a valid URL: {}", self.base_url));
        }

        if self.search_backend == SearchBackend::Elasticsearch
            && self.elasticsearch_node_list().is_empty()
        {
            errors.push("Elasticsearch backend requires at least one node".to_string());
        }

        if self.elasticsearch_username.is_some() != self.elasticsearch_password.is_some() {
            errors.push("Elasticsearch username and password must be set together".to_string());
        }

        if self.cache_ttl.is_zero() {
            errors.push("Cache TTL cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0, an in-memory database, and disables
    /// features that might interfere with tests.
    pub fn for_testing() -> Self {
        Self {
            port: 0, // Let OS assign port
            host: "127.0.0.1".to_string(),
            log_level: "debug".to_string(),
            max_body_size: 10 * 1024 * 1024,
            request_timeout: 5, // Shorter timeout for tests
            enable_cors: false,
            cors_origins: "*".to_string(),
            cors_methods: "*".to_string(),
            cors_headers: "*".to_string(),
            enable_request_id: false,
            base_url: "http://localhost".to_string(),
            app_name: "platesApp".to_string(),
            database_path: ":memory:".to_string(),
            default_page_size: 20,
            max_page_size: 100,
            search_backend: SearchBackend::Memory,
            elasticsearch_nodes: "http://localhost:9200".to_string(),
            elasticsearch_index_prefix: "plates_test".to_string(),
            elasticsearch_username: None,
            elasticsearch_password: None,
            cache_ttl: Duration::from_secs(60),
            cache_max_entries: 100,
        }
    }
}
