//! Plates server
//!
//! Serves the plates REST API over a SQLite primary store mirrored into a
//! search index.

use std::sync::Arc;

use clap::Parser;
use plates_persistence::backends::memory::MemoryIndex;
use plates_persistence::{PrimaryStore, SearchIndex};
use plates_rest::{SearchBackend, ServerConfig, create_app_with_config, init_logging};
use tracing::info;

#[cfg(feature = "sqlite")]
use plates_persistence::{CachedStore, backends::sqlite::SqliteBackend};

/// Creates and initializes the SQLite primary store, wrapped in the
/// read-through cache.
#[cfg(feature = "sqlite")]
fn create_primary_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn PrimaryStore>> {
    info!(database = %config.database_path, "Initializing SQLite backend");

    let backend = if config.is_memory_database() {
        SqliteBackend::in_memory()?
    } else {
        SqliteBackend::open(&config.database_path)?
    };
    backend.init_schema()?;

    info!(
        ttl = ?config.cache_ttl,
        max_entries = config.cache_max_entries,
        "Enabling entity cache"
    );

    Ok(Arc::new(CachedStore::new(backend, &config.cache_config())))
}

/// Fallback when sqlite feature is not enabled.
#[cfg(not(feature = "sqlite"))]
fn create_primary_store(_config: &ServerConfig) -> anyhow::Result<Arc<dyn PrimaryStore>> {
    anyhow::bail!(
        "The primary store requires the 'sqlite' feature. \
         Build with: cargo build -p plates-server --features sqlite"
    )
}

/// Creates the configured search index.
async fn create_search_index(config: &ServerConfig) -> anyhow::Result<Arc<dyn SearchIndex>> {
    match config.search_backend {
        SearchBackend::Memory => {
            info!("Using in-memory search index");
            Ok(Arc::new(MemoryIndex::new()))
        }
        SearchBackend::Elasticsearch => create_elasticsearch_index(config).await,
    }
}

/// Creates the Elasticsearch index and its per-entity indices.
#[cfg(feature = "elasticsearch")]
async fn create_elasticsearch_index(
    config: &ServerConfig,
) -> anyhow::Result<Arc<dyn SearchIndex>> {
    use plates_persistence::backends::elasticsearch::{
        ElasticsearchAuth, ElasticsearchConfig, ElasticsearchIndex,
    };

    let es_nodes = config.elasticsearch_node_list();

    let es_auth = match (
        &config.elasticsearch_username,
        &config.elasticsearch_password,
    ) {
        (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    let es_config = ElasticsearchConfig {
        nodes: es_nodes.clone(),
        index_prefix: config.elasticsearch_index_prefix.clone(),
        auth: es_auth,
        ..Default::default()
    };

    info!(
        nodes = ?es_nodes,
        index_prefix = %config.elasticsearch_index_prefix,
        "Initializing Elasticsearch backend"
    );

    let index = ElasticsearchIndex::new(es_config)?;
    index.initialize().await?;

    Ok(Arc::new(index))
}

/// Fallback when elasticsearch feature is not enabled.
#[cfg(not(feature = "elasticsearch"))]
async fn create_elasticsearch_index(
    _config: &ServerConfig,
) -> anyhow::Result<Arc<dyn SearchIndex>> {
    anyhow::bail!(
        "The elasticsearch search backend requires the 'elasticsearch' feature. \
         Build with: cargo build -p plates-server --features elasticsearch"
    )
}

/// Starts the Axum HTTP server.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        search_backend = %config.search_backend,
        "Starting plates server"
    );

    let store = create_primary_store(&config)?;
    let index = create_search_index(&config).await?;

    let app = create_app_with_config(store, index, config.clone());
    serve(app, &config).await
}
