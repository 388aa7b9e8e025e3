//! Plates Persistence Layer
//!
//! Storage for the plates service: a relational primary store that owns the
//! data and assigns ids, mirrored into a search index for free-text queries.
//!
//! # Features
//!
//! - **Dual write**: every save and delete goes to the primary store, then to
//!   the index. Index failures are logged and recorded, never returned.
//! - **Typed entities** with id-only equality and an arena for keeping
//!   bidirectional relationships consistent in memory.
//! - **Read-through cache** per entity type with TTL and size limits.
//! - **Reindex** to rebuild index collections from the primary store.
//!
//! # Backend Features
//!
//! - `sqlite` (default) - SQLite primary store, file-based or in-memory
//! - `elasticsearch` - Elasticsearch search index
//!
//! The in-memory search index is always available.
//!
//! # Architecture
//!
//! - [`domain`] - entity types, descriptors and the relationship arena
//! - [`types`] - pagination
//! - [`error`] - error types for all operations
//! - [`core`] - the [`PrimaryStore`] and [`SearchIndex`] traits
//! - [`backends`] - SQLite, Elasticsearch and in-memory implementations
//! - [`cache`] - the [`CachedStore`] wrapper
//! - [`composite`] - [`EntityService`] and the [`SyncMonitor`]
//! - [`search`] - the [`Reindexer`]
//!
//! # Quick Start
//!
//! ```
//! # #[cfg(feature = "sqlite")]
//! # async fn example() -> plates_persistence::StorageResult<()> {
//! use std::sync::Arc;
//!
//! use plates_persistence::backends::memory::MemoryIndex;
//! use plates_persistence::backends::sqlite::SqliteBackend;
//! use plates_persistence::domain::Plate;
//! use plates_persistence::{CacheConfig, CachedStore, EntityService, SyncMonitor};
//!
//! let sqlite = SqliteBackend::in_memory()?;
//! sqlite.init_schema()?;
//!
//! let plates: EntityService<Plate> = EntityService::new(
//!     Arc::new(CachedStore::new(sqlite, &CacheConfig::default())),
//!     Arc::new(MemoryIndex::new()),
//!     Arc::new(SyncMonitor::default()),
//! );
//!
//! let saved = plates.save(Plate::new().with_plate_title("Willow")).await?;
//! assert!(saved.id.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod cache;
pub mod composite;
pub mod core;
pub mod domain;
pub mod error;
pub mod search;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{StorageError, StorageResult};
pub use types::{Page, PageRequest, SortDirection, SortOrder};

// Re-export core traits
pub use core::{BackendKind, PrimaryStore, SearchIndex};

pub use cache::{CacheConfig, CachePolicy, CachedStore};
pub use composite::{EntityService, HealthReport, SyncMonitor};
pub use search::{ReindexReport, ReindexRequest, Reindexer};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
