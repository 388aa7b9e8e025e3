//! Dual-store coordination.
//!
//! The primary store is the single source of truth. The search index is a
//! mirror that may lag behind it when an index write fails.
//!
//! | Operation | Served by |
//! |-----------|-----------|
//! | save, delete | primary, then index |
//! | find_one, find_all, find_all_paged, count | primary |
//! | search | index |
//!
//! [`EntityService`] performs the writes for one entity type and reports
//! index failures to the shared [`SyncMonitor`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use plates_persistence::backends::{memory::MemoryIndex, sqlite::SqliteBackend};
//! use plates_persistence::composite::{EntityService, SyncMonitor};
//! use plates_persistence::domain::Plate;
//!
//! let store = SqliteBackend::open("plates.db")?;
//! store.init_schema()?;
//! let plates: EntityService<Plate> = EntityService::new(
//!     Arc::new(store),
//!     Arc::new(MemoryIndex::new()),
//!     Arc::new(SyncMonitor::default()),
//! );
//! let saved = plates.save(Plate::new().with_plate_title("Willow")).await?;
//! ```

pub mod health;
mod service;
pub mod sync;

pub use health::{BackendHealth, HealthReport, HealthStatus, MonitorConfig, SyncMonitor};
pub use service::EntityService;
pub use sync::{DivergenceRecord, SyncOperation};
