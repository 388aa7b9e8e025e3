//! Storage backend implementations.
//!
//! | Backend | Feature | Role |
//! |---------|---------|------|
//! | SQLite | `sqlite` (default) | Primary store |
//! | Elasticsearch | `elasticsearch` | Search index |
//! | Memory | always available | Search index |
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "sqlite")]
//! use plates_persistence::backends::sqlite::SqliteBackend;
//!
//! # #[cfg(feature = "sqlite")]
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::open("./data/plates.db")?;
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "elasticsearch")]
pub mod elasticsearch;

pub mod memory;
