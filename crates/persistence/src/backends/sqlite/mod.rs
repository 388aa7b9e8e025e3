//! SQLite primary store.
//!
//! Every entity type maps to one table with an `INTEGER PRIMARY KEY
//! AUTOINCREMENT` id, one column per scalar field and one `<field>_id`
//! column per reference. Many-to-many collections live in join tables named
//! `<owner>_<target>`.
//!
//! Supports both in-memory databases (for tests) and file-based databases.
//!
//! # Example
//!
//! ```no_run
//! use plates_persistence::backends::sqlite::SqliteBackend;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = SqliteBackend::in_memory()?;
//! backend.init_schema()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE plate (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     plate_title TEXT,
//!     person_id INTEGER REFERENCES person (id) ON DELETE SET NULL
//! );
//!
//! CREATE TABLE plate_note (
//!     plate_id INTEGER NOT NULL REFERENCES plate (id) ON DELETE CASCADE,
//!     note_id INTEGER NOT NULL REFERENCES note (id) ON DELETE CASCADE,
//!     PRIMARY KEY (plate_id, note_id)
//! );
//! ```

mod backend;
mod schema;
mod storage;

pub use backend::{SqliteBackend, SqliteBackendConfig};
pub use schema::SCHEMA_VERSION;
