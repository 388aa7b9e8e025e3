//! Core storage traits and abstractions.
//!
//! Two gateways sit beneath the entity service:
//!
//! - [`PrimaryStore`] - the authoritative relational store, which assigns ids
//! - [`SearchIndex`] - a secondary, text-searchable mirror keyed by the same ids
//!
//! Both traits are object safe and exchange entities as JSON documents
//! together with the entity's static [`EntityDescriptor`]. The typed layer in
//! [`crate::composite`] converts between documents and concrete entity types.
//!
//! ```text
//! EntityService<E>
//!     ├── PrimaryStore   (SqliteBackend, optionally wrapped in CachedStore)
//!     └── SearchIndex    (ElasticsearchIndex | MemoryIndex)
//! ```
//!
//! [`EntityDescriptor`]: crate::domain::EntityDescriptor

mod backend;
mod index;
mod store;

pub use backend::BackendKind;
pub use index::SearchIndex;
pub use store::PrimaryStore;
