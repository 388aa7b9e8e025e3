//! HTTP request handlers.
//!
//! - [`entity`] - Create, update, list, read, delete and search, generic
//!   over the entity type
//! - [`management`] - Health and reindex endpoints

pub mod entity;
pub mod management;

// Re-export handlers for convenience
pub use entity::{
    create_handler, delete_handler, list_handler, read_handler, search_handler, update_handler,
};
pub use management::{health_handler, reindex_handler};
