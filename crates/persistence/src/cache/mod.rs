//! Read-through entity cache.
//!
//! [`CachedStore`] wraps any [`PrimaryStore`](crate::core::PrimaryStore) with
//! one bounded, expiring cache per entity type.

mod config;
mod store;

pub use config::{CacheConfig, CachePolicy};
pub use store::CachedStore;
