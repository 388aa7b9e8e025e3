//! Route configuration for the plates REST API.
//!
//! This module contains the routing configuration that maps HTTP paths
//! to handlers.

pub mod plates_routes;

pub use plates_routes::create_routes;
