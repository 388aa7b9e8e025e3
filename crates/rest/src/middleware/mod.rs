//! HTTP middleware for the plates REST API.
//!
//! - [`alerts`] - Failure alert headers on error responses

pub mod alerts;

pub use alerts::error_alert_middleware;
