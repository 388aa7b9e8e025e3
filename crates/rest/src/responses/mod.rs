//! Response formatting for the plates REST API.
//!
//! - [`headers`] - Alert and pagination header generation

pub mod headers;

pub use headers::{alert_headers, failure_headers, pagination_headers};
