//! Common test utilities for REST API testing.
//!
//! This module provides test infrastructure including:
//!
//! - [`harness`] - REST API test harness
//! - [`flaky`] - A search index that fails on demand
//! - [`assertions`] - HTTP response assertions

#![allow(dead_code)]

pub mod assertions;
pub mod flaky;
pub mod harness;

pub use assertions::*;
pub use flaky::FlakyIndex;
pub use harness::RestTestHarness;
