//! Test infrastructure for the persistence layer.
//!
//! Provides backend constructors, entity fixtures and a spy search index
//! that records writes and can be told to fail.

#![allow(dead_code)]

pub mod fixtures;
pub mod spy;

pub use fixtures::*;
pub use spy::*;
