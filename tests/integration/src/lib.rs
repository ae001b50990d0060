//! Integration test utilities for the presence client
//!
//! This crate provides a recording transport and a fully wired client
//! (in-memory store, cache, and idle queue) for end-to-end tests.


pub use helpers::*;
pub use fixtures::*;
