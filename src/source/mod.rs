//! Page sources
//!
//! This module provides:
//! - The `PageSource` trait the collector drives
//! - The HTTP relay implementation used by the binary
//! - A scripted in-memory source for tests
//!
//! The collector must interact with sources exclusively through
//! the `PageSource` trait.

pub mod adapter;
pub mod relay;

#[cfg(test)]
pub mod scripted;
