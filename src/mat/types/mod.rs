//! Foundational data structures, error types, and file-level results.

pub mod error;
pub mod file;
pub mod models;
