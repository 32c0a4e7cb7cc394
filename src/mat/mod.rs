//! Core MAT-file reader module

pub mod array;
pub mod codec;
pub mod format;
pub mod reader;
pub mod types;
mod utils;

pub use array::Array;
pub use reader::{HdfBackend, MatFileReader, ReadOptions};
pub use types::error::{ErrorCategory, MatError, Result};
pub use types::file::{MatFile, Variable};
pub use types::models;
