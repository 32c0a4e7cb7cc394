//! # matfile-handler
//!
//! A reader for MATLAB `.mat` files.
//! Decodes Level 5 files, including compressed elements, sparse arrays and
//! objects stored through subsystem data. HDF5-based (v7.3) files are handed
//! to a pluggable [`HdfBackend`].
pub mod mat;

// Re-export the main types for convenience
pub use mat::{
    array::{
        CellArray, CharArray, CharData, Element, MatObject, NumericArray, NumericData,
        ObjectInstance, ObjectPayload, SparseArray, SparseMatrix, StructArray, StructElement,
    },
    Array, ErrorCategory, HdfBackend, MatError, MatFile, MatFileReader, ReadOptions, Result,
    Variable,
};
