//! Custom error types for the matfile-handler crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum MatError {
    /// An error originating from I/O operations on the source stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended in the middle of an element.
    #[error("Unexpected end of data while reading {context}")]
    UnexpectedEof { context: &'static str },

    /// The file is structurally invalid (bad sizes, wrong element types, corrupt tables).
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The header carries the big-endian marker.
    #[error("Big-endian files are not supported")]
    BigEndian,

    /// The header endian indicator is neither the little- nor the big-endian marker.
    #[error("Invalid endian indicator in header: {0:#06x}")]
    InvalidEndianMarker(u16),

    /// The header version is neither Level 5 (0x0100) nor HDF5 (0x0200).
    #[error("Unsupported MAT-file version: {0:#06x}")]
    UnsupportedVersion(u16),

    /// A corner of the format that is intentionally not implemented.
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// DEFLATE decoding of a compressed element failed.
    #[error("Decompression failed: {0}")]
    DecompressionError(String),

    /// The trailing Adler-32 of a compressed element does not match its contents.
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// An index component is outside the array bounds.
    #[error("Index {index} is out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The number of subscripts does not fit the array rank.
    #[error("Shape mismatch: expected {expected} subscripts, got {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// A typed accessor was used on an array of a different element type.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A struct or object field that does not exist was requested.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Subsystem data does not contain a class, object or field the file refers to.
    #[error("Subsystem data has no {kind} with index {index}")]
    SubsystemIndex { kind: &'static str, index: usize },
}

/// Coarse classification of [`MatError`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The underlying stream failed.
    Io,
    /// The container is corrupt or truncated.
    Malformed,
    /// The container uses a feature this crate does not implement.
    Unsupported,
    /// The caller passed an index, name or type that does not fit the array.
    Argument,
}

impl MatError {
    /// Returns which part of the error taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MatError::Io(_) => ErrorCategory::Io,
            MatError::UnexpectedEof { .. }
            | MatError::InvalidFormat(_)
            | MatError::BigEndian
            | MatError::InvalidEndianMarker(_)
            | MatError::DecompressionError(_)
            | MatError::ChecksumMismatch { .. }
            | MatError::SubsystemIndex { .. } => ErrorCategory::Malformed,
            MatError::UnsupportedVersion(_) | MatError::Unsupported(_) => {
                ErrorCategory::Unsupported
            }
            MatError::IndexOutOfRange { .. }
            | MatError::ShapeMismatch { .. }
            | MatError::TypeMismatch { .. }
            | MatError::FieldNotFound(_) => ErrorCategory::Argument,
        }
    }
}

/// A convenience `Result` type alias using the crate's `MatError` type.
pub type Result<T> = std::result::Result<T, MatError>;
