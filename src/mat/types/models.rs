//! Core data structures for the Level 5 wire format.
//!
//! This module defines the fundamental types used throughout the decoder:
//! - Primitive data type codes carried by element tags
//! - Array classes and array flags carried by matrix elements
//! - The fixed 128-byte file header

use super::error::{MatError, Result};

/// Size of the fixed file header in bytes.
pub const HEADER_SIZE: usize = 128;

/// Endian indicator as read on a little-endian file ("IM" stored as `b"IM"`).
pub const LITTLE_ENDIAN_MARKER: u16 = 0x4D49;

/// Endian indicator bytes as they read when the writer was big-endian.
pub const BIG_ENDIAN_MARKER: u16 = 0x494D;

/// Header version of classic Level 5 files.
pub const VERSION_LEVEL5: u16 = 0x0100;

/// Header version of HDF5-based (v7.3) files.
pub const VERSION_HDF5: u16 = 0x0200;

/// Primitive data type codes found in element tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Int8 = 1,
    UInt8 = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Single = 7,
    Double = 9,
    Int64 = 12,
    UInt64 = 13,
    Matrix = 14,
    Compressed = 15,
    Utf8 = 16,
    Utf16 = 17,
    Utf32 = 18,
}

impl DataType {
    /// Returns the width in bytes of one value of this type.
    ///
    /// `Matrix` and `Compressed` are containers and report a width of 1,
    /// their tag length is a plain byte count.
    pub fn element_size(&self) -> usize {
        match self {
            DataType::Int8 | DataType::UInt8 | DataType::Utf8 => 1,
            DataType::Int16 | DataType::UInt16 | DataType::Utf16 => 2,
            DataType::Int32 | DataType::UInt32 | DataType::Single | DataType::Utf32 => 4,
            DataType::Double | DataType::Int64 | DataType::UInt64 => 8,
            DataType::Matrix | DataType::Compressed => 1,
        }
    }
}

impl TryFrom<u32> for DataType {
    type Error = MatError;
    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(Self::Int8),
            2 => Ok(Self::UInt8),
            3 => Ok(Self::Int16),
            4 => Ok(Self::UInt16),
            5 => Ok(Self::Int32),
            6 => Ok(Self::UInt32),
            7 => Ok(Self::Single),
            9 => Ok(Self::Double),
            12 => Ok(Self::Int64),
            13 => Ok(Self::UInt64),
            14 => Ok(Self::Matrix),
            15 => Ok(Self::Compressed),
            16 => Ok(Self::Utf8),
            17 => Ok(Self::Utf16),
            18 => Ok(Self::Utf32),
            _ => Err(MatError::Unsupported(format!(
                "unknown element data type {}",
                value
            ))),
        }
    }
}

/// A decoded element tag.
///
/// Compact (4-byte) tags are normalized to this same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub data_type: DataType,
    /// Payload length in bytes.
    pub length: usize,
}

/// Array classes found in the array flags of a matrix element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayClass {
    Cell = 1,
    Struct = 2,
    Object = 3,
    Char = 4,
    Sparse = 5,
    Double = 6,
    Single = 7,
    Int8 = 8,
    UInt8 = 9,
    Int16 = 10,
    UInt16 = 11,
    Int32 = 12,
    UInt32 = 13,
    Int64 = 14,
    UInt64 = 15,
    Function = 16,
    Opaque = 17,
}

impl TryFrom<u8> for ArrayClass {
    type Error = MatError;
    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::Cell),
            2 => Ok(Self::Struct),
            3 => Ok(Self::Object),
            4 => Ok(Self::Char),
            5 => Ok(Self::Sparse),
            6 => Ok(Self::Double),
            7 => Ok(Self::Single),
            8 => Ok(Self::Int8),
            9 => Ok(Self::UInt8),
            10 => Ok(Self::Int16),
            11 => Ok(Self::UInt16),
            12 => Ok(Self::Int32),
            13 => Ok(Self::UInt32),
            14 => Ok(Self::Int64),
            15 => Ok(Self::UInt64),
            16 => Ok(Self::Function),
            17 => Ok(Self::Opaque),
            _ => Err(MatError::Unsupported(format!("unknown array class {}", value))),
        }
    }
}

/// Per-matrix metadata word.
///
/// Layout of the first u32 of the array flags element:
/// - Bits 0-7: array class
/// - Bit 9 (0x0200): logical
/// - Bit 10 (0x0400): global
/// - Bit 11 (0x0800): complex
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayFlags {
    pub class: ArrayClass,
    pub is_complex: bool,
    pub is_global: bool,
    pub is_logical: bool,
}

impl ArrayFlags {
    const COMPLEX: u32 = 0x08;
    const GLOBAL: u32 = 0x04;
    const LOGICAL: u32 = 0x02;

    /// Parses the flags word of an array flags element.
    pub fn from_word(word: u32) -> Result<Self> {
        let class = ArrayClass::try_from((word & 0xFF) as u8)?;
        let variable = (word >> 8) & 0x0E;
        Ok(Self {
            class,
            is_complex: variable & Self::COMPLEX != 0,
            is_global: variable & Self::GLOBAL != 0,
            is_logical: variable & Self::LOGICAL != 0,
        })
    }
}

/// Parsed 128-byte file header.
#[derive(Debug, Clone)]
pub struct Header {
    /// The header exactly as read; the HDF5 path needs it to rebuild the file image.
    pub raw: Vec<u8>,
    /// Descriptive text (bytes 0..116), trailing padding removed.
    pub text: String,
    /// Absolute offset of the subsystem data element, 0 or all-spaces when absent.
    pub subsystem_offset: i64,
    pub version: u16,
}

impl Header {
    /// Returns the subsystem data offset if it can point into the file.
    pub fn subsystem_position(&self) -> Option<u64> {
        u64::try_from(self.subsystem_offset)
            .ok()
            .filter(|&offset| offset >= HEADER_SIZE as u64)
    }
}
