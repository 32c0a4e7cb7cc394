//! Tag and data element decoding.
//!
//! Every element starts with a tag. A normal tag is two u32 words (type,
//! byte length) followed by the payload. A compact tag packs the length into
//! the upper 16 bits of the first word and is followed by exactly 4 payload
//! bytes:
//! ```text
//! normal:  [type: u32][length: u32][payload ...][padding to 8]
//! compact: [length: u16][type: u16][payload: 4 bytes]
//! ```

use std::io::Cursor;

use log::trace;

use crate::mat::array::Array;
use crate::mat::codec::compression;
use crate::mat::codec::numeric::RawData;
use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::{ArrayFlags, DataType, Tag};
use crate::mat::utils;

use super::matrix;

const COMPACT_PAYLOAD_SIZE: usize = 4;

/// A `miMATRIX` element after decoding.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixElement {
    pub array: Array,
    /// `None` for the empty matrix, which has no flags element.
    pub flags: Option<ArrayFlags>,
    pub name: String,
}

/// One decoded data element.
#[derive(Debug, Clone, PartialEq)]
pub enum DataElement {
    Raw(RawData),
    Matrix(MatrixElement),
}

/// Reads a tag and borrows its payload.
pub fn read_tag<'a>(cursor: &mut Cursor<&'a [u8]>) -> Result<(Tag, &'a [u8])> {
    let word = utils::read_u32(cursor, "element tag")?;
    let (type_code, length, compact) = match word >> 16 {
        0 => (word, utils::read_u32(cursor, "element tag")? as usize, false),
        length => (word & 0xFFFF, length as usize, true),
    };
    let data_type = DataType::try_from(type_code)?;
    let payload = if compact {
        if length > COMPACT_PAYLOAD_SIZE {
            return Err(MatError::InvalidFormat(format!(
                "compact element declares {} bytes",
                length
            )));
        }
        &utils::take_bytes(cursor, COMPACT_PAYLOAD_SIZE, "compact element")?[..length]
    } else {
        utils::take_bytes(cursor, length, "element payload")?
    };
    trace!(
        "Tag: type={:?}, length={}, compact={}",
        data_type,
        length,
        compact
    );
    Ok((Tag { data_type, length }, payload))
}

/// Decodes data elements, recursing into matrices and compressed elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementReader {
    verify_checksums: bool,
}

impl ElementReader {
    pub fn new(verify_checksums: bool) -> Self {
        Self { verify_checksums }
    }

    /// Reads one element and skips the padding that follows it.
    ///
    /// A compressed element is inflated and the single element inside it is
    /// returned; padding inside the inflated stream is handled there.
    pub fn read(&self, cursor: &mut Cursor<&[u8]>) -> Result<DataElement> {
        let (tag, payload) = read_tag(cursor)?;
        let element = match tag.data_type {
            DataType::Compressed => {
                let inflated = compression::inflate_element(payload, self.verify_checksums)?;
                let mut inner = Cursor::new(inflated.as_slice());
                return self.read(&mut inner);
            }
            DataType::Matrix => DataElement::Matrix(matrix::read_matrix(self, payload)?),
            data_type => DataElement::Raw(RawData::from_le_bytes(data_type, payload)?),
        };
        utils::align8(cursor);
        Ok(element)
    }

    /// Reads an element that the format requires to be primitive.
    pub(crate) fn read_raw(
        &self,
        cursor: &mut Cursor<&[u8]>,
        context: &'static str,
    ) -> Result<RawData> {
        match self.read(cursor)? {
            DataElement::Raw(raw) => Ok(raw),
            DataElement::Matrix(_) => Err(MatError::InvalidFormat(format!(
                "expected a primitive element for {}, found a matrix",
                context
            ))),
        }
    }

    /// Reads an element that the format requires to be a matrix.
    pub(crate) fn read_array(
        &self,
        cursor: &mut Cursor<&[u8]>,
        context: &'static str,
    ) -> Result<Array> {
        match self.read(cursor)? {
            DataElement::Matrix(matrix) => Ok(matrix.array),
            DataElement::Raw(_) => Err(MatError::InvalidFormat(format!(
                "expected a matrix for {}, found a primitive element",
                context
            ))),
        }
    }
}
