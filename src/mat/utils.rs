//! Low-level byte reading and indexing utilities

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use encoding_rs::UTF_8;

use super::types::error::{MatError, Result};

/// Maps an I/O failure on an in-memory cursor to the crate error.
///
/// Running out of bytes inside an element is a truncated file, not an I/O fault.
fn eof_as(context: &'static str) -> impl Fn(io::Error) -> MatError {
    move |e| match e.kind() {
        io::ErrorKind::UnexpectedEof => MatError::UnexpectedEof { context },
        _ => MatError::Io(e),
    }
}

/// Read a little-endian u32.
pub fn read_u32(reader: &mut impl Read, context: &'static str) -> Result<u32> {
    reader.read_u32::<LittleEndian>().map_err(eof_as(context))
}

/// Read a little-endian i32.
pub fn read_i32(reader: &mut impl Read, context: &'static str) -> Result<i32> {
    reader.read_i32::<LittleEndian>().map_err(eof_as(context))
}

/// Borrow the next `len` bytes of a cursor and advance past them.
pub fn take_bytes<'a>(
    cursor: &mut Cursor<&'a [u8]>,
    len: usize,
    context: &'static str,
) -> Result<&'a [u8]> {
    let data: &'a [u8] = *cursor.get_ref();
    let start = cursor.position() as usize;
    let end = start
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or(MatError::UnexpectedEof { context })?;
    cursor.set_position(end as u64);
    Ok(&data[start..end])
}

/// Number of bytes left in a cursor.
pub fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

/// Advance a cursor to the next 8-byte boundary.
///
/// Padding at the very end of a stream may be missing; the cursor stops at the end.
pub fn align8(cursor: &mut Cursor<&[u8]>) {
    let position = cursor.position();
    let rem = position % 8;
    if rem != 0 {
        let aligned = (position + 8 - rem).min(cursor.get_ref().len() as u64);
        cursor.set_position(aligned);
    }
}

/// Total number of elements described by a dimensions vector.
///
/// An empty dimensions vector describes the canonical empty array. A product
/// that does not fit in `usize` saturates, so it never matches a real buffer.
pub fn number_of_elements(dimensions: &[usize]) -> usize {
    checked_number_of_elements(dimensions).unwrap_or(usize::MAX)
}

fn checked_number_of_elements(dimensions: &[usize]) -> Option<usize> {
    if dimensions.is_empty() {
        return Some(0);
    }
    dimensions.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Element count of dimensions read from a file.
///
/// # Errors
/// `InvalidFormat` if the product overflows.
pub fn element_count(dimensions: &[usize]) -> Result<usize> {
    checked_number_of_elements(dimensions).ok_or_else(|| {
        MatError::InvalidFormat(format!("dimensions {:?} overflow the element count", dimensions))
    })
}

/// Flatten a subscript list into a column-major linear index.
///
/// Accepts either one linear index or exactly one subscript per dimension.
pub fn flat_index(dimensions: &[usize], index: &[usize]) -> Result<usize> {
    let count = number_of_elements(dimensions);
    match index {
        [flat] => {
            if *flat >= count {
                return Err(MatError::IndexOutOfRange { index: *flat, len: count });
            }
            Ok(*flat)
        }
        _ if index.len() == dimensions.len() => {
            let mut flat = 0;
            let mut stride = 1;
            for (&i, &dim) in index.iter().zip(dimensions) {
                if i >= dim {
                    return Err(MatError::IndexOutOfRange { index: i, len: dim });
                }
                flat += i * stride;
                stride *= dim;
            }
            Ok(flat)
        }
        _ => Err(MatError::ShapeMismatch {
            expected: dimensions.len(),
            found: index.len(),
        }),
    }
}

/// Decode an ASCII name element, stopping at the first NUL.
pub fn decode_name(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, _) = UTF_8.decode_without_bom_handling(&bytes[..end]);
    text.into_owned()
}
