//! Character arrays.

use encoding_rs::{UTF_16LE, UTF_8};
use num_complex::Complex64;

use crate::mat::types::error::{MatError, Result};
use crate::mat::utils;

/// Code units of a char array, in the width they were stored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharData {
    /// 1-byte code units (`miUINT8` / `miUTF8`).
    Utf8(Vec<u8>),
    /// 2-byte code units (`miUINT16` / `miUTF16`).
    Utf16(Vec<u16>),
}

impl CharData {
    /// Number of stored code units.
    pub fn len(&self) -> usize {
        match self {
            CharData::Utf8(v) => v.len(),
            CharData::Utf16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A MATLAB char array with its decoded string view.
#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    dimensions: Vec<usize>,
    data: CharData,
    string: String,
}

impl CharArray {
    /// Builds a char array and decodes its string view.
    ///
    /// The string is the column-major concatenation of all characters. UTF-16
    /// data holds one code unit per element; UTF-8 data holds one decoded
    /// character per element.
    ///
    /// # Errors
    /// `InvalidFormat` if the number of elements does not match the dimensions.
    pub fn new(dimensions: Vec<usize>, data: CharData) -> Result<Self> {
        let (string, length) = match &data {
            CharData::Utf8(bytes) => {
                let (text, _) = UTF_8.decode_without_bom_handling(bytes);
                let length = text.chars().count();
                (text.into_owned(), length)
            }
            CharData::Utf16(units) => {
                let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
                let (text, _) = UTF_16LE.decode_without_bom_handling(&bytes);
                (text.into_owned(), units.len())
            }
        };
        let expected = utils::number_of_elements(&dimensions);
        if length != expected {
            return Err(MatError::InvalidFormat(format!(
                "char array with dimensions {:?} needs {} characters, found {}",
                dimensions, expected, length
            )));
        }
        Ok(Self {
            dimensions,
            data,
            string,
        })
    }

    /// A 1xN char array holding `text` as UTF-16 code units.
    pub fn from_text(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        Self {
            dimensions: vec![1, units.len()],
            data: CharData::Utf16(units),
            string: text.to_owned(),
        }
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn data(&self) -> &CharData {
        &self.data
    }

    pub fn as_str(&self) -> &str {
        &self.string
    }

    /// Character code of one element, by linear index or subscript list.
    ///
    /// For UTF-16 data this is the raw code unit, so each half of a surrogate
    /// pair is its own element.
    pub fn code_unit(&self, index: &[usize]) -> Result<u32> {
        let flat = utils::flat_index(&self.dimensions, index)?;
        self.codes()
            .nth(flat)
            .ok_or(MatError::IndexOutOfRange {
                index: flat,
                len: utils::number_of_elements(&self.dimensions),
            })
    }

    /// Character at a linear index or subscript list.
    ///
    /// A code unit that is half of a surrogate pair maps to U+FFFD.
    pub fn char_at(&self, index: &[usize]) -> Result<char> {
        let code = self.code_unit(index)?;
        Ok(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER))
    }

    fn codes(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match &self.data {
            CharData::Utf8(_) => Box::new(self.string.chars().map(u32::from)),
            CharData::Utf16(units) => Box::new(units.iter().map(|&u| u32::from(u))),
        }
    }

    /// Character codes widened to `f64`.
    pub fn to_double_array(&self) -> Vec<f64> {
        self.codes().map(f64::from).collect()
    }

    pub fn to_complex_array(&self) -> Vec<Complex64> {
        self.to_double_array()
            .into_iter()
            .map(|re| Complex64::new(re, 0.0))
            .collect()
    }
}

impl std::fmt::Display for CharArray {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.string)
    }
}
