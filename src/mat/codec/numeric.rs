//! Conversion of primitive element buffers into typed arrays.
//!
//! Primitive elements are decoded into [`RawData`] exactly as stored. MATLAB
//! is free to store an array class in a narrower on-disk type (a double array
//! of small integers is often written as `miUINT8`), so building an array
//! casts the raw buffer to the element type of the array class.

use byteorder::{ByteOrder, LittleEndian};
use num_complex::Complex;

use crate::mat::array::{Array, CharArray, CharData, NumericArray, NumericData};
use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::{ArrayClass, ArrayFlags, DataType};

/// The payload of a primitive element in its on-disk type.
#[derive(Debug, Clone, PartialEq)]
pub enum RawData {
    Int8(Vec<i8>),
    UInt8(Vec<u8>),
    Int16(Vec<i16>),
    UInt16(Vec<u16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Int64(Vec<i64>),
    UInt64(Vec<u64>),
    Single(Vec<f32>),
    Double(Vec<f64>),
    Utf8(Vec<u8>),
    Utf16(Vec<u16>),
}

macro_rules! read_into {
    ($bytes:expr, $read:ident, $t:ty, $variant:ident) => {{
        let mut values: Vec<$t> = vec![Default::default(); $bytes.len() / std::mem::size_of::<$t>()];
        LittleEndian::$read($bytes, &mut values);
        RawData::$variant(values)
    }};
}

/// Casts every value of a raw buffer to `$t` with `as` semantics.
macro_rules! cast_all {
    ($raw:expr, $t:ty) => {
        match $raw {
            RawData::Int8(v) => v.iter().map(|&x| x as $t).collect::<Vec<$t>>(),
            RawData::UInt8(v) | RawData::Utf8(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::Int16(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::UInt16(v) | RawData::Utf16(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::Int32(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::UInt32(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::Int64(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::UInt64(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::Single(v) => v.iter().map(|&x| x as $t).collect(),
            RawData::Double(v) => v.iter().map(|&x| x as $t).collect(),
        }
    };
}

impl RawData {
    /// Reinterprets little-endian bytes as values of `data_type`.
    pub fn from_le_bytes(data_type: DataType, bytes: &[u8]) -> Result<Self> {
        let size = data_type.element_size();
        if bytes.len() % size != 0 {
            return Err(MatError::InvalidFormat(format!(
                "{:?} element of {} bytes is not a whole number of values",
                data_type,
                bytes.len()
            )));
        }
        let raw = match data_type {
            DataType::Int8 => RawData::Int8(bytes.iter().map(|&b| b as i8).collect()),
            DataType::UInt8 => RawData::UInt8(bytes.to_vec()),
            DataType::Utf8 => RawData::Utf8(bytes.to_vec()),
            DataType::Int16 => read_into!(bytes, read_i16_into, i16, Int16),
            DataType::UInt16 => read_into!(bytes, read_u16_into, u16, UInt16),
            DataType::Utf16 => read_into!(bytes, read_u16_into, u16, Utf16),
            DataType::Int32 => read_into!(bytes, read_i32_into, i32, Int32),
            DataType::UInt32 => read_into!(bytes, read_u32_into, u32, UInt32),
            DataType::Int64 => read_into!(bytes, read_i64_into, i64, Int64),
            DataType::UInt64 => read_into!(bytes, read_u64_into, u64, UInt64),
            DataType::Single => read_into!(bytes, read_f32_into, f32, Single),
            DataType::Double => read_into!(bytes, read_f64_into, f64, Double),
            DataType::Utf32 | DataType::Matrix | DataType::Compressed => {
                return Err(MatError::Unsupported(format!(
                    "{:?} is not a primitive element type",
                    data_type
                )))
            }
        };
        Ok(raw)
    }

    pub fn len(&self) -> usize {
        match self {
            RawData::Int8(v) => v.len(),
            RawData::UInt8(v) | RawData::Utf8(v) => v.len(),
            RawData::Int16(v) => v.len(),
            RawData::UInt16(v) | RawData::Utf16(v) => v.len(),
            RawData::Int32(v) => v.len(),
            RawData::UInt32(v) => v.len(),
            RawData::Int64(v) => v.len(),
            RawData::UInt64(v) => v.len(),
            RawData::Single(v) => v.len(),
            RawData::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            RawData::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&[u32]> {
        match self {
            RawData::UInt32(v) => Some(v),
            _ => None,
        }
    }

    /// Bytes of a name-like element (`miINT8`, `miUINT8` or `miUTF8`).
    pub fn name_bytes(&self) -> Option<Vec<u8>> {
        match self {
            RawData::Int8(v) => Some(v.iter().map(|&b| b as u8).collect()),
            RawData::UInt8(v) | RawData::Utf8(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Nonzero values are `true`.
    pub fn to_bool_vec(&self) -> Vec<bool> {
        match self {
            RawData::Single(v) => v.iter().map(|&x| x != 0.0).collect(),
            RawData::Double(v) => v.iter().map(|&x| x != 0.0).collect(),
            integer => cast_all!(integer, i128).into_iter().map(|x| x != 0).collect(),
        }
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        cast_all!(self, f64)
    }
}

/// Builds the array for one numeric storage type, zipping in the imaginary part if present.
macro_rules! build_numeric {
    ($dims:expr, $real:expr, $imag:expr, $t:ty, $variant:ident, $complex:ident) => {{
        let real: Vec<$t> = cast_all!($real, $t);
        let data = match $imag {
            None => NumericData::$variant(real),
            Some(imag) => {
                let imag: Vec<$t> = cast_all!(imag, $t);
                if imag.len() != real.len() {
                    return Err(MatError::InvalidFormat(format!(
                        "complex array has {} real and {} imaginary values",
                        real.len(),
                        imag.len()
                    )));
                }
                NumericData::$complex(
                    real.into_iter()
                        .zip(imag)
                        .map(|(re, im)| Complex::new(re, im))
                        .collect(),
                )
            }
        };
        NumericArray::new($dims, data)?
    }};
}

/// Turns the data elements of a numeric or char matrix into an array.
///
/// The logical flag wins over the declared class. Char data keeps the code
/// unit width it was stored with.
///
/// # Errors
/// `Unsupported` for classes that are not numeric or char and for char data
/// stored in an unsupported element type; `InvalidFormat` when the values do
/// not match the dimensions.
pub fn convert(
    flags: &ArrayFlags,
    dimensions: Vec<usize>,
    real: RawData,
    imaginary: Option<RawData>,
) -> Result<Array> {
    if flags.is_logical {
        let data = NumericData::Bool(real.to_bool_vec());
        return Ok(NumericArray::new(dimensions, data)?.into());
    }

    if flags.class == ArrayClass::Char {
        let data = match real {
            RawData::UInt8(v) | RawData::Utf8(v) => CharData::Utf8(v),
            RawData::UInt16(v) | RawData::Utf16(v) => CharData::Utf16(v),
            other => {
                return Err(MatError::Unsupported(format!(
                    "char array stored as {} values",
                    raw_type_name(&other)
                )))
            }
        };
        return Ok(CharArray::new(dimensions, data)?.into());
    }

    if flags.is_complex && imaginary.is_none() {
        return Err(MatError::InvalidFormat(
            "complex array without imaginary part".to_string(),
        ));
    }
    let imaginary = if flags.is_complex { imaginary.as_ref() } else { None };

    let array = match flags.class {
        ArrayClass::Int8 => build_numeric!(dimensions, &real, imaginary, i8, Int8, ComplexInt8),
        ArrayClass::UInt8 => build_numeric!(dimensions, &real, imaginary, u8, UInt8, ComplexUInt8),
        ArrayClass::Int16 => build_numeric!(dimensions, &real, imaginary, i16, Int16, ComplexInt16),
        ArrayClass::UInt16 => {
            build_numeric!(dimensions, &real, imaginary, u16, UInt16, ComplexUInt16)
        }
        ArrayClass::Int32 => build_numeric!(dimensions, &real, imaginary, i32, Int32, ComplexInt32),
        ArrayClass::UInt32 => {
            build_numeric!(dimensions, &real, imaginary, u32, UInt32, ComplexUInt32)
        }
        ArrayClass::Int64 => build_numeric!(dimensions, &real, imaginary, i64, Int64, ComplexInt64),
        ArrayClass::UInt64 => {
            build_numeric!(dimensions, &real, imaginary, u64, UInt64, ComplexUInt64)
        }
        ArrayClass::Single => {
            build_numeric!(dimensions, &real, imaginary, f32, Single, ComplexSingle)
        }
        ArrayClass::Double => {
            build_numeric!(dimensions, &real, imaginary, f64, Double, ComplexDouble)
        }
        other => {
            return Err(MatError::Unsupported(format!(
                "{:?} is not a numeric array class",
                other
            )))
        }
    };
    Ok(array.into())
}

fn raw_type_name(raw: &RawData) -> &'static str {
    match raw {
        RawData::Int8(_) => "int8",
        RawData::UInt8(_) => "uint8",
        RawData::Int16(_) => "int16",
        RawData::UInt16(_) => "uint16",
        RawData::Int32(_) => "int32",
        RawData::UInt32(_) => "uint32",
        RawData::Int64(_) => "int64",
        RawData::UInt64(_) => "uint64",
        RawData::Single(_) => "single",
        RawData::Double(_) => "double",
        RawData::Utf8(_) => "utf8",
        RawData::Utf16(_) => "utf16",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(class: ArrayClass) -> ArrayFlags {
        ArrayFlags {
            class,
            is_complex: false,
            is_global: false,
            is_logical: false,
        }
    }

    #[test]
    fn narrow_storage_is_widened_to_class_type() {
        let raw = RawData::UInt8(vec![1, 2, 255]);
        let array = convert(&flags(ArrayClass::Double), vec![1, 3], raw, None).unwrap();
        let numeric = array.as_numeric().unwrap();
        assert_eq!(numeric.as_slice::<f64>(), Some(&[1.0, 2.0, 255.0][..]));
    }

    #[test]
    fn logical_flag_overrides_class() {
        let mut f = flags(ArrayClass::UInt8);
        f.is_logical = true;
        let array = convert(&f, vec![1, 3], RawData::UInt8(vec![0, 7, 1]), None).unwrap();
        let numeric = array.as_numeric().unwrap();
        assert_eq!(numeric.as_slice::<bool>(), Some(&[false, true, true][..]));
    }

    #[test]
    fn rejects_non_numeric_class() {
        let err = convert(&flags(ArrayClass::Function), vec![1, 1], RawData::Double(vec![0.0]), None)
            .unwrap_err();
        assert!(matches!(err, MatError::Unsupported(_)));
    }

    #[test]
    fn decodes_little_endian_words() {
        let raw = RawData::from_le_bytes(DataType::Int16, &[0x00, 0x80, 0xff, 0x7f]).unwrap();
        assert_eq!(raw, RawData::Int16(vec![i16::MIN, i16::MAX]));
        assert!(RawData::from_le_bytes(DataType::Int32, &[0, 0, 0]).is_err());
    }
}
