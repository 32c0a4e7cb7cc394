//! Dense numeric and logical arrays.
//!
//! Storage is one flat column-major buffer whose element type is fixed by the
//! array class. [`NumericData`] enumerates every supported element type and
//! the [`Element`] trait gives typed access to it without downcasting.

use num_complex::{Complex, Complex64};

use crate::mat::types::error::{MatError, Result};
use crate::mat::utils;

/// An element type that can be stored in a [`NumericArray`].
pub trait Element: Copy + PartialEq + std::fmt::Debug {
    /// Human-readable type name, used in type mismatch errors.
    const NAME: &'static str;

    /// Borrow the buffer if it holds this element type.
    fn slice(data: &NumericData) -> Option<&[Self]>;

    /// Mutably borrow the buffer if it holds this element type.
    fn slice_mut(data: &mut NumericData) -> Option<&mut [Self]>;
}

macro_rules! numeric_data {
    (
        real: [$(($rv:ident, $rt:ty, $rn:literal)),* $(,)?],
        complex: [$(($cv:ident, $ct:ty, $cn:literal)),* $(,)?] $(,)?
    ) => {
        /// Flat buffer of one supported element type.
        #[derive(Debug, Clone, PartialEq)]
        pub enum NumericData {
            Bool(Vec<bool>),
            $($rv(Vec<$rt>),)*
            $($cv(Vec<Complex<$ct>>),)*
        }

        impl NumericData {
            /// Number of stored elements.
            pub fn len(&self) -> usize {
                match self {
                    NumericData::Bool(v) => v.len(),
                    $(NumericData::$rv(v) => v.len(),)*
                    $(NumericData::$cv(v) => v.len(),)*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Whether the elements are complex numbers.
            pub fn is_complex(&self) -> bool {
                matches!(self, $(NumericData::$cv(_))|*)
            }

            /// Name of the stored element type.
            pub fn type_name(&self) -> &'static str {
                match self {
                    NumericData::Bool(_) => <bool as Element>::NAME,
                    $(NumericData::$rv(_) => $rn,)*
                    $(NumericData::$cv(_) => $cn,)*
                }
            }

            /// Widening conversion of real data to `f64`; `None` for complex data.
            pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
                match self {
                    NumericData::Bool(v) => {
                        Some(v.iter().map(|&b| if b { 1.0 } else { 0.0 }).collect())
                    }
                    $(NumericData::$rv(v) => Some(v.iter().map(|&x| x as f64).collect()),)*
                    $(NumericData::$cv(_) => None,)*
                }
            }

            /// Widening conversion to double-precision complex numbers.
            pub fn to_complex_vec(&self) -> Vec<Complex64> {
                match self {
                    $(NumericData::$cv(v) => v
                        .iter()
                        .map(|c| Complex64::new(c.re as f64, c.im as f64))
                        .collect(),)*
                    real => real
                        .to_f64_vec()
                        .unwrap_or_default()
                        .into_iter()
                        .map(|re| Complex64::new(re, 0.0))
                        .collect(),
                }
            }
        }

        $(
            impl Element for $rt {
                const NAME: &'static str = $rn;
                fn slice(data: &NumericData) -> Option<&[Self]> {
                    match data {
                        NumericData::$rv(v) => Some(v),
                        _ => None,
                    }
                }
                fn slice_mut(data: &mut NumericData) -> Option<&mut [Self]> {
                    match data {
                        NumericData::$rv(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*

        $(
            impl Element for Complex<$ct> {
                const NAME: &'static str = $cn;
                fn slice(data: &NumericData) -> Option<&[Self]> {
                    match data {
                        NumericData::$cv(v) => Some(v),
                        _ => None,
                    }
                }
                fn slice_mut(data: &mut NumericData) -> Option<&mut [Self]> {
                    match data {
                        NumericData::$cv(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

numeric_data! {
    real: [
        (Int8, i8, "int8"),
        (UInt8, u8, "uint8"),
        (Int16, i16, "int16"),
        (UInt16, u16, "uint16"),
        (Int32, i32, "int32"),
        (UInt32, u32, "uint32"),
        (Int64, i64, "int64"),
        (UInt64, u64, "uint64"),
        (Single, f32, "single"),
        (Double, f64, "double"),
    ],
    complex: [
        (ComplexInt8, i8, "complex int8"),
        (ComplexUInt8, u8, "complex uint8"),
        (ComplexInt16, i16, "complex int16"),
        (ComplexUInt16, u16, "complex uint16"),
        (ComplexInt32, i32, "complex int32"),
        (ComplexUInt32, u32, "complex uint32"),
        (ComplexInt64, i64, "complex int64"),
        (ComplexUInt64, u64, "complex uint64"),
        (ComplexSingle, f32, "complex single"),
        (ComplexDouble, f64, "complex double"),
    ],
}

impl Element for bool {
    const NAME: &'static str = "logical";
    fn slice(data: &NumericData) -> Option<&[Self]> {
        match data {
            NumericData::Bool(v) => Some(v),
            _ => None,
        }
    }
    fn slice_mut(data: &mut NumericData) -> Option<&mut [Self]> {
        match data {
            NumericData::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// A dense numeric or logical array.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    dimensions: Vec<usize>,
    data: NumericData,
}

impl NumericArray {
    /// Builds an array, checking that the buffer matches the dimensions.
    pub fn new(dimensions: Vec<usize>, data: NumericData) -> Result<Self> {
        let expected = utils::number_of_elements(&dimensions);
        if data.len() != expected {
            return Err(MatError::InvalidFormat(format!(
                "{} array with dimensions {:?} needs {} elements, found {}",
                data.type_name(),
                dimensions,
                expected,
                data.len()
            )));
        }
        Ok(Self { dimensions, data })
    }

    /// A 1x1 double array.
    pub fn scalar(value: f64) -> Self {
        Self {
            dimensions: vec![1, 1],
            data: NumericData::Double(vec![value]),
        }
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn data(&self) -> &NumericData {
        &self.data
    }

    /// Whether the array holds logical values.
    pub fn is_logical(&self) -> bool {
        matches!(self.data, NumericData::Bool(_))
    }

    pub fn is_complex(&self) -> bool {
        self.data.is_complex()
    }

    /// Borrow the buffer as `T`, or `None` if the array stores another type.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        T::slice(&self.data)
    }

    /// Read one element by linear index or one subscript per dimension.
    pub fn get<T: Element>(&self, index: &[usize]) -> Result<T> {
        let flat = utils::flat_index(&self.dimensions, index)?;
        let values = T::slice(&self.data).ok_or(MatError::TypeMismatch {
            expected: T::NAME,
            found: self.data.type_name(),
        })?;
        Ok(values[flat])
    }

    /// Overwrite one element in place.
    pub fn set<T: Element>(&mut self, index: &[usize], value: T) -> Result<()> {
        let flat = utils::flat_index(&self.dimensions, index)?;
        let found = self.data.type_name();
        let values = T::slice_mut(&mut self.data).ok_or(MatError::TypeMismatch {
            expected: T::NAME,
            found,
        })?;
        values[flat] = value;
        Ok(())
    }

    pub fn to_double_array(&self) -> Option<Vec<f64>> {
        self.data.to_f64_vec()
    }

    pub fn to_complex_array(&self) -> Option<Vec<Complex64>> {
        Some(self.data.to_complex_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access_checks_element_type() {
        let array = NumericArray::new(vec![1, 2], NumericData::Int8(vec![-128, 127])).unwrap();
        assert_eq!(array.get::<i8>(&[1]).unwrap(), 127);
        assert!(matches!(
            array.get::<f64>(&[0]),
            Err(MatError::TypeMismatch { expected: "double", found: "int8" })
        ));
    }

    #[test]
    fn complex_data_has_no_double_view() {
        let data = NumericData::ComplexInt8(vec![Complex::new(-128, 127), Complex::new(127, -128)]);
        assert!(data.to_f64_vec().is_none());
        assert_eq!(
            data.to_complex_vec(),
            vec![Complex64::new(-128.0, 127.0), Complex64::new(127.0, -128.0)]
        );
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut array = NumericArray::new(vec![2, 1], NumericData::Double(vec![1.0, 2.0])).unwrap();
        array.set(&[1, 0], 5.0f64).unwrap();
        assert_eq!(array.as_slice::<f64>(), Some(&[1.0, 5.0][..]));
        assert!(array.set(&[2, 0], 1.0f64).is_err());
    }

    #[test]
    fn new_rejects_mismatched_buffer() {
        assert!(NumericArray::new(vec![2, 2], NumericData::Double(vec![1.0])).is_err());
    }
}
