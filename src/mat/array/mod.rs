//! The array model shared by every decoding path.
//!
//! [`Array`] is a closed set of variants. Callers inspect it by matching or
//! through the `as_*` accessors; every variant reports its dimensions and the
//! lossy `to_double_array` / `to_complex_array` views in the same way.

pub mod cell;
pub mod character;
pub mod numeric;
pub mod object;
pub mod sparse;
pub mod structure;

use num_complex::Complex64;

pub use self::cell::CellArray;
pub use self::character::{CharArray, CharData};
pub use self::numeric::{Element, NumericArray, NumericData};
pub use self::object::{MatObject, ObjectInstance, ObjectPayload, OpaqueLink};
pub use self::sparse::{SparseArray, SparseMatrix};
pub use self::structure::{StructArray, StructElement};

use crate::mat::utils;

/// A decoded MATLAB array.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// The canonical empty array; it has no dimensions at all.
    Empty,
    Numeric(NumericArray),
    Char(CharArray),
    Cell(CellArray),
    Struct(StructArray),
    Sparse(SparseArray),
    Object(MatObject),
}

impl Array {
    pub fn dimensions(&self) -> &[usize] {
        match self {
            Array::Empty => &[],
            Array::Numeric(a) => a.dimensions(),
            Array::Char(a) => a.dimensions(),
            Array::Cell(a) => a.dimensions(),
            Array::Struct(a) => a.dimensions(),
            Array::Sparse(a) => a.dimensions(),
            Array::Object(a) => a.dimensions(),
        }
    }

    /// Number of elements, the product of the dimensions.
    pub fn count(&self) -> usize {
        utils::number_of_elements(self.dimensions())
    }

    /// `true` only for an array without dimensions.
    ///
    /// A `0x0` matrix still has two dimensions and is not empty in this sense.
    pub fn is_empty(&self) -> bool {
        self.dimensions().is_empty()
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Array::Empty => "empty",
            Array::Numeric(a) => a.data().type_name(),
            Array::Char(_) => "char",
            Array::Cell(_) => "cell",
            Array::Struct(_) => "struct",
            Array::Sparse(SparseArray::Double(_)) => "sparse double",
            Array::Sparse(SparseArray::Logical(_)) => "sparse logical",
            Array::Sparse(SparseArray::Complex(_)) => "sparse complex double",
            Array::Object(_) => "object",
        }
    }

    /// Real values widened to `f64`, column-major.
    ///
    /// `None` for complex data and for arrays without numeric content
    /// (cell, struct, object and the empty array).
    pub fn to_double_array(&self) -> Option<Vec<f64>> {
        match self {
            Array::Numeric(a) => a.to_double_array(),
            Array::Char(a) => Some(a.to_double_array()),
            Array::Sparse(a) => a.to_double_array(),
            Array::Empty | Array::Cell(_) | Array::Struct(_) | Array::Object(_) => None,
        }
    }

    /// Values widened to double-precision complex numbers, column-major.
    pub fn to_complex_array(&self) -> Option<Vec<Complex64>> {
        match self {
            Array::Numeric(a) => a.to_complex_array(),
            Array::Char(a) => Some(a.to_complex_array()),
            Array::Sparse(a) => a.to_complex_array(),
            Array::Empty | Array::Cell(_) | Array::Struct(_) | Array::Object(_) => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&NumericArray> {
        match self {
            Array::Numeric(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_numeric_mut(&mut self) -> Option<&mut NumericArray> {
        match self {
            Array::Numeric(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<&CharArray> {
        match self {
            Array::Char(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_cell(&self) -> Option<&CellArray> {
        match self {
            Array::Cell(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_cell_mut(&mut self) -> Option<&mut CellArray> {
        match self {
            Array::Cell(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructArray> {
        match self {
            Array::Struct(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructArray> {
        match self {
            Array::Struct(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sparse(&self) -> Option<&SparseArray> {
        match self {
            Array::Sparse(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sparse_mut(&mut self) -> Option<&mut SparseArray> {
        match self {
            Array::Sparse(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&MatObject> {
        match self {
            Array::Object(a) => Some(a),
            _ => None,
        }
    }
}

impl From<NumericArray> for Array {
    fn from(a: NumericArray) -> Self {
        Array::Numeric(a)
    }
}

impl From<CharArray> for Array {
    fn from(a: CharArray) -> Self {
        Array::Char(a)
    }
}

impl From<CellArray> for Array {
    fn from(a: CellArray) -> Self {
        Array::Cell(a)
    }
}

impl From<StructArray> for Array {
    fn from(a: StructArray) -> Self {
        Array::Struct(a)
    }
}

impl From<SparseArray> for Array {
    fn from(a: SparseArray) -> Self {
        Array::Sparse(a)
    }
}

impl From<MatObject> for Array {
    fn from(a: MatObject) -> Self {
        Array::Object(a)
    }
}
