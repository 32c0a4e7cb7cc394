//! Sparse arrays.
//!
//! On disk MATLAB stores sparse matrices in compressed-column form: a row
//! index per stored value plus, for every column, the range of those values
//! that belong to it. The decoder expands that into an explicit
//! `(row, column) -> value` map.

use std::collections::BTreeMap;

use num_complex::Complex64;

use crate::mat::types::error::{MatError, Result};

/// A 2-D sparse matrix with values of type `T`.
///
/// Cells that are not stored read as `T::default()`, the zero of `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T> {
    dimensions: Vec<usize>,
    rows: usize,
    columns: usize,
    entries: BTreeMap<(usize, usize), T>,
    nz_max: usize,
}

impl<T: Copy + Default> SparseMatrix<T> {
    /// Builds a matrix from compressed-column data.
    ///
    /// For column `c`, the stored values `column_index[c]..column_index[c + 1]`
    /// belong to it, each paired with its entry in `row_index`.
    /// `value(j)` yields the `j`-th stored value.
    pub fn from_compressed_columns(
        dimensions: &[usize],
        row_index: &[i32],
        column_index: &[i32],
        nz_max: usize,
        value: impl Fn(usize) -> Option<T>,
    ) -> Result<Self> {
        let (rows, columns) = match dimensions {
            [rows, columns] => (*rows, *columns),
            _ => {
                return Err(MatError::Unsupported(format!(
                    "only 2-dimensional sparse arrays are supported, found {} dimensions",
                    dimensions.len()
                )))
            }
        };
        let bad = |what: &str| MatError::InvalidFormat(format!("sparse array: {}", what));

        let mut entries = BTreeMap::new();
        for (column, range) in column_index.windows(2).enumerate() {
            let start = usize::try_from(range[0]).map_err(|_| bad("negative column pointer"))?;
            let end = usize::try_from(range[1]).map_err(|_| bad("negative column pointer"))?;
            if column >= columns && start < end {
                return Err(bad("values stored beyond the last column"));
            }
            for j in start..end {
                let row = row_index
                    .get(j)
                    .copied()
                    .and_then(|r| usize::try_from(r).ok())
                    .ok_or_else(|| bad("row index out of range"))?;
                if row >= rows {
                    return Err(bad("row index exceeds row count"));
                }
                let v = value(j).ok_or_else(|| bad("fewer values than row indices"))?;
                entries.insert((row, column), v);
            }
        }
        Ok(Self {
            dimensions: dimensions.to_vec(),
            rows,
            columns,
            entries,
            nz_max,
        })
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// The explicitly stored `(row, column) -> value` pairs.
    pub fn entries(&self) -> &BTreeMap<(usize, usize), T> {
        &self.entries
    }

    /// Declared upper bound on stored values.
    pub fn nz_max(&self) -> usize {
        self.nz_max
    }

    /// Value at `(row, column)`, zero for cells that are not stored.
    pub fn get(&self, row: usize, column: usize) -> Result<T> {
        if row >= self.rows {
            return Err(MatError::IndexOutOfRange {
                index: row,
                len: self.rows,
            });
        }
        if column >= self.columns {
            return Err(MatError::IndexOutOfRange {
                index: column,
                len: self.columns,
            });
        }
        Ok(self.entries.get(&(row, column)).copied().unwrap_or_default())
    }

    /// Store `value` at `(row, column)`.
    pub fn set(&mut self, row: usize, column: usize, value: T) -> Result<()> {
        self.get(row, column)?;
        self.entries.insert((row, column), value);
        Ok(())
    }

    /// Dense column-major expansion.
    ///
    /// Allocates `rows * columns` values regardless of how many are stored.
    /// Returns `None` if that size overflows or cannot be allocated.
    pub fn to_dense(&self) -> Option<Vec<T>> {
        let len = self.rows.checked_mul(self.columns)?;
        let mut dense = Vec::new();
        dense.try_reserve_exact(len).ok()?;
        dense.resize(len, T::default());
        for (&(row, column), &v) in &self.entries {
            dense[row + column * self.rows] = v;
        }
        Some(dense)
    }
}

/// A sparse array of one of the element types MATLAB can store sparsely.
#[derive(Debug, Clone, PartialEq)]
pub enum SparseArray {
    Double(SparseMatrix<f64>),
    Logical(SparseMatrix<bool>),
    Complex(SparseMatrix<Complex64>),
}

impl SparseArray {
    pub fn dimensions(&self) -> &[usize] {
        match self {
            SparseArray::Double(m) => m.dimensions(),
            SparseArray::Logical(m) => m.dimensions(),
            SparseArray::Complex(m) => m.dimensions(),
        }
    }

    pub fn nz_max(&self) -> usize {
        match self {
            SparseArray::Double(m) => m.nz_max(),
            SparseArray::Logical(m) => m.nz_max(),
            SparseArray::Complex(m) => m.nz_max(),
        }
    }

    pub fn as_double(&self) -> Option<&SparseMatrix<f64>> {
        match self {
            SparseArray::Double(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_logical(&self) -> Option<&SparseMatrix<bool>> {
        match self {
            SparseArray::Logical(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&SparseMatrix<Complex64>> {
        match self {
            SparseArray::Complex(m) => Some(m),
            _ => None,
        }
    }

    /// Dense real expansion.
    ///
    /// `None` for complex sparse arrays and for matrices too large to expand.
    pub fn to_double_array(&self) -> Option<Vec<f64>> {
        match self {
            SparseArray::Double(m) => m.to_dense(),
            SparseArray::Logical(m) => Some(
                m.to_dense()?
                    .into_iter()
                    .map(|b| if b { 1.0 } else { 0.0 })
                    .collect(),
            ),
            SparseArray::Complex(_) => None,
        }
    }

    /// Dense complex expansion; `None` for matrices too large to expand.
    pub fn to_complex_array(&self) -> Option<Vec<Complex64>> {
        match self {
            SparseArray::Complex(m) => m.to_dense(),
            real => Some(
                real.to_double_array()?
                    .into_iter()
                    .map(|re| Complex64::new(re, 0.0))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_pointers_pair_rows_with_values() {
        let values = [1.0, 3.0, 2.0, 4.0];
        let m = SparseMatrix::from_compressed_columns(
            &[4, 5],
            &[1, 2, 1, 2],
            &[0, 0, 2, 3, 4, 4],
            4,
            |j| values.get(j).copied(),
        )
        .unwrap();
        assert_eq!(m.get(1, 1).unwrap(), 1.0);
        assert_eq!(m.get(2, 1).unwrap(), 3.0);
        assert_eq!(m.get(1, 2).unwrap(), 2.0);
        assert_eq!(m.get(2, 3).unwrap(), 4.0);
        assert_eq!(m.get(3, 0).unwrap(), 0.0);
        assert_eq!(m.entries().len(), 4);
        assert!(m.get(4, 0).is_err());
    }

    #[test]
    fn dense_view_of_huge_matrix_is_refused() {
        let m = SparseMatrix::from_compressed_columns(
            &[usize::MAX, 2],
            &[0],
            &[0, 1, 1],
            1,
            |_| Some(1.0),
        )
        .unwrap();
        assert_eq!(m.get(0, 0).unwrap(), 1.0);
        assert!(m.to_dense().is_none());
        let sparse = SparseArray::Double(m);
        assert!(sparse.to_double_array().is_none());
        assert!(sparse.to_complex_array().is_none());
    }

    #[test]
    fn rejects_non_matrix_shapes() {
        let err = SparseMatrix::<f64>::from_compressed_columns(&[2, 2, 2], &[], &[0], 0, |_| None)
            .unwrap_err();
        assert!(matches!(err, MatError::Unsupported(_)));
    }
}
