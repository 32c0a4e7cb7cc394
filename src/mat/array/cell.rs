//! Cell arrays.

use super::Array;
use crate::mat::types::error::{MatError, Result};
use crate::mat::utils;

/// A cell array: a column-major buffer of nested arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    dimensions: Vec<usize>,
    elements: Vec<Array>,
}

impl CellArray {
    pub fn new(dimensions: Vec<usize>, elements: Vec<Array>) -> Result<Self> {
        let expected = utils::number_of_elements(&dimensions);
        if elements.len() != expected {
            return Err(MatError::InvalidFormat(format!(
                "cell array with dimensions {:?} needs {} elements, found {}",
                dimensions,
                expected,
                elements.len()
            )));
        }
        Ok(Self {
            dimensions,
            elements,
        })
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn elements(&self) -> &[Array] {
        &self.elements
    }

    pub fn get(&self, index: &[usize]) -> Result<&Array> {
        let flat = utils::flat_index(&self.dimensions, index)?;
        Ok(&self.elements[flat])
    }

    /// Replace one cell in place.
    pub fn set(&mut self, index: &[usize], value: Array) -> Result<()> {
        let flat = utils::flat_index(&self.dimensions, index)?;
        self.elements[flat] = value;
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Array> {
        self.elements.iter()
    }

    pub(crate) fn into_parts(self) -> (Vec<usize>, Vec<Array>) {
        (self.dimensions, self.elements)
    }
}

impl<'a> IntoIterator for &'a CellArray {
    type Item = &'a Array;
    type IntoIter = std::slice::Iter<'a, Array>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
