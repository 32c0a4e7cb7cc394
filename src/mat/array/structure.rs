//! Struct arrays.
//!
//! A struct array keeps its field names in file order and one column-major
//! buffer of values per field, so every element has exactly the same keys.

use super::Array;
use crate::mat::types::error::{MatError, Result};
use crate::mat::utils;

/// A MATLAB struct array.
#[derive(Debug, Clone, PartialEq)]
pub struct StructArray {
    dimensions: Vec<usize>,
    field_names: Vec<String>,
    /// `fields[f][i]` is the value of field `f` in element `i`.
    fields: Vec<Vec<Array>>,
}

impl StructArray {
    /// Builds a struct array from per-field value buffers.
    ///
    /// Field names must be unique and every buffer must hold one value per element.
    pub fn new(
        dimensions: Vec<usize>,
        field_names: Vec<String>,
        fields: Vec<Vec<Array>>,
    ) -> Result<Self> {
        if field_names.len() != fields.len() {
            return Err(MatError::InvalidFormat(format!(
                "struct has {} field names but {} value buffers",
                field_names.len(),
                fields.len()
            )));
        }
        for (i, name) in field_names.iter().enumerate() {
            if field_names[..i].contains(name) {
                return Err(MatError::InvalidFormat(format!(
                    "duplicate struct field name '{}'",
                    name
                )));
            }
        }
        let count = utils::number_of_elements(&dimensions);
        if let Some((name, values)) = field_names
            .iter()
            .zip(&fields)
            .find(|(_, values)| values.len() != count)
        {
            return Err(MatError::InvalidFormat(format!(
                "struct field '{}' has {} values for {} elements",
                name,
                values.len(),
                count
            )));
        }
        Ok(Self {
            dimensions,
            field_names,
            fields,
        })
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    /// Field names in the order they were declared in the file.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    fn field_position(&self, name: &str) -> Result<usize> {
        self.field_names
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| MatError::FieldNotFound(name.to_string()))
    }

    /// Value of field `name` in the element at `index`.
    pub fn field(&self, name: &str, index: &[usize]) -> Result<&Array> {
        let f = self.field_position(name)?;
        let flat = utils::flat_index(&self.dimensions, index)?;
        Ok(&self.fields[f][flat])
    }

    /// All values of field `name`, column-major.
    pub fn field_values(&self, name: &str) -> Result<&[Array]> {
        let f = self.field_position(name)?;
        Ok(&self.fields[f])
    }

    /// Replace the value of field `name` in the element at `index`.
    pub fn set(&mut self, name: &str, index: &[usize], value: Array) -> Result<()> {
        let f = self.field_position(name)?;
        let flat = utils::flat_index(&self.dimensions, index)?;
        self.fields[f][flat] = value;
        Ok(())
    }

    /// Ordered field map of the element at `index`.
    pub fn element(&self, index: &[usize]) -> Result<StructElement<'_>> {
        let flat = utils::flat_index(&self.dimensions, index)?;
        Ok(StructElement {
            array: self,
            index: flat,
        })
    }

    pub(crate) fn into_parts(self) -> (Vec<usize>, Vec<String>, Vec<Vec<Array>>) {
        (self.dimensions, self.field_names, self.fields)
    }
}

/// One element of a struct array viewed as an ordered name-to-value map.
#[derive(Debug, Clone, Copy)]
pub struct StructElement<'a> {
    array: &'a StructArray,
    index: usize,
}

impl<'a> StructElement<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Array> {
        let f = self.array.field_names.iter().position(|n| n == name)?;
        Some(&self.array.fields[f][self.index])
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.array.field_names.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.array.field_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.field_names.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        self.array.field_names.iter().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &'a Array> + 'a {
        let index = self.index;
        self.array.fields.iter().map(move |values| &values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Array)> + 'a {
        self.keys().zip(self.values())
    }
}
