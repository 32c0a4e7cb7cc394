//! File-level result types.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;

use crate::mat::array::Array;
use crate::mat::reader::MatFileReader;

use super::error::Result;

/// A named top-level value of a MAT-file.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Array,
    pub is_global: bool,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: Array, is_global: bool) -> Self {
        Self {
            name: name.into(),
            value,
            is_global,
        }
    }
}

/// The variables of a MAT-file, in file order.
///
/// Names are not required to be unique. [`MatFile::get`] returns the first
/// variable with a given name and [`MatFile::get_all`] returns all of them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatFile {
    variables: Vec<Variable>,
    description: String,
}

impl MatFile {
    pub fn new(variables: Vec<Variable>) -> Self {
        Self {
            variables,
            description: String::new(),
        }
    }

    pub fn with_description(variables: Vec<Variable>, description: impl Into<String>) -> Self {
        Self {
            variables,
            description: description.into(),
        }
    }

    /// Opens and reads a file with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening MAT-file: {}", path.display());
        let file = File::open(path)?;
        MatFileReader::new(BufReader::new(file)).read()
    }

    /// Reads a complete file image held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        MatFileReader::new(bytes).read()
    }

    /// Descriptive text from the file header.
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// First variable called `name`.
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Every variable called `name`, in file order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Variable> + 'a {
        self.variables.iter().filter(move |v| v.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }
}

impl IntoIterator for MatFile {
    type Item = Variable;
    type IntoIter = std::vec::IntoIter<Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.into_iter()
    }
}

impl<'a> IntoIterator for &'a MatFile {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}
