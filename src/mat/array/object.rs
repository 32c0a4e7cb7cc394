//! MATLAB objects.
//!
//! Objects reach the decoder in three shapes:
//! - old-style `mxOBJECT` matrices, whose fields are stored inline like a struct;
//! - opaque objects with a self-contained payload;
//! - opaque links, which only carry object ids into the file's subsystem data.
//!
//! Links stay unresolved until the subsystem post-pass turns them into
//! per-element field maps.

use super::Array;
use crate::mat::types::error::{MatError, Result};
use crate::mat::utils;

/// One element of an object array: its fields in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectInstance {
    fields: Vec<(String, Array)>,
}

impl ObjectInstance {
    pub fn new(fields: Vec<(String, Array)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Array> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Parsed payload of an opaque link.
///
/// On disk: `[marker, ndims, dims..., object ids..., class id]` as uint32.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueLink {
    pub object_ids: Vec<u32>,
    pub class_id: u32,
    /// The uint32 payload as read.
    pub raw: Box<Array>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectPayload {
    /// Self-contained opaque data that is not interpreted further.
    Opaque(Box<Array>),
    /// Object ids waiting for subsystem resolution.
    Link(OpaqueLink),
    /// One field map per element, column-major.
    Resolved(Vec<ObjectInstance>),
}

/// A MATLAB object array.
#[derive(Debug, Clone, PartialEq)]
pub struct MatObject {
    type_description: String,
    class_name: String,
    dimensions: Vec<usize>,
    payload: ObjectPayload,
}

impl MatObject {
    /// A self-contained opaque object; it counts as a single element.
    pub fn opaque(type_description: String, class_name: String, data: Array) -> Self {
        Self {
            type_description,
            class_name,
            dimensions: vec![1, 1],
            payload: ObjectPayload::Opaque(Box::new(data)),
        }
    }

    /// A link into subsystem data.
    pub fn link(
        type_description: String,
        class_name: String,
        dimensions: Vec<usize>,
        link: OpaqueLink,
    ) -> Result<Self> {
        let count = utils::number_of_elements(&dimensions);
        if link.object_ids.len() != count {
            return Err(MatError::InvalidFormat(format!(
                "object link with dimensions {:?} carries {} object ids",
                dimensions,
                link.object_ids.len()
            )));
        }
        Ok(Self {
            type_description,
            class_name,
            dimensions,
            payload: ObjectPayload::Link(link),
        })
    }

    /// An object whose fields are known.
    pub fn resolved(
        type_description: String,
        class_name: String,
        dimensions: Vec<usize>,
        instances: Vec<ObjectInstance>,
    ) -> Result<Self> {
        let count = utils::number_of_elements(&dimensions);
        if instances.len() != count {
            return Err(MatError::InvalidFormat(format!(
                "object with dimensions {:?} has {} elements",
                dimensions,
                instances.len()
            )));
        }
        Ok(Self {
            type_description,
            class_name,
            dimensions,
            payload: ObjectPayload::Resolved(instances),
        })
    }

    /// Object kind as written by MATLAB, `MCOS` for classdef objects.
    pub fn type_description(&self) -> &str {
        &self.type_description
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn dimensions(&self) -> &[usize] {
        &self.dimensions
    }

    pub fn payload(&self) -> &ObjectPayload {
        &self.payload
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.payload, ObjectPayload::Resolved(_))
    }

    /// Raw payload of an opaque object or unresolved link.
    pub fn raw_data(&self) -> Option<&Array> {
        match &self.payload {
            ObjectPayload::Opaque(data) => Some(data),
            ObjectPayload::Link(link) => Some(&link.raw),
            ObjectPayload::Resolved(_) => None,
        }
    }

    /// Union of field names over all elements, in first-seen order.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        if let ObjectPayload::Resolved(instances) = &self.payload {
            for name in instances.iter().flat_map(ObjectInstance::keys) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Field map of the element at `index`.
    ///
    /// # Errors
    /// `Unsupported` if the object has no resolved fields, index errors otherwise.
    pub fn element(&self, index: &[usize]) -> Result<&ObjectInstance> {
        let instances = match &self.payload {
            ObjectPayload::Resolved(instances) => instances,
            _ => {
                return Err(MatError::Unsupported(format!(
                    "fields of object of class '{}' are not available",
                    self.class_name
                )))
            }
        };
        let flat = utils::flat_index(&self.dimensions, index)?;
        Ok(&instances[flat])
    }

    /// Value of field `name` in the element at `index`.
    pub fn field(&self, name: &str, index: &[usize]) -> Result<&Array> {
        self.element(index)?
            .get(name)
            .ok_or_else(|| MatError::FieldNotFound(name.to_string()))
    }
}
