//! The Level 5 variable loop.
//!
//! Reading happens in two phases. The first walks the top-level elements,
//! keeping matrices as raw variables and setting aside the subsystem
//! element. The second builds the subsystem tables once and resolves object
//! links in every variable against them.

use std::io::Cursor;

use log::{debug, info};

use crate::mat::array::{Array, NumericData};
use crate::mat::types::error::{MatError, Result};
use crate::mat::types::file::{MatFile, Variable};
use crate::mat::types::models::{ArrayFlags, Header, HEADER_SIZE};
use crate::mat::utils;

use super::element::{DataElement, ElementReader};
use super::subsystem::{self, SubsystemData};

/// A top-level matrix before object resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    /// Absolute file offset of the element tag.
    pub position: u64,
    pub name: String,
    pub array: Array,
    pub flags: Option<ArrayFlags>,
}

/// Walks the top-level elements of a complete file image.
///
/// Returns the raw variables in file order and the bytes of the subsystem
/// element, if the header pointed at one. Running out of data exactly at an
/// element boundary ends the loop; anything else that cannot be read is an error.
pub fn read_raw_variables(
    image: &[u8],
    subsystem_position: Option<u64>,
    reader: &ElementReader,
) -> Result<(Vec<RawVariable>, Option<Vec<u8>>)> {
    let mut cursor = Cursor::new(image);
    cursor.set_position(HEADER_SIZE as u64);
    let mut variables = Vec::new();
    let mut subsystem = None;

    while utils::remaining(&cursor) > 0 {
        let position = cursor.position();
        let element = reader.read(&mut cursor)?;
        if Some(position) == subsystem_position {
            debug!("Subsystem data element at offset {}", position);
            subsystem = Some(subsystem_bytes(element)?);
            continue;
        }
        match element {
            DataElement::Matrix(matrix) => {
                debug!("Variable '{}' at offset {}", matrix.name, position);
                variables.push(RawVariable {
                    position,
                    name: matrix.name,
                    array: matrix.array,
                    flags: matrix.flags,
                });
            }
            DataElement::Raw(_) => {
                debug!("Skipping non-matrix top-level element at offset {}", position);
            }
        }
    }

    Ok((variables, subsystem))
}

fn subsystem_bytes(element: DataElement) -> Result<Vec<u8>> {
    let array = match element {
        DataElement::Matrix(matrix) => matrix.array,
        DataElement::Raw(_) => {
            return Err(MatError::InvalidFormat(
                "subsystem data is not a matrix".to_string(),
            ))
        }
    };
    match array.as_numeric().map(|n| n.data()) {
        Some(NumericData::UInt8(bytes)) => Ok(bytes.clone()),
        _ => Err(MatError::InvalidFormat(
            "subsystem data is not a uint8 array".to_string(),
        )),
    }
}

/// Reads a complete Level 5 file image into a [`MatFile`].
pub fn read(
    image: &[u8],
    header: &Header,
    reader: &ElementReader,
    resolve_objects: bool,
) -> Result<MatFile> {
    let (raw_variables, subsystem_bytes) =
        read_raw_variables(image, header.subsystem_position(), reader)?;

    let subsystem = match subsystem_bytes {
        Some(bytes) if resolve_objects => Some(SubsystemData::parse(&bytes, reader)?),
        _ => None,
    };

    let variables = raw_variables
        .into_iter()
        .map(|raw| {
            let value = if resolve_objects {
                subsystem::resolve(raw.array, subsystem.as_ref())?
            } else {
                raw.array
            };
            Ok(Variable::new(
                raw.name,
                value,
                raw.flags.is_some_and(|f| f.is_global),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("Read {} variable(s)", variables.len());
    Ok(MatFile::with_description(variables, header.text.clone()))
}
