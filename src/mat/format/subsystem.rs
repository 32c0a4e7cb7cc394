//! Subsystem data and object resolution.
//!
//! The subsystem element is a uint8 array holding a nested element stream:
//! ```text
//! [8 bytes]  mini header (version, endian indicator)
//! [matrix]   1x1 struct with a field `MCOS`
//!              -> opaque `FileWrapper__` object
//!                 -> cell array; cell 0 is the metadata blob, the other
//!                    cells hold property values
//! ```
//!
//! The metadata blob:
//! ```text
//! [4 bytes]   version
//! [4 bytes]   number of names
//! [32 bytes]  eight absolute region offsets
//! [...]       null-terminated names
//! region 1    class table        16-byte zero block, then [package, name, 0, 0]
//! region 2    type-1 properties  8 zero bytes, then per object: n, n x [name, kind, value], padded to 8
//! region 3    object table       24-byte zero block, then [class, 0, 0, type-1 pos, type-2 pos, id]
//! region 4    type-2 properties  same layout as region 2
//! ```
//! Name and class indices are 1-based.

use std::collections::HashMap;
use std::io::Cursor;

use log::{debug, warn};

use crate::mat::array::{Array, CellArray, CharArray, MatObject, NumericArray, NumericData};
use crate::mat::array::{ObjectInstance, ObjectPayload, StructArray};
use crate::mat::types::error::{MatError, Result};
use crate::mat::utils;

use super::element::ElementReader;

const MINI_HEADER_SIZE: usize = 8;
const NAMES_START: usize = 40;
const REGION_COUNT: usize = 8;
const CLASS_ENTRY_SIZE: usize = 16;
const OBJECT_ENTRY_SIZE: usize = 24;
const PROPERTY_TABLE_SKIP: usize = 8;

/// Offset between a kind-1 property value and the cell holding it.
const CELL_INDEX_BIAS: usize = 2;

/// How a property value is stored.
#[derive(Debug, Clone, Copy, PartialEq)]
enum PropertyValue {
    /// Index into the names table.
    Name(u32),
    /// Index into the wrapper cell array.
    Cell(usize),
    /// A scalar stored inline.
    Scalar(f64),
}

#[derive(Debug, Clone, PartialEq)]
struct Property {
    name: u32,
    value: PropertyValue,
}

#[derive(Debug, Clone, PartialEq)]
struct ObjectEntry {
    class_id: u32,
    properties: Vec<Property>,
}

/// Class and object tables of one file, used to resolve object links.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubsystemData {
    names: Vec<String>,
    class_names: Vec<String>,
    objects: HashMap<u32, ObjectEntry>,
    cells: Vec<Array>,
}

impl SubsystemData {
    /// Decodes the bytes of the subsystem element.
    pub fn parse(bytes: &[u8], reader: &ElementReader) -> Result<Self> {
        if bytes.len() < MINI_HEADER_SIZE {
            return Err(MatError::InvalidFormat(
                "subsystem data is shorter than its header".to_string(),
            ));
        }
        let mut cursor = Cursor::new(bytes);
        cursor.set_position(MINI_HEADER_SIZE as u64);
        let root = reader.read_array(&mut cursor, "subsystem data")?;

        let wrapper = match root.as_struct().map(|s| s.field("MCOS", &[0])) {
            Some(Ok(wrapper)) => wrapper,
            _ => {
                warn!("Subsystem data has no MCOS entry; objects cannot be resolved");
                return Ok(Self::default());
            }
        };
        let cells = match wrapper.as_object().map(MatObject::payload) {
            Some(ObjectPayload::Opaque(payload)) => match payload.as_ref() {
                Array::Cell(cells) => cells.clone(),
                _ => return Err(invalid("MCOS payload is not a cell array")),
            },
            _ => return Err(invalid("MCOS entry is not an opaque object")),
        };
        let (_, cells) = cells.into_parts();

        let metadata = match cells.first().and_then(Array::as_numeric).map(NumericArray::data) {
            Some(NumericData::UInt8(bytes)) => bytes.as_slice(),
            _ => return Err(invalid("MCOS metadata is not a uint8 array")),
        };
        let data = Self::parse_metadata(metadata, cells.clone())?;
        debug!(
            "Subsystem data: {} names, {} classes, {} objects",
            data.names.len(),
            data.class_names.len(),
            data.objects.len()
        );
        Ok(data)
    }

    fn parse_metadata(metadata: &[u8], cells: Vec<Array>) -> Result<Self> {
        let mut cursor = Cursor::new(metadata);
        let _version = utils::read_u32(&mut cursor, "subsystem version")?;
        let name_count = utils::read_u32(&mut cursor, "subsystem name count")? as usize;
        let mut offsets = [0usize; REGION_COUNT];
        for offset in offsets.iter_mut() {
            *offset = utils::read_u32(&mut cursor, "subsystem region offsets")? as usize;
        }
        if offsets.windows(2).any(|w| w[0] > w[1]) || offsets[REGION_COUNT - 1] > metadata.len() {
            return Err(invalid("subsystem region offsets are out of order"));
        }
        let region = |k: usize| &metadata[offsets[k - 1]..offsets[k]];

        // Step 1: Names
        let names_end = offsets[0];
        if names_end < NAMES_START {
            return Err(invalid("subsystem names overlap the region table"));
        }
        let names: Vec<String> = metadata[NAMES_START..names_end]
            .split(|&b| b == 0)
            .take(name_count)
            .map(utils::decode_name)
            .collect();
        if names.len() != name_count {
            return Err(invalid("subsystem names table is truncated"));
        }

        let mut data = Self {
            names,
            cells,
            ..Self::default()
        };

        // Step 2: Classes
        for entry in words(region(1))?
            .chunks_exact(CLASS_ENTRY_SIZE / 4)
            .skip(1)
        {
            let name = data.name(entry[1])?;
            let class_name = match entry[0] {
                0 => name.to_string(),
                package => format!("{}.{}", data.name(package)?, name),
            };
            data.class_names.push(class_name);
        }

        // Step 3: Property tables
        let type1 = property_blocks(region(2))?;
        let type2 = property_blocks(region(4))?;

        // Step 4: Objects
        for entry in words(region(3))?
            .chunks_exact(OBJECT_ENTRY_SIZE / 4)
            .skip(1)
        {
            let (class_id, type1_pos, type2_pos, object_id) = (entry[0], entry[3], entry[4], entry[5]);
            let mut properties = Vec::new();
            let tables = [
                (&type1, type1_pos, "type-1 property block"),
                (&type2, type2_pos, "type-2 property block"),
            ];
            for (table, position, kind) in tables {
                if position == 0 {
                    continue;
                }
                let block = table
                    .get(position as usize - 1)
                    .ok_or(MatError::SubsystemIndex {
                        kind,
                        index: position as usize,
                    })?;
                properties.extend(block.iter().cloned());
            }
            data.objects.insert(
                object_id,
                ObjectEntry {
                    class_id,
                    properties,
                },
            );
        }
        Ok(data)
    }

    /// Name by 1-based index.
    fn name(&self, index: u32) -> Result<&str> {
        (index as usize)
            .checked_sub(1)
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
            .ok_or(MatError::SubsystemIndex {
                kind: "name",
                index: index as usize,
            })
    }

    /// Fully qualified class name by 1-based class id.
    pub fn class_name(&self, class_id: u32) -> Result<&str> {
        (class_id as usize)
            .checked_sub(1)
            .and_then(|i| self.class_names.get(i))
            .map(String::as_str)
            .ok_or(MatError::SubsystemIndex {
                kind: "class",
                index: class_id as usize,
            })
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Resolves every object link inside `array`.
    pub fn resolve(&self, array: Array) -> Result<Array> {
        resolve(array, Some(self))
    }
}

/// Replaces object links inside `array` with resolved objects.
///
/// Arrays without links are returned unchanged.
///
/// # Errors
/// `Unsupported` if a link is found but there is no subsystem data, or if
/// objects refer to each other in a cycle; `SubsystemIndex` for ids that are
/// missing from the tables.
pub fn resolve(array: Array, subsystem: Option<&SubsystemData>) -> Result<Array> {
    Resolver {
        subsystem,
        active: Vec::new(),
    }
    .resolve(array)
}

struct Resolver<'a> {
    subsystem: Option<&'a SubsystemData>,
    /// Objects currently being resolved, innermost last.
    active: Vec<u32>,
}

impl Resolver<'_> {
    fn resolve(&mut self, array: Array) -> Result<Array> {
        match array {
            Array::Cell(cell) => {
                let (dimensions, elements) = cell.into_parts();
                let elements = elements
                    .into_iter()
                    .map(|e| self.resolve(e))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CellArray::new(dimensions, elements)?.into())
            }
            Array::Struct(structure) => {
                let (dimensions, names, fields) = structure.into_parts();
                let fields = fields
                    .into_iter()
                    .map(|values| {
                        values
                            .into_iter()
                            .map(|v| self.resolve(v))
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(StructArray::new(dimensions, names, fields)?.into())
            }
            Array::Object(object) => self.resolve_object(object),
            other => Ok(other),
        }
    }

    fn resolve_object(&mut self, object: MatObject) -> Result<Array> {
        let type_description = object.type_description().to_string();
        let dimensions = object.dimensions().to_vec();
        let (class_name, instances) = match object.payload() {
            ObjectPayload::Opaque(_) => return Ok(object.into()),
            ObjectPayload::Resolved(instances) => {
                let instances = instances
                    .iter()
                    .map(|instance| {
                        let fields = instance
                            .iter()
                            .map(|(name, value)| Ok((name.to_string(), self.resolve(value.clone())?)))
                            .collect::<Result<Vec<_>>>()?;
                        Ok(ObjectInstance::new(fields))
                    })
                    .collect::<Result<Vec<_>>>()?;
                (object.class_name().to_string(), instances)
            }
            ObjectPayload::Link(link) => {
                let subsystem = self.subsystem.ok_or_else(|| {
                    MatError::Unsupported(format!(
                        "object of class '{}' needs subsystem data, but the file has none",
                        object.class_name()
                    ))
                })?;
                let class_name = subsystem.class_name(link.class_id)?.to_string();
                debug!(
                    "Resolving {} object(s) of class '{}'",
                    link.object_ids.len(),
                    class_name
                );
                let instances = link
                    .object_ids
                    .iter()
                    .map(|&id| self.instance(subsystem, id))
                    .collect::<Result<Vec<_>>>()?;
                (class_name, instances)
            }
        };
        Ok(MatObject::resolved(type_description, class_name, dimensions, instances)?.into())
    }

    fn instance(&mut self, subsystem: &SubsystemData, object_id: u32) -> Result<ObjectInstance> {
        if self.active.contains(&object_id) {
            return Err(MatError::Unsupported(format!(
                "object {} refers to itself",
                object_id
            )));
        }
        let entry = subsystem
            .objects
            .get(&object_id)
            .ok_or(MatError::SubsystemIndex {
                kind: "object",
                index: object_id as usize,
            })?;
        subsystem.class_name(entry.class_id)?;

        self.active.push(object_id);
        let mut fields = Vec::with_capacity(entry.properties.len());
        for property in &entry.properties {
            let name = subsystem.name(property.name)?.to_string();
            let value = match property.value {
                PropertyValue::Name(index) => CharArray::from_text(subsystem.name(index)?).into(),
                PropertyValue::Scalar(value) => NumericArray::scalar(value).into(),
                PropertyValue::Cell(index) => {
                    let cell = subsystem.cells.get(index).ok_or(MatError::SubsystemIndex {
                        kind: "property cell",
                        index,
                    })?;
                    self.resolve(cell.clone())?
                }
            };
            fields.push((name, value));
        }
        self.active.pop();
        Ok(ObjectInstance::new(fields))
    }
}

fn invalid(message: &str) -> MatError {
    MatError::InvalidFormat(message.to_string())
}

fn words(bytes: &[u8]) -> Result<Vec<u32>> {
    let mut cursor = Cursor::new(bytes);
    (0..bytes.len() / 4)
        .map(|_| utils::read_u32(&mut cursor, "subsystem table"))
        .collect()
}

/// Splits a property region into per-object property lists.
fn property_blocks(region: &[u8]) -> Result<Vec<Vec<Property>>> {
    let mut blocks = Vec::new();
    if region.len() <= PROPERTY_TABLE_SKIP {
        return Ok(blocks);
    }
    let mut cursor = Cursor::new(region);
    cursor.set_position(PROPERTY_TABLE_SKIP as u64);
    while utils::remaining(&cursor) >= 4 {
        let count = utils::read_u32(&mut cursor, "property count")? as usize;
        let mut properties = Vec::with_capacity(count.min(utils::remaining(&cursor) / 12));
        for _ in 0..count {
            let name = utils::read_u32(&mut cursor, "property name")?;
            let kind = utils::read_u32(&mut cursor, "property kind")?;
            let value = utils::read_u32(&mut cursor, "property value")?;
            let value = match kind {
                0 => PropertyValue::Name(value),
                1 => PropertyValue::Cell(value as usize + CELL_INDEX_BIAS),
                2 => PropertyValue::Scalar(f64::from(value)),
                other => {
                    return Err(MatError::Unsupported(format!(
                        "object property of kind {}",
                        other
                    )))
                }
            };
            properties.push(Property { name, value });
        }
        utils::align8(&mut cursor);
        blocks.push(properties);
    }
    Ok(blocks)
}
