//! Composite decoding of `miMATRIX` elements.
//!
//! Every matrix starts with an array flags element. Apart from opaque
//! objects, it is followed by the dimensions and the array name; what comes
//! after depends on the array class.

use std::io::Cursor;

use log::{debug, trace};

use crate::mat::array::{
    Array, CellArray, MatObject, NumericData, ObjectInstance, OpaqueLink, SparseArray,
    SparseMatrix, StructArray,
};
use crate::mat::codec::numeric::{self, RawData};
use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::{ArrayClass, ArrayFlags};
use crate::mat::utils;

use super::element::{ElementReader, MatrixElement};

/// Type description recorded for old-style `mxOBJECT` arrays.
const OBJECT_TYPE_DESCRIPTION: &str = "object";

const ELEMENT_TAG_SIZE: usize = 8;

/// Decodes the payload of a matrix element.
///
/// An empty payload is the canonical empty array.
pub(crate) fn read_matrix(reader: &ElementReader, payload: &[u8]) -> Result<MatrixElement> {
    if payload.is_empty() {
        trace!("Empty matrix");
        return Ok(MatrixElement {
            array: Array::Empty,
            flags: None,
            name: String::new(),
        });
    }
    let mut cursor = Cursor::new(payload);

    let flag_words = reader.read_raw(&mut cursor, "array flags")?;
    let flag_words = flag_words
        .as_u32()
        .filter(|words| !words.is_empty())
        .ok_or_else(|| MatError::InvalidFormat("array flags must be uint32".to_string()))?
        .to_vec();
    let flags = ArrayFlags::from_word(flag_words[0])?;
    trace!("Array flags: {:?}", flags);

    if flags.class == ArrayClass::Opaque {
        let (name, array) = read_opaque(reader, &mut cursor)?;
        return Ok(MatrixElement {
            array,
            flags: Some(flags),
            name,
        });
    }

    let dimensions = read_dimensions(reader, &mut cursor)?;
    let name = read_name(reader, &mut cursor, "array name")?;
    debug!(
        "Matrix '{}': class={:?}, dimensions={:?}",
        name, flags.class, dimensions
    );

    let array = match flags.class {
        ArrayClass::Cell => read_cell(reader, &mut cursor, dimensions)?,
        ArrayClass::Struct => read_struct(reader, &mut cursor, dimensions)?.into(),
        ArrayClass::Object => read_object(reader, &mut cursor, dimensions)?,
        ArrayClass::Sparse => {
            let nz_max = flag_words.get(1).copied().unwrap_or(0) as usize;
            read_sparse(reader, &mut cursor, &flags, dimensions, nz_max)?
        }
        ArrayClass::Function => {
            return Err(MatError::Unsupported(
                "function handle arrays are not supported".to_string(),
            ))
        }
        _ => {
            let real = reader.read_raw(&mut cursor, "array data")?;
            let imaginary = if flags.is_complex {
                Some(reader.read_raw(&mut cursor, "imaginary array data")?)
            } else {
                None
            };
            numeric::convert(&flags, dimensions, real, imaginary)?
        }
    };

    Ok(MatrixElement {
        array,
        flags: Some(flags),
        name,
    })
}

fn read_dimensions(reader: &ElementReader, cursor: &mut Cursor<&[u8]>) -> Result<Vec<usize>> {
    let raw = reader.read_raw(cursor, "array dimensions")?;
    let dims = raw
        .as_i32()
        .ok_or_else(|| MatError::InvalidFormat("array dimensions must be int32".to_string()))?;
    let dimensions = dims
        .iter()
        .map(|&d| {
            usize::try_from(d)
                .map_err(|_| MatError::InvalidFormat(format!("negative array dimension {}", d)))
        })
        .collect::<Result<Vec<_>>>()?;
    utils::element_count(&dimensions)?;
    Ok(dimensions)
}

/// Every stored element starts with at least one 8-byte tag.
fn check_element_budget(cursor: &Cursor<&[u8]>, elements: usize, what: &str) -> Result<()> {
    let budget = utils::remaining(cursor) / ELEMENT_TAG_SIZE;
    if elements > budget {
        return Err(MatError::InvalidFormat(format!(
            "{} declares {} elements but only {} bytes remain",
            what,
            elements,
            utils::remaining(cursor)
        )));
    }
    Ok(())
}

fn read_name(
    reader: &ElementReader,
    cursor: &mut Cursor<&[u8]>,
    context: &'static str,
) -> Result<String> {
    let raw = reader.read_raw(cursor, context)?;
    let bytes = raw.name_bytes().ok_or_else(|| {
        MatError::InvalidFormat(format!("{} must be stored as 8-bit characters", context))
    })?;
    Ok(utils::decode_name(&bytes))
}

fn read_cell(
    reader: &ElementReader,
    cursor: &mut Cursor<&[u8]>,
    dimensions: Vec<usize>,
) -> Result<Array> {
    let count = utils::number_of_elements(&dimensions);
    check_element_budget(cursor, count, "cell array")?;
    let elements = (0..count)
        .map(|_| reader.read_array(cursor, "cell element"))
        .collect::<Result<Vec<_>>>()?;
    Ok(CellArray::new(dimensions, elements)?.into())
}

/// Reads the field name table that precedes struct and object values.
fn read_field_names(reader: &ElementReader, cursor: &mut Cursor<&[u8]>) -> Result<Vec<String>> {
    let length = reader.read_raw(cursor, "field name length")?;
    let length = length
        .as_i32()
        .and_then(|v| v.first().copied())
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| MatError::InvalidFormat("field name length must be int32".to_string()))?;

    let packed = reader.read_raw(cursor, "field names")?;
    let packed = packed
        .name_bytes()
        .ok_or_else(|| MatError::InvalidFormat("field names must be int8".to_string()))?;
    if length == 0 {
        return Ok(Vec::new());
    }
    Ok(packed.chunks_exact(length).map(utils::decode_name).collect())
}

/// Reads the values of every element, one value per field, element by element.
fn read_field_values(
    reader: &ElementReader,
    cursor: &mut Cursor<&[u8]>,
    count: usize,
    field_count: usize,
) -> Result<Vec<Vec<Array>>> {
    let values = count.checked_mul(field_count).ok_or_else(|| {
        MatError::InvalidFormat(format!("struct with {} elements and {} fields", count, field_count))
    })?;
    check_element_budget(cursor, values, "struct array")?;
    let mut fields: Vec<Vec<Array>> = (0..field_count).map(|_| Vec::new()).collect();
    if field_count == 0 {
        return Ok(fields);
    }
    for _ in 0..count {
        for values in fields.iter_mut() {
            values.push(reader.read_array(cursor, "struct field value")?);
        }
    }
    Ok(fields)
}

fn read_struct(
    reader: &ElementReader,
    cursor: &mut Cursor<&[u8]>,
    dimensions: Vec<usize>,
) -> Result<StructArray> {
    let field_names = read_field_names(reader, cursor)?;
    trace!("Struct fields: {:?}", field_names);
    let count = utils::number_of_elements(&dimensions);
    let fields = read_field_values(reader, cursor, count, field_names.len())?;
    StructArray::new(dimensions, field_names, fields)
}

/// Old-style object: a class name followed by a struct body.
fn read_object(
    reader: &ElementReader,
    cursor: &mut Cursor<&[u8]>,
    dimensions: Vec<usize>,
) -> Result<Array> {
    let class_name = read_name(reader, cursor, "object class name")?;
    let body = read_struct(reader, cursor, dimensions)?;
    let (dimensions, field_names, fields) = body.into_parts();

    let count = utils::number_of_elements(&dimensions);
    if field_names.is_empty() && count > cursor.get_ref().len() {
        return Err(MatError::InvalidFormat(format!(
            "fieldless object array declares {} elements",
            count
        )));
    }
    let mut instances: Vec<Vec<(String, Array)>> = (0..count).map(|_| Vec::new()).collect();
    for (name, values) in field_names.into_iter().zip(fields) {
        for (instance, value) in instances.iter_mut().zip(values) {
            instance.push((name.clone(), value));
        }
    }
    let instances = instances.into_iter().map(ObjectInstance::new).collect();
    Ok(MatObject::resolved(
        OBJECT_TYPE_DESCRIPTION.to_string(),
        class_name,
        dimensions,
        instances,
    )?
    .into())
}

fn read_sparse(
    reader: &ElementReader,
    cursor: &mut Cursor<&[u8]>,
    flags: &ArrayFlags,
    dimensions: Vec<usize>,
    nz_max: usize,
) -> Result<Array> {
    let row_index = reader.read_raw(cursor, "sparse row indices")?;
    let row_index = row_index.as_i32().ok_or_else(|| {
        MatError::InvalidFormat("sparse row indices must be int32".to_string())
    })?;
    let column_index = reader.read_raw(cursor, "sparse column indices")?;
    let column_index = column_index.as_i32().ok_or_else(|| {
        MatError::InvalidFormat("sparse column indices must be int32".to_string())
    })?;
    let data = reader.read_raw(cursor, "sparse values")?;

    let sparse = if flags.is_logical {
        let values = data.to_bool_vec();
        SparseArray::Logical(SparseMatrix::from_compressed_columns(
            &dimensions,
            row_index,
            column_index,
            nz_max,
            |j| values.get(j).copied(),
        )?)
    } else if flags.is_complex {
        let imaginary = reader.read_raw(cursor, "sparse imaginary values")?;
        let re = data.to_f64_vec();
        let im = imaginary.to_f64_vec();
        SparseArray::Complex(SparseMatrix::from_compressed_columns(
            &dimensions,
            row_index,
            column_index,
            nz_max,
            |j| Some(num_complex::Complex64::new(*re.get(j)?, *im.get(j)?)),
        )?)
    } else {
        match &data {
            RawData::Double(values) => SparseArray::Double(SparseMatrix::from_compressed_columns(
                &dimensions,
                row_index,
                column_index,
                nz_max,
                |j| values.get(j).copied(),
            )?),
            _ => {
                return Err(MatError::Unsupported(
                    "only double, complex double and logical sparse arrays are supported"
                        .to_string(),
                ))
            }
        }
    };
    Ok(sparse.into())
}

/// Reads the body of an opaque matrix: name, type description, class name, payload.
fn read_opaque(reader: &ElementReader, cursor: &mut Cursor<&[u8]>) -> Result<(String, Array)> {
    let name = read_name(reader, cursor, "object name")?;
    let type_description = read_name(reader, cursor, "object type description")?;
    let class_name = read_name(reader, cursor, "object class name")?;
    let data = reader.read_array(cursor, "object payload")?;
    debug!(
        "Opaque '{}': type='{}', class='{}'",
        name, type_description, class_name
    );

    let link = match data.as_numeric().map(|n| n.data()) {
        Some(NumericData::UInt32(words)) => Some(parse_link(words)?),
        _ => None,
    };
    let object = match link {
        Some((dimensions, object_ids, class_id)) => MatObject::link(
            type_description,
            class_name,
            dimensions,
            OpaqueLink {
                object_ids,
                class_id,
                raw: Box::new(data),
            },
        )?,
        None => MatObject::opaque(type_description, class_name, data),
    };
    Ok((name, object.into()))
}

/// Splits a link payload `[marker, ndims, dims..., object ids..., class id]`.
fn parse_link(words: &[u32]) -> Result<(Vec<usize>, Vec<u32>, u32)> {
    let truncated = || MatError::InvalidFormat("truncated object link".to_string());
    let ndims = *words.get(1).ok_or_else(truncated)? as usize;
    let dims_end = 2usize.checked_add(ndims).ok_or_else(truncated)?;
    let dimensions: Vec<usize> = words
        .get(2..dims_end)
        .ok_or_else(truncated)?
        .iter()
        .map(|&d| d as usize)
        .collect();
    let count = utils::element_count(&dimensions)?;
    let ids_end = dims_end.checked_add(count).ok_or_else(truncated)?;
    let object_ids = words.get(dims_end..ids_end).ok_or_else(truncated)?.to_vec();
    let class_id = *words.get(ids_end).ok_or_else(truncated)?;
    Ok((dimensions, object_ids, class_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_payload_is_split_into_parts() {
        let (dims, ids, class_id) = parse_link(&[0xDD00_0000, 2, 1, 2, 5, 6, 1]).unwrap();
        assert_eq!(dims, vec![1, 2]);
        assert_eq!(ids, vec![5, 6]);
        assert_eq!(class_id, 1);
        assert!(parse_link(&[0xDD00_0000, 2, 1, 2, 5]).is_err());
    }

    #[test]
    fn link_with_overflowing_dimensions_is_invalid() {
        let words = [0xDD00_0000, 3, u32::MAX, u32::MAX, u32::MAX, 1];
        assert!(matches!(parse_link(&words), Err(MatError::InvalidFormat(_))));
    }
}
