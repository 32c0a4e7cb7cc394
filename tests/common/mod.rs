//! A small Level 5 writer used to build test files in memory.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

pub const MI_INT8: u32 = 1;
pub const MI_UINT8: u32 = 2;
pub const MI_INT16: u32 = 3;
pub const MI_UINT16: u32 = 4;
pub const MI_INT32: u32 = 5;
pub const MI_UINT32: u32 = 6;
pub const MI_SINGLE: u32 = 7;
pub const MI_DOUBLE: u32 = 9;
pub const MI_INT64: u32 = 12;
pub const MI_UINT64: u32 = 13;
pub const MI_MATRIX: u32 = 14;
pub const MI_COMPRESSED: u32 = 15;
pub const MI_UTF8: u32 = 16;
pub const MI_UTF16: u32 = 17;

pub const MX_CELL: u8 = 1;
pub const MX_STRUCT: u8 = 2;
pub const MX_OBJECT: u8 = 3;
pub const MX_CHAR: u8 = 4;
pub const MX_SPARSE: u8 = 5;
pub const MX_DOUBLE: u8 = 6;
pub const MX_SINGLE: u8 = 7;
pub const MX_INT8: u8 = 8;
pub const MX_UINT8: u8 = 9;
pub const MX_INT16: u8 = 10;
pub const MX_UINT16: u8 = 11;
pub const MX_INT32: u8 = 12;
pub const MX_UINT32: u8 = 13;
pub const MX_INT64: u8 = 14;
pub const MX_UINT64: u8 = 15;
pub const MX_OPAQUE: u8 = 17;

pub const COMPLEX: u32 = 0x0800;
pub const GLOBAL: u32 = 0x0400;
pub const LOGICAL: u32 = 0x0200;

pub const LINK_MARKER: u32 = 0xDD00_0000;
pub const FIELD_NAME_LENGTH: usize = 32;

const LITTLE_ENDIAN_MARKER: u16 = 0x4D49;

pub fn u32s(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn u16s(values: &[u16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

pub fn f64s(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn pad8(bytes: &mut Vec<u8>) {
    while bytes.len() % 8 != 0 {
        bytes.push(0);
    }
}

/// An element with a normal 8-byte tag, padded to 8 bytes.
pub fn element(data_type: u32, payload: &[u8]) -> Vec<u8> {
    let mut bytes = u32s(&[data_type, payload.len() as u32]);
    bytes.extend_from_slice(payload);
    pad8(&mut bytes);
    bytes
}

/// An element with a compact 4-byte tag; `payload` holds at most 4 bytes.
pub fn compact(data_type: u32, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= 4, "compact payload too long");
    let word = ((payload.len() as u32) << 16) | data_type;
    let mut bytes = word.to_le_bytes().to_vec();
    bytes.extend_from_slice(payload);
    pad8(&mut bytes);
    bytes
}

/// Wraps one element in a `miCOMPRESSED` element.
pub fn compressed(inner: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(inner).expect("compress");
    let stream = encoder.finish().expect("finish compression");
    let mut bytes = u32s(&[MI_COMPRESSED, stream.len() as u32]);
    bytes.extend_from_slice(&stream);
    bytes
}

pub fn header_with(version: u16, marker: u16, subsystem_offset: u64) -> Vec<u8> {
    let mut bytes = vec![b' '; 128];
    let text = b"MATLAB 5.0 MAT-file, written by the test suite";
    bytes[..text.len()].copy_from_slice(text);
    bytes[116..124].copy_from_slice(&subsystem_offset.to_le_bytes());
    bytes[124..126].copy_from_slice(&version.to_le_bytes());
    bytes[126..128].copy_from_slice(&marker.to_le_bytes());
    bytes
}

pub fn header() -> Vec<u8> {
    header_with(0x0100, LITTLE_ENDIAN_MARKER, 0)
}

/// A complete Level 5 file image.
pub fn file(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut bytes = header();
    for element in elements {
        bytes.extend_from_slice(element);
    }
    bytes
}

/// A complete file whose last element is the subsystem data.
pub fn file_with_subsystem(elements: &[Vec<u8>], subsystem: &[u8]) -> Vec<u8> {
    let offset = 128 + elements.iter().map(Vec::len).sum::<usize>();
    let mut bytes = header_with(0x0100, LITTLE_ENDIAN_MARKER, offset as u64);
    for element in elements {
        bytes.extend_from_slice(element);
    }
    bytes.extend_from_slice(subsystem);
    bytes
}

fn name_element(name: &str) -> Vec<u8> {
    if name.len() <= 4 && !name.is_empty() {
        compact(MI_INT8, name.as_bytes())
    } else {
        element(MI_INT8, name.as_bytes())
    }
}

fn matrix_element(parts: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = parts.concat();
    element(MI_MATRIX, &body)
}

fn flags_element(class: u8, flag_bits: u32, nz_max: u32) -> Vec<u8> {
    element(MI_UINT32, &u32s(&[u32::from(class) | flag_bits, nz_max]))
}

/// A matrix element: flags, dimensions, name, then `body`.
pub fn matrix(class: u8, flag_bits: u32, dims: &[i32], name: &str, body: &[Vec<u8>]) -> Vec<u8> {
    let mut parts = vec![
        flags_element(class, flag_bits, 0),
        element(MI_INT32, &i32s(dims)),
        name_element(name),
    ];
    parts.extend_from_slice(body);
    matrix_element(&parts)
}

/// The empty matrix: a matrix tag with length 0.
pub fn empty_matrix() -> Vec<u8> {
    u32s(&[MI_MATRIX, 0])
}

pub fn double_matrix(name: &str, dims: &[i32], values: &[f64]) -> Vec<u8> {
    matrix(MX_DOUBLE, 0, dims, name, &[element(MI_DOUBLE, &f64s(values))])
}

pub fn char_matrix(name: &str, text: &str) -> Vec<u8> {
    let units: Vec<u16> = text.encode_utf16().collect();
    matrix(
        MX_CHAR,
        0,
        &[1, units.len() as i32],
        name,
        &[element(MI_UINT16, &u16s(&units))],
    )
}

pub fn cell_matrix(name: &str, dims: &[i32], cells: &[Vec<u8>]) -> Vec<u8> {
    matrix(MX_CELL, 0, dims, name, cells)
}

fn field_names_elements(fields: &[&str]) -> Vec<Vec<u8>> {
    let mut packed = Vec::new();
    for field in fields {
        let mut bytes = field.as_bytes().to_vec();
        bytes.resize(FIELD_NAME_LENGTH, 0);
        packed.extend(bytes);
    }
    vec![
        compact(MI_INT32, &i32s(&[FIELD_NAME_LENGTH as i32])),
        element(MI_INT8, &packed),
    ]
}

/// A struct matrix; `values` are ordered element by element, fields inner.
pub fn struct_matrix(name: &str, dims: &[i32], fields: &[&str], values: &[Vec<u8>]) -> Vec<u8> {
    let mut body = field_names_elements(fields);
    body.extend_from_slice(values);
    matrix(MX_STRUCT, 0, dims, name, &body)
}

/// An old-style object matrix.
pub fn object_matrix(
    name: &str,
    dims: &[i32],
    class_name: &str,
    fields: &[&str],
    values: &[Vec<u8>],
) -> Vec<u8> {
    let mut body = vec![name_element(class_name)];
    body.extend(field_names_elements(fields));
    body.extend_from_slice(values);
    matrix(MX_OBJECT, 0, dims, name, &body)
}

/// A sparse matrix from compressed-column data.
pub fn sparse_matrix(
    name: &str,
    dims: &[i32],
    flag_bits: u32,
    ir: &[i32],
    jc: &[i32],
    data: Vec<u8>,
    imaginary: Option<Vec<u8>>,
) -> Vec<u8> {
    let mut parts = vec![
        flags_element(MX_SPARSE, flag_bits, ir.len() as u32),
        element(MI_INT32, &i32s(dims)),
        name_element(name),
        element(MI_INT32, &i32s(ir)),
        element(MI_INT32, &i32s(jc)),
        data,
    ];
    parts.extend(imaginary);
    matrix_element(&parts)
}

/// An opaque matrix: flags, name, type description, class name, payload.
pub fn opaque_matrix(name: &str, type_description: &str, class_name: &str, payload: Vec<u8>) -> Vec<u8> {
    matrix_element(&[
        flags_element(MX_OPAQUE, 0, 0),
        name_element(name),
        name_element(type_description),
        name_element(class_name),
        payload,
    ])
}

/// A uint32 matrix holding an object link.
pub fn link_payload(dims: &[u32], object_ids: &[u32], class_id: u32) -> Vec<u8> {
    let mut words = vec![LINK_MARKER, dims.len() as u32];
    words.extend_from_slice(dims);
    words.extend_from_slice(object_ids);
    words.push(class_id);
    matrix(
        MX_UINT32,
        0,
        &[words.len() as i32, 1],
        "",
        &[element(MI_UINT32, &u32s(&words))],
    )
}

/// An `MCOS` object link variable.
pub fn link_variable(name: &str, class_name: &str, dims: &[u32], object_ids: &[u32], class_id: u32) -> Vec<u8> {
    opaque_matrix(name, "MCOS", class_name, link_payload(dims, object_ids, class_id))
}

/// Object tables of the subsystem metadata blob.
#[derive(Default)]
pub struct Metadata<'a> {
    pub names: &'a [&'a str],
    /// `(package name index, class name index)`, class ids start at 1.
    pub classes: &'a [(u32, u32)],
    /// `[class id, type-1 position, type-2 position, object id]`.
    pub objects: &'a [[u32; 4]],
    /// Type-1 property blocks of `[name index, kind, value]`.
    pub type1: &'a [&'a [[u32; 3]]],
    /// Type-2 property blocks of `[name index, kind, value]`.
    pub type2: &'a [&'a [[u32; 3]]],
}

fn property_region(blocks: &[&[[u32; 3]]]) -> Vec<u8> {
    let mut bytes = vec![0u8; 8];
    for block in blocks {
        let mut b = u32s(&[block.len() as u32]);
        for entry in *block {
            b.extend(u32s(entry));
        }
        pad8(&mut b);
        bytes.extend(b);
    }
    bytes
}

impl Metadata<'_> {
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut names = Vec::new();
        for name in self.names {
            names.extend_from_slice(name.as_bytes());
            names.push(0);
        }
        pad8(&mut names);

        let mut classes = vec![0u8; 16];
        for (package, name) in self.classes {
            classes.extend(u32s(&[*package, *name, 0, 0]));
        }
        let mut objects = vec![0u8; 24];
        for [class_id, type1, type2, object_id] in self.objects {
            objects.extend(u32s(&[*class_id, 0, 0, *type1, *type2, *object_id]));
        }
        let regions = [
            classes,
            property_region(self.type1),
            objects,
            property_region(self.type2),
        ];

        let mut offsets = [0u32; 8];
        let mut position = 40 + names.len();
        offsets[0] = position as u32;
        for (k, region) in regions.iter().enumerate() {
            position += region.len();
            offsets[k + 1] = position as u32;
        }
        for offset in offsets.iter_mut().skip(regions.len() + 1) {
            *offset = position as u32;
        }

        let mut bytes = u32s(&[2, self.names.len() as u32]);
        bytes.extend(u32s(&offsets));
        bytes.extend(names);
        for region in regions {
            bytes.extend(region);
        }
        bytes
    }
}

pub fn uint8_matrix(name: &str, bytes: &[u8]) -> Vec<u8> {
    matrix(MX_UINT8, 0, &[bytes.len() as i32, 1], name, &[element(MI_UINT8, bytes)])
}

/// The subsystem data element.
///
/// `values` become cells 2.. of the object wrapper, so a kind-1 property with
/// value `v` refers to `values[v]`.
pub fn subsystem(metadata: &Metadata, values: &[Vec<u8>]) -> Vec<u8> {
    let mut cells = vec![uint8_matrix("", &metadata.to_bytes()), empty_matrix()];
    cells.extend_from_slice(values);
    let wrapper_cells = cell_matrix("", &[cells.len() as i32, 1], &cells);
    let wrapper = opaque_matrix("", "MCOS", "FileWrapper__", wrapper_cells);
    let root = struct_matrix("", &[1, 1], &["MCOS"], &[wrapper]);

    let mut blob = vec![0x00, 0x01, b'I', b'M', 0, 0, 0, 0];
    blob.extend(root);
    uint8_matrix("", &blob)
}
