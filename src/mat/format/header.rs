//! MAT-file header parsing.

use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::UTF_8;
use log::{debug, info};

use crate::mat::types::error::{MatError, Result};
use crate::mat::types::models::{
    Header, BIG_ENDIAN_MARKER, HEADER_SIZE, LITTLE_ENDIAN_MARKER, VERSION_HDF5, VERSION_LEVEL5,
};

const TEXT_END: usize = 116;
const SUBSYSTEM_OFFSET_END: usize = 124;
const VERSION_END: usize = 126;

/// Parses the fixed 128-byte header.
///
/// # Header Structure
/// ```text
/// [116 bytes] Descriptive text
/// [8 bytes]   Subsystem data offset (i64, spaces or zeros when absent)
/// [2 bytes]   Version (0x0100 Level 5, 0x0200 HDF5)
/// [2 bytes]   Endian indicator ("IM" on little-endian files)
/// ```
///
/// The endian indicator is checked before anything else is interpreted.
///
/// # Errors
/// Returns an error if `bytes` is shorter than the header, the endian
/// indicator is wrong or the version is unknown.
pub fn parse(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(MatError::UnexpectedEof { context: "file header" });
    }
    let raw = &bytes[..HEADER_SIZE];

    // Step 1: Endianness
    let marker = LittleEndian::read_u16(&raw[VERSION_END..HEADER_SIZE]);
    match marker {
        LITTLE_ENDIAN_MARKER => {}
        BIG_ENDIAN_MARKER => return Err(MatError::BigEndian),
        other => return Err(MatError::InvalidEndianMarker(other)),
    }

    // Step 2: Version
    let version = LittleEndian::read_u16(&raw[SUBSYSTEM_OFFSET_END..VERSION_END]);
    if version != VERSION_LEVEL5 && version != VERSION_HDF5 {
        return Err(MatError::UnsupportedVersion(version));
    }

    // Step 3: Subsystem offset, which MATLAB fills with spaces when there is none
    let offset_bytes = &raw[TEXT_END..SUBSYSTEM_OFFSET_END];
    let subsystem_offset = if offset_bytes.iter().all(|&b| b == b' ') {
        0
    } else {
        LittleEndian::read_i64(offset_bytes)
    };
    debug!("Subsystem data offset: {}", subsystem_offset);

    // Step 4: Text
    let (text, _) = UTF_8.decode_without_bom_handling(&raw[..TEXT_END]);
    let text = text.trim_end_matches(|c: char| c == ' ' || c == '\0').to_string();

    info!("Header parsed: version={:#06x}, text='{}'", version, text);

    Ok(Header {
        raw: raw.to_vec(),
        text,
        subsystem_offset,
        version,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(version: u16, marker: u16) -> Vec<u8> {
        let mut bytes = vec![b' '; HEADER_SIZE];
        bytes[..12].copy_from_slice(b"MATLAB 5.0 M");
        bytes[124..126].copy_from_slice(&version.to_le_bytes());
        bytes[126..128].copy_from_slice(&marker.to_le_bytes());
        bytes
    }

    #[test]
    fn parses_level5_header() {
        let parsed = parse(&header(VERSION_LEVEL5, LITTLE_ENDIAN_MARKER)).unwrap();
        assert_eq!(parsed.version, VERSION_LEVEL5);
        assert_eq!(parsed.text, "MATLAB 5.0 M");
        assert_eq!(parsed.subsystem_position(), None);
    }

    #[test]
    fn endian_marker_is_checked_before_version() {
        assert!(matches!(
            parse(&header(0x0300, BIG_ENDIAN_MARKER)),
            Err(MatError::BigEndian)
        ));
        assert!(matches!(
            parse(&header(0x0300, 0x1234)),
            Err(MatError::InvalidEndianMarker(0x1234))
        ));
        assert!(matches!(
            parse(&header(0x0300, LITTLE_ENDIAN_MARKER)),
            Err(MatError::UnsupportedVersion(0x0300))
        ));
    }
}
