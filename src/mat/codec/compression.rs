//! Decompression of `miCOMPRESSED` elements.
//!
//! A compressed element carries a complete zlib stream:
//! ```text
//! [2 bytes]  zlib header
//! [N bytes]  raw DEFLATE data
//! [4 bytes]  Adler-32 of the inflated bytes (big-endian)
//! ```

use std::io::Read;

use adler2::adler32_slice;
use byteorder::{BigEndian, ByteOrder};
use flate2::read::DeflateDecoder;
use log::{trace, warn};

use crate::mat::types::error::{MatError, Result};

const ZLIB_HEADER_SIZE: usize = 2;
const ADLER32_SIZE: usize = 4;

/// Inflates the payload of a compressed element.
///
/// When `verify_checksum` is set, a wrong trailing Adler-32 is an error;
/// otherwise it is only logged.
///
/// # Errors
/// Returns an error if the payload is too short to hold a zlib stream or the
/// DEFLATE data is corrupt.
pub fn inflate_element(payload: &[u8], verify_checksum: bool) -> Result<Vec<u8>> {
    if payload.len() < ZLIB_HEADER_SIZE + ADLER32_SIZE {
        return Err(MatError::InvalidFormat(format!(
            "compressed element of {} bytes is too short",
            payload.len()
        )));
    }
    let body_end = payload.len() - ADLER32_SIZE;
    let deflated = &payload[ZLIB_HEADER_SIZE..body_end];

    let mut inflated = Vec::with_capacity(deflated.len() * 4);
    DeflateDecoder::new(deflated)
        .read_to_end(&mut inflated)
        .map_err(|e| MatError::DecompressionError(format!("DEFLATE decoding failed: {}", e)))?;
    trace!(
        "Inflated compressed element: {} bytes -> {} bytes",
        deflated.len(),
        inflated.len()
    );

    let expected = BigEndian::read_u32(&payload[body_end..]);
    let actual = adler32_slice(&inflated);
    if expected != actual {
        if verify_checksum {
            return Err(MatError::ChecksumMismatch { expected, actual });
        }
        warn!(
            "Compressed element checksum mismatch: expected={:#010x}, actual={:#010x}",
            expected, actual
        );
    }

    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    use super::*;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn inflates_zlib_stream() {
        let data: Vec<u8> = (0..200u8).collect();
        assert_eq!(inflate_element(&zlib(&data), true).unwrap(), data);
    }

    #[test]
    fn checksum_is_only_enforced_on_request() {
        let mut stream = zlib(b"matrix payload");
        let last = stream.len() - 1;
        stream[last] ^= 0xFF;
        assert_eq!(inflate_element(&stream, false).unwrap(), b"matrix payload");
        assert!(matches!(
            inflate_element(&stream, true),
            Err(MatError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn rejects_truncated_stream() {
        assert!(matches!(
            inflate_element(&[0x78, 0x9c, 0x00], false),
            Err(MatError::InvalidFormat(_))
        ));
    }
}
