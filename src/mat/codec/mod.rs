//! Codec layer for element payloads.
//!
//! # Submodules
//!
//! - [`compression`][]: Inflation of `miCOMPRESSED` elements (zlib/deflate)
//! - [`numeric`][]: Raw element buffers and their conversion into typed arrays

pub mod compression;
pub mod numeric;
