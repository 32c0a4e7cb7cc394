//! Wire format parsing layer for Level 5 MAT-files.
//!
//! # Module Organization
//!
//! - [`header`]: Parses the fixed 128-byte header
//! - [`element`]: Decodes tags and data elements
//! - `matrix`: Builds arrays from `miMATRIX` elements
//! - [`level5`]: Walks the top-level variables
//! - [`subsystem`]: Decodes subsystem data and resolves object links
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌─────────────────┐
//! │  Header (128)   │ ← header::parse()
//! ├─────────────────┤
//! │  Variable 1..n  │ ← level5::read_raw_variables()
//! │  (tagged,       │     → element::ElementReader::read()
//! │   compressed)   │
//! ├─────────────────┤
//! │  Subsystem data │ ← subsystem::SubsystemData::parse()
//! └─────────────────┘
//! ```

pub mod element;
pub mod header;
pub mod level5;
pub(crate) mod matrix;
pub mod subsystem;
