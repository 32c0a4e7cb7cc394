use std::io::Read;

use log::{info, warn};

use super::format::element::ElementReader;
use super::format::{header, level5};
use super::types::error::{MatError, Result};
use super::types::file::MatFile;
use super::types::models::{HEADER_SIZE, VERSION_HDF5, VERSION_LEVEL5};

/// Options that control how a file is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Treat a wrong Adler-32 after a compressed element as an error instead of a warning.
    pub verify_checksums: bool,
    /// Run the subsystem post-pass that resolves object links.
    pub resolve_objects: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            resolve_objects: true,
        }
    }
}

impl ReadOptions {
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    pub fn resolve_objects(mut self, resolve: bool) -> Self {
        self.resolve_objects = resolve;
        self
    }
}

/// Reader for version 7.3 (HDF5-based) files.
///
/// The backend receives the complete file image, header included, and must
/// produce the same array model as the Level 5 path.
pub trait HdfBackend {
    fn read(&self, image: &[u8]) -> Result<MatFile>;
}

/// The main reader for MAT-files.
///
/// Reads the header first and fails before touching the rest of the stream
/// if it is not a little-endian Level 5 or HDF5 file. The stream is then
/// consumed to the end and decoded in memory.
pub struct MatFileReader<R: Read> {
    reader: R,
    options: ReadOptions,
    hdf_backend: Option<Box<dyn HdfBackend>>,
}

impl<R: Read> MatFileReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ReadOptions::default())
    }

    pub fn with_options(reader: R, options: ReadOptions) -> Self {
        Self {
            reader,
            options,
            hdf_backend: None,
        }
    }

    /// Installs the reader used for HDF5-based files.
    pub fn with_hdf_backend(mut self, backend: Box<dyn HdfBackend>) -> Self {
        self.hdf_backend = Some(backend);
        self
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Reads the whole stream.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The stream fails or ends inside the header or an element
    /// - The header endian indicator or version is not supported
    /// - An element is malformed or uses an unsupported feature
    /// - The file is HDF5-based and no backend is installed
    pub fn read(mut self) -> Result<MatFile> {
        let mut header_bytes = vec![0u8; HEADER_SIZE];
        self.reader
            .read_exact(&mut header_bytes)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::UnexpectedEof => MatError::UnexpectedEof {
                    context: "file header",
                },
                _ => MatError::Io(e),
            })?;
        let header = header::parse(&header_bytes)?;

        let mut image = header_bytes;
        self.reader.read_to_end(&mut image)?;
        info!("Read {} bytes", image.len());

        match header.version {
            VERSION_LEVEL5 => {
                let elements = ElementReader::new(self.options.verify_checksums);
                level5::read(&image, &header, &elements, self.options.resolve_objects)
            }
            VERSION_HDF5 => match &self.hdf_backend {
                Some(backend) => {
                    info!("Delegating HDF5-based file to the installed backend");
                    backend.read(&image)
                }
                None => {
                    warn!("HDF5-based file and no HDF5 backend installed");
                    Err(MatError::Unsupported(
                        "HDF5-based (v7.3) files need an HDF5 backend".to_string(),
                    ))
                }
            },
            other => Err(MatError::UnsupportedVersion(other)),
        }
    }
}
