//! Error types for FAT32 image decoding and navigation.
//!
//! This module defines the errors that can occur while parsing the boot sector, translating
//! cluster numbers, walking cluster chains, decoding directory entries and extracting file data.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading a FAT32 image.
#[derive(Error, Debug)]
pub enum FATError {
    /// A read ran past the end of the image file.
    #[error("Image too small: a read ran past the end of the image.")]
    ImageTooSmall,

    /// The boot sector describes an unusable geometry (e.g. zero bytes per sector).
    #[error("Invalid volume geometry: {0}")]
    InvalidGeometry(String),

    /// Clusters 0 and 1 are reserved, the data area starts at cluster 2.
    #[error("Invalid cluster number `{0}`. Data clusters start at 2.")]
    InvalidCluster(u32),

    /// A cluster chain loops, links to a reserved or bad cluster, or is longer than the volume.
    #[error("Corrupt cluster chain: {0}")]
    CorruptChain(String),

    /// A name does not fit the 8.3 layout.
    #[error("Name too long for an 8.3 entry: `{0}`")]
    NameTooLong(String),

    /// No live entry of the current directory carries that name.
    #[error("File not found: `{0}`")]
    NameNotFound(String),

    /// File content was requested for a directory entry.
    #[error("`{0}` is a directory")]
    IsDirectory(String),

    /// The requested byte range does not lie within the file.
    #[error("Range out of bounds: {length} bytes at position {start} in a {size}-byte file")]
    RangeOutOfBounds { start: i64, length: i64, size: u32 },

    /// The file is bigger than the configured extraction ceiling.
    #[error("File too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    /// Underlying I/O errors that occur while reading the image.
    #[error("IO Error: `{0}`")]
    IOError(io::Error),

    /// Parsing error occured during structure initialization
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),
}

/// Converts standard I/O errors into FATError.
///
/// Hitting the end of the image is reported as [`FATError::ImageTooSmall`].
impl From<io::Error> for FATError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => FATError::ImageTooSmall,
            _ => FATError::IOError(err),
        }
    }
}

/// Converts BinRead errors into FATError.
impl From<binread::Error> for FATError {
    fn from(err: binread::Error) -> Self {
        match err {
            binread::Error::Io(io_err) => FATError::from(io_err),
            other => FATError::BinReadError(other),
        }
    }
}
