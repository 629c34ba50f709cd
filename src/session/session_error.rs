//! Error types for session and command handling.
//!
//! Every error is reported at the command boundary and leaves the session unchanged.

use std::io;
use thiserror;

use crate::filesystem::fat_error::FATError;

/// Represents errors that can occur while running a command.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// `open` was issued while an image is open.
    #[error("File system image already open.")]
    AlreadyOpen,
    /// A command needing an image was issued with no image open.
    #[error("File system image must be open first.")]
    NotOpen,
    /// The image file doesn't exist.
    #[error("File system image not found: `{0}`")]
    ImageNotFound(String),
    /// The image file exists but couldn't be opened or read.
    #[error("Cannot read file system image `{path}`: {source}")]
    ImageUnreadable { path: String, source: io::Error },
    /// `cd` on a name that is not a subdirectory of the current directory.
    #[error("No such directory: `{0}`")]
    InvalidDirectoryTarget(String),
    /// Ascending from the root directory.
    #[error("Currently in root directory.")]
    AlreadyAtRoot,
    /// Missing or malformed positional arguments.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    /// The boot sector carries no volume label.
    #[error("Volume name not found.")]
    VolumeLabelNotSet,
    /// The extracted file couldn't be written.
    #[error("Failed to write `{path}`: {source}")]
    OutputFile { path: String, source: io::Error },
    /// Errors while reading the image.
    #[error("{0}")]
    FAT(FATError),
}

impl SessionError {
    /// Whether the error leaves the open image unusable and should end the process.
    ///
    /// Failures while opening an image leave no image open and are never fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::FAT(FATError::IOError(_)))
    }
}

/// Converts image errors into SessionError.
impl From<FATError> for SessionError {
    fn from(err: FATError) -> Self {
        SessionError::FAT(err)
    }
}
