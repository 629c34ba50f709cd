//! Session configuration.

use std::path::PathBuf;

use crate::filesystem::fat::Limits;

/// Tunables of a [`Session`](super::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum count of records scanned in one directory, deleted ones included.
    pub max_dir_entries: usize,
    /// Maximum size in bytes of a file extracted by `get` or `read`.
    pub max_file_size: u64,
    /// Directory where `get` writes extracted files.
    pub output_dir: PathBuf,
    /// Enable the full validation of the boot sector on `open`.
    pub strict: bool,
}

impl SessionConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            max_dir_entries: self.max_dir_entries,
            max_file_size: self.max_file_size,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        let limits = Limits::default();

        Self {
            max_dir_entries: limits.max_dir_entries,
            max_file_size: limits.max_file_size,
            output_dir: PathBuf::from("."),
            strict: false,
        }
    }
}
