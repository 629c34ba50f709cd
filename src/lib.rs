//!
//! FAT Navigator: a library and CLI for browsing FAT32 volume images without mounting them.
//!
//! This crate provides tools for:
//! - Parsing the boot sector of a FAT32 image into its geometry
//! - Following cluster chains through the File Allocation Table
//! - Decoding directory entries and 8.3 names
//! - Navigating the directory hierarchy and extracting file contents
//!
//! The image is only ever read. The library is used by the interactive `main` binary and can be
//! used on its own through [`Session`] or, for any `Read + Seek` image, through [`FATVol`].
//!
//! # Re-exports
//! - [`FATVol`]: FAT32 volume abstraction
//! - [`Session`]: Open image, navigation stack and command operations
//! - [`SessionConfig`]: Tunables of a session

pub mod commands;
pub mod filesystem;
pub mod navigation;
pub mod session;
pub mod utils;

/// FAT32 volume abstraction (see [`filesystem::fat::FATVol`]).
pub use crate::filesystem::fat::FATVol;
/// Errors while reading an image (see [`filesystem::fat_error::FATError`]).
pub use crate::filesystem::fat_error::FATError;
/// Session over one open image (see [`session::Session`]).
pub use crate::session::{Session, SessionConfig, SessionError};
