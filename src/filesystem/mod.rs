//! FAT32 image decoding: boot sector, allocation table, directory entries and file content.

pub mod bpb;
pub mod dir_entry;
pub mod fat;
pub mod fat_error;
pub mod reader;
