//! FAT directory entry structure and 8.3 name handling.
//!
//! Each directory entry is 32 bytes and contains the metadata of a file or directory: the
//! fixed-width 8.3 name, the attribute flags, the first cluster of its data and its size.
//! Timestamps are decoded but not interpreted.

use binread::{BinRead, BinReaderExt};
use bitflags::bitflags;
use getset::Getters;
use std::fmt;
use std::io;
use std::str::Utf8Error;

use super::fat_error::FATError;

/// Size in bytes of a directory entry record.
pub const DIR_ENTRY_SIZE: usize = 32;

/// First name byte marking the end of the live entries of a directory.
pub const END_MARKER: u8 = 0x00;

/// First name byte of a deleted entry.
pub const DELETED_MARKER: u8 = 0xE5;

/// Length of an 8.3 name on disk.
pub const SHORT_NAME_LEN: usize = 11;

bitflags! {
    /// Attribute flags of a directory entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;

        // Reserved bits are kept as read
        const _ = !0;
    }
}

impl fmt::Display for Attributes {
    /// Lists the set flags, e.g. `read only, archive flag`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Attributes, &str); 6] = [
            (Attributes::READ_ONLY, "read only"),
            (Attributes::HIDDEN, "hidden"),
            (Attributes::SYSTEM, "system"),
            (Attributes::VOLUME_ID, "volume id"),
            (Attributes::DIRECTORY, "subdirectory"),
            (Attributes::ARCHIVE, "archive flag"),
        ];

        let names: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

/// FAT directory entry structure.
///
/// # Fields
/// - `name`: 8.3 format filename (8 characters for name, 3 for extension)
/// - `attr`: File attributes (read-only, hidden, system, volume label, directory, archive)
/// - `fst_clus_hi`: High 16 bits of the first cluster number
/// - `fst_clus_lo`: Low 16 bits of the first cluster number
/// - `file_size`: Size of the file in bytes (0 for directories)
#[derive(BinRead, Debug, Clone, PartialEq, Eq, Getters)]
#[br(little)]
pub struct DirEntry {
    /// Filename in 8.3 format, space padded, without the dot
    #[get = "pub"]
    name: [u8; SHORT_NAME_LEN],
    /// File attributes byte
    #[br(map = |b: u8| Attributes::from_bits_retain(b))]
    #[get = "pub"]
    attr: Attributes,
    _n_t_res: u8,
    _crt_time_tenth: u8,
    _crt_time: u16,
    _crt_date: u16,
    _lst_acc_date: u16,
    /// High 16 bits of first cluster number
    fst_clus_hi: u16,
    _wrt_time: u16,
    _wrt_date: u16,
    /// Low 16 bits of first cluster number
    fst_clus_lo: u16,
    /// File size in bytes (0 for directories)
    #[get = "pub"]
    file_size: u32,
}

impl DirEntry {
    /// Creates a directory entry from a byte slice.
    ///
    /// # Parameters
    /// - `buf`: A byte slice starting with the 32 bytes of the record
    ///
    /// # Errors
    /// - `FATError::ImageTooSmall` if the slice is shorter than a record
    pub fn from_slice(buf: &[u8]) -> Result<Self, FATError> {
        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FATError::from)
    }

    /// Returns the complete first cluster number for this entry.
    ///
    /// Combines `fst_clus_hi` and `fst_clus_lo`: `(fst_clus_hi << 16) | fst_clus_lo`
    pub fn first_cluster(&self) -> u32 {
        (u32::from(self.fst_clus_hi) << 16) | u32::from(self.fst_clus_lo)
    }

    /// Checks if the directory attribute bit (0x10) is set.
    pub fn is_dir(&self) -> bool {
        self.attr.contains(Attributes::DIRECTORY)
    }

    /// Whether the entry shows up in a listing.
    ///
    /// Hidden, system and volume label entries are left out. Long name records carry all three
    /// of these bits and are left out as well.
    pub fn is_visible(&self) -> bool {
        !self
            .attr
            .intersects(Attributes::HIDDEN | Attributes::SYSTEM | Attributes::VOLUME_ID)
    }

    /// Checks if the on-disk name is exactly the given canonical 8.3 name.
    pub fn has_name(&self, canonical: &[u8; SHORT_NAME_LEN]) -> bool {
        &self.name == canonical
    }

    /// Returns the name in its usual `NAME.EXT` form.
    pub fn short_name(&self) -> String {
        match self.from_8_3_name() {
            Ok(name) => name,
            Err(_) => String::from_utf8_lossy(&self.name).trim_end().to_string(),
        }
    }

    fn from_8_3_name(&self) -> Result<String, Utf8Error> {
        let name = std::str::from_utf8(&self.name[0..8])?.trim_end();
        let ext = std::str::from_utf8(&self.name[8..11])?.trim_end();

        if ext.is_empty() {
            Ok(name.to_string())
        } else {
            Ok(format!("{name}.{ext}"))
        }
    }
}

impl fmt::Display for DirEntry {
    /// Emits the raw 11-byte name as stored on disk.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.name))
    }
}

/// Converts a user-typed name into the 11-byte on-disk form.
///
/// `.` and `..` map to the dot entries. Otherwise the part before the first `.` fills the 8-byte
/// base and the part after it the 3-byte extension; without a `.` the whole name fills the 11
/// bytes. Names are upper-cased and space padded. Trailing spaces of the input are ignored, so
/// converting an already converted name gives the same result.
///
/// # Errors
/// - `FATError::NameTooLong` if the base, the extension or the undotted name doesn't fit
pub fn to_canonical_name(input: &str) -> Result<[u8; SHORT_NAME_LEN], FATError> {
    let input = input.trim_end_matches(' ');
    let mut name = [b' '; SHORT_NAME_LEN];

    match input {
        "." => {
            name[0] = b'.';
            return Ok(name);
        }
        ".." => {
            name[..2].copy_from_slice(b"..");
            return Ok(name);
        }
        _ => {}
    }

    match input.split_once('.') {
        Some((base, ext)) => {
            if base.len() > 8 || ext.len() > 3 {
                return Err(FATError::NameTooLong(input.to_string()));
            }
            fill_upper(&mut name[..8], base);
            fill_upper(&mut name[8..], ext);
        }
        None => {
            if input.len() > SHORT_NAME_LEN {
                return Err(FATError::NameTooLong(input.to_string()));
            }
            fill_upper(&mut name, input);
        }
    }

    Ok(name)
}

fn fill_upper(field: &mut [u8], part: &str) {
    for (dst, src) in field.iter_mut().zip(part.bytes()) {
        *dst = src.to_ascii_uppercase();
    }
}
