//! FAT32 boot sector (BIOS Parameter Block).
//!
//! This module implements:
//! - Boot sector parsing into the volume geometry
//! - Derivation of the FAT and data region offsets
//! - Geometry checks, and optional strict validation according to Microsoft's FAT specification

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use log::debug;
use std::fmt;
use std::io::{self, SeekFrom};

use super::fat_error::FATError;
use crate::utils;

/// Offset of the volume label inside the boot sector.
const VOL_LAB_OFFSET: u64 = 43;

/// Count of boot sector bytes covered by the fields below.
const BPB_LEN: usize = 54;

/// BIOS Parameter Block structure of a FAT32 volume.
///
/// Only the fields needed to navigate the volume are decoded. The struct is immutable once
/// parsed and every derived offset is computed from it on demand.
#[derive(BinRead, Debug, Clone, Getters)]
#[br(little)]
pub struct Bpb {
    /// Jump instruction to boot code (must be 0xEB ?? 0x90 or 0xE9 ?? ??)
    jmp: [u8; 3],
    /// OEM identifier (e.g., "MSWIN4.1")
    #[get = "pub"]
    oem_name: [u8; 8],
    /// Number of bytes per sector
    #[get = "pub"]
    bytes_per_sec: u16,
    /// Number of sectors per cluster
    #[get = "pub"]
    sec_per_clus: u8,
    /// Number of reserved sectors from start of volume
    #[get = "pub"]
    rsvd_sec_cnt: u16,
    /// Number of FAT copies
    #[get = "pub"]
    num_fat: u8,
    /// Maximum number of root directory entries (0 for FAT32)
    root_ent_cnt: u16,
    /// Total sectors for volumes < 32MB (0 for FAT32)
    tot_sec_16: u16,
    _media: u8,
    /// Sectors per FAT for FAT12/FAT16 (0 for FAT32)
    fat_sz_16: u16,
    _sec_per_trk: u16,
    _num_heads: u16,
    _hidd_sec: u32,
    /// Total sectors of the volume
    #[get = "pub"]
    tot_sec_32: u32,

    // FAT32-specific fields
    /// Sectors per FAT
    #[get = "pub"]
    fat_sz_32: u32,
    _ext_flags: u16,
    _fs_ver: u16,
    /// First cluster of root directory (typically 2)
    #[get = "pub"]
    root_clus: u32,
    /// Volume label
    #[br(seek_before = SeekFrom::Start(VOL_LAB_OFFSET))]
    #[get = "pub"]
    vol_lab: [u8; 11],
}

impl Bpb {
    /// Reads the Bpb from the start of an image and checks its geometry.
    ///
    /// # Parameters
    /// - `image`: The FAT32 volume image
    /// - `strict`: Whether to perform the full FAT32 validation checks
    ///
    /// # Errors
    /// - `FATError::ImageTooSmall` if the image ends inside the boot sector fields
    /// - `FATError::InvalidGeometry` if bytes per sector or sectors per cluster is zero, or if
    ///   `strict` is set and any validation check fails
    pub fn from<T: io::Read + io::Seek>(image: &mut T, strict: bool) -> Result<Bpb, FATError> {
        let mut buf = vec![0; BPB_LEN];
        utils::read_at(image, 0, &mut buf)?;

        let mut reader = io::Cursor::new(buf);
        let bpb: Bpb = reader.read_le()?;

        debug!(
            "Boot sector: {} bytes/sector, {} sectors/cluster, {} reserved, {} FAT(s) of {} sectors, root cluster {}",
            bpb.bytes_per_sec, bpb.sec_per_clus, bpb.rsvd_sec_cnt, bpb.num_fat, bpb.fat_sz_32, bpb.root_clus
        );

        let bpb = bpb.check_geometry()?;
        if strict { bpb.validate() } else { Ok(bpb) }
    }

    /// Size of a cluster in bytes.
    pub fn cluster_size(&self) -> u64 {
        u64::from(self.bytes_per_sec) * u64::from(self.sec_per_clus)
    }

    /// Byte offset of the first FAT.
    pub fn fat_start(&self) -> u64 {
        u64::from(self.bytes_per_sec) * u64::from(self.rsvd_sec_cnt)
    }

    /// Byte offset of the data region, i.e. of cluster 2.
    pub fn data_start(&self) -> u64 {
        self.fat_start()
            + u64::from(self.num_fat) * u64::from(self.fat_sz_32) * u64::from(self.bytes_per_sec)
    }

    /// Determines the number of clusters in the data region from the sector counts.
    ///
    /// Returns 0 if the total sector count doesn't cover the reserved and FAT regions.
    pub fn cluster_count(&self) -> u32 {
        let meta_sec = u32::from(self.rsvd_sec_cnt)
            .saturating_add(u32::from(self.num_fat).saturating_mul(self.fat_sz_32));

        self.tot_sec_32.saturating_sub(meta_sec) / u32::from(self.sec_per_clus).max(1)
    }

    /// Checks the invariants every other computation relies on.
    fn check_geometry(self) -> Result<Self, FATError> {
        if self.bytes_per_sec == 0 {
            return Err(FATError::InvalidGeometry(String::from(
                "BPB_BytsPerSec must be greater than 0.",
            )));
        }

        if self.sec_per_clus == 0 {
            return Err(FATError::InvalidGeometry(String::from(
                "BPB_SecPerClus must be greater than 0.",
            )));
        }

        Ok(self)
    }

    /// Validates the Bpb according to FAT32 specification requirements.
    ///
    /// # Errors
    /// Returns `FATError::InvalidGeometry` describing the first check that failed.
    fn validate(self) -> Result<Self, FATError> {
        if !((self.jmp[0] == 0xEB && self.jmp[2] == 0x90) || self.jmp[0] == 0xE9) {
            return Err(FATError::InvalidGeometry(format!(
                "Invalid jump instruction 0x{:02X}{:02X}{:02X}",
                self.jmp[0], self.jmp[1], self.jmp[2],
            )));
        }

        const VALID_BYTES_PER_SEC: [u16; 4] = [512, 1024, 2048, 4096];
        if !VALID_BYTES_PER_SEC.contains(&self.bytes_per_sec) {
            return Err(FATError::InvalidGeometry(format!(
                "Invalid count of bytes per sector: `{}`. Legal values: 512, 1024, 2048 or 4096",
                self.bytes_per_sec
            )));
        }

        const VALID_SEC_PER_CLUS: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
        if !VALID_SEC_PER_CLUS.contains(&self.sec_per_clus) {
            return Err(FATError::InvalidGeometry(format!(
                "Invalid number of sector per cluster: `{}`. Legal values: 1, 2, 4, 8, 16, 32, 64, 128",
                self.sec_per_clus
            )));
        }

        if self.cluster_size() > 32 * 1024 {
            return Err(FATError::InvalidGeometry(format!(
                "Invalid cluster size: `{}`. Any value greater than 32K is invalid.",
                self.cluster_size()
            )));
        }

        if self.rsvd_sec_cnt == 0 {
            return Err(FATError::InvalidGeometry(String::from(
                "BPB_RsvdSecCnt must be greater than 0.",
            )));
        }

        if self.num_fat == 0 {
            return Err(FATError::InvalidGeometry(String::from(
                "BPB_NumFATs must be greater than 0.",
            )));
        }

        if self.root_ent_cnt != 0 || self.tot_sec_16 != 0 || self.fat_sz_16 != 0 {
            return Err(FATError::InvalidGeometry(String::from(
                "BPB_RootEntCnt, BPB_TotSec16 and BPB_FATSz16 must be 0 for a FAT32 volume.",
            )));
        }

        if self.fat_sz_32 == 0 {
            return Err(FATError::InvalidGeometry(String::from(
                "BPB_FATSz32 should be greater than 0 for a FAT32 volume.",
            )));
        }

        if self.root_clus < 2 {
            return Err(FATError::InvalidGeometry(format!(
                "Invalid first cluster of the root directory: `{}`. This value should be at least 2.",
                self.root_clus
            )));
        }

        Ok(self)
    }
}

/// Displays the geometry fields in hexadecimal and decimal.
impl fmt::Display for Bpb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! field {
            ($name:expr, $val:expr) => {{
                let val = u64::from($val);
                writeln!(f, "  {:<16} 0x{:<10X} {}", $name, val, val)?;
            }};
        }

        writeln!(f, "  {:<16} {:<12} {}", "", "hex", "dec")?;
        field!("BPB_BytsPerSec", self.bytes_per_sec);
        field!("BPB_SecPerClus", self.sec_per_clus);
        field!("BPB_RsvdSecCnt", self.rsvd_sec_cnt);
        field!("BPB_NumFATs", self.num_fat);
        field!("BPB_FATSz32", self.fat_sz_32);
        field!("BPB_RootClus", self.root_clus);
        field!("BPB_TotSec32", self.tot_sec_32);

        Ok(())
    }
}
