//! Synthetic FAT32 images for the integration tests.

use std::fs;
use std::path::PathBuf;

pub const BPS: usize = 512;

/// Attribute bytes used by the tests.
pub const ARCHIVE: u8 = 0x20;
pub const DIRECTORY: u8 = 0x10;
pub const HIDDEN: u8 = 0x02;

/// A FAT32 image with 512-byte sectors, one sector per cluster, one reserved sector, one FAT of
/// one sector and the root directory at cluster 2.
pub struct Image {
    pub bytes: Vec<u8>,
}

impl Image {
    pub fn new(cluster_cnt: u32) -> Self {
        let tot_sec = 2 + cluster_cnt;
        let mut bytes = vec![0u8; tot_sec as usize * BPS];

        bytes[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        bytes[3..11].copy_from_slice(b"MSWIN4.1");
        bytes[11..13].copy_from_slice(&(BPS as u16).to_le_bytes());
        bytes[13] = 1;
        bytes[14..16].copy_from_slice(&1u16.to_le_bytes());
        bytes[16] = 1;
        bytes[32..36].copy_from_slice(&tot_sec.to_le_bytes());
        bytes[36..40].copy_from_slice(&1u32.to_le_bytes());
        bytes[44..48].copy_from_slice(&2u32.to_le_bytes());
        bytes[510..512].copy_from_slice(&[0x55, 0xAA]);

        let mut image = Self { bytes };
        image.set_fat(0, 0x0FFF_FFF8);
        image.set_fat(1, 0x0FFF_FFFF);
        image.set_fat(2, 0x0FFF_FFFF);
        image
    }

    pub fn set_fat(&mut self, cluster: u32, value: u32) {
        let off = BPS + cluster as usize * 4;
        self.bytes[off..off + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Links the clusters into one chain ending with an end-of-chain marker.
    pub fn chain(&mut self, clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.set_fat(*last, 0x0FFF_FFFF);
        }
    }

    pub fn cluster_off(cluster: u32) -> usize {
        2 * BPS + (cluster as usize - 2) * BPS
    }

    pub fn write_cluster(&mut self, cluster: u32, data: &[u8]) {
        let off = Self::cluster_off(cluster);
        self.bytes[off..off + data.len()].copy_from_slice(data);
    }

    /// Writes directory records at the start of a cluster.
    pub fn write_dir(&mut self, cluster: u32, records: &[[u8; 32]]) {
        let off = Self::cluster_off(cluster);
        for (i, rec) in records.iter().enumerate() {
            self.bytes[off + i * 32..off + i * 32 + 32].copy_from_slice(rec);
        }
    }

    /// Saves the image under a fresh directory and returns its path.
    pub fn save(&self, test_name: &str) -> PathBuf {
        let path = scratch_dir(test_name).join("fat32.img");
        fs::write(&path, &self.bytes).unwrap();
        path
    }
}

/// Encodes a directory entry record.
pub fn entry(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut rec = [0u8; 32];
    rec[0..11].copy_from_slice(name);
    rec[11] = attr;
    rec[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    rec[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    rec[28..32].copy_from_slice(&size.to_le_bytes());
    rec
}

/// Creates an empty directory unique to a test.
pub fn scratch_dir(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "fat_navigator_{}_{}",
        std::process::id(),
        test_name
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// The sample volume:
///
/// ```text
/// /               cluster 2
/// ├── HELLO.TXT   cluster 3, "HELLO"
/// ├── SECRET.TXT  hidden, cluster 4
/// ├── (deleted)   OLD.TXT
/// └── DOCS/       cluster 5
///     ├── .  ..
///     ├── NOTES.TXT  clusters 6 -> 8, 600 bytes
///     └── SUB/       cluster 7, empty
/// ```
pub fn sample_image() -> Image {
    let mut image = Image::new(16);

    let mut deleted = entry(b"OLD     TXT", ARCHIVE, 9, 3);
    deleted[0] = 0xE5;
    image.write_dir(
        2,
        &[
            entry(b"HELLO   TXT", ARCHIVE, 3, 5),
            entry(b"SECRET  TXT", ARCHIVE | HIDDEN, 4, 6),
            deleted,
            entry(b"DOCS       ", DIRECTORY, 5, 0),
        ],
    );

    image.chain(&[3]);
    image.write_cluster(3, b"HELLO");
    image.chain(&[4]);
    image.write_cluster(4, b"hidden");

    image.chain(&[5]);
    image.write_dir(
        5,
        &[
            entry(b".          ", DIRECTORY, 5, 0),
            entry(b"..         ", DIRECTORY, 0, 0),
            entry(b"NOTES   TXT", ARCHIVE, 6, 600),
            entry(b"SUB        ", DIRECTORY, 7, 0),
        ],
    );

    image.chain(&[6, 8]);
    image.write_cluster(6, &[b'n'; BPS]);
    image.write_cluster(8, &[b'm'; BPS]);

    image.chain(&[7]);
    image.write_dir(
        7,
        &[
            entry(b".          ", DIRECTORY, 7, 0),
            entry(b"..         ", DIRECTORY, 5, 0),
        ],
    );

    image
}
