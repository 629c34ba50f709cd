//! FAT volume structure and operations.
//!
//! This module implements the core functions to interact with a FAT32 volume image:
//! - Translating cluster numbers into byte offsets
//! - Following cluster chains through the File Allocation Table
//! - Reading directories

use log::{debug, warn};
use std::collections::HashSet;
use std::io::{self, Read, Seek};

use super::bpb::Bpb;
use super::dir_entry::{DELETED_MARKER, DIR_ENTRY_SIZE, DirEntry, END_MARKER};
use super::fat_error::FATError;
use crate::utils::{read_at, read_up_to, stream_len};

/// Size in bytes of a FAT32 table entry.
const FAT_ENTRY_SIZE: u64 = 4;

/// The top 4 bits of a FAT32 entry are reserved.
const FAT32_MASK: u32 = 0x0FFF_FFFF;

/// Entries at or above this value mark the end of a chain.
const END_OF_CHAIN: u32 = 0x0FFF_FFF8;

/// Marker of a bad cluster.
const BAD_CLUSTER: u32 = 0x0FFF_FFF7;

/// Bounds on what a volume may make the reader allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum count of records scanned in one directory, deleted ones included.
    pub max_dir_entries: usize,
    /// Maximum size in bytes of extracted file content.
    pub max_file_size: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_dir_entries: 65536,
            max_file_size: 256 * 1024 * 1024,
        }
    }
}

/// Structure for a FAT32 volume image.
///
/// Essentially, it is a wrapper around the Bpb and the image it was read from.
///
/// A `FATVol` moves the cursor of its image on every read and is therefore not meant to be
/// shared between threads without external synchronization.
pub struct FATVol<T> {
    bpb: Bpb,
    image: T,
    image_len: u64,
    limits: Limits,
}

impl<T: Read + Seek> FATVol<T> {
    /// Reads the Bpb from the start of an image and wraps both.
    ///
    /// # Parameters
    /// - `image`: The FAT32 image
    /// - `strict`: Whether to perform the full validation checks on the Bpb
    /// - `limits`: Bounds on directory scans and extracted file sizes
    ///
    /// # Errors
    /// - Returns `FATError::ImageTooSmall` if the image ends inside the boot sector fields
    /// - Returns `FATError::InvalidGeometry` if the geometry is unusable
    pub fn from(mut image: T, strict: bool, limits: Limits) -> Result<FATVol<T>, FATError> {
        let image_len = stream_len(&mut image)?;
        let bpb = Bpb::from(&mut image, strict)?;

        Ok(Self {
            bpb,
            image,
            image_len,
            limits,
        })
    }

    pub fn bpb(&self) -> &Bpb {
        &self.bpb
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Returns the first cluster of the root directory.
    ///
    /// A root cluster field below 2 can't address the data region, the conventional cluster 2
    /// is used instead.
    pub fn root_cluster(&self) -> u32 {
        match *self.bpb.root_clus() {
            clus if clus >= 2 => clus,
            clus => {
                warn!("Invalid root cluster {clus} in the boot sector, using cluster 2");
                2
            }
        }
    }

    /// Converts a cluster number to the byte offset of its first byte in the image.
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` if `cluster` is 0 or 1
    pub fn cluster_to_byte_offset(&self, cluster: u32) -> Result<u64, FATError> {
        if cluster < 2 {
            return Err(FATError::InvalidCluster(cluster));
        }

        Ok(self.bpb.data_start() + u64::from(cluster - 2) * self.bpb.cluster_size())
    }

    /// Looks up the cluster following `cluster` in the first FAT.
    ///
    /// # Returns
    /// - `Ok(Some(next))`: The next cluster of the chain, reserved bits cleared
    /// - `Ok(None)`: The end of the chain, or the entry lies past the end of the image
    pub fn next_cluster(&mut self, cluster: u32) -> Result<Option<u32>, FATError> {
        let address = self.bpb.fat_start() + u64::from(cluster) * FAT_ENTRY_SIZE;
        let mut raw = [0u8; FAT_ENTRY_SIZE as usize];

        match read_at(&mut self.image, address, &mut raw) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("FAT entry of cluster {cluster} lies past the end of the image");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        }

        match u32::from_le_bytes(raw) & FAT32_MASK {
            next if next >= END_OF_CHAIN => Ok(None),
            next => Ok(Some(next)),
        }
    }

    /// Maximum plausible length of a cluster chain on this volume.
    ///
    /// The count of data clusters from the boot sector, or the count of clusters the image can
    /// physically hold if that is larger.
    pub fn max_chain_len(&self) -> u64 {
        let in_image = self.image_len.saturating_sub(self.bpb.data_start()) / self.bpb.cluster_size();

        u64::from(self.bpb.cluster_count()).max(in_image).max(1)
    }

    /// Starts walking the chain beginning at `first_cluster`.
    pub fn walk(&self, first_cluster: u32) -> ClusterWalk {
        ClusterWalk::new(first_cluster, self.max_chain_len())
    }

    /// Lists all clusters of the chain beginning at `first_cluster`.
    pub fn list_clusters(&mut self, first_cluster: u32) -> Result<Vec<u32>, FATError> {
        let mut walk = self.walk(first_cluster);
        let mut clusters = vec![];

        while let Some(cluster) = walk.next_cluster(self)? {
            clusters.push(cluster);
        }

        Ok(clusters)
    }

    /// Reads one cluster.
    ///
    /// The returned buffer is shorter than a cluster if the image ends inside it.
    ///
    /// # Errors
    /// - `FATError::ImageTooSmall` if the cluster starts past the end of the image
    pub fn read_cluster(&mut self, cluster: u32) -> Result<Vec<u8>, FATError> {
        let offset = self.cluster_to_byte_offset(cluster)?;
        let buf = read_up_to(&mut self.image, offset, self.bpb.cluster_size() as usize)?;

        if buf.is_empty() {
            return Err(FATError::ImageTooSmall);
        }

        Ok(buf)
    }

    /// Reads the live entries of the directory starting at `first_cluster`.
    ///
    /// Records are scanned cluster by cluster along the directory's chain until the end marker,
    /// the end of the chain, or the scan limit. Deleted records are skipped but count toward the
    /// limit. A chain that breaks after the first cluster ends the listing.
    pub fn read_dir(&mut self, first_cluster: u32) -> Result<Vec<DirEntry>, FATError> {
        let mut walk = self.walk(first_cluster);
        let mut dir_entries = vec![];
        let mut scanned = 0;

        'clusters: loop {
            let cluster = match walk.next_cluster(self) {
                Ok(Some(cluster)) => cluster,
                Ok(None) => break,
                Err(err @ (FATError::CorruptChain(_) | FATError::ImageTooSmall)) if scanned > 0 => {
                    warn!("Directory at cluster {first_cluster} is cut short: {err}");
                    break;
                }
                Err(err) => return Err(err),
            };

            let buf = match self.read_cluster(cluster) {
                Ok(buf) => buf,
                Err(FATError::ImageTooSmall) if scanned > 0 => {
                    warn!("Directory at cluster {first_cluster} runs past the end of the image");
                    break;
                }
                Err(err) => return Err(err),
            };

            for record in buf.chunks_exact(DIR_ENTRY_SIZE) {
                if scanned >= self.limits.max_dir_entries {
                    warn!(
                        "Stopped scanning directory at cluster {first_cluster} after {scanned} entries"
                    );
                    break 'clusters;
                }
                scanned += 1;

                match record[0] {
                    END_MARKER => break 'clusters,
                    DELETED_MARKER => continue,
                    _ => dir_entries.push(DirEntry::from_slice(record)?),
                }
            }
        }

        debug!(
            "Directory at cluster {first_cluster}: {} live entries, {scanned} records scanned",
            dir_entries.len()
        );

        Ok(dir_entries)
    }
}

/// State of a walk along a cluster chain.
///
/// The walk borrows the volume only while advancing, so clusters can be read between two steps.
/// It fails with `FATError::CorruptChain` when the chain revisits a cluster, links to a reserved
/// or bad cluster, or grows longer than the volume allows. Once it has returned `None` or an
/// error it stays finished.
#[derive(Debug)]
pub struct ClusterWalk {
    next: Option<u32>,
    current: Option<u32>,
    visited: HashSet<u32>,
    limit: u64,
}

impl ClusterWalk {
    fn new(first_cluster: u32, limit: u64) -> Self {
        Self {
            next: Some(first_cluster),
            current: None,
            visited: HashSet::new(),
            limit,
        }
    }

    /// Advances to the next cluster of the chain.
    ///
    /// # Returns
    /// - `Ok(Some(cluster))`: The next cluster of the chain
    /// - `Ok(None)`: The chain has ended
    pub fn next_cluster<T: Read + Seek>(
        &mut self,
        vol: &mut FATVol<T>,
    ) -> Result<Option<u32>, FATError> {
        if let Some(current) = self.current.take() {
            self.next = vol.next_cluster(current)?;
        }

        let cluster = match self.next.take() {
            Some(cluster) => cluster,
            None => return Ok(None),
        };

        if self.visited.is_empty() && cluster < 2 {
            return Err(FATError::InvalidCluster(cluster));
        }
        if cluster < 2 || cluster == BAD_CLUSTER {
            return Err(FATError::CorruptChain(format!(
                "link to reserved cluster 0x{cluster:X} after {} clusters",
                self.visited.len()
            )));
        }
        if !self.visited.insert(cluster) {
            return Err(FATError::CorruptChain(format!(
                "cluster {cluster} is visited twice"
            )));
        }
        if self.visited.len() as u64 > self.limit {
            return Err(FATError::CorruptChain(format!(
                "chain is longer than the {} clusters of the volume",
                self.limit
            )));
        }

        self.current = Some(cluster);
        Ok(Some(cluster))
    }
}
