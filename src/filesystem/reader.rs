//! Extraction of file content along cluster chains.

use log::debug;
use std::io::{Read, Seek};

use super::dir_entry::DirEntry;
use super::fat::FATVol;
use super::fat_error::FATError;

impl<T: Read + Seek> FATVol<T> {
    /// Reads the whole content of a file.
    ///
    /// The returned buffer is exactly `file_size` bytes long.
    ///
    /// # Errors
    /// - `FATError::IsDirectory` if the entry is a directory
    /// - `FATError::FileTooLarge` if the file exceeds the configured size limit
    /// - `FATError::CorruptChain` if the chain is broken or ends before `file_size` bytes
    pub fn extract_full(&mut self, entry: &DirEntry) -> Result<Vec<u8>, FATError> {
        if entry.is_dir() {
            return Err(FATError::IsDirectory(entry.short_name()));
        }

        self.read_chain(entry, u64::from(*entry.file_size()))
    }

    /// Reads `length` bytes of a file starting at byte `start`.
    ///
    /// # Errors
    /// - `FATError::IsDirectory` if the entry is a directory
    /// - `FATError::RangeOutOfBounds` if either value is negative or the range ends past the file
    /// - Any error of [`FATVol::extract_full`]
    pub fn extract_range(
        &mut self,
        entry: &DirEntry,
        start: i64,
        length: i64,
    ) -> Result<Vec<u8>, FATError> {
        if entry.is_dir() {
            return Err(FATError::IsDirectory(entry.short_name()));
        }

        let size = *entry.file_size();
        let end = match start.checked_add(length) {
            Some(end) if start >= 0 && length >= 0 && end <= i64::from(size) => end,
            _ => {
                return Err(FATError::RangeOutOfBounds {
                    start,
                    length,
                    size,
                });
            }
        };

        let mut data = self.read_chain(entry, end as u64)?;
        Ok(data.split_off(start as usize))
    }

    /// Gathers the first `wanted` bytes of a file, following its chain no further than needed.
    fn read_chain(&mut self, entry: &DirEntry, wanted: u64) -> Result<Vec<u8>, FATError> {
        let limit = self.limits().max_file_size;
        if wanted > limit {
            return Err(FATError::FileTooLarge {
                size: wanted,
                limit,
            });
        }

        let mut data = Vec::with_capacity(wanted as usize);
        if wanted == 0 {
            return Ok(data);
        }

        let cluster_size = self.bpb().cluster_size();
        let mut walk = self.walk(entry.first_cluster());

        while (data.len() as u64) < wanted {
            let cluster = match walk.next_cluster(self)? {
                Some(cluster) => cluster,
                None => {
                    return Err(FATError::CorruptChain(format!(
                        "chain of `{}` ends after {} of {} bytes",
                        entry.short_name(),
                        data.len(),
                        wanted
                    )));
                }
            };

            let buf = self.read_cluster(cluster)?;
            let short = (buf.len() as u64) < cluster_size;
            data.extend_from_slice(&buf);

            if short && (data.len() as u64) < wanted {
                return Err(FATError::ImageTooSmall);
            }
        }

        data.truncate(wanted as usize);
        debug!(
            "Read {} bytes of `{}` from cluster {}",
            data.len(),
            entry.short_name(),
            entry.first_cluster()
        );

        Ok(data)
    }
}
