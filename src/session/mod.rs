//! Session over one open FAT32 image.
//!
//! The session owns the image handle, the parsed volume and the navigation stack, and implements
//! the operations behind each command: `open`, `close`, `info`, `stat`, `get`, `read`, `cd`,
//! `ls` and `volume`. A failed operation never leaves the session in a different state.

mod config;
mod session_error;

pub use config::SessionConfig;
pub use session_error::SessionError;

use log::info;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use crate::filesystem::bpb::Bpb;
use crate::filesystem::dir_entry::{DirEntry, to_canonical_name};
use crate::filesystem::fat::FATVol;
use crate::filesystem::fat_error::FATError;
use crate::navigation::{NavFrame, NavStack};

/// State of an open image.
struct OpenImage {
    path: PathBuf,
    vol: FATVol<File>,
    stack: NavStack,
}

/// Represents the runtime state of the navigator.
///
/// A session is driven by a single command loop; it is not safe to use from several threads
/// without external synchronization.
pub struct Session {
    config: SessionConfig,
    image: Option<OpenImage>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            image: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.image.is_some()
    }

    /// Path of the current directory, `None` if no image is open.
    pub fn current_path(&self) -> Option<String> {
        self.image.as_ref().map(|image| image.stack.path())
    }

    /// Depth of the navigation stack, `None` if no image is open.
    pub fn depth(&self) -> Option<usize> {
        self.image.as_ref().map(|image| image.stack.depth())
    }

    /// Opens an image, parses its boot sector and reads the root directory.
    ///
    /// # Errors
    /// - `SessionError::AlreadyOpen` if an image is open
    /// - `SessionError::ImageNotFound` if the file doesn't exist
    /// - `SessionError::ImageUnreadable` if the file can't be opened or read
    /// - `SessionError::FAT` if the boot sector or the root directory is malformed
    pub fn open(&mut self, path: &Path) -> Result<(), SessionError> {
        if self.image.is_some() {
            return Err(SessionError::AlreadyOpen);
        }

        let unreadable = |err: FATError| match err {
            FATError::IOError(source) => SessionError::ImageUnreadable {
                path: path.display().to_string(),
                source,
            },
            other => SessionError::FAT(other),
        };

        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => SessionError::ImageNotFound(path.display().to_string()),
            _ => unreadable(err.into()),
        })?;

        let mut vol =
            FATVol::from(file, self.config.strict, self.config.limits()).map_err(unreadable)?;
        let root_cluster = vol.root_cluster();
        let root = load_frame(&mut vol, String::new(), root_cluster).map_err(unreadable)?;

        info!(
            "Opened {}: root directory at byte 0x{:X} with {} entries",
            path.display(),
            root.byte_address(),
            root.entries().len()
        );

        self.image = Some(OpenImage {
            path: path.to_path_buf(),
            vol,
            stack: NavStack::new(root),
        });

        Ok(())
    }

    /// Closes the image and resets the navigation stack.
    pub fn close(&mut self) -> Result<(), SessionError> {
        match self.image.take() {
            Some(image) => {
                info!("Closed {}", image.path.display());
                Ok(())
            }
            None => Err(SessionError::NotOpen),
        }
    }

    /// Returns the boot sector of the open image.
    pub fn info(&self) -> Result<&Bpb, SessionError> {
        Ok(self.open_image()?.vol.bpb())
    }

    /// Looks up a name in the current directory.
    pub fn stat(&self, name: &str) -> Result<DirEntry, SessionError> {
        let image = self.open_image()?;
        Ok(lookup(image.stack.current(), name)?.clone())
    }

    /// Extracts a file of the current directory into the output directory.
    ///
    /// # Returns
    /// The path of the written file.
    pub fn get(&mut self, name: &str) -> Result<PathBuf, SessionError> {
        let output_dir = self.config.output_dir.clone();
        let image = self.open_image_mut()?;

        if name.contains(['/', '\\']) {
            return Err(SessionError::InvalidArguments(format!(
                "'get' expects a name in the current directory, got `{name}`."
            )));
        }

        let entry = lookup(image.stack.current(), name)?.clone();
        let data = image.vol.extract_full(&entry)?;

        let out_path = output_dir.join(name);
        fs::write(&out_path, &data).map_err(|source| SessionError::OutputFile {
            path: out_path.display().to_string(),
            source,
        })?;

        info!("Extracted {} bytes to {}", data.len(), out_path.display());
        Ok(out_path)
    }

    /// Reads `length` bytes of a file of the current directory starting at `position`.
    pub fn read(&mut self, name: &str, position: i64, length: i64) -> Result<Vec<u8>, SessionError> {
        let image = self.open_image_mut()?;

        let entry = lookup(image.stack.current(), name)?.clone();
        Ok(image.vol.extract_range(&entry, position, length)?)
    }

    /// Changes the current directory.
    ///
    /// `path` is a `/`-separated list of names, `.` and `..`; a leading `/` starts from the root.
    /// The stack is only updated once the whole path was resolved.
    pub fn cd(&mut self, path: &str) -> Result<(), SessionError> {
        let image = self.open_image_mut()?;

        if path.is_empty() {
            return Err(SessionError::InvalidArguments(String::from(
                "'cd' expects a directory name.",
            )));
        }

        let mut stack = image.stack.clone();
        if path.starts_with('/') {
            stack.reset_to_root();
        }

        for part in path.split('/').filter(|part| !part.is_empty()) {
            match part {
                "." => {}
                ".." => {
                    stack.ascend()?;
                }
                name => {
                    let target = || SessionError::InvalidDirectoryTarget(name.to_string());
                    let canonical = to_canonical_name(name).map_err(|_| target())?;
                    let entry = stack
                        .current()
                        .find(&canonical)
                        .filter(|entry| entry.is_dir())
                        .ok_or_else(target)?;

                    let cluster = entry.first_cluster();
                    let frame_name = entry.short_name();
                    let frame = load_frame(&mut image.vol, frame_name, cluster)?;
                    stack.descend(frame);
                }
            }
        }

        image.stack = stack;
        Ok(())
    }

    /// Lists the visible entries of the current directory, or of its parent with `..`.
    pub fn ls(&self, target: Option<&str>) -> Result<Vec<DirEntry>, SessionError> {
        let image = self.open_image()?;

        let frame = match target {
            None | Some(".") => image.stack.current(),
            Some("..") => image.stack.parent().ok_or(SessionError::AlreadyAtRoot)?,
            Some(other) => {
                return Err(SessionError::InvalidArguments(format!(
                    "'ls' expects '.' or '..', got `{other}`."
                )));
            }
        };

        Ok(frame.visible_entries().cloned().collect())
    }

    /// Returns the volume label.
    ///
    /// # Errors
    /// - `SessionError::VolumeLabelNotSet` if the label is empty
    pub fn volume(&self) -> Result<String, SessionError> {
        let image = self.open_image()?;

        let raw = image.vol.bpb().vol_lab();
        let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
        let label = String::from_utf8_lossy(&raw[..end]).trim_end().to_string();

        if label.is_empty() {
            Err(SessionError::VolumeLabelNotSet)
        } else {
            Ok(label)
        }
    }

    fn open_image(&self) -> Result<&OpenImage, SessionError> {
        self.image.as_ref().ok_or(SessionError::NotOpen)
    }

    fn open_image_mut(&mut self) -> Result<&mut OpenImage, SessionError> {
        self.image.as_mut().ok_or(SessionError::NotOpen)
    }
}

/// Reads a directory into a navigation frame.
fn load_frame(vol: &mut FATVol<File>, name: String, cluster: u32) -> Result<NavFrame, FATError> {
    let byte_address = vol.cluster_to_byte_offset(cluster)?;
    let entries = vol.read_dir(cluster)?;

    Ok(NavFrame::new(name, cluster, byte_address, entries))
}

/// Finds a live entry of `frame` by its user-typed name.
fn lookup<'a>(frame: &'a NavFrame, name: &str) -> Result<&'a DirEntry, SessionError> {
    if name.is_empty() {
        return Err(SessionError::InvalidArguments(String::from(
            "Expected a file name.",
        )));
    }

    let canonical = to_canonical_name(name)?;
    frame
        .find(&canonical)
        .ok_or_else(|| FATError::NameNotFound(name.to_string()).into())
}
