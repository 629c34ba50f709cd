//! Stack of visited directories, from the root to the current directory.
//!
//! Each frame keeps the entries read when the directory was entered, so ascending restores the
//! parent without reading the image again.

use getset::Getters;

use crate::filesystem::dir_entry::{DirEntry, SHORT_NAME_LEN};
use crate::session::SessionError;

/// A directory on the navigation stack.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct NavFrame {
    /// Name of the directory as shown in paths, empty for the root
    #[get = "pub"]
    name: String,
    /// First cluster of the directory
    #[get = "pub"]
    cluster: u32,
    /// Byte offset of the directory's first cluster in the image
    #[get = "pub"]
    byte_address: u64,
    /// Live entries of the directory, in on-disk order
    #[get = "pub"]
    entries: Vec<DirEntry>,
}

impl NavFrame {
    pub fn new(name: String, cluster: u32, byte_address: u64, entries: Vec<DirEntry>) -> Self {
        Self {
            name,
            cluster,
            byte_address,
            entries,
        }
    }

    /// Finds the entry carrying the canonical 8.3 name.
    pub fn find(&self, canonical: &[u8; SHORT_NAME_LEN]) -> Option<&DirEntry> {
        self.entries.iter().find(|entry| entry.has_name(canonical))
    }

    /// Entries shown by a listing.
    pub fn visible_entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|entry| entry.is_visible())
    }
}

/// The navigation stack.
///
/// The root frame is held apart from the frames above it, so the stack can never be empty.
#[derive(Debug, Clone)]
pub struct NavStack {
    root: NavFrame,
    children: Vec<NavFrame>,
}

impl NavStack {
    pub fn new(root: NavFrame) -> Self {
        Self {
            root,
            children: vec![],
        }
    }

    /// Enters a subdirectory.
    pub fn descend(&mut self, frame: NavFrame) {
        self.children.push(frame);
    }

    /// Leaves the current directory and returns its frame.
    ///
    /// # Errors
    /// - `SessionError::AlreadyAtRoot` if the current directory is the root
    pub fn ascend(&mut self) -> Result<NavFrame, SessionError> {
        self.children.pop().ok_or(SessionError::AlreadyAtRoot)
    }

    /// Drops every frame above the root.
    pub fn reset_to_root(&mut self) {
        self.children.clear();
    }

    pub fn current(&self) -> &NavFrame {
        self.children.last().unwrap_or(&self.root)
    }

    /// The frame below the current one, `None` at the root.
    pub fn parent(&self) -> Option<&NavFrame> {
        match self.children.len() {
            0 => None,
            1 => Some(&self.root),
            n => self.children.get(n - 2),
        }
    }

    pub fn is_at_root(&self) -> bool {
        self.children.is_empty()
    }

    /// Count of frames, the root included.
    pub fn depth(&self) -> usize {
        self.children.len() + 1
    }

    /// Path of the current directory, e.g. `/DOCS/NOTES`.
    pub fn path(&self) -> String {
        if self.is_at_root() {
            return String::from("/");
        }

        self.children
            .iter()
            .map(|frame| format!("/{}", frame.name))
            .collect()
    }
}
