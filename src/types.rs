//! Store value types
//!
//! Immutable snapshots returned by client operations.

use crate::protocol::{REV_DIR, REV_MISSING};

/// Event flag: the path was written
pub const FLAG_SET: i32 = 4;

/// Event flag: the path was deleted
pub const FLAG_DEL: i32 = 8;

/// One mutation of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Store revision at which the change happened
    pub rev: i64,
    pub path: String,
    pub body: Vec<u8>,
    /// Combination of [`FLAG_SET`] and [`FLAG_DEL`]
    pub flag: i32,
}

impl Event {
    pub fn is_set(&self) -> bool {
        self.flag & FLAG_SET != 0
    }

    pub fn is_del(&self) -> bool {
        self.flag & FLAG_DEL != 0
    }
}

/// What STAT found at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRev {
    /// Nothing exists at the path
    Missing,
    /// The path is a directory
    Dir,
    /// The path is a file last written at this revision
    Rev(i64),
}

impl FileRev {
    /// Interpret a revision as sent on the wire
    pub fn from_wire(rev: i64) -> Self {
        match rev {
            REV_MISSING => FileRev::Missing,
            REV_DIR => FileRev::Dir,
            rev => FileRev::Rev(rev),
        }
    }

    /// The revision as sent on the wire
    pub fn to_wire(self) -> i64 {
        match self {
            FileRev::Missing => REV_MISSING,
            FileRev::Dir => REV_DIR,
            FileRev::Rev(rev) => rev,
        }
    }
}

/// Metadata for one entry of the tree
///
/// The `Default` value, with only `name` filled in, stands for an entry whose
/// metadata could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    /// Final path segment
    pub name: String,
    /// Body length for files, entry count for directories
    pub len: usize,
    /// File revision; zero for directories
    pub rev: i64,
    /// Whether the metadata was actually read
    pub is_set: bool,
    pub is_dir: bool,
}

/// Final segment of a slash-separated path
pub(crate) fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}
