//! Metadata types shared by the filesystem collaborators and filters.

use std::fs;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// File kind as reported by a link-aware stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    BlockDevice,
    CharDevice,
    Directory,
    File,
    Symlink,
    Fifo,
    Socket,
    Other,
}

impl FileKind {
    /// Classifies a `std` file type without following links.
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            return Self::Symlink;
        }
        if file_type.is_dir() {
            return Self::Directory;
        }
        if file_type.is_file() {
            return Self::File;
        }
        special_kind(file_type)
    }
}

#[cfg(unix)]
fn special_kind(file_type: fs::FileType) -> FileKind {
    use std::os::unix::fs::FileTypeExt;

    if file_type.is_block_device() {
        FileKind::BlockDevice
    } else if file_type.is_char_device() {
        FileKind::CharDevice
    } else if file_type.is_fifo() {
        FileKind::Fifo
    } else if file_type.is_socket() {
        FileKind::Socket
    } else {
        FileKind::Other
    }
}

#[cfg(not(unix))]
fn special_kind(_file_type: fs::FileType) -> FileKind {
    FileKind::Other
}

/// Link-aware metadata for one scanned entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    kind: FileKind,
    len: u64,
    modified: Option<SystemTime>,
}

impl Metadata {
    pub fn new(kind: FileKind) -> Self {
        Self {
            kind,
            len: 0,
            modified: None,
        }
    }

    /// Converts `std` metadata obtained from `symlink_metadata`.
    pub fn from_fs_metadata(metadata: &fs::Metadata) -> Self {
        Self {
            kind: FileKind::from_file_type(metadata.file_type()),
            len: metadata.len(),
            modified: metadata.modified().ok(),
        }
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}
