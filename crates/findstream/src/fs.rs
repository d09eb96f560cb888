//! Filesystem collaborators used by the scanner.
//!
//! The scanner only needs two capabilities: a link-aware stat and a
//! directory listing. Implement [`FileSystem`] to scan something other than
//! the local disk.

mod local;
mod memory;

use std::io;
use std::path::Path;

use async_trait::async_trait;

use crate::types::Metadata;

pub use local::LocalFs;
pub use memory::{FsCall, MemoryFs};

/// Minimal read-only filesystem abstraction for the scanner.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Returns metadata for `path` without following a final symlink.
    async fn lstat(&self, path: &Path) -> io::Result<Metadata>;

    /// Lists the entry names of a directory in the order the backend yields
    /// them. `.` and `..` are never included.
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;
}
