//! In-memory filesystem for tests and dry runs.
//!
//! Paths are resolved relative to the tree root: `.`, a leading `/` and
//! empty components are ignored, so `"."`, `"/"` and `""` all name the root
//! and `"./a/b"` equals `"/a/b"`. Directory listings come back in insertion
//! order.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::FileSystem;
use crate::types::{FileKind, Metadata};

/// A recorded filesystem call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    Lstat(PathBuf),
    ListDir(PathBuf),
}

#[derive(Debug)]
enum MemoryEntry {
    Dir(Vec<(String, MemoryEntry)>),
    Leaf(Metadata),
}

impl MemoryEntry {
    fn metadata(&self) -> Metadata {
        match self {
            Self::Dir(_) => Metadata::new(FileKind::Directory),
            Self::Leaf(metadata) => metadata.clone(),
        }
    }

    fn child(&self, name: &str) -> Option<&MemoryEntry> {
        match self {
            Self::Dir(children) => children
                .iter()
                .find(|(child, _)| child == name)
                .map(|(_, entry)| entry),
            Self::Leaf(_) => None,
        }
    }
}

/// An ordered in-memory tree implementing [`FileSystem`].
///
/// Every call is recorded, and individual paths can be made to fail or to
/// respond slowly, which makes it the collaborator of choice for testing
/// traversal order, error reporting, and backpressure.
#[derive(Debug)]
pub struct MemoryFs {
    root: MemoryEntry,
    failing_lstat: HashSet<PathBuf>,
    failing_list: HashSet<PathBuf>,
    latency: HashMap<PathBuf, Duration>,
    calls: Mutex<Vec<FsCall>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self {
            root: MemoryEntry::Dir(Vec::new()),
            failing_lstat: HashSet::new(),
            failing_list: HashSet::new(),
            latency: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MemoryFs {
    /// Creates an empty tree containing only the root directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from a JSON value: objects are directories, anything
    /// else is a regular file. Keys are inserted in the map's iteration order.
    pub fn from_json(tree: &serde_json::Value) -> Self {
        let mut fs = Self::new();
        fs.root = entry_from_json(tree);
        fs
    }

    /// Adds a directory, creating missing parents.
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        self.with_entry(path, MemoryEntry::Dir(Vec::new()))
    }

    /// Adds an empty regular file, creating missing parents.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.with_leaf(path, Metadata::new(FileKind::File))
    }

    /// Adds a non-directory entry of any kind, creating missing parents.
    pub fn with_leaf(self, path: impl AsRef<Path>, metadata: Metadata) -> Self {
        self.with_entry(path, MemoryEntry::Leaf(metadata))
    }

    /// Makes every `lstat` of `path` fail with `PermissionDenied`.
    pub fn fail_lstat(mut self, path: impl AsRef<Path>) -> Self {
        self.failing_lstat.insert(normalize(path.as_ref()));
        self
    }

    /// Makes every listing of `path` fail with `PermissionDenied`.
    pub fn fail_list_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.failing_list.insert(normalize(path.as_ref()));
        self
    }

    /// Delays every call touching `path` by `delay`.
    pub fn with_latency(mut self, path: impl AsRef<Path>, delay: Duration) -> Self {
        self.latency.insert(normalize(path.as_ref()), delay);
        self
    }

    /// Returns every call made so far, in issue order.
    pub fn calls(&self) -> Vec<FsCall> {
        self.calls.lock().clone()
    }

    pub fn lstat_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, FsCall::Lstat(_)))
            .count()
    }

    pub fn list_dir_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, FsCall::ListDir(_)))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn with_entry(mut self, path: impl AsRef<Path>, entry: MemoryEntry) -> Self {
        let key = normalize(path.as_ref());
        let names = key
            .iter()
            .map(|name| name.to_string_lossy().into_owned())
            .collect::<Vec<_>>();
        insert_entry(&mut self.root, &names, entry);
        self
    }

    fn lookup(&self, key: &Path) -> Option<&MemoryEntry> {
        key.iter().try_fold(&self.root, |entry, name| {
            entry.child(name.to_string_lossy().as_ref())
        })
    }

    async fn enter(&self, call: FsCall, key: &Path) {
        self.calls.lock().push(call);
        if let Some(delay) = self.latency.get(key) {
            tokio::time::sleep(*delay).await;
        }
    }
}

#[async_trait]
impl FileSystem for MemoryFs {
    async fn lstat(&self, path: &Path) -> io::Result<Metadata> {
        let key = normalize(path);
        self.enter(FsCall::Lstat(path.to_path_buf()), &key).await;
        if self.failing_lstat.contains(&key) {
            return Err(permission_denied(path));
        }
        self.lookup(&key)
            .map(MemoryEntry::metadata)
            .ok_or_else(|| not_found(path))
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let key = normalize(path);
        self.enter(FsCall::ListDir(path.to_path_buf()), &key).await;
        if self.failing_list.contains(&key) {
            return Err(permission_denied(path));
        }
        match self.lookup(&key) {
            Some(MemoryEntry::Dir(children)) => {
                Ok(children.iter().map(|(name, _)| name.clone()).collect())
            }
            Some(MemoryEntry::Leaf(_)) => Err(io::Error::other(format!(
                "not a directory: {}",
                path.display()
            ))),
            None => Err(not_found(path)),
        }
    }
}

fn entry_from_json(value: &serde_json::Value) -> MemoryEntry {
    match value {
        serde_json::Value::Object(map) => MemoryEntry::Dir(
            map.iter()
                .map(|(name, child)| (name.clone(), entry_from_json(child)))
                .collect(),
        ),
        _ => MemoryEntry::Leaf(Metadata::new(FileKind::File)),
    }
}

fn insert_entry(parent: &mut MemoryEntry, names: &[String], entry: MemoryEntry) {
    let Some((first, rest)) = names.split_first() else {
        *parent = entry;
        return;
    };
    // Intermediate components always become directories.
    if matches!(parent, MemoryEntry::Leaf(_)) {
        *parent = MemoryEntry::Dir(Vec::new());
    }
    let MemoryEntry::Dir(children) = parent else {
        return;
    };
    let index = match children.iter().position(|(name, _)| name == first) {
        Some(index) => index,
        None => {
            children.push((first.clone(), MemoryEntry::Dir(Vec::new())));
            children.len() - 1
        }
    };
    insert_entry(&mut children[index].1, rest, entry);
}

fn normalize(path: &Path) -> PathBuf {
    let mut key = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => key.push(name),
            Component::ParentDir => {
                key.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    key
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such entry: {}", path.display()),
    )
}

fn permission_denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {}", path.display()),
    )
}
