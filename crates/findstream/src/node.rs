//! Locations in a scanned hierarchy.

use std::fmt;
use std::io;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::{FindError, Result};
use crate::fs::FileSystem;
use crate::types::Metadata;

type CachedStat = std::result::Result<Metadata, Arc<io::Error>>;

/// An immutable location in the scanned hierarchy.
///
/// A node is a root component (the start path exactly as given) followed by
/// the child names leading to it. Nodes share their ancestors, so `child`
/// is O(1) and clones are cheap.
///
/// Metadata is fetched lazily with a link-aware stat, at most once per node;
/// the outcome, success or failure, is cached for the node's lifetime.
#[derive(Clone)]
pub struct PathNode {
    inner: Arc<NodeInner>,
}

struct NodeInner {
    parent: Option<PathNode>,
    component: String,
    depth: usize,
    fs: Arc<dyn FileSystem>,
    stat: OnceCell<CachedStat>,
}

impl PathNode {
    /// Creates a traversal root for `start`.
    pub fn root(start: impl Into<String>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                parent: None,
                component: start.into(),
                depth: 0,
                fs,
                stat: OnceCell::new(),
            }),
        }
    }

    /// Appends one step below this node.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                parent: Some(self.clone()),
                component: name.into(),
                depth: self.inner.depth + 1,
                fs: Arc::clone(&self.inner.fs),
                stat: OnceCell::new(),
            }),
        }
    }

    /// Returns the node minus its last component, or `None` for a root.
    pub fn parent(&self) -> Option<&PathNode> {
        self.inner.parent.as_ref()
    }

    /// Steps below the traversal root. Roots are depth 0.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn is_root(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Returns the final component.
    ///
    /// For a root this is the last component of the start path, so `./x.y.z`
    /// is named `x.y.z`; a start path without one (such as `/`) is its own
    /// name.
    pub fn name(&self) -> &str {
        let component = self.inner.component.as_str();
        if !self.is_root() {
            return component;
        }
        let trimmed = component.trim_end_matches(is_separator);
        match trimmed.rfind(is_separator) {
            Some(split) => &trimmed[split + 1..],
            None if trimmed.is_empty() => component,
            None => trimmed,
        }
    }

    /// Returns every component from the root down, the root first.
    pub fn steps(&self) -> Vec<&str> {
        let mut steps = Vec::with_capacity(self.depth() + 1);
        let mut current = Some(self);
        while let Some(node) = current {
            steps.push(node.inner.component.as_str());
            current = node.parent();
        }
        steps.reverse();
        steps
    }

    /// Joins the components with `separator`.
    ///
    /// A separator is not doubled when the previous component already ends
    /// with it, so the child `x` of root `/` prints as `/x`.
    pub fn to_string_with(&self, separator: char) -> String {
        let mut out = String::new();
        for step in self.steps() {
            if !out.is_empty() && !out.ends_with(separator) && !out.ends_with(is_separator) {
                out.push(separator);
            }
            out.push_str(step);
        }
        out
    }

    /// Returns the path used for filesystem calls.
    pub fn to_path_buf(&self) -> PathBuf {
        let mut steps = self.steps().into_iter();
        let mut path = PathBuf::from(steps.next().unwrap_or_default());
        path.extend(steps);
        path
    }

    /// Returns link-aware metadata, fetching it on first use.
    pub async fn stat(&self) -> Result<Metadata> {
        let cached = self
            .inner
            .stat
            .get_or_init(|| async {
                let path = self.to_path_buf();
                self.inner.fs.lstat(&path).await.map_err(Arc::new)
            })
            .await;
        self.stat_result(cached)
    }

    pub async fn is_directory(&self) -> Result<bool> {
        Ok(self.stat().await?.is_dir())
    }

    /// Returns metadata only if it was already fetched successfully.
    pub fn cached_metadata(&self) -> Option<&Metadata> {
        self.inner.stat.get().and_then(|cached| cached.as_ref().ok())
    }

    /// Stores a stat result obtained elsewhere. Ignored if the node already
    /// has one.
    pub(crate) fn seed_stat(&self, result: io::Result<Metadata>) {
        let _ = self.inner.stat.set(result.map_err(Arc::new));
    }

    fn stat_result(&self, cached: &CachedStat) -> Result<Metadata> {
        cached
            .clone()
            .map_err(|source| FindError::node_io(self.to_string_with('/'), source))
    }
}

fn is_separator(ch: char) -> bool {
    ch == '/' || ch == MAIN_SEPARATOR
}

impl fmt::Display for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_with(MAIN_SEPARATOR))
    }
}

impl fmt::Debug for PathNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathNode")
            .field("path", &self.to_string_with('/'))
            .field("depth", &self.depth())
            .field("metadata", &self.cached_metadata())
            .finish()
    }
}
