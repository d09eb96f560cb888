//! Lazy, backpressure-aware directory traversal.
//!
//! A [`Scan`] walks one or more roots in preorder and yields the entries its
//! filter includes. The walk is pull-driven: every call to
//! [`Scan::next`] advances it just far enough to produce one more entry, so
//! a slow consumer never causes unbounded buffering.

mod adapters;
mod barrier;
mod engine;
mod level;
#[cfg(test)]
mod tests;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::FindError;
use crate::node::PathNode;
use crate::types::Metadata;

pub use engine::Scan;

/// Receives errors for nodes the scan skipped.
pub type ErrorCallback = Arc<dyn Fn(&FindError) + Send + Sync>;

/// How metadata lookups are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FanOut {
    /// One lookup at a time, as each node is visited.
    #[default]
    Sequential,
    /// When a directory's children are first visited, look all of them up
    /// concurrently on the tokio runtime. Emission order is unchanged.
    PerDirectory,
}

impl From<bool> for FanOut {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::PerDirectory
        } else {
            Self::Sequential
        }
    }
}

/// Work counters for a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// Nodes taken off the frontier, including skipped ones.
    pub visited: usize,
    pub emitted: usize,
    /// Nodes skipped because of an error.
    pub errors: usize,
}

/// An emitted node together with its metadata.
#[derive(Debug, Clone)]
pub struct Entry {
    node: PathNode,
    metadata: Metadata,
}

impl Entry {
    pub(crate) fn new(node: PathNode, metadata: Metadata) -> Self {
        Self { node, metadata }
    }

    pub fn node(&self) -> &PathNode {
        &self.node
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn path(&self) -> PathBuf {
        self.node.to_path_buf()
    }

    pub fn depth(&self) -> usize {
        self.node.depth()
    }

    pub fn into_parts(self) -> (PathNode, Metadata) {
        (self.node, self.metadata)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.node, f)
    }
}
