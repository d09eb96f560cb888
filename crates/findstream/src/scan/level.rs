//! Sibling records kept on the traversal frontier.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::barrier::LevelBarrier;
use crate::error::{FindError, Result};
use crate::fs::FileSystem;
use crate::node::PathNode;
use crate::types::Metadata;

/// A node waiting to be visited, with its in-flight metadata lookup if one
/// was dispatched.
#[derive(Debug)]
pub(crate) struct Pending {
    pub(crate) node: PathNode,
    lookup: Option<JoinHandle<io::Result<Metadata>>>,
    /// Child names read ahead of the visit. Only roots have them.
    pub(crate) listing: Option<Vec<String>>,
}

impl Pending {
    /// Returns the node's metadata, awaiting its own dispatched lookup first
    /// when there is one.
    pub(crate) async fn resolve(&mut self) -> Result<Metadata> {
        if let Some(lookup) = self.lookup.take() {
            match lookup.await {
                Ok(result) => self.node.seed_stat(result),
                Err(error) => {
                    return Err(FindError::internal(
                        self.node.to_string_with('/'),
                        format!("metadata lookup did not complete: {error}"),
                    ))
                }
            }
        }
        self.node.stat().await
    }
}

/// The unvisited siblings at one depth.
#[derive(Debug, Default)]
pub(crate) struct Level {
    pending: VecDeque<Pending>,
    barrier: Option<Arc<LevelBarrier>>,
    dispatched: bool,
}

impl Level {
    pub(crate) fn new(nodes: impl IntoIterator<Item = PathNode>) -> Self {
        Self {
            pending: nodes
                .into_iter()
                .map(|node| Pending {
                    node,
                    lookup: None,
                    listing: None,
                })
                .collect(),
            barrier: None,
            dispatched: false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn pop(&mut self) -> Option<Pending> {
        self.pending.pop_front()
    }

    pub(crate) fn pending_mut(&mut self) -> impl Iterator<Item = &mut Pending> {
        self.pending.iter_mut()
    }

    /// Starts a spawned lookup for every sibling whose metadata is not known
    /// yet, all counted by one fresh barrier. Only the first call per level
    /// does anything.
    ///
    /// Without a tokio runtime nothing is dispatched and every node is
    /// resolved in place when visited.
    pub(crate) fn dispatch(&mut self, fs: &Arc<dyn FileSystem>) {
        if std::mem::replace(&mut self.dispatched, true) {
            return;
        }
        let Ok(runtime) = Handle::try_current() else {
            tracing::debug!("no tokio runtime, metadata lookups stay sequential");
            return;
        };
        let unresolved = self
            .pending
            .iter()
            .filter(|pending| pending.node.cached_metadata().is_none())
            .count();
        if unresolved == 0 {
            return;
        }

        let barrier = LevelBarrier::new(unresolved);
        for pending in &mut self.pending {
            if pending.node.cached_metadata().is_some() {
                continue;
            }
            let fs = Arc::clone(fs);
            let path = pending.node.to_path_buf();
            let arrival = barrier.arrival();
            pending.lookup = Some(runtime.spawn(async move {
                let _arrival = arrival;
                fs.lstat(&path).await
            }));
        }
        self.barrier = Some(barrier);
    }

    /// Waits for every lookup dispatched for this level to finish.
    pub(crate) async fn settle(&self) {
        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
    }
}
