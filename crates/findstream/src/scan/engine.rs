//! Pull-driven preorder traversal.

use std::mem;
use std::sync::Arc;

use super::level::{Level, Pending};
use super::{Entry, ErrorCallback, FanOut, ScanStats};
use crate::cancel::CancellationToken;
use crate::error::{FindError, Result};
use crate::filter::{Decision, DynFilter};
use crate::fs::FileSystem;
use crate::node::PathNode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotStarted,
    Running,
    Done,
}

/// A lazy traversal of one or more roots.
///
/// Nothing happens until [`next`](Scan::next) is awaited, and each call does
/// only the work needed to produce the next matching entry. Entries come out
/// in preorder: roots in the order given, siblings in listing order, every
/// directory before its descendants.
///
/// A root that cannot be read ends the scan with a single
/// [`FindError::StartPath`]. Any other failure skips the affected node,
/// which is reported through [`on_error`](Scan::on_error) and the `tracing`
/// log, and the scan carries on with its siblings.
///
/// Dropping the scan stops it. Lookups already dispatched in
/// [`FanOut::PerDirectory`] mode finish on their own and are ignored.
pub struct Scan {
    fs: Arc<dyn FileSystem>,
    filter: DynFilter,
    max_depth: Option<usize>,
    fan_out: FanOut,
    on_error: Option<ErrorCallback>,
    cancel: CancellationToken,
    state: State,
    current: Level,
    frontier: Vec<Level>,
    stats: ScanStats,
}

impl Scan {
    /// Creates a scan over `roots`, each exactly as it should appear at the
    /// front of every emitted path.
    pub fn new<I, S>(fs: Arc<dyn FileSystem>, roots: I, filter: DynFilter) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roots = roots
            .into_iter()
            .map(|root| PathNode::root(root, Arc::clone(&fs)))
            .collect::<Vec<_>>();
        Self {
            fs,
            filter,
            max_depth: None,
            fan_out: FanOut::default(),
            on_error: None,
            cancel: CancellationToken::new(),
            state: State::NotStarted,
            current: Level::new(roots),
            frontier: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Bounds expansion: nodes at `max_depth` are still evaluated and may be
    /// emitted, but their children are never listed. Roots are depth 0.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_fan_out(mut self, fan_out: FanOut) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Receives every skipped node's error.
    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Counters for the work done so far.
    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Done
    }

    /// Advances to the next matching entry.
    ///
    /// Returns `None` once the traversal is exhausted or cancelled. An
    /// `Err` is always fatal and is followed by `None`.
    pub async fn next(&mut self) -> Option<Result<Entry>> {
        loop {
            if self.cancel.is_active().is_none() && self.state != State::Done {
                tracing::debug!("scan cancelled");
                self.finish();
            }
            match self.state {
                State::Done => return None,
                State::NotStarted => {
                    self.state = State::Running;
                    if let Err(error) = self.start().await {
                        self.finish();
                        return Some(Err(error));
                    }
                    continue;
                }
                State::Running => {}
            }

            let Some(pending) = self.take_next() else {
                self.current.settle().await;
                match self.frontier.pop() {
                    Some(parent) => self.current = parent,
                    None => self.finish(),
                }
                continue;
            };

            match self.visit(pending).await {
                Ok(Some(entry)) => {
                    self.stats.emitted += 1;
                    return Some(Ok(entry));
                }
                Ok(None) => {}
                Err(error) if error.is_fatal() => {
                    self.finish();
                    return Some(Err(error));
                }
                Err(error) => self.report(&error),
            }
        }
    }

    /// Reads every root's metadata, and lists every root that will be
    /// expanded, before anything is emitted.
    async fn start(&mut self) -> Result<()> {
        tracing::debug!(
            roots = self.current.len(),
            max_depth = ?self.max_depth,
            fan_out = ?self.fan_out,
            "scan started"
        );
        if self.fan_out == FanOut::PerDirectory {
            self.current.dispatch(&self.fs);
        }
        let fs = Arc::clone(&self.fs);
        let expand_roots = self.max_depth != Some(0);
        for pending in self.current.pending_mut() {
            let metadata = pending
                .resolve()
                .await
                .map_err(FindError::into_start_path)?;
            if expand_roots && metadata.is_dir() {
                let names = fs
                    .list_dir(&pending.node.to_path_buf())
                    .await
                    .map_err(|source| {
                        FindError::node_io(pending.node.to_string_with('/'), source)
                            .into_start_path()
                    })?;
                pending.listing = Some(names);
            }
        }
        Ok(())
    }

    fn take_next(&mut self) -> Option<Pending> {
        if self.fan_out == FanOut::PerDirectory {
            self.current.dispatch(&self.fs);
        }
        self.current.pop()
    }

    async fn visit(&mut self, mut pending: Pending) -> Result<Option<Entry>> {
        self.stats.visited += 1;
        let metadata = pending.resolve().await?;
        let listing = pending.listing.take();
        let node = pending.node;
        let Decision { include, ascend } = self.filter.decide(&node).await?;

        if !ascend && self.within_depth(&node) && metadata.is_dir() {
            self.descend(&node, listing).await?;
        } else {
            tracing::trace!(path = %node, ascend, "not descending");
        }

        Ok(include.then_some(Entry::new(node, metadata)))
    }

    fn within_depth(&self, node: &PathNode) -> bool {
        self.max_depth.map_or(true, |max| node.depth() < max)
    }

    /// Makes `node`'s children the current level, listing them unless
    /// `listing` already holds their names.
    async fn descend(&mut self, node: &PathNode, listing: Option<Vec<String>>) -> Result<()> {
        if self.fan_out == FanOut::PerDirectory {
            self.current.settle().await;
        }
        let names = match listing {
            Some(names) => names,
            None => self
                .fs
                .list_dir(&node.to_path_buf())
                .await
                .map_err(|source| FindError::node_io(node.to_string_with('/'), source))?,
        };
        tracing::trace!(path = %node, children = names.len(), "descending");

        let children = Level::new(names.into_iter().map(|name| node.child(name)));
        let parent = mem::replace(&mut self.current, children);
        self.frontier.push(parent);
        Ok(())
    }

    fn report(&mut self, error: &FindError) {
        self.stats.errors += 1;
        tracing::warn!(path = ?error.path(), %error, "skipping entry");
        if let Some(callback) = &self.on_error {
            callback(error);
        }
    }

    fn finish(&mut self) {
        if self.state == State::Done {
            return;
        }
        self.state = State::Done;
        self.current = Level::default();
        self.frontier.clear();
        tracing::debug!(
            visited = self.stats.visited,
            emitted = self.stats.emitted,
            errors = self.stats.errors,
            "scan finished"
        );
    }
}

impl std::fmt::Debug for Scan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan")
            .field("filter", &self.filter)
            .field("max_depth", &self.max_depth)
            .field("fan_out", &self.fan_out)
            .field("state", &self.state)
            .field("depth", &self.frontier.len())
            .field("stats", &self.stats)
            .finish()
    }
}
