//! Filter algebra over [`PathNode`]s.
//!
//! A filter answers two independent questions about a node: should it be
//! emitted (`include`), and should the scan stop descending below it
//! (`ascend`). Primitives match names, paths and file kinds; combinators
//! compose filters into filters, so any composition is itself a filter.

mod combinators;
mod glob;
mod primitives;
mod type_filter;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::node::PathNode;

pub use combinators::{And, Not, Or, Prune};
pub use glob::{glob_to_regex, GlobScope};
pub use primitives::{Always, GlobMatch, Never, RegexMatch, TypeMatch};
pub use type_filter::{lookup_type_code, parse_type_codes};

/// The outcome of evaluating a filter against one node.
///
/// `ascend == true` forbids descent into the node's children regardless of
/// `include`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Decision {
    pub include: bool,
    pub ascend: bool,
}

impl Decision {
    pub const INCLUDE: Self = Self {
        include: true,
        ascend: false,
    };
    pub const EXCLUDE: Self = Self {
        include: false,
        ascend: false,
    };

    pub fn new(include: bool, ascend: bool) -> Self {
        Self { include, ascend }
    }

    pub fn matched(include: bool) -> Self {
        Self {
            include,
            ascend: false,
        }
    }
}

/// A predicate over path nodes.
///
/// Evaluation may suspend while metadata is fetched. A metadata failure is
/// returned as [`FindError::NodeIo`](crate::FindError::NodeIo).
#[async_trait]
pub trait Filter: Send + Sync + fmt::Debug {
    async fn decide(&self, node: &PathNode) -> Result<Decision>;
}

/// A shareable filter.
pub type DynFilter = Arc<dyn Filter>;

/// Includes every node.
pub fn always() -> DynFilter {
    Arc::new(Always)
}

/// Includes nothing.
pub fn never() -> DynFilter {
    Arc::new(Never)
}

/// Matches the final path component against a shell glob.
pub fn name(glob: &str) -> Result<DynFilter> {
    Ok(Arc::new(GlobMatch::new(GlobScope::Name, glob, false)?))
}

/// Case-insensitive [`name`].
pub fn iname(glob: &str) -> Result<DynFilter> {
    Ok(Arc::new(GlobMatch::new(GlobScope::Name, glob, true)?))
}

/// Matches the whole `/`-joined path against a shell glob whose wildcards
/// also match `/`.
pub fn path(glob: &str) -> Result<DynFilter> {
    Ok(Arc::new(GlobMatch::new(GlobScope::Path, glob, false)?))
}

/// Case-insensitive [`path`].
pub fn ipath(glob: &str) -> Result<DynFilter> {
    Ok(Arc::new(GlobMatch::new(GlobScope::Path, glob, true)?))
}

/// Searches the `/`-joined path for `pattern` (unanchored).
pub fn regex(pattern: &str) -> Result<DynFilter> {
    Ok(Arc::new(RegexMatch::new(pattern)?))
}

/// Matches the file kind against `find -type` codes such as `"f"` or `"fd"`.
pub fn file_type(codes: &str) -> Result<DynFilter> {
    Ok(Arc::new(TypeMatch::new(codes)?))
}

/// Negates `include`; `ascend` passes through.
pub fn not(filter: DynFilter) -> DynFilter {
    Arc::new(Not::new(filter))
}

/// Short-circuiting conjunction.
pub fn and(filters: Vec<DynFilter>) -> DynFilter {
    Arc::new(And::new(filters))
}

/// Short-circuiting disjunction.
pub fn or(filters: Vec<DynFilter>) -> DynFilter {
    Arc::new(Or::new(filters))
}

/// Stops descent below every node `filter` includes.
pub fn prune(filter: DynFilter) -> DynFilter {
    Arc::new(Prune::new(filter))
}
