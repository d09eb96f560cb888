//! Composable, lazily evaluated directory-tree scanning.
//!
//! This crate provides a `find`-style traversal as a library primitive:
//! - A filter algebra where inclusion and pruning are independent
//! - A compiler from plain-data expressions to filters
//! - A pull-driven preorder scan with optional per-directory fan-out
//! - Pluggable filesystems, including an in-memory one for tests

pub mod cancel;
pub mod config;
pub mod error;
pub mod filter;
pub mod fs;
pub mod node;
pub mod query;
pub mod scan;
pub mod types;

// Re-export main types
pub use cancel::CancellationToken;
pub use config::{FindConfig, FindOptions, Finder, StartPaths};
pub use error::{FindError, Result};
pub use filter::{Decision, DynFilter, Filter};
pub use fs::{FileSystem, LocalFs, MemoryFs};
pub use node::PathNode;
pub use query::{CompiledQuery, Expression, ExpressionParser};
pub use scan::{Entry, ErrorCallback, FanOut, Scan, ScanStats};
pub use types::{FileKind, Metadata};
