//! Declarative scan expressions.
//!
//! This module compiles find-style expressions written as plain data
//! (strings, lists and single-key maps, usually JSON) into a [`Filter`]:
//! - Expression types (accept, prune, AND, OR, NOT, terms)
//! - Parsing from `serde_json::Value`
//! - Evaluation with sticky accept/prune effects
//!
//! [`Filter`]: crate::filter::Filter

mod evaluate;
mod expression;
mod matcher;
mod parser;

use std::sync::Arc;

use crate::error::Result;
use crate::filter::DynFilter;

pub use evaluate::Verdict;
pub use expression::{Expression, QueryTerm};
pub use matcher::CompiledQuery;
pub use parser::{ExpressionParser, OPERATORS};

/// Compiles an expression value into a filter ready for scanning.
pub fn compile(expression: &serde_json::Value, case_insensitive: bool) -> Result<DynFilter> {
    Ok(Arc::new(CompiledQuery::compile(expression, case_insensitive)?))
}
