//! Compiled queries usable as filters.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::filter::{Decision, Filter};
use crate::node::PathNode;

use super::evaluate::{Program, Verdict};
use super::expression::{case_insensitive_expression, Expression};
use super::parser::ExpressionParser;

/// A parsed and compiled expression.
///
/// A node is included when an `accept` ran while evaluating it, and the
/// scan stops below it when a prune ran.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    expression: Expression,
    program: Program,
}

impl CompiledQuery {
    /// Parses and compiles an expression value.
    ///
    /// With `case_insensitive`, every `name` and `path` term behaves like its
    /// `iname`/`ipath` counterpart.
    pub fn compile(value: &Value, case_insensitive: bool) -> Result<Self> {
        let mut expression = ExpressionParser::parse(value)?;
        if case_insensitive {
            expression = case_insensitive_expression(expression);
        }
        Self::from_expression(expression)
    }

    /// Compiles an already parsed expression, adding the implicit `accept`.
    pub fn from_expression(expression: Expression) -> Result<Self> {
        let expression = expression.with_implicit_accept();
        let program = Program::compile(&expression)?;
        tracing::trace!(?expression, "compiled scan expression");
        Ok(Self {
            expression,
            program,
        })
    }

    /// Returns the expression as evaluated, implicit `accept` included.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub async fn evaluate(&self, node: &PathNode) -> Result<Verdict> {
        self.program.evaluate(node).await
    }
}

#[async_trait]
impl Filter for CompiledQuery {
    async fn decide(&self, node: &PathNode) -> Result<Decision> {
        let verdict = self.evaluate(node).await?;
        Ok(Decision::new(verdict.accepted, verdict.ascend))
    }
}
