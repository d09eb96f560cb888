//! Expression evaluation against nodes.

use futures_util::future::{BoxFuture, FutureExt};

use crate::error::Result;
use crate::filter::{self, DynFilter};
use crate::node::PathNode;

use super::expression::{Expression, QueryTerm};

/// The result of evaluating an expression against one node.
///
/// `holds` is the truth value that drives `not`, `and` and `or`.
/// `accepted` and `ascend` record whether an `accept` or a prune ran while
/// evaluating; once set they stay set, however the surrounding logic turns
/// out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verdict {
    pub holds: bool,
    pub accepted: bool,
    pub ascend: bool,
}

impl Verdict {
    fn holds(holds: bool) -> Self {
        Self {
            holds,
            ..Self::default()
        }
    }

    fn absorb(&mut self, other: Verdict) {
        self.holds = other.holds;
        self.accepted |= other.accepted;
        self.ascend |= other.ascend;
    }
}

/// An expression whose terms are compiled to filters.
#[derive(Debug, Clone)]
pub(crate) enum Program {
    Accept,
    Constant(bool),
    Prune,
    PruneIf(Box<Program>),
    Term(DynFilter),
    Not(Box<Program>),
    And(Vec<Program>),
    Or(Vec<Program>),
}

impl Program {
    pub(crate) fn compile(expression: &Expression) -> Result<Self> {
        Ok(match expression {
            Expression::Accept => Self::Accept,
            Expression::Constant(value) => Self::Constant(*value),
            Expression::Prune => Self::Prune,
            Expression::PruneIf(inner) => Self::PruneIf(Box::new(Self::compile(inner)?)),
            Expression::Term(term) => Self::Term(compile_term(term)?),
            Expression::Not(inner) => Self::Not(Box::new(Self::compile(inner)?)),
            Expression::And(parts) => Self::And(compile_all(parts)?),
            Expression::Or(parts) => Self::Or(compile_all(parts)?),
        })
    }

    pub(crate) fn evaluate<'a>(&'a self, node: &'a PathNode) -> BoxFuture<'a, Result<Verdict>> {
        async move {
            match self {
                Self::Accept => Ok(Verdict {
                    holds: true,
                    accepted: true,
                    ascend: false,
                }),
                Self::Constant(value) => Ok(Verdict::holds(*value)),
                Self::Prune => Ok(Verdict {
                    holds: true,
                    accepted: false,
                    ascend: true,
                }),
                Self::PruneIf(inner) => {
                    let verdict = inner.evaluate(node).await?;
                    Ok(Verdict {
                        ascend: verdict.ascend || verdict.holds,
                        ..verdict
                    })
                }
                Self::Term(filter) => {
                    let decision = filter.decide(node).await?;
                    Ok(Verdict {
                        holds: decision.include,
                        accepted: false,
                        ascend: decision.ascend,
                    })
                }
                Self::Not(inner) => {
                    let verdict = inner.evaluate(node).await?;
                    Ok(Verdict {
                        holds: !verdict.holds,
                        ..verdict
                    })
                }
                Self::And(parts) => {
                    let mut verdict = Verdict::holds(true);
                    for part in parts {
                        verdict.absorb(part.evaluate(node).await?);
                        if !verdict.holds {
                            break;
                        }
                    }
                    Ok(verdict)
                }
                Self::Or(parts) => {
                    let mut verdict = Verdict::holds(false);
                    for part in parts {
                        verdict.absorb(part.evaluate(node).await?);
                        if verdict.holds {
                            break;
                        }
                    }
                    Ok(verdict)
                }
            }
        }
        .boxed()
    }
}

fn compile_all(parts: &[Expression]) -> Result<Vec<Program>> {
    parts.iter().map(Program::compile).collect()
}

fn compile_term(term: &QueryTerm) -> Result<DynFilter> {
    match term {
        QueryTerm::Name {
            glob,
            case_insensitive: false,
        } => filter::name(glob),
        QueryTerm::Name {
            glob,
            case_insensitive: true,
        } => filter::iname(glob),
        QueryTerm::Path {
            glob,
            case_insensitive: false,
        } => filter::path(glob),
        QueryTerm::Path {
            glob,
            case_insensitive: true,
        } => filter::ipath(glob),
        QueryTerm::Regex(pattern) => filter::regex(pattern),
        QueryTerm::Type(codes) => filter::file_type(codes),
    }
}
