//! Query expression types and AST nodes.

/// A parsed scan expression (AST node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Emits the node.
    Accept,
    /// `true` / `false`.
    Constant(bool),
    /// Bare `prune`: holds and stops descent.
    Prune,
    /// `{prune: expr}`: holds iff `expr` holds, stops descent when it does.
    PruneIf(Box<Expression>),
    Term(QueryTerm),
    Not(Box<Expression>),
    And(Vec<Expression>),
    Or(Vec<Expression>),
}

/// A single predicate (leaf node in the AST).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTerm {
    Name {
        glob: String,
        case_insensitive: bool,
    },
    Path {
        glob: String,
        case_insensitive: bool,
    },
    Regex(String),
    Type(String),
}

impl Expression {
    /// Checks if the expression emits anything on its own.
    pub fn contains_accept(&self) -> bool {
        match self {
            Self::Accept => true,
            Self::Constant(_) | Self::Prune | Self::Term(_) => false,
            Self::PruneIf(inner) | Self::Not(inner) => inner.contains_accept(),
            Self::And(parts) | Self::Or(parts) => parts.iter().any(Self::contains_accept),
        }
    }

    /// Appends an implicit `accept` when the expression has none, the way
    /// find prints by default.
    pub fn with_implicit_accept(self) -> Self {
        if self.contains_accept() {
            return self;
        }
        match self {
            Self::And(mut parts) => {
                parts.push(Self::Accept);
                Self::And(parts)
            }
            other => Self::And(vec![other, Self::Accept]),
        }
    }
}

/// Turns every `name`/`path` term into its case-insensitive variant.
pub fn case_insensitive_expression(expression: Expression) -> Expression {
    match expression {
        Expression::Term(term) => Expression::Term(case_insensitive_term(term)),
        Expression::PruneIf(inner) => {
            Expression::PruneIf(Box::new(case_insensitive_expression(*inner)))
        }
        Expression::Not(inner) => Expression::Not(Box::new(case_insensitive_expression(*inner))),
        Expression::And(parts) => Expression::And(
            parts
                .into_iter()
                .map(case_insensitive_expression)
                .collect::<Vec<_>>(),
        ),
        Expression::Or(parts) => Expression::Or(
            parts
                .into_iter()
                .map(case_insensitive_expression)
                .collect::<Vec<_>>(),
        ),
        other => other,
    }
}

fn case_insensitive_term(term: QueryTerm) -> QueryTerm {
    match term {
        QueryTerm::Name { glob, .. } => QueryTerm::Name {
            glob,
            case_insensitive: true,
        },
        QueryTerm::Path { glob, .. } => QueryTerm::Path {
            glob,
            case_insensitive: true,
        },
        // Regex and type terms have their own syntax for case.
        other => other,
    }
}
