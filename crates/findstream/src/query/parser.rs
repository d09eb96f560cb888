//! Expression parser over plain data values.
//!
//! Grammar:
//! - a string is a nullary operator (`accept`, `true`, `false`, `prune`);
//! - a list is an implicit AND of its elements;
//! - a single-key map applies the operator named by the key to its value.

use serde_json::Value;

use crate::error::{FindError, Result};

use super::expression::{Expression, QueryTerm};

/// Every operator the parser understands.
pub const OPERATORS: &[&str] = &[
    "accept", "and", "false", "iname", "ipath", "name", "not", "or", "path", "prune", "regex",
    "true", "type",
];

pub struct ExpressionParser;

impl ExpressionParser {
    pub fn parse(value: &Value) -> Result<Expression> {
        parse_value(value)
    }

    /// Parses expression JSON text.
    pub fn parse_str(input: &str) -> Result<Expression> {
        let value: Value = serde_json::from_str(input)
            .map_err(|error| FindError::config(format!("malformed expression JSON: {error}")))?;
        parse_value(&value)
    }
}

fn parse_value(value: &Value) -> Result<Expression> {
    match value {
        Value::String(operator) => parse_nullary(operator),
        Value::Array(items) => Ok(Expression::And(parse_list(items)?)),
        Value::Object(map) => {
            let mut entries = map.iter();
            let (Some((operator, argument)), None) = (entries.next(), entries.next()) else {
                return Err(FindError::config(format!(
                    "operator maps must have exactly one key, found {}",
                    map.len()
                )));
            };
            parse_operator(operator, argument)
        }
        other => Err(FindError::config(format!(
            "expected an operator, a list, or a map, found {}",
            value_kind(other)
        ))),
    }
}

fn parse_list(items: &[Value]) -> Result<Vec<Expression>> {
    items.iter().map(parse_value).collect()
}

fn parse_nullary(operator: &str) -> Result<Expression> {
    match operator {
        "accept" => Ok(Expression::Accept),
        "true" => Ok(Expression::Constant(true)),
        "false" => Ok(Expression::Constant(false)),
        "prune" => Ok(Expression::Prune),
        known if OPERATORS.contains(&known) => Err(FindError::config(format!(
            "{operator}: requires an argument"
        ))),
        _ => Err(unknown_operator(operator)),
    }
}

fn parse_operator(operator: &str, argument: &Value) -> Result<Expression> {
    match operator {
        // Constants ignore their argument.
        "accept" | "true" | "false" => parse_nullary(operator),
        "prune" => match argument {
            Value::Null => Ok(Expression::Prune),
            other => Ok(Expression::PruneIf(Box::new(parse_value(other)?))),
        },
        "not" => Ok(Expression::Not(Box::new(parse_value(argument)?))),
        "and" => match argument {
            Value::Array(items) => Ok(Expression::And(parse_list(items)?)),
            other => Ok(Expression::And(vec![parse_value(other)?])),
        },
        "or" => match argument {
            Value::Array(items) => Ok(Expression::Or(parse_list(items)?)),
            other => Err(FindError::config(format!(
                "or: requires a list of expressions, found {}",
                value_kind(other)
            ))),
        },
        "name" | "iname" => Ok(Expression::Term(QueryTerm::Name {
            glob: string_argument(operator, argument)?,
            case_insensitive: operator == "iname",
        })),
        "path" | "ipath" => Ok(Expression::Term(QueryTerm::Path {
            glob: string_argument(operator, argument)?,
            case_insensitive: operator == "ipath",
        })),
        "regex" => Ok(Expression::Term(QueryTerm::Regex(string_argument(
            operator, argument,
        )?))),
        "type" => Ok(Expression::Term(QueryTerm::Type(string_argument(
            operator, argument,
        )?))),
        _ => Err(unknown_operator(operator)),
    }
}

fn string_argument(operator: &str, argument: &Value) -> Result<String> {
    match argument {
        Value::String(value) => Ok(value.clone()),
        other => Err(FindError::config(format!(
            "{operator}: requires a string, found {}",
            value_kind(other)
        ))),
    }
}

fn unknown_operator(operator: &str) -> FindError {
    FindError::config(format!(
        "unknown operator {operator:?} (expected one of: {})",
        OPERATORS.join(", ")
    ))
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
