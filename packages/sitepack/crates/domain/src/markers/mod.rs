//! Environment markers: the boolean expressions attached to lockfile packages
//! (`sys_platform == "linux" and python_version >= "3.9"`) that decide whether
//! a package applies to the running interpreter.

pub mod environment;
pub mod parser;
pub mod tokenizer;

pub use environment::MarkerEnvironment;
pub use parser::{MarkerExpr, Operand};
pub use tokenizer::{Op, Token};

use std::cmp::Ordering;
use thiserror::Error;

/// Malformed marker text. Never silently treated as true or false.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerSyntaxError {
    #[error("unterminated string")]
    UnterminatedString,

    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of marker")]
    UnexpectedEnd,

    #[error("missing closing parenthesis")]
    MissingClosingParen,

    #[error("unmatched closing parenthesis")]
    UnmatchedClosingParen,

    #[error("missing right operand after '{0}'")]
    MissingRightOperand(Op),

    #[error("unexpected token '{0}'")]
    UnexpectedToken(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarkerError {
    #[error("marker syntax error: {0}")]
    Syntax(#[from] MarkerSyntaxError),

    #[error("'{0}' is not a boolean expression")]
    NotBoolean(String),
}

/// A parsed marker. The empty marker always holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Marker {
    expr: Option<MarkerExpr>,
}

impl Marker {
    pub fn parse(text: &str) -> Result<Self, MarkerSyntaxError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let tokens = tokenizer::tokenize(text)?;
        let expr = parser::parse(&tokens)?;
        Ok(Self { expr: Some(expr) })
    }

    pub fn evaluate(&self, env: &MarkerEnvironment) -> Result<bool, MarkerError> {
        match &self.expr {
            None => Ok(true),
            Some(expr) => expr.evaluate(env),
        }
    }
}

/// Parse and evaluate `expression` against `env` in one step.
pub fn evaluate(expression: &str, env: &MarkerEnvironment) -> Result<bool, MarkerError> {
    Marker::parse(expression)?.evaluate(env)
}

impl MarkerExpr {
    pub fn evaluate(&self, env: &MarkerEnvironment) -> Result<bool, MarkerError> {
        match self {
            MarkerExpr::And(left, right) => Ok(left.evaluate(env)? && right.evaluate(env)?),
            MarkerExpr::Or(left, right) => Ok(left.evaluate(env)? || right.evaluate(env)?),
            MarkerExpr::Compare { op, left, right } => {
                Ok(compare(resolve(left, env), resolve(right, env), *op))
            }
            MarkerExpr::Value(Operand::Var(name)) | MarkerExpr::Value(Operand::Literal(name)) => {
                Err(MarkerError::NotBoolean(name.clone()))
            }
        }
    }
}

fn resolve<'a>(operand: &'a Operand, env: &'a MarkerEnvironment) -> &'a str {
    match operand {
        Operand::Var(name) => env.get(name),
        Operand::Literal(value) => value,
    }
}

fn compare(left: &str, right: &str, op: Op) -> bool {
    match op {
        Op::Eq => left == right,
        Op::Ne => left != right,
        Op::Lt => version_compare(left, right) == Ordering::Less,
        Op::Le => version_compare(left, right) != Ordering::Greater,
        Op::Gt => version_compare(left, right) == Ordering::Greater,
        Op::Ge => version_compare(left, right) != Ordering::Less,
    }
}

/// Compare dotted versions component by component as integers.
///
/// Non-numeric and missing components count as zero, so `"2.0"` equals
/// `"2.0.0"` and `"3.12rc1"` orders like `"3.0"`.
pub fn version_compare(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| -> Vec<i64> { s.split('.').map(|c| c.parse().unwrap_or(0)).collect() };
    let (left, right) = (parse(a), parse(b));

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            decided => return decided,
        }
    }
    Ordering::Equal
}
