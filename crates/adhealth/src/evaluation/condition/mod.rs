//! Rule condition language.
//!
//! Conditions are small boolean expressions such as
//! `OffsetSeconds > MaxTimeSkewSeconds AND NOT IsHealthy` or
//! `Any(Status == 'Failed') OR Count > 5`. They are tokenized, parsed into an
//! [`Expr`] tree and walked by an interpreter that can only read the check's
//! raw output and the run's thresholds.
//!
//! Identifiers resolve against thresholds first, then against the fields of
//! a scalar output. Sequence outputs expose their elements only through
//! `Any(...)` and their size through `Count`.

mod interpreter;
mod lexer;
mod parser;

pub use interpreter::Operand;
pub use lexer::CompareOp;
pub use parser::Expr;

use super::record::RawOutput;
use super::thresholds::ThresholdSet;
use interpreter::Interpreter;
use std::str::FromStr;
use tracing::debug;

/// Reasons a condition fails to parse or evaluate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("condition ended unexpectedly")]
    UnexpectedEnd,
    #[error("'{0}' does not name a threshold or field")]
    Unresolved(String),
    #[error("cannot compare {left} {op} {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("condition produced a {0} value instead of a boolean")]
    NotBoolean(&'static str),
    #[error("Any(...) requires a sequence output")]
    CollectionRequired,
}

/// A parsed rule condition together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    source: String,
    expr: Expr,
}

impl Condition {
    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        let expr = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn evaluate(
        &self,
        output: &RawOutput,
        thresholds: &ThresholdSet,
    ) -> Result<bool, ConditionError> {
        Interpreter::new(output, thresholds).truth(&self.expr)
    }
}

impl FromStr for Condition {
    type Err = ConditionError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::parse(source)
    }
}

/// Evaluates `source` against `output`, reading any failure as "not matched".
pub fn condition_matches(source: &str, output: &RawOutput, thresholds: &ThresholdSet) -> bool {
    match Condition::parse(source).and_then(|condition| condition.evaluate(output, thresholds)) {
        Ok(matched) => matched,
        Err(error) => {
            debug!(condition = source, %error, "condition treated as not matched");
            false
        }
    }
}
