use super::lexer::CompareOp;
use super::parser::Expr;
use super::ConditionError;
use crate::evaluation::record::{FieldValue, RawOutput, Record};
use crate::evaluation::thresholds::ThresholdSet;
use std::cmp::Ordering;

/// Value an operand resolves to during interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Operand {
    pub const fn kind(&self) -> &'static str {
        match self {
            Operand::Null => "null",
            Operand::Bool(_) => "bool",
            Operand::Number(_) => "number",
            Operand::Text(_) => "text",
        }
    }
}

impl From<&FieldValue> for Operand {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Null => Operand::Null,
            FieldValue::Bool(value) => Operand::Bool(*value),
            FieldValue::Number(_) => value.as_f64().map_or(Operand::Null, Operand::Number),
            FieldValue::Text(text) => Operand::Text(text.clone()),
            FieldValue::Nested(value) => Operand::Text(value.to_string()),
        }
    }
}

#[derive(Clone, Copy)]
enum Scope<'a> {
    Empty,
    Record(&'a Record),
    Sequence(&'a [Record]),
}

/// Walks a parsed condition against one output and the run's thresholds.
pub(crate) struct Interpreter<'a> {
    thresholds: &'a ThresholdSet,
    scope: Scope<'a>,
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(output: &'a RawOutput, thresholds: &'a ThresholdSet) -> Self {
        let scope = match output {
            RawOutput::Empty => Scope::Empty,
            RawOutput::Scalar(record) => Scope::Record(record),
            RawOutput::Sequence(records) => Scope::Sequence(records),
        };
        Self { thresholds, scope }
    }

    pub(crate) fn truth(&self, expr: &Expr) -> Result<bool, ConditionError> {
        match self.value(expr)? {
            Operand::Bool(value) => Ok(value),
            other => Err(ConditionError::NotBoolean(other.kind())),
        }
    }

    fn value(&self, expr: &Expr) -> Result<Operand, ConditionError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier(name) => self.resolve(name),
            Expr::Count => self.count(),
            Expr::Any(inner) => self.any(inner).map(Operand::Bool),
            Expr::Not(inner) => Ok(Operand::Bool(!self.truth(inner)?)),
            Expr::And(left, right) => Ok(Operand::Bool(self.truth(left)? && self.truth(right)?)),
            Expr::Or(left, right) => Ok(Operand::Bool(self.truth(left)? || self.truth(right)?)),
            Expr::Compare { op, left, right } => {
                compare(*op, &self.value(left)?, &self.value(right)?).map(Operand::Bool)
            }
        }
    }

    fn resolve(&self, name: &str) -> Result<Operand, ConditionError> {
        if let Some(value) = self.thresholds.get(name) {
            return Ok(Operand::from(value));
        }

        match self.scope {
            Scope::Record(record) => record
                .get(name)
                .map(Operand::from)
                .ok_or_else(|| ConditionError::Unresolved(name.to_string())),
            // Sequence outputs only expose fields through Any(...).
            Scope::Sequence(_) | Scope::Empty => Err(ConditionError::Unresolved(name.to_string())),
        }
    }

    fn count(&self) -> Result<Operand, ConditionError> {
        if let Some(value) = self.thresholds.get("Count") {
            return Ok(Operand::from(value));
        }

        match self.scope {
            Scope::Sequence(records) => Ok(Operand::Number(records.len() as f64)),
            Scope::Empty => Ok(Operand::Number(0.0)),
            Scope::Record(_) => self.resolve("Count"),
        }
    }

    fn any(&self, inner: &Expr) -> Result<bool, ConditionError> {
        match self.scope {
            Scope::Sequence(records) => Ok(records.iter().any(|record| {
                let element = Interpreter {
                    thresholds: self.thresholds,
                    scope: Scope::Record(record),
                };
                // An element the predicate cannot be evaluated against does not match.
                element.truth(inner).unwrap_or(false)
            })),
            Scope::Empty => Ok(false),
            Scope::Record(_) => Err(ConditionError::CollectionRequired),
        }
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok()
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "$true" => Some(true),
        "false" | "$false" => Some(false),
        _ => None,
    }
}

fn equals(left: &Operand, right: &Operand) -> bool {
    match (left, right) {
        (Operand::Null, Operand::Null) => true,
        (Operand::Null, _) | (_, Operand::Null) => false,
        (Operand::Number(a), Operand::Number(b)) => a == b,
        (Operand::Number(a), Operand::Text(text)) | (Operand::Text(text), Operand::Number(a)) => {
            parse_number(text) == Some(*a)
        }
        (Operand::Bool(a), Operand::Bool(b)) => a == b,
        (Operand::Bool(a), Operand::Text(text)) | (Operand::Text(text), Operand::Bool(a)) => {
            parse_bool(text) == Some(*a)
        }
        (Operand::Text(a), Operand::Text(b)) => a.to_lowercase() == b.to_lowercase(),
        (Operand::Bool(_), Operand::Number(_)) | (Operand::Number(_), Operand::Bool(_)) => false,
    }
}

fn order(op: CompareOp, left: &Operand, right: &Operand) -> Result<Ordering, ConditionError> {
    let ordering = match (left, right) {
        (Operand::Number(a), Operand::Number(b)) => a.partial_cmp(b),
        (Operand::Number(a), Operand::Text(text)) => {
            parse_number(text).and_then(|b| a.partial_cmp(&b))
        }
        (Operand::Text(text), Operand::Number(b)) => {
            parse_number(text).and_then(|a| a.partial_cmp(b))
        }
        (Operand::Text(a), Operand::Text(b)) => Some(a.to_lowercase().cmp(&b.to_lowercase())),
        _ => None,
    };

    ordering.ok_or_else(|| ConditionError::TypeMismatch {
        op: op.symbol(),
        left: left.kind(),
        right: right.kind(),
    })
}

fn compare(op: CompareOp, left: &Operand, right: &Operand) -> Result<bool, ConditionError> {
    let ordering = match op {
        CompareOp::Eq => return Ok(equals(left, right)),
        CompareOp::Ne => return Ok(!equals(left, right)),
        CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
            order(op, left, right)?
        }
    };

    Ok(match op {
        CompareOp::Gt => ordering.is_gt(),
        CompareOp::Ge => ordering.is_ge(),
        CompareOp::Lt => ordering.is_lt(),
        CompareOp::Le => ordering.is_le(),
        CompareOp::Eq => ordering.is_eq(),
        CompareOp::Ne => ordering.is_ne(),
    })
}
