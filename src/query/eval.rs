//! Predicate evaluation and projection against single records.
//!
//! Evaluation never mutates a record. A reference to a field the record does
//! not have is always an error, never a silent `false` or `null`.
//!
//! Comparison rules:
//! - two numbers compare numerically under every comparator
//! - `=` and `<>` otherwise compare by exact equality; operands of different
//!   types are never equal, so `5 = '5'` is false
//! - `<`, `<=`, `>`, `>=` on anything but two numbers is a
//!   [`QueryError::TypeMismatch`], except string against string when
//!   [`FilterConfig::text_ordering`] is enabled

use super::ast::{
    unquote, Comparator, Condition, Numeric, Projection, RValue, Reference, WhereClause,
    WhereFactor, WherePrimary, WhereTerm,
};
use crate::config::FilterConfig;
use crate::types::{value_kind, QueryError, Record, Result};
use serde_json::Value;

/// A comparison operand after resolution against a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand<'a> {
    Number(Numeric),
    Text(&'a str),
    /// Booleans, nulls and non-scalar values; these only support equality
    Other(&'a Value),
}

impl<'a> Operand<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Number(number) => Numeric::from_json(number)
                .map(Operand::Number)
                .unwrap_or(Operand::Other(value)),
            Value::String(text) => Operand::Text(text),
            other => Operand::Other(other),
        }
    }

    /// Type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Number(_) => "number",
            Operand::Text(_) => "string",
            Operand::Other(value) => value_kind(value),
        }
    }
}

/// Apply `comparator` to two resolved operands.
///
/// # Errors
///
/// Returns `QueryError::TypeMismatch` for an ordering comparator on operands
/// that cannot be ordered
pub fn compare(
    left: Operand<'_>,
    comparator: Comparator,
    right: Operand<'_>,
    config: &FilterConfig,
) -> Result<bool> {
    match (left, right) {
        (Operand::Number(a), Operand::Number(b)) => Ok(match a.compare(&b) {
            Some(ordering) => comparator.accepts(ordering),
            None => comparator == Comparator::Ne,
        }),
        _ if !comparator.is_ordering() => {
            let equal = operands_equal(left, right);
            Ok(if comparator == Comparator::Eq {
                equal
            } else {
                !equal
            })
        }
        (Operand::Text(a), Operand::Text(b)) if config.text_ordering => {
            Ok(comparator.accepts(a.cmp(b)))
        }
        _ => Err(QueryError::TypeMismatch {
            comparator: comparator.symbol().to_string(),
            left: left.kind().to_string(),
            right: right.kind().to_string(),
        }),
    }
}

fn operands_equal(left: Operand<'_>, right: Operand<'_>) -> bool {
    match (left, right) {
        (Operand::Text(a), Operand::Text(b)) => a == b,
        (Operand::Other(a), Operand::Other(b)) => a == b,
        _ => false,
    }
}

impl Reference {
    /// Look up the referenced field in `record`.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnrecognisedReference` if the field is absent
    pub fn resolve<'r>(&self, record: &'r Record) -> Result<&'r Value> {
        record
            .get(self.name())
            .ok_or_else(|| QueryError::UnrecognisedReference(self.name().to_string()))
    }
}

impl RValue {
    /// Resolve the right-hand side of a condition.
    pub fn resolve<'a>(&'a self, record: &'a Record) -> Result<Operand<'a>> {
        match self {
            RValue::Reference(reference) => Ok(Operand::from_value(reference.resolve(record)?)),
            RValue::Number { value, .. } => Ok(Operand::Number(*value)),
            RValue::String { lexeme } => Ok(Operand::Text(unquote(lexeme))),
        }
    }
}

impl Condition {
    pub fn evaluate(&self, record: &Record, config: &FilterConfig) -> Result<bool> {
        let left = Operand::from_value(self.left.resolve(record)?);
        let right = self.right.resolve(record)?;
        compare(left, self.comparator, right, config)
    }
}

impl WhereClause {
    /// Evaluate the clause; OR short-circuits left to right.
    pub fn satisfied(&self, record: &Record, config: &FilterConfig) -> Result<bool> {
        if self.term.satisfied(record, config)? {
            return Ok(true);
        }
        match &self.rest {
            Some(rest) => rest.satisfied(record, config),
            None => Ok(false),
        }
    }
}

impl WhereTerm {
    /// Evaluate the term; AND short-circuits left to right.
    pub fn satisfied(&self, record: &Record, config: &FilterConfig) -> Result<bool> {
        if !self.factor.satisfied(record, config)? {
            return Ok(false);
        }
        match &self.rest {
            Some(rest) => rest.satisfied(record, config),
            None => Ok(true),
        }
    }
}

impl WhereFactor {
    pub fn satisfied(&self, record: &Record, config: &FilterConfig) -> Result<bool> {
        match self {
            WhereFactor::Not(primary) => Ok(!primary.satisfied(record, config)?),
            WhereFactor::Primary(primary) => primary.satisfied(record, config),
        }
    }
}

impl WherePrimary {
    pub fn satisfied(&self, record: &Record, config: &FilterConfig) -> Result<bool> {
        match self {
            WherePrimary::Group(inner) => inner.satisfied(record, config),
            WherePrimary::Condition(condition) => condition.evaluate(record, config),
        }
    }
}

/// Evaluate an optional WHERE clause; no clause accepts every record.
pub fn satisfied(
    where_clause: Option<&WhereClause>,
    record: &Record,
    config: &FilterConfig,
) -> Result<bool> {
    match where_clause {
        Some(clause) => clause.satisfied(record, config),
        None => Ok(true),
    }
}

impl Projection {
    /// Build the output record for `record`.
    ///
    /// The wildcard returns a copy of the whole record. A field list returns
    /// exactly the selected fields, in the order they were written.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::UnrecognisedReference` if a selected field is absent
    pub fn project(&self, record: &Record) -> Result<Record> {
        match self {
            Projection::All => Ok(record.clone()),
            Projection::Fields(fields) => {
                let mut projected = Record::with_capacity(fields.len());
                for field in fields {
                    let value = field.resolve(record)?;
                    projected.insert(field.name().to_string(), value.clone());
                }
                Ok(projected)
            }
        }
    }
}
