//! Abstract syntax tree for parsed queries.
//!
//! The WHERE clause is a right-leaning tree mirroring the grammar:
//!
//! ```text
//! WhereClause  := WhereTerm [OR WhereClause]
//! WhereTerm    := WhereFactor [AND WhereTerm]
//! WhereFactor  := [NOT] WherePrimary
//! WherePrimary := ( WhereClause ) | Condition
//! ```
//!
//! Every node owns its children. `Display` renders canonical query text that
//! parses back to an equal tree.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A field name written as `{identifier}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    lexeme: String,
}

impl Reference {
    /// Wrap a reference lexeme as produced by the lexer (braces included).
    pub fn from_lexeme(lexeme: impl Into<String>) -> Self {
        Self {
            lexeme: lexeme.into(),
        }
    }

    /// Build a reference from a bare field name.
    pub fn new(name: &str) -> Self {
        Self {
            lexeme: format!("{{{name}}}"),
        }
    }

    /// Field name with braces stripped; the lookup key into a record.
    pub fn name(&self) -> &str {
        self.lexeme
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or(&self.lexeme)
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexeme)
    }
}

/// Fields kept in output records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// `*`
    All,
    /// `{a}, {b}, ...` in the order written
    Fields(Vec<Reference>),
}

impl Projection {
    pub fn is_all(&self) -> bool {
        matches!(self, Projection::All)
    }

    /// Selected references; empty for the wildcard.
    pub fn fields(&self) -> &[Reference] {
        match self {
            Projection::All => &[],
            Projection::Fields(fields) => fields,
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::All => f.write_str("*"),
            Projection::Fields(fields) => {
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{field}")?;
                }
                Ok(())
            }
        }
    }
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparator {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<>`
    Ne,
}

impl Comparator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Ne => "<>",
        }
    }

    /// Whether the comparator needs an ordering rather than just equality.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, Self::Eq | Self::Ne)
    }

    /// Whether an ordering between left and right operand satisfies the comparator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Lte => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Gte => ordering != Ordering::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Numeric value of a literal or record field.
///
/// Integers are kept exact; anything else is compared as `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    /// Parse a number lexeme such as `-12` or `3.25`.
    pub fn parse(text: &str) -> Option<Self> {
        if !text.contains('.') {
            if let Ok(value) = text.parse::<i64>() {
                return Some(Numeric::Int(value));
            }
        }
        text.parse::<f64>().ok().map(Numeric::Float)
    }

    pub fn from_json(number: &serde_json::Number) -> Option<Self> {
        number
            .as_i64()
            .map(Numeric::Int)
            .or_else(|| number.as_f64().map(Numeric::Float))
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Numeric::Int(value) => *value as f64,
            Numeric::Float(value) => *value,
        }
    }

    /// Numeric ordering; `None` only when a NaN is involved.
    pub fn compare(&self, other: &Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RValue {
    Reference(Reference),
    /// Number literal; the value is parsed once, at parse time
    Number { lexeme: String, value: Numeric },
    /// String literal; the lexeme keeps its quotes
    String { lexeme: String },
}

impl RValue {
    /// Build a number operand from its lexeme.
    ///
    /// # Returns
    ///
    /// `None` if the lexeme is not a number
    pub fn number(lexeme: impl Into<String>) -> Option<Self> {
        let lexeme = lexeme.into();
        let value = Numeric::parse(&lexeme)?;
        Some(RValue::Number { lexeme, value })
    }

    pub fn string(lexeme: impl Into<String>) -> Self {
        RValue::String {
            lexeme: lexeme.into(),
        }
    }

    /// Unquoted text of a string literal.
    pub fn text(&self) -> Option<&str> {
        match self {
            RValue::String { lexeme } => Some(unquote(lexeme)),
            _ => None,
        }
    }
}

pub(crate) fn unquote(lexeme: &str) -> &str {
    let mut chars = lexeme.chars();
    match (chars.next(), chars.next_back()) {
        (Some(open), Some(close)) if open == close && (open == '\'' || open == '"') => {
            &lexeme[open.len_utf8()..lexeme.len() - close.len_utf8()]
        }
        _ => lexeme,
    }
}

impl fmt::Display for RValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RValue::Reference(reference) => write!(f, "{reference}"),
            RValue::Number { lexeme, .. } | RValue::String { lexeme } => f.write_str(lexeme),
        }
    }
}

/// Leaf predicate: `{field} <comparator> <rvalue>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub left: Reference,
    pub comparator: Comparator,
    pub right: RValue,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.comparator, self.right)
    }
}

/// OR level: `term [OR rest]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    pub term: WhereTerm,
    pub rest: Option<Box<WhereClause>>,
}

/// AND level: `factor [AND rest]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereTerm {
    pub factor: WhereFactor,
    pub rest: Option<Box<WhereTerm>>,
}

/// NOT level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WhereFactor {
    Not(WherePrimary),
    Primary(WherePrimary),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WherePrimary {
    /// Parenthesized clause
    Group(Box<WhereClause>),
    Condition(Condition),
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.term)?;
        if let Some(rest) = &self.rest {
            write!(f, " OR {rest}")?;
        }
        Ok(())
    }
}

impl fmt::Display for WhereTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor)?;
        if let Some(rest) = &self.rest {
            write!(f, " AND {rest}")?;
        }
        Ok(())
    }
}

impl fmt::Display for WhereFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WhereFactor::Not(primary) => write!(f, "NOT {primary}"),
            WhereFactor::Primary(primary) => write!(f, "{primary}"),
        }
    }
}

impl fmt::Display for WherePrimary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WherePrimary::Group(inner) => write!(f, "( {inner} )"),
            WherePrimary::Condition(condition) => write!(f, "{condition}"),
        }
    }
}

/// Root of a parsed `SELECT ... FROM ... [WHERE ...]` statement.
///
/// Immutable once built; safe to share between threads evaluating
/// different records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub projection: Projection,
    pub source: Reference,
    /// `None` when the statement has no WHERE clause
    pub where_clause: Option<WhereClause>,
}

impl ParsedQuery {
    /// Name of the collection the query reads from, braces stripped.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }
}

impl fmt::Display for ParsedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT {} FROM {}", self.projection, self.source)?;
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {where_clause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_name() {
        let reference = Reference::from_lexeme("{sales_team}");
        assert_eq!(reference.name(), "sales_team");
        assert_eq!(reference.lexeme(), "{sales_team}");
        assert_eq!(Reference::new("city"), Reference::from_lexeme("{city}"));
        assert_eq!(Reference::from_lexeme("{}").name(), "");
    }

    #[test]
    fn test_comparator_accepts() {
        use Ordering::*;
        assert!(Comparator::Eq.accepts(Equal));
        assert!(!Comparator::Eq.accepts(Less));
        assert!(Comparator::Ne.accepts(Greater));
        assert!(Comparator::Lte.accepts(Less));
        assert!(Comparator::Lte.accepts(Equal));
        assert!(!Comparator::Lte.accepts(Greater));
        assert!(Comparator::Gte.accepts(Equal));
        assert!(!Comparator::Gt.accepts(Equal));
        assert!(Comparator::Lt.is_ordering());
        assert!(!Comparator::Ne.is_ordering());
    }

    #[test]
    fn test_numeric_parse() {
        assert_eq!(Numeric::parse("42"), Some(Numeric::Int(42)));
        assert_eq!(Numeric::parse("-7"), Some(Numeric::Int(-7)));
        assert_eq!(Numeric::parse("1.5"), Some(Numeric::Float(1.5)));
        assert_eq!(
            Numeric::parse("99999999999999999999"),
            Some(Numeric::Float(99999999999999999999.0))
        );
        assert_eq!(Numeric::parse("abc"), None);
    }

    #[test]
    fn test_numeric_compare() {
        assert_eq!(
            Numeric::Int(2).compare(&Numeric::Float(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Numeric::Int(i64::MAX).compare(&Numeric::Int(i64::MAX - 1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Numeric::Float(-0.5).compare(&Numeric::Int(0)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_string_literal_text() {
        assert_eq!(RValue::string("'STRVAL'").text(), Some("STRVAL"));
        assert_eq!(RValue::string("\"it's\"").text(), Some("it's"));
        assert_eq!(RValue::string("''").text(), Some(""));
        assert_eq!(RValue::number("1").unwrap().text(), None);
    }

    #[test]
    fn test_display() {
        let condition = Condition {
            left: Reference::new("val1"),
            comparator: Comparator::Gt,
            right: RValue::number("1").unwrap(),
        };
        let clause = WhereClause {
            term: WhereTerm {
                factor: WhereFactor::Not(WherePrimary::Condition(condition.clone())),
                rest: None,
            },
            rest: None,
        };
        let query = ParsedQuery {
            projection: Projection::Fields(vec![Reference::new("a"), Reference::new("b")]),
            source: Reference::new("source"),
            where_clause: Some(clause),
        };
        assert_eq!(condition.to_string(), "{val1} > 1");
        assert_eq!(
            query.to_string(),
            "SELECT {a}, {b} FROM {source} WHERE NOT {val1} > 1"
        );
        assert_eq!(query.source_name(), "source");
    }
}
