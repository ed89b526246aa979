//! Query span helpers.

use tracing::{field, span, Level, Span};
use tracing_subscriber::EnvFilter;

/// Query operation types (maps to `db.operation.name`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOperation {
    /// Lex and parse query text
    Parse,
    /// Evaluate a parsed query over a collection
    Filter,
}

impl QueryOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Filter => "filter",
        }
    }
}

/// Create a query span with database semantic attributes.
///
/// The row count fields start empty and are filled in by
/// [`record_filter_metrics`] while the span is entered.
///
/// # Example
///
/// ```rust,ignore
/// let span = query_span(QueryOperation::Filter, Some("sales_team"), sql);
/// let _guard = span.enter();
/// ```
pub fn query_span(operation: QueryOperation, collection: Option<&str>, query_text: &str) -> Span {
    let span_name = match collection {
        Some(coll) => format!("{} {}", operation.as_str(), coll),
        None => operation.as_str().to_string(),
    };

    let span = span!(
        Level::INFO,
        "dictql.query",
        otel.name = %span_name,
        otel.kind = "internal",
        db.system.name = "dictql",
        db.operation.name = operation.as_str(),
        db.collection.name = field::Empty,
        db.query.text = query_text,
        db.response.scanned_rows = field::Empty,
        db.response.returned_rows = field::Empty,
    );

    if let Some(coll) = collection {
        span.record("db.collection.name", coll);
    }

    span
}

/// Record row counts on the current span.
pub fn record_filter_metrics(scanned: usize, returned: usize) {
    let span = Span::current();
    span.record("db.response.scanned_rows", scanned);
    span.record("db.response.returned_rows", returned);
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"dictql=info"`).
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(default_directive: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
