//! Tracing instrumentation for query parsing and filtering.
//!
//! Spans follow the OpenTelemetry database conventions:
//! - `db.system.name`: always `"dictql"`
//! - `db.operation.name`: `parse` or `filter`
//! - `db.collection.name`: the query's source identifier
//! - `db.query.text`: the query as written
//!
//! Row counts are recorded on the filter span as `db.response.scanned_rows`
//! and `db.response.returned_rows`.

pub mod query;

pub use query::{init_tracing, query_span, record_filter_metrics, QueryOperation};
