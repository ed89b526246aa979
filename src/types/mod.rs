//! Core data types: records and errors.

pub mod error;
pub mod record;

pub use error::{QueryError, Result};
pub use record::{into_record, value_kind, Record};
