//! Record filter: parse a query once, apply it to many records.
//!
//! ```rust,ignore
//! use dictql::RecordFilter;
//!
//! let filter = RecordFilter::new("SELECT {name} FROM {sales_team} WHERE {sales} > 400")?;
//! let top = filter.filter("sales_team", &records)?;
//! ```

use crate::config::{FilterConfig, MissingReferencePolicy};
use crate::otel::{query_span, record_filter_metrics, QueryOperation};
use crate::query::{eval, parse, ParsedQuery};
use crate::types::{QueryError, Record, Result};
use rayon::prelude::*;
use tracing::Span;

/// A compiled query plus the policy used to evaluate it.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    sql: String,
    query: ParsedQuery,
    config: FilterConfig,
}

impl RecordFilter {
    /// Parse `sql` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidToken` or `QueryError::UnexpectedToken` if
    /// the query text is malformed
    pub fn new(sql: &str) -> Result<Self> {
        Self::with_config(sql, FilterConfig::default())
    }

    pub fn with_config(sql: &str, config: FilterConfig) -> Result<Self> {
        let span = query_span(QueryOperation::Parse, None, sql);
        let _guard = span.enter();

        let query = parse(sql).inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected query");
        })?;
        span.record("db.collection.name", query.source_name());
        tracing::debug!(
            source = query.source_name(),
            missing_reference = %config.missing_reference,
            "Parsed query"
        );

        Ok(Self {
            sql: sql.to_string(),
            query,
            config,
        })
    }

    /// FROM identifier with braces removed.
    pub fn source_name(&self) -> &str {
        self.query.source_name()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn query(&self) -> &ParsedQuery {
        &self.query
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Whether `record` satisfies the WHERE clause. No clause matches everything.
    pub fn is_satisfied(&self, record: &Record) -> Result<bool> {
        eval::satisfied(self.query.where_clause.as_ref(), record, &self.config)
    }

    pub fn project(&self, record: &Record) -> Result<Record> {
        self.query.projection.project(record)
    }

    /// Projection of `record` if it satisfies the query, `None` otherwise.
    pub fn apply(&self, record: &Record) -> Result<Option<Record>> {
        if self.is_satisfied(record)? {
            self.project(record).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Filter `records`, returning projections of matching records in input order.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidCollection` if `collection` is not the
    /// query's source. Under [`MissingReferencePolicy::Abort`] the first
    /// failing record's error is returned
    pub fn filter(&self, collection: &str, records: &[Record]) -> Result<Vec<Record>> {
        self.check_collection(collection)?;
        let span = query_span(QueryOperation::Filter, Some(collection), &self.sql);
        let _guard = span.enter();

        let mut results = Vec::new();
        for (index, record) in records.iter().enumerate() {
            if let Some(projected) = self.settle(index, self.apply(record))? {
                results.push(projected);
            }
        }

        record_filter_metrics(records.len(), results.len());
        Ok(results)
    }

    /// Filter a single named source out of `sources`.
    ///
    /// Exactly one source must be given and its name must match the query.
    pub fn filter_named<'r, S, I>(&self, sources: I) -> Result<Vec<Record>>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = (S, &'r [Record])>,
    {
        let mut sources = sources.into_iter();
        match (sources.next(), sources.next()) {
            (Some((name, records)), None) => self.filter(name.as_ref(), records),
            (None, _) => Err(QueryError::InvalidCollection(
                "Expected one named source, got none".to_string(),
            )),
            (Some(_), Some(_)) => Err(QueryError::InvalidCollection(format!(
                "Expected one named source, got {}",
                2 + sources.count()
            ))),
        }
    }

    /// Lazily filter `records`.
    ///
    /// The collection name is checked before anything is read. The returned
    /// iterator pulls one input record at a time and stops after yielding an
    /// error.
    pub fn filter_iter<I>(&self, collection: &str, records: I) -> Result<FilterIter<'_, I::IntoIter>>
    where
        I: IntoIterator<Item = Record>,
    {
        self.check_collection(collection)?;
        Ok(FilterIter {
            filter: self,
            records: records.into_iter(),
            span: query_span(QueryOperation::Filter, Some(collection), &self.sql),
            scanned: 0,
            returned: 0,
            done: false,
        })
    }

    /// Parallel [`filter`](Self::filter). Output order matches input order.
    pub fn filter_par(&self, collection: &str, records: &[Record]) -> Result<Vec<Record>> {
        self.check_collection(collection)?;
        let span = query_span(QueryOperation::Filter, Some(collection), &self.sql);
        let _guard = span.enter();

        let outcomes: Vec<Result<Option<Record>>> =
            records.par_iter().map(|record| self.apply(record)).collect();

        let mut results = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            if let Some(projected) = self.settle(index, outcome)? {
                results.push(projected);
            }
        }

        record_filter_metrics(records.len(), results.len());
        Ok(results)
    }

    fn check_collection(&self, collection: &str) -> Result<()> {
        if collection == self.source_name() {
            Ok(())
        } else {
            Err(QueryError::InvalidCollection(format!(
                "Collection '{}' does not match FROM reference '{}'",
                collection,
                self.source_name()
            )))
        }
    }

    /// Apply the error policy to one record's outcome.
    fn settle(&self, index: usize, outcome: Result<Option<Record>>) -> Result<Option<Record>> {
        match outcome {
            Err(e)
                if e.is_record_error()
                    && self.config.missing_reference == MissingReferencePolicy::Skip =>
            {
                tracing::warn!(index, error = %e, "Skipping record");
                Ok(None)
            }
            other => other,
        }
    }
}

/// Lazy iterator returned by [`RecordFilter::filter_iter`].
pub struct FilterIter<'f, I> {
    filter: &'f RecordFilter,
    records: I,
    span: Span,
    scanned: usize,
    returned: usize,
    done: bool,
}

impl<I> Iterator for FilterIter<'_, I>
where
    I: Iterator<Item = Record>,
{
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let _guard = self.span.enter();

        for record in self.records.by_ref() {
            let index = self.scanned;
            self.scanned += 1;
            match self.filter.settle(index, self.filter.apply(&record)) {
                Ok(Some(projected)) => {
                    self.returned += 1;
                    return Some(Ok(projected));
                }
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        self.done = true;
        record_filter_metrics(self.scanned, self.returned);
        None
    }
}

impl<I> std::iter::FusedIterator for FilterIter<'_, I> where I: Iterator<Item = Record> {}
