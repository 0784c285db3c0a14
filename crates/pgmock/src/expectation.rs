//! Scripted query expectations.
//!
//! A script is an ordered list of [`QueryExpectation`] records, fixed at
//! pool construction and consumed strictly in order. Expectations are
//! immutable once configured; the client clones the record at consumption
//! time before applying result defaults, so the original script is never
//! mutated and verification stays idempotent.

use pgmock_core::{Error, Row};

use crate::matcher::ParamPattern;

/// One scripted interaction: expected SQL text, expected parameters, and
/// the canned result or error to deliver.
#[derive(Debug, Clone)]
pub struct QueryExpectation {
    query: String,
    params: Vec<ParamPattern>,
    result: ExpectedResult,
}

/// The outcome a consumed expectation delivers through the query callback.
#[derive(Debug, Clone)]
pub enum ExpectedResult {
    /// A canned result set. `row_count` defaults to `rows.len()` at
    /// consumption time when not configured explicitly.
    Rows {
        rows: Vec<Row>,
        row_count: Option<u64>,
    },
    /// A simulated query failure; consuming it marks the client errored.
    Fail(Error),
}

/// A materialized result set as delivered to the query callback.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    /// Canned rows, possibly empty
    pub rows: Vec<Row>,
    /// Reported row count; defaults to `rows.len()` unless scripted
    pub row_count: u64,
}

impl QueryExpectation {
    /// Start an expectation for the given SQL text with no parameters and
    /// an empty result.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            params: Vec::new(),
            result: ExpectedResult::Rows {
                rows: Vec::new(),
                row_count: None,
            },
        }
    }

    /// Add one expected parameter pattern.
    pub fn with_param(mut self, param: impl Into<ParamPattern>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Replace the expected parameter patterns.
    pub fn with_params<I, P>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<ParamPattern>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Set the canned rows to deliver.
    pub fn returning(mut self, rows: Vec<Row>) -> Self {
        self.result = match self.result {
            ExpectedResult::Rows { row_count, .. } => ExpectedResult::Rows { rows, row_count },
            ExpectedResult::Fail(_) => ExpectedResult::Rows {
                rows,
                row_count: None,
            },
        };
        self
    }

    /// Set an explicit row count, overriding the `rows.len()` default.
    ///
    /// Useful for statements like UPDATE where the reported count is not
    /// the number of returned rows.
    pub fn with_row_count(mut self, row_count: u64) -> Self {
        self.result = match self.result {
            ExpectedResult::Rows { rows, .. } => ExpectedResult::Rows {
                rows,
                row_count: Some(row_count),
            },
            ExpectedResult::Fail(_) => ExpectedResult::Rows {
                rows: Vec::new(),
                row_count: Some(row_count),
            },
        };
        self
    }

    /// Script a query failure instead of a result.
    pub fn failing(mut self, error: Error) -> Self {
        self.result = ExpectedResult::Fail(error);
        self
    }

    /// The scripted SQL text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The scripted parameter patterns.
    pub fn params(&self) -> &[ParamPattern] {
        &self.params
    }

    /// The scripted result or error.
    pub fn result(&self) -> &ExpectedResult {
        &self.result
    }
}

impl ExpectedResult {
    /// Materialize the scripted outcome, applying result defaults.
    ///
    /// Called on a clone of the expectation; the original keeps its
    /// unset `row_count`.
    pub fn materialize(self) -> Result<ResultSet, Error> {
        match self {
            ExpectedResult::Rows { rows, row_count } => Ok(ResultSet {
                row_count: row_count.unwrap_or(rows.len() as u64),
                rows,
            }),
            ExpectedResult::Fail(error) => Err(error),
        }
    }
}
