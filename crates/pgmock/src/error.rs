//! Mock-usage and verification failures.
//!
//! These errors describe defects in the test setup or in the code under
//! test: a query issued after release, a script consumed the wrong number
//! of times, a mismatched SQL text or parameter, or a connection released
//! to the wrong place. They are always surfaced synchronously as `Err`
//! values, never through the deferred callback path; the callback path is
//! reserved for the simulated database errors in `pgmock_core::Error`.

use std::fmt;

/// A mock contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    /// query was called after the connection was released
    UnexpectedCall,
    /// The script was consumed more or fewer times than expected
    CountMismatch {
        /// Number of scripted expectations
        expected: usize,
        /// Number of query calls actually made
        actual: usize,
    },
    /// SQL text or parameters did not match the expectation at the cursor
    Content(ContentMismatch),
    /// Release target inconsistent with whether the connection errored
    Lifecycle(LifecycleMismatch),
}

/// What part of the expectation failed to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentMismatch {
    /// SQL text differed from the scripted text
    Query {
        /// Scripted SQL text
        expected: String,
        /// SQL text the code under test issued
        actual: String,
    },
    /// Number of bound parameters differed from the scripted patterns
    ParamCount {
        /// Number of scripted parameter patterns
        expected: usize,
        /// Number of parameters actually bound
        actual: usize,
    },
    /// A bound parameter failed its satisfies-pattern
    Param {
        /// Zero-based parameter position
        index: usize,
        /// Description of the scripted pattern
        pattern: String,
        /// Description of the actual value
        actual: String,
    },
}

/// Which lifecycle assertion was violated at verification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleMismatch {
    /// A healthy connection was never returned to the pool
    ExpectedReturned,
    /// An errored connection was returned to the pool
    ExpectedNotReturned,
    /// An errored connection was never removed from the pool
    ExpectedRemoved,
    /// A healthy connection was removed from the pool
    ExpectedNotRemoved,
}

fn times(n: usize) -> &'static str {
    if n == 1 { "time" } else { "times" }
}

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MockError::UnexpectedCall => {
                write!(f, "Calling query on client after calling done.")
            }
            MockError::CountMismatch { expected, actual } => write!(
                f,
                "expected pg to be queried {} {} but it was queried {} {}.",
                expected,
                times(*expected),
                actual,
                times(*actual)
            ),
            MockError::Content(mismatch) => write!(f, "{mismatch}"),
            MockError::Lifecycle(mismatch) => write!(f, "{mismatch}"),
        }
    }
}

impl fmt::Display for ContentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentMismatch::Query { expected, actual } => {
                write!(f, "expected query '{actual}' to equal '{expected}'")
            }
            ContentMismatch::ParamCount { expected, actual } => write!(
                f,
                "expected {expected} parameter{} but {actual} {} bound",
                if *expected == 1 { "" } else { "s" },
                if *actual == 1 { "was" } else { "were" }
            ),
            ContentMismatch::Param {
                index,
                pattern,
                actual,
            } => write!(
                f,
                "expected parameter {index} ({actual}) to satisfy {pattern}"
            ),
        }
    }
}

impl fmt::Display for LifecycleMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleMismatch::ExpectedReturned => {
                write!(f, "expected client to be returned to connection pool.")
            }
            LifecycleMismatch::ExpectedNotReturned => {
                write!(f, "expected client not to be returned to connection pool.")
            }
            LifecycleMismatch::ExpectedRemoved => {
                write!(f, "expected client to be removed from connection pool.")
            }
            LifecycleMismatch::ExpectedNotRemoved => {
                write!(f, "expected client not to be removed from connection pool.")
            }
        }
    }
}

impl std::error::Error for MockError {}

impl From<ContentMismatch> for MockError {
    fn from(mismatch: ContentMismatch) -> Self {
        MockError::Content(mismatch)
    }
}

impl From<LifecycleMismatch> for MockError {
    fn from(mismatch: LifecycleMismatch) -> Self {
        MockError::Lifecycle(mismatch)
    }
}
