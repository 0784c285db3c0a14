//! The scripted mock client.
//!
//! A [`MockClient`] simulates a single checked-out pooled connection. It
//! holds the query script, a cursor into it, and the lifecycle flags, and
//! enforces the script on every query call: calls must come in order, with
//! the scripted SQL text and satisfying parameters, and must stop once the
//! connection has been released.

use std::cell::RefCell;
use std::rc::Rc;

use pgmock_core::{Error, Value};

use crate::error::{ContentMismatch, MockError};
use crate::expectation::{QueryExpectation, ResultSet};
use crate::matcher::params_satisfy;
use crate::scheduler::Scheduler;
use crate::verify;

#[derive(Debug)]
struct ClientState {
    script: Vec<QueryExpectation>,
    /// Cursor into the script; `None` until the first query call. Advances
    /// once per call, never decrements, never skips.
    call_index: Option<usize>,
    errored: bool,
    removed_from_pool: bool,
    returned_to_pool: bool,
}

impl ClientState {
    fn calls_made(&self) -> usize {
        self.call_index.map_or(0, |i| i + 1)
    }
}

/// A mock pooled database connection enforcing a query script.
///
/// Handles are cheap clones sharing one underlying state; the pool, the
/// release hook, and the connect callback all observe the same connection.
/// The client is single-threaded by design, matching real pooled-connection
/// semantics where one checkout belongs to one borrower.
#[derive(Clone)]
pub struct MockClient {
    state: Rc<RefCell<ClientState>>,
    scheduler: Scheduler,
}

impl MockClient {
    pub(crate) fn new(script: Vec<QueryExpectation>, scheduler: Scheduler) -> Self {
        Self {
            state: Rc::new(RefCell::new(ClientState {
                script,
                call_index: None,
                errored: false,
                removed_from_pool: false,
                returned_to_pool: false,
            })),
            scheduler,
        }
    }

    /// Issue a query against the script.
    ///
    /// The cursor advances at call time, not at callback-delivery time, so
    /// overlapping calls issued before earlier callbacks fire are matched
    /// in call-issuance order.
    ///
    /// Mock contract violations (query after release, script exhausted,
    /// SQL or parameter mismatch) surface synchronously as `Err`; they are
    /// test-setup defects, not simulated database conditions. A scripted
    /// failure instead marks the client errored and is delivered through
    /// the deferred callback's error slot, like a real driver surfacing a
    /// query error.
    pub fn query(
        &self,
        sql: &str,
        params: &[Value],
        callback: impl FnOnce(Result<ResultSet, Error>) + 'static,
    ) -> Result<(), MockError> {
        let mut state = self.state.borrow_mut();

        if state.removed_from_pool || state.returned_to_pool {
            return Err(MockError::UnexpectedCall);
        }

        let index = state.call_index.map_or(0, |i| i + 1);
        state.call_index = Some(index);

        if index >= state.script.len() {
            return Err(MockError::CountMismatch {
                expected: state.script.len(),
                actual: index + 1,
            });
        }

        // Deep copy before defaulting so the original script is never
        // mutated and repeated verification stays idempotent.
        let expectation = state.script[index].clone();
        tracing::trace!(sql = %sql, call_index = index, "scripted query issued");

        match expectation.result().clone().materialize() {
            Err(error) => {
                state.errored = true;
                drop(state);
                tracing::debug!(call_index = index, error = %error, "delivering scripted query failure");
                self.scheduler.defer(move || callback(Err(error)));
            }
            Ok(result) => {
                if sql != expectation.query() {
                    return Err(ContentMismatch::Query {
                        expected: expectation.query().to_string(),
                        actual: sql.to_string(),
                    }
                    .into());
                }
                params_satisfy(params, expectation.params())?;
                drop(state);
                tracing::debug!(call_index = index, row_count = result.row_count, "delivering scripted result");
                self.scheduler.defer(move || callback(Ok(result)));
            }
        }
        Ok(())
    }

    /// Verify that the script was fully consumed and the connection was
    /// released to the correct place.
    ///
    /// Pure read-check: never mutates script or lifecycle state, so it may
    /// be called multiple times. Conventionally called once at test
    /// teardown, usually through the pool.
    pub fn verify(&self) -> Result<(), MockError> {
        let state = self.state.borrow();
        verify::check_query_count(state.script.len(), state.calls_made())?;
        verify::check_release(
            state.errored,
            state.returned_to_pool,
            state.removed_from_pool,
        )
    }

    /// Number of query calls made so far.
    pub fn calls_made(&self) -> usize {
        self.state.borrow().calls_made()
    }

    /// Whether any consumed expectation represented a failure.
    pub fn errored(&self) -> bool {
        self.state.borrow().errored
    }

    /// Whether the connection was returned to the pool.
    pub fn returned_to_pool(&self) -> bool {
        self.state.borrow().returned_to_pool
    }

    /// Whether the connection was removed from the pool.
    pub fn removed_from_pool(&self) -> bool {
        self.state.borrow().removed_from_pool
    }

    pub(crate) fn mark_errored(&self) {
        self.state.borrow_mut().errored = true;
    }

    pub(crate) fn mark_released(&self, remove: bool) {
        let mut state = self.state.borrow_mut();
        if remove {
            state.removed_from_pool = true;
        } else {
            state.returned_to_pool = true;
        }
        tracing::debug!(remove, "client released");
    }
}

impl std::fmt::Debug for MockClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockClient")
            .field("expected_calls", &state.script.len())
            .field("calls_made", &state.calls_made())
            .field("errored", &state.errored)
            .field("removed_from_pool", &state.removed_from_pool)
            .field("returned_to_pool", &state.returned_to_pool)
            .finish()
    }
}
