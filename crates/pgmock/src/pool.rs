//! The mock connection pool entry point.
//!
//! A [`MockPool`] simulates the pool's connect operation. It holds the
//! configured outcome (a connect-time error or a query script), hands out
//! exactly one [`MockClient`], and delegates final verification to it.

use std::cell::Cell;

use pgmock_core::Error;

use crate::client::MockClient;
use crate::error::MockError;
use crate::expectation::QueryExpectation;
use crate::scheduler::Scheduler;

/// The configured outcome of the connect operation.
#[derive(Debug, Clone)]
pub enum ConnectOutcome {
    /// The connection itself cannot be established.
    Fail(Error),
    /// The connection succeeds; the script governs subsequent queries.
    Script(Vec<QueryExpectation>),
}

/// The release hook handed to the connect callback.
///
/// Consuming `self` makes a second release unrepresentable, so at most one
/// of returned/removed can ever become true for a connection.
#[derive(Debug)]
pub struct ReleaseHandle {
    client: MockClient,
}

impl ReleaseHandle {
    /// Return the connection to the pool (the healthy path).
    pub fn return_to_pool(self) {
        self.client.mark_released(false);
    }

    /// Remove the connection from the pool (the errored path).
    pub fn remove_from_pool(self) {
        self.client.mark_released(true);
    }

    /// Release with an explicit remove flag, mirroring drivers whose done
    /// callback takes a truthy "discard this connection" argument.
    pub fn release(self, remove: bool) {
        self.client.mark_released(remove);
    }
}

/// A scripted stand-in for a pooled database client's connect surface.
///
/// Created once per test case. The single [`MockClient`] exists from
/// construction, before connect is even called, because release tracking
/// must work even when the connect itself is scripted to fail.
#[derive(Debug)]
pub struct MockPool {
    connect_error: Option<Error>,
    client: MockClient,
    connect_called: Cell<bool>,
    scheduler: Scheduler,
}

impl MockPool {
    /// Create a pool with the given connect outcome.
    pub fn new(outcome: ConnectOutcome) -> Self {
        let scheduler = Scheduler::new();
        let (connect_error, script) = match outcome {
            ConnectOutcome::Fail(error) => (Some(error), Vec::new()),
            ConnectOutcome::Script(script) => (None, script),
        };
        Self {
            connect_error,
            client: MockClient::new(script, scheduler.clone()),
            connect_called: Cell::new(false),
            scheduler,
        }
    }

    /// Create a pool whose connection succeeds and enforces the script.
    pub fn with_script(script: Vec<QueryExpectation>) -> Self {
        Self::new(ConnectOutcome::Script(script))
    }

    /// Create a pool whose connect operation fails with the given error.
    pub fn with_connect_error(error: Error) -> Self {
        Self::new(ConnectOutcome::Fail(error))
    }

    /// Simulate the pool's connect operation.
    ///
    /// Delivery is deferred to the next scheduler turn, preserving the
    /// calling convention of an asynchronous driver. The callback always
    /// receives the client and the release hook, even on a scripted
    /// connect failure; callers are expected to check the error first, but
    /// the mock does not prevent further use.
    pub fn connect(
        &self,
        url: &str,
        callback: impl FnOnce(Option<Error>, MockClient, ReleaseHandle) + 'static,
    ) {
        self.connect_called.set(true);
        let client = self.client.clone();
        let release = ReleaseHandle {
            client: self.client.clone(),
        };
        tracing::debug!(url = %url, failing = self.connect_error.is_some(), "connect requested");

        match &self.connect_error {
            Some(error) => {
                client.mark_errored();
                let error = error.clone();
                self.scheduler
                    .defer(move || callback(Some(error), client, release));
            }
            None => {
                self.scheduler.defer(move || callback(None, client, release));
            }
        }
    }

    /// Verify the script was consumed and the connection released correctly.
    ///
    /// A pool never connected to has nothing to verify; checking
    /// unconditionally would force every test to call connect.
    pub fn verify(&self) -> Result<(), MockError> {
        if self.connect_called.get() {
            self.client.verify()
        } else {
            Ok(())
        }
    }

    /// Whether a connect attempt occurred.
    pub fn connect_called(&self) -> bool {
        self.connect_called.get()
    }

    /// A handle to the single client this pool hands out.
    pub fn client(&self) -> MockClient {
        self.client.clone()
    }

    /// A handle to the cooperative scheduler backing this pool.
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler.clone()
    }

    /// Drain all deferred callbacks, in order. Returns the number run.
    pub fn run_until_idle(&self) -> usize {
        self.scheduler.run_until_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_connect_defers_delivery() {
        let pool = MockPool::with_script(vec![]);
        let connected = Rc::new(Cell::new(false));

        let flag = Rc::clone(&connected);
        pool.connect("postgres://localhost/test", move |err, _client, release| {
            assert!(err.is_none());
            flag.set(true);
            release.return_to_pool();
        });

        assert!(pool.connect_called());
        assert!(!connected.get());
        pool.run_until_idle();
        assert!(connected.get());
        assert!(pool.verify().is_ok());
    }

    #[test]
    fn test_connect_error_still_provides_client_and_release() {
        let pool = MockPool::with_connect_error(Error::connect("Error on connect"));
        let seen = Rc::new(RefCell::new(None));

        let slot = Rc::clone(&seen);
        pool.connect("postgres://localhost/test", move |err, client, release| {
            *slot.borrow_mut() = Some(err);
            assert!(client.errored());
            release.remove_from_pool();
        });
        pool.run_until_idle();

        assert_eq!(
            seen.borrow_mut().take().unwrap(),
            Some(Error::connect("Error on connect"))
        );
        assert!(pool.verify().is_ok());
    }

    #[test]
    fn test_verify_without_connect_is_a_noop() {
        let pool = MockPool::with_script(vec![QueryExpectation::new("SELECT 1")]);
        // Never connected, so the unconsumed script is not an error.
        assert!(pool.verify().is_ok());
    }

    #[test]
    fn test_client_exists_before_connect() {
        let pool = MockPool::with_connect_error(Error::connect("nope"));
        let client = pool.client();
        assert_eq!(client.calls_made(), 0);
        assert!(!client.errored());
    }
}
