//! A scripted test double for a pooled Postgres-style database client.
//!
//! pgmock lets a test declare an ordered script of expected queries, each
//! with its SQL text, parameter patterns, and a canned result or error. It
//! hands out a fake pooled connection that enforces the script, and at
//! teardown verifies that the script was fully consumed and that the
//! connection was released to the right place: returned to the pool when
//! healthy, removed from it after an error.
//!
//! There is no networking and no real database. Everything that would be
//! asynchronous against a real driver is delivered through a cooperative
//! deferred-task scheduler, so code under test keeps its asynchronous
//! calling convention without timers or threads.
//!
//! # Example
//!
//! ```
//! use pgmock::{MockPool, QueryExpectation, Row, Value};
//!
//! let pool = MockPool::with_script(vec![
//!     QueryExpectation::new("SELECT * FROM pets WHERE name = $1")
//!         .with_param(pgmock::ParamPattern::matches("^Fi"))
//!         .returning(vec![Row::from_pairs([
//!             ("id", Value::from("1")),
//!             ("name", Value::from("Fido")),
//!         ])]),
//! ]);
//!
//! pool.connect("postgres://localhost/pets", |err, client, release| {
//!     assert!(err.is_none());
//!     client
//!         .query(
//!             "SELECT * FROM pets WHERE name = $1",
//!             &[Value::from("Fido")],
//!             move |result| {
//!                 let result = result.unwrap();
//!                 assert_eq!(result.row_count, 1);
//!                 assert_eq!(result.rows[0].get_named::<String>("name").unwrap(), "Fido");
//!                 release.return_to_pool();
//!             },
//!         )
//!         .unwrap();
//! });
//!
//! pool.run_until_idle();
//! pool.verify().unwrap();
//! ```

pub mod client;
pub mod error;
pub mod expectation;
pub mod matcher;
pub mod pool;
pub mod scheduler;
pub mod verify;

pub use client::MockClient;
pub use error::{ContentMismatch, LifecycleMismatch, MockError};
pub use expectation::{ExpectedResult, QueryExpectation, ResultSet};
pub use matcher::{ParamPattern, params_satisfy};
pub use pool::{ConnectOutcome, MockPool, ReleaseHandle};
pub use scheduler::Scheduler;

// Re-export the core data types so consumers need only one crate.
pub use pgmock_core::{ColumnInfo, Error, FromValue, Row, Value};
