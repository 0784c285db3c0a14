//! End-to-end contract tests for the scripted pool and client.
//!
//! Each test drives the mock the way code under test would: configure the
//! pool, connect, issue queries, release, drain the scheduler, verify.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pgmock::{
    ContentMismatch, Error, LifecycleMismatch, MockError, MockPool, ParamPattern,
    QueryExpectation, Row, Value,
};

fn pet_row() -> Row {
    Row::from_pairs([("id", Value::from("1")), ("name", Value::from("Fido"))])
}

#[test]
fn emits_error_on_connect() {
    let error = Error::connect("Error on connect");
    let pool = MockPool::with_connect_error(error.clone());

    let seen = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&seen);
    pool.connect("foo", move |err, _client, _release| {
        *slot.borrow_mut() = err;
    });
    pool.run_until_idle();

    assert_eq!(seen.borrow_mut().take(), Some(error));
}

#[test]
fn fails_if_not_called_when_expecting_a_single_call() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("SELECT * FROM pets").returning(vec![pet_row()]),
    ]);

    pool.connect("foo", |_err, _client, _release| {});
    pool.run_until_idle();

    let err = pool.verify().unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected pg to be queried 1 time but it was queried 0 times."
    );
}

#[test]
fn fails_if_called_when_not_expecting_any_calls() {
    let pool = MockPool::with_script(vec![]);

    let failure = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&failure);
    pool.connect("foo", move |_err, client, _release| {
        let err = client
            .query("SELECT 1", &[], |_| panic!("callback must not fire"))
            .unwrap_err();
        *slot.borrow_mut() = Some(err);
    });
    pool.run_until_idle();

    let err = failure.borrow_mut().take().unwrap();
    assert_eq!(
        err.to_string(),
        "expected pg to be queried 0 times but it was queried 1 time."
    );
}

#[test]
fn gives_the_expected_result_to_the_callback() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("SELECT * FROM pets").returning(vec![pet_row()]),
    ]);

    let checked = Rc::new(Cell::new(false));
    let flag = Rc::clone(&checked);
    pool.connect("foo", move |err, client, release| {
        assert!(err.is_none());
        client
            .query("SELECT * FROM pets", &[], move |result| {
                let result = result.unwrap();
                assert_eq!(result.rows, vec![pet_row()]);
                // rowCount defaulted from rows.len() at consumption time
                assert_eq!(result.row_count, 1);
                release.return_to_pool();
                flag.set(true);
            })
            .unwrap();
    });
    pool.run_until_idle();

    assert!(checked.get());
    assert!(pool.verify().is_ok());
}

#[test]
fn allows_satisfies_semantics_in_params() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("SELECT * FROM pets WHERE name = $1")
            .with_param(ParamPattern::matches("^Fi"))
            .returning(vec![pet_row()]),
    ]);

    let checked = Rc::new(Cell::new(false));
    let flag = Rc::clone(&checked);
    pool.connect("foo", move |_err, client, release| {
        client
            .query(
                "SELECT * FROM pets WHERE name = $1",
                &[Value::from("Fido")],
                move |result| {
                    assert_eq!(result.unwrap().rows, vec![pet_row()]);
                    release.return_to_pool();
                    flag.set(true);
                },
            )
            .unwrap();
    });
    pool.run_until_idle();

    assert!(checked.get());
    assert!(pool.verify().is_ok());
}

#[test]
fn rejects_params_that_do_not_satisfy_the_pattern() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("SELECT * FROM pets WHERE name = $1")
            .with_param(ParamPattern::matches("^Fi"))
            .returning(vec![pet_row()]),
    ]);

    let failure = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&failure);
    pool.connect("foo", move |_err, client, _release| {
        let err = client
            .query(
                "SELECT * FROM pets WHERE name = $1",
                &[Value::from("Rex")],
                |_| panic!("callback must not fire"),
            )
            .unwrap_err();
        *slot.borrow_mut() = Some(err);
    });
    pool.run_until_idle();

    match failure.borrow_mut().take().unwrap() {
        MockError::Content(ContentMismatch::Param { index, .. }) => assert_eq!(index, 0),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn rejects_mismatched_sql_regardless_of_params() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("SELECT * FROM pets").returning(vec![pet_row()]),
    ]);

    let failure = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&failure);
    pool.connect("foo", move |_err, client, _release| {
        let err = client
            .query("SELECT * FROM owners", &[], |_| {
                panic!("callback must not fire")
            })
            .unwrap_err();
        *slot.borrow_mut() = Some(err);
    });
    pool.run_until_idle();

    assert!(matches!(
        failure.borrow_mut().take().unwrap(),
        MockError::Content(ContentMismatch::Query { .. })
    ));
}

#[test]
fn fails_query_after_client_returned_to_pool() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("SELECT * FROM pets WHERE name = $1")
            .with_param(ParamPattern::matches("^Fi"))
            .returning(vec![pet_row()]),
    ]);

    let failure = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&failure);
    pool.connect("foo", move |_err, client, release| {
        release.return_to_pool();
        let err = client
            .query(
                "SELECT * FROM pets WHERE name = $1",
                &[Value::from("Fido")],
                |_| panic!("callback must not fire"),
            )
            .unwrap_err();
        *slot.borrow_mut() = Some(err);
    });
    pool.run_until_idle();

    let err = failure.borrow_mut().take().unwrap();
    assert_eq!(err, MockError::UnexpectedCall);
    assert_eq!(err.to_string(), "Calling query on client after calling done.");
}

mod returning {
    use super::*;

    #[test]
    fn complains_if_client_not_returned() {
        let pool =
            MockPool::with_script(vec![QueryExpectation::new("SELECT * FROM pets")]);

        pool.connect("foo", move |_err, client, _release| {
            client.query("SELECT * FROM pets", &[], |_| {}).unwrap();
        });
        pool.run_until_idle();

        assert_eq!(
            pool.verify().unwrap_err().to_string(),
            "expected client to be returned to connection pool."
        );
    }

    #[test]
    fn does_not_complain_if_client_returned() {
        let pool =
            MockPool::with_script(vec![QueryExpectation::new("SELECT * FROM pets")]);

        pool.connect("foo", move |_err, client, release| {
            client
                .query("SELECT * FROM pets", &[], move |_| release.return_to_pool())
                .unwrap();
        });
        pool.run_until_idle();

        assert!(pool.verify().is_ok());
    }

    #[test]
    fn complains_if_not_returned_even_with_no_queries() {
        let pool = MockPool::with_script(vec![]);

        pool.connect("foo", |_err, _client, _release| {});
        pool.run_until_idle();

        assert_eq!(
            pool.verify().unwrap_err(),
            MockError::Lifecycle(LifecycleMismatch::ExpectedReturned)
        );
    }

    #[test]
    fn does_not_complain_if_returned_with_no_queries() {
        let pool = MockPool::with_script(vec![]);

        pool.connect("foo", |_err, _client, release| release.return_to_pool());
        pool.run_until_idle();

        assert!(pool.verify().is_ok());
    }

    #[test]
    fn complains_if_returned_after_a_connect_error() {
        let pool = MockPool::with_connect_error(Error::connect("Error on connect"));

        pool.connect("foo", |_err, _client, release| release.return_to_pool());
        pool.run_until_idle();

        assert_eq!(
            pool.verify().unwrap_err().to_string(),
            "expected client not to be returned to connection pool."
        );
    }
}

mod removing {
    use super::*;

    #[test]
    fn complains_if_not_removed_when_a_query_errored() {
        let pool = MockPool::with_script(vec![
            QueryExpectation::new("SELECT * FROM pets").failing(Error::query("Mock error")),
        ]);

        pool.connect("foo", move |_err, client, _release| {
            client
                .query("SELECT * FROM pets", &[], |result| {
                    assert!(result.is_err());
                })
                .unwrap();
        });
        pool.run_until_idle();

        assert_eq!(
            pool.verify().unwrap_err().to_string(),
            "expected client to be removed from connection pool."
        );
    }

    #[test]
    fn does_not_complain_if_removed_when_a_query_errored() {
        let pool = MockPool::with_script(vec![
            QueryExpectation::new("SELECT * FROM pets").failing(Error::query("Mock error")),
        ]);

        pool.connect("foo", move |_err, client, release| {
            client
                .query("SELECT * FROM pets", &[], move |result| {
                    assert_eq!(result.unwrap_err(), Error::query("Mock error"));
                    release.remove_from_pool();
                })
                .unwrap();
        });
        pool.run_until_idle();

        assert!(pool.verify().is_ok());
    }

    #[test]
    fn complains_if_not_removed_when_connection_failed() {
        let pool = MockPool::with_connect_error(Error::connect("Error on connect"));

        pool.connect("foo", |_err, _client, _release| {});
        pool.run_until_idle();

        assert_eq!(
            pool.verify().unwrap_err(),
            MockError::Lifecycle(LifecycleMismatch::ExpectedRemoved)
        );
    }

    #[test]
    fn does_not_complain_if_removed_when_connection_failed() {
        let pool = MockPool::with_connect_error(Error::connect("Error on connect"));

        pool.connect("foo", |_err, _client, release| release.remove_from_pool());
        pool.run_until_idle();

        assert!(pool.verify().is_ok());
    }

    #[test]
    fn complains_if_removed_with_no_error() {
        let pool = MockPool::with_script(vec![]);

        pool.connect("foo", |_err, _client, release| release.remove_from_pool());
        pool.run_until_idle();

        assert_eq!(
            pool.verify().unwrap_err().to_string(),
            "expected client not to be removed from connection pool."
        );
    }
}

#[test]
fn full_replay_in_order_verifies_cleanly() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("INSERT INTO pets (name) VALUES ($1)")
            .with_param("Fido")
            .with_row_count(1),
        QueryExpectation::new("SELECT * FROM pets").returning(vec![pet_row()]),
    ]);

    let steps = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&steps);
    pool.connect("foo", move |_err, client, release| {
        let inner_client = client.clone();
        let insert_log = Rc::clone(&log);
        client
            .query(
                "INSERT INTO pets (name) VALUES ($1)",
                &[Value::from("Fido")],
                move |result| {
                    insert_log.borrow_mut().push(result.unwrap().row_count);
                    let select_log = Rc::clone(&insert_log);
                    inner_client
                        .query("SELECT * FROM pets", &[], move |result| {
                            select_log.borrow_mut().push(result.unwrap().row_count);
                            release.return_to_pool();
                        })
                        .unwrap();
                },
            )
            .unwrap();
    });
    pool.run_until_idle();

    assert_eq!(*steps.borrow(), vec![1, 1]);
    assert!(pool.verify().is_ok());
}

#[test]
fn overlapping_queries_match_in_call_issuance_order() {
    let pool = MockPool::with_script(vec![
        QueryExpectation::new("first").with_row_count(1),
        QueryExpectation::new("second").with_row_count(2),
    ]);

    let counts = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&counts);
    pool.connect("foo", move |_err, client, release| {
        // Both queries issued before either callback fires; the cursor
        // advances in call order, not delivery order.
        for sql in ["first", "second"] {
            let log = Rc::clone(&log);
            client
                .query(sql, &[], move |result| {
                    log.borrow_mut().push(result.unwrap().row_count);
                })
                .unwrap();
        }
        release.return_to_pool();
    });
    pool.run_until_idle();

    assert_eq!(*counts.borrow(), vec![1, 2]);
    assert!(pool.verify().is_ok());
}

#[test]
fn extra_query_beyond_script_fails_at_the_offending_call() {
    let pool = MockPool::with_script(vec![QueryExpectation::new("SELECT 1")]);

    let failure = Rc::new(RefCell::new(None));
    let slot = Rc::clone(&failure);
    pool.connect("foo", move |_err, client, _release| {
        client.query("SELECT 1", &[], |_| {}).unwrap();
        let err = client
            .query("SELECT 1", &[], |_| panic!("callback must not fire"))
            .unwrap_err();
        *slot.borrow_mut() = Some(err);
    });
    pool.run_until_idle();

    assert_eq!(
        failure.borrow_mut().take().unwrap(),
        MockError::CountMismatch {
            expected: 1,
            actual: 2
        }
    );
}

#[test]
fn verify_without_connect_checks_nothing() {
    let pool = MockPool::with_script(vec![QueryExpectation::new("SELECT 1")]);
    assert!(pool.verify().is_ok());
    assert!(!pool.connect_called());
}

#[test]
fn verify_can_be_repeated() {
    let pool = MockPool::with_script(vec![]);
    pool.connect("foo", |_err, _client, release| release.return_to_pool());
    pool.run_until_idle();

    assert!(pool.verify().is_ok());
    assert!(pool.verify().is_ok());
}
