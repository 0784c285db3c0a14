//! Final verification checks.
//!
//! A pair of pure read-checks run at test teardown: the script must have
//! been consumed exactly, and the connection must have been released to
//! the right place. These are free functions over explicit state rather
//! than assertions registered on a shared library instance, so nothing
//! here couples one test to another.

use crate::error::{LifecycleMismatch, MockError};

/// Check that the number of scripted expectations equals the number of
/// query calls actually made.
pub fn check_query_count(expected: usize, actual: usize) -> Result<(), MockError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MockError::CountMismatch { expected, actual })
    }
}

/// Check that the release target is consistent with the errored state.
///
/// An errored connection is in an unknown state and must be removed from
/// the pool, never returned. A healthy connection must be returned, never
/// discarded. The checks run in a fixed order so the failure message is
/// deterministic when both flags are wrong.
pub fn check_release(errored: bool, returned: bool, removed: bool) -> Result<(), MockError> {
    if errored {
        if returned {
            return Err(LifecycleMismatch::ExpectedNotReturned.into());
        }
        if !removed {
            return Err(LifecycleMismatch::ExpectedRemoved.into());
        }
    } else {
        if removed {
            return Err(LifecycleMismatch::ExpectedNotRemoved.into());
        }
        if !returned {
            return Err(LifecycleMismatch::ExpectedReturned.into());
        }
    }
    Ok(())
}
