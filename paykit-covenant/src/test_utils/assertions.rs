//! Assertion helpers for evaluation results.

use crate::contract::{ContractParameters, ContractState};
use crate::covenant::Transition;
use crate::{ErrorKind, Result};

/// Assert that a spend was accepted and return the successor state.
///
/// # Panics
/// Panics if the candidate was rejected or revoked the instance.
pub fn assert_continues(result: Result<Transition>) -> ContractState {
    match result {
        Ok(Transition::Continue(next)) => next,
        Ok(Transition::Revoked) => panic!("expected a spend, got a revocation"),
        Err(e) => panic!("spend rejected: {} (code {})", e, e.code()),
    }
}

/// Assert that a candidate was rejected with the given kind.
///
/// # Panics
/// Panics if the candidate was accepted or failed with another kind.
pub fn assert_rejected<T: std::fmt::Debug>(result: Result<T>, kind: ErrorKind) {
    match result {
        Ok(value) => panic!("expected {:?} rejection, got {:?}", kind, value),
        Err(e) => assert_eq!(e.kind(), kind, "unexpected rejection: {}", e),
    }
}

/// Assert the allowance state invariants.
///
/// # Panics
/// Panics if the remaining amount or remaining time is out of range.
pub fn assert_within_bounds(params: &ContractParameters, state: &ContractState) {
    assert!(
        state.remaining_amount <= params.max_amount_per_epoch,
        "remaining amount {} exceeds max {}",
        state.remaining_amount,
        params.max_amount_per_epoch
    );
    if params.epoch_length == 0 {
        assert_eq!(state.remaining_time, 0, "unbounded contract tracks time");
    } else {
        assert!(
            state.remaining_time <= params.epoch_length,
            "remaining time {} exceeds epoch length {}",
            state.remaining_time,
            params.epoch_length
        );
    }
}
