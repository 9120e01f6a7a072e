//! Test utilities for covenant evaluation.
//!
//! This module provides:
//! - Deterministic signing keys and standard contract parameters
//! - Builders for signed spend and revoke candidate transactions
//! - Assertion helpers for accepted and rejected transitions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use paykit_covenant::test_utils::{payee_key, spend_tx, standard_params, assert_continues};
//!
//! let (covenant, state) = Covenant::deploy(standard_params(), 100, CovenantConfig::default())?;
//! let tx = spend_tx(&covenant, &state, 105, Amount::from_sats(1000), &payee_key());
//! let next = assert_continues(covenant.evaluate(&state, &tx));
//! ```

mod assertions;
mod fixtures;

pub use fixtures::{
    payee_key, payer_key, public_key, revoke_tx, sign_candidate, signing_key, spend_tx,
    standard_params, stranger_key, SpendBuilder, DEFAULT_FEE, DEFAULT_INPUT_VALUE,
};

pub use assertions::{assert_continues, assert_rejected, assert_within_bounds};
