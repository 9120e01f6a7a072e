//! Output validator for the spend path.
//!
//! The expected output set is rebuilt from the parameters and the successor
//! state and hashed exactly as the ledger hashes outputs. A spend is accepted
//! only if that hash equals the transaction's declared outputs hash.

use crate::contract::{ContractParameters, ContractState};
use crate::transaction::{CandidateTransaction, TxOutput};
use crate::{codec, Amount, CovenantConfig, CovenantError, Result};
use subtle::ConstantTimeEq;

/// Payout to the payee followed by the continuation carrying `next`.
pub fn expected_spend_outputs(
    params: &ContractParameters,
    next: &ContractState,
    requested: Amount,
    continuation: Amount,
) -> [TxOutput; 2] {
    [
        TxOutput::new(requested, params.payee.destination()),
        TxOutput::new(continuation, codec::contract_destination(params, next)),
    ]
}

/// Miner fee implied by a spend, if the amounts balance.
pub fn implied_fee(input_value: Amount, requested: Amount, continuation: Amount) -> Option<Amount> {
    input_value
        .checked_sub(&requested)?
        .checked_sub(&continuation)
}

fn check_amounts(
    tx: &CandidateTransaction,
    requested: Amount,
    continuation: Amount,
    config: &CovenantConfig,
) -> Result<()> {
    if continuation < config.min_transferable {
        return Err(CovenantError::range(format!(
            "continuation {} is below the minimum transferable amount {}",
            continuation, config.min_transferable
        )));
    }

    let fee = implied_fee(tx.input_value, requested, continuation).ok_or_else(|| {
        CovenantError::range(format!(
            "outputs {} + {} exceed input value {}",
            requested, continuation, tx.input_value
        ))
    })?;

    if !fee.is_within_limit(&config.max_miner_fee) {
        return Err(CovenantError::range(format!(
            "miner fee {} exceeds maximum {}",
            fee, config.max_miner_fee
        )));
    }
    Ok(())
}

fn first_difference(expected: &[TxOutput], actual: &[TxOutput]) -> String {
    if let Some(index) = expected.iter().zip(actual).position(|(e, a)| e != a) {
        let (want, found) = (&expected[index], &actual[index]);
        return format!(
            "output {} is {} to {}, expected {} to {}",
            index, found.amount, found.destination, want.amount, want.destination
        );
    }
    format!(
        "expected {} outputs, transaction declares {}",
        expected.len(),
        actual.len()
    )
}

/// Check a spend's outputs against the successor state.
pub fn validate_spend_outputs(
    params: &ContractParameters,
    next: &ContractState,
    tx: &CandidateTransaction,
    requested: Amount,
    continuation: Amount,
    config: &CovenantConfig,
) -> Result<()> {
    check_amounts(tx, requested, continuation, config)?;

    let declared = codec::outputs_hash(&tx.outputs);
    if !bool::from(declared[..].ct_eq(&tx.outputs_hash[..])) {
        return Err(CovenantError::OutputMismatch(
            "declared outputs hash does not cover the declared outputs".to_string(),
        ));
    }

    let expected = expected_spend_outputs(params, next, requested, continuation);
    let expected_hash = codec::outputs_hash(&expected);
    if !bool::from(expected_hash[..].ct_eq(&tx.outputs_hash[..])) {
        return Err(CovenantError::OutputMismatch(first_difference(
            &expected,
            &tx.outputs,
        )));
    }

    Ok(())
}
