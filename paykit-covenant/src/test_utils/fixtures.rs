//! Test fixtures and transaction builders.

use crate::contract::{ContractParameters, ContractState, PayeeIdentity, PayerIdentity, PublicKey};
use crate::covenant::Covenant;
use crate::signing::{sign_ed25519, Signature};
use crate::transaction::{Action, CandidateTransaction, SpendRequest, TxOutput};
use crate::{accountant, codec, guard, outputs, Amount};
use ed25519_dalek::SigningKey;

/// Value of the covenant output consumed by default.
pub const DEFAULT_INPUT_VALUE: Amount = Amount::from_sats(100_000);

/// Miner fee left by default.
pub const DEFAULT_FEE: Amount = Amount::from_sats(1_000);

/// Create a deterministic signing key from a seed string.
pub fn signing_key(seed: &str) -> SigningKey {
    SigningKey::from_bytes(&codec::sha256(seed.as_bytes()))
}

pub fn payer_key() -> SigningKey {
    signing_key("payer")
}

pub fn payee_key() -> SigningKey {
    signing_key("payee")
}

pub fn stranger_key() -> SigningKey {
    signing_key("stranger")
}

pub fn public_key(key: &SigningKey) -> PublicKey {
    PublicKey::from_verifying_key(&key.verifying_key())
}

/// Payer and payee keys, 10-block windows, 3000 sats per window.
pub fn standard_params() -> ContractParameters {
    ContractParameters::new(
        PayerIdentity::Key(public_key(&payer_key())),
        PayeeIdentity::Key(public_key(&payee_key())),
        10,
        Amount::from_sats(3000),
    )
}

/// Replace the signature of `tx` with one by `key` over its current contents.
///
/// # Panics
/// Panics if the digest cannot be computed.
pub fn sign_candidate(
    mut tx: CandidateTransaction,
    covenant: &Covenant,
    state: &ContractState,
    key: &SigningKey,
) -> CandidateTransaction {
    let input = guard::sighash_input(covenant.commitment(state), &tx);
    let signature = sign_ed25519(&input, key).expect("sighash computation");
    match &mut tx.action {
        Action::Revoke(existing) => *existing = signature,
        Action::Spend(request) => request.signature = signature,
    }
    tx
}

fn placeholder_signature(key: &SigningKey) -> Signature {
    Signature::new_ed25519([0u8; 64], public_key(key))
}

/// Builder for signed spend candidates.
///
/// By default the outputs are exactly the ones the covenant expects, so
/// tests only override what they want to break.
pub struct SpendBuilder<'a> {
    covenant: &'a Covenant,
    state: &'a ContractState,
    request_time: u32,
    requested: Amount,
    input_value: Amount,
    fee: Amount,
    outputs: Option<Vec<TxOutput>>,
}

impl<'a> SpendBuilder<'a> {
    pub fn new(covenant: &'a Covenant, state: &'a ContractState) -> Self {
        Self {
            covenant,
            state,
            request_time: state.valid_from,
            requested: Amount::zero(),
            input_value: DEFAULT_INPUT_VALUE,
            fee: DEFAULT_FEE,
            outputs: None,
        }
    }

    pub fn at(mut self, request_time: u32) -> Self {
        self.request_time = request_time;
        self
    }

    pub fn amount(mut self, requested: Amount) -> Self {
        self.requested = requested;
        self
    }

    pub fn input_value(mut self, value: Amount) -> Self {
        self.input_value = value;
        self
    }

    pub fn fee(mut self, fee: Amount) -> Self {
        self.fee = fee;
        self
    }

    pub fn outputs(mut self, outputs: Vec<TxOutput>) -> Self {
        self.outputs = Some(outputs);
        self
    }

    /// Continuation amount implied by input, request and fee.
    pub fn continuation(&self) -> Amount {
        self.input_value
            .checked_sub(&self.requested)
            .and_then(|rest| rest.checked_sub(&self.fee))
            .unwrap_or_default()
    }

    /// Outputs the covenant expects, or the current state's continuation
    /// when the request would be rejected anyway.
    pub fn expected_outputs(&self) -> Vec<TxOutput> {
        let params = self.covenant.params();
        let next = accountant::next_state(
            params,
            self.state,
            self.request_time,
            self.requested,
            self.covenant.config().min_transferable,
        )
        .unwrap_or(*self.state);
        outputs::expected_spend_outputs(params, &next, self.requested, self.continuation())
            .to_vec()
    }

    pub fn build(self, key: &SigningKey) -> CandidateTransaction {
        let outputs = match &self.outputs {
            Some(outputs) => outputs.clone(),
            None => self.expected_outputs(),
        };
        let tx = CandidateTransaction {
            input_value: self.input_value,
            request_time: self.request_time,
            outputs_hash: codec::outputs_hash(&outputs),
            outputs,
            action: Action::Spend(SpendRequest {
                requested_amount: self.requested,
                continuation_amount: self.continuation(),
                signature: placeholder_signature(key),
            }),
        };
        sign_candidate(tx, self.covenant, self.state, key)
    }
}

/// Signed spend of `requested` at `request_time` with expected outputs.
pub fn spend_tx(
    covenant: &Covenant,
    state: &ContractState,
    request_time: u32,
    requested: Amount,
    key: &SigningKey,
) -> CandidateTransaction {
    SpendBuilder::new(covenant, state)
        .at(request_time)
        .amount(requested)
        .build(key)
}

/// Signed revocation sweeping the input to the payer.
pub fn revoke_tx(
    covenant: &Covenant,
    state: &ContractState,
    request_time: u32,
    key: &SigningKey,
) -> CandidateTransaction {
    let outputs = vec![TxOutput::new(
        DEFAULT_INPUT_VALUE.checked_sub(&DEFAULT_FEE).unwrap_or_default(),
        covenant.params().payer.destination(),
    )];
    let tx = CandidateTransaction {
        input_value: DEFAULT_INPUT_VALUE,
        request_time,
        outputs_hash: codec::outputs_hash(&outputs),
        outputs,
        action: Action::Revoke(placeholder_signature(key)),
    };
    sign_candidate(tx, covenant, state, key)
}
