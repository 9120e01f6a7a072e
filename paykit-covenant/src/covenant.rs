//! Covenant evaluation.
//!
//! A [`Covenant`] holds the immutable terms of one instance plus the ledger
//! limits it is evaluated under. [`Covenant::evaluate`] runs a candidate
//! transaction through the guard, the expiration gate, the allowance
//! accountant and the output validator, in that order, and either accepts it
//! with a [`Transition`] or rejects it with no effect on the state.

use crate::contract::{ContractParameters, ContractState, Destination};
use crate::transaction::{Action, CandidateTransaction};
use crate::{accountant, codec, expiration, guard, outputs, CovenantConfig, CovenantError, Result};
use serde::{Deserialize, Serialize};

/// Effect of an accepted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Spend accepted; the continuation output carries this state
    Continue(ContractState),
    /// Payer took the funds; the instance is finished
    Revoked,
}

/// A deployed covenant instance's terms.
///
/// # Examples
///
/// ```rust
/// use paykit_covenant::{
///     Amount, ContractParameters, Covenant, CovenantConfig, PayeeIdentity, PayerIdentity,
///     PublicKey,
/// };
///
/// let params = ContractParameters::new(
///     PayerIdentity::Key(PublicKey([1u8; 32])),
///     PayeeIdentity::Key(PublicKey([2u8; 32])),
///     144,
///     Amount::from_sats(50_000),
/// );
/// let (covenant, state) = Covenant::deploy(params, 800_000, CovenantConfig::default()).unwrap();
/// assert_eq!(state.remaining_amount, Amount::from_sats(50_000));
/// assert_eq!(state.remaining_time, 144);
/// let _lock_to = covenant.destination(&state);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Covenant {
    params: ContractParameters,
    config: CovenantConfig,
}

impl Covenant {
    /// Wrap validated parameters.
    pub fn new(params: ContractParameters, config: CovenantConfig) -> Result<Self> {
        config.validate()?;
        params.validate(config.min_transferable)?;
        Ok(Self { params, config })
    }

    /// Create an instance and its initial state at `deployed_at`.
    pub fn deploy(
        params: ContractParameters,
        deployed_at: u32,
        config: CovenantConfig,
    ) -> Result<(Self, ContractState)> {
        let covenant = Self::new(params, config)?;
        let state = ContractState::initial(&covenant.params, deployed_at);
        tracing::debug!(
            deployed_at,
            epoch_length = covenant.params.epoch_length,
            max = %covenant.params.max_amount_per_epoch,
            "covenant deployed"
        );
        Ok((covenant, state))
    }

    /// Restore an instance from its serialized parameters and state.
    pub fn from_wire(bytes: &[u8], config: CovenantConfig) -> Result<(Self, ContractState)> {
        let (params, state) = codec::decode_contract(bytes)?;
        let covenant = Self::new(params, config)?;
        state.validate(&covenant.params)?;
        Ok((covenant, state))
    }

    pub fn params(&self) -> &ContractParameters {
        &self.params
    }

    pub fn config(&self) -> &CovenantConfig {
        &self.config
    }

    /// Commitment of this instance in `state`.
    pub fn commitment(&self, state: &ContractState) -> [u8; 32] {
        codec::commitment(&self.params, state)
    }

    /// Destination funds must be locked to for this instance in `state`.
    pub fn destination(&self, state: &ContractState) -> Destination {
        codec::contract_destination(&self.params, state)
    }

    /// Whether the spend path is closed at `request_time`.
    pub fn is_expired(&self, request_time: u32) -> bool {
        expiration::is_expired(&self.params, request_time)
    }

    /// Evaluate a candidate transaction consuming this instance in `state`.
    #[tracing::instrument(
        skip(self, state, tx),
        fields(request_time = tx.request_time, action = %tx.action.kind())
    )]
    pub fn evaluate(&self, state: &ContractState, tx: &CandidateTransaction) -> Result<Transition> {
        match self.evaluate_inner(state, tx) {
            Ok(transition) => {
                match &transition {
                    Transition::Continue(next) => tracing::debug!(
                        remaining_amount = %next.remaining_amount,
                        remaining_time = next.remaining_time,
                        "spend accepted"
                    ),
                    Transition::Revoked => tracing::debug!("revocation accepted"),
                }
                Ok(transition)
            }
            Err(err) => {
                tracing::warn!(kind = ?err.kind(), error = %err, "candidate rejected");
                Err(err)
            }
        }
    }

    fn evaluate_inner(&self, state: &ContractState, tx: &CandidateTransaction) -> Result<Transition> {
        state.validate(&self.params)?;
        let input_commitment = self.commitment(state);
        let actor = guard::authorize(&self.params, input_commitment, tx)?;
        tracing::trace!(?actor, "signature verified");

        let request = match &tx.action {
            Action::Revoke(_) => return Ok(Transition::Revoked),
            Action::Spend(request) => request,
        };

        expiration::check_spend_window(&self.params, tx.request_time)?;

        let next = accountant::next_state(
            &self.params,
            state,
            tx.request_time,
            request.requested_amount,
            self.config.min_transferable,
        )?;

        outputs::validate_spend_outputs(
            &self.params,
            &next,
            tx,
            request.requested_amount,
            request.continuation_amount,
            &self.config,
        )?;

        Ok(Transition::Continue(next))
    }
}

/// Lifecycle of an instance: active with a state, or revoked for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractStatus {
    Active(ContractState),
    Revoked,
}

impl ContractStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    /// Apply a candidate transaction.
    ///
    /// A rejected candidate leaves the status untouched; nothing leaves
    /// [`ContractStatus::Revoked`].
    pub fn apply(&self, covenant: &Covenant, tx: &CandidateTransaction) -> Result<Self> {
        let state = match self {
            Self::Active(state) => state,
            Self::Revoked => return Err(CovenantError::Revoked),
        };
        Ok(match covenant.evaluate(state, tx)? {
            Transition::Continue(next) => Self::Active(next),
            Transition::Revoked => Self::Revoked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{payee_key, payer_key, revoke_tx, spend_tx, standard_params};
    use crate::{Amount, ErrorKind};

    fn deployed() -> (Covenant, ContractState) {
        Covenant::deploy(standard_params(), 100, CovenantConfig::default()).unwrap()
    }

    #[test]
    fn test_deploy_rejects_invalid_parameters() {
        let dusty = ContractParameters {
            max_amount_per_epoch: Amount::from_sats(546),
            ..standard_params()
        };
        let err = Covenant::deploy(dusty, 100, CovenantConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameters);
    }

    #[test]
    fn test_deploy_rejects_invalid_config() {
        let config = CovenantConfig::default().with_min_transferable(Amount::zero());
        let err = Covenant::deploy(standard_params(), 100, config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn test_spend_then_revoke() {
        let (covenant, state) = deployed();
        let status = ContractStatus::Active(state);

        let tx = spend_tx(&covenant, &state, 105, Amount::from_sats(1000), &payee_key());
        let status = status.apply(&covenant, &tx).unwrap();
        let ContractStatus::Active(next) = status else {
            panic!("expected active status");
        };
        assert_eq!(next.valid_from, 105);
        assert_eq!(next.remaining_amount, Amount::from_sats(2000));

        let tx = revoke_tx(&covenant, &next, 106, &payer_key());
        let status = status.apply(&covenant, &tx).unwrap();
        assert_eq!(status, ContractStatus::Revoked);
    }

    #[test]
    fn test_nothing_leaves_revoked() {
        let (covenant, state) = deployed();
        let tx = revoke_tx(&covenant, &state, 101, &payer_key());
        let err = ContractStatus::Revoked.apply(&covenant, &tx).unwrap_err();
        assert_eq!(err, CovenantError::Revoked);
    }

    #[test]
    fn test_rejection_leaves_status_untouched() {
        let (covenant, state) = deployed();
        let status = ContractStatus::Active(state);
        let tx = spend_tx(&covenant, &state, 105, Amount::from_sats(3001), &payee_key());
        assert!(status.apply(&covenant, &tx).is_err());
        assert!(status.is_active());
    }

    #[test]
    fn test_expired_spend_rejected_but_revoke_allowed() {
        let (covenant, state) = Covenant::deploy(
            standard_params().with_expiration(150),
            100,
            CovenantConfig::default(),
        )
        .unwrap();
        assert!(covenant.is_expired(151));

        let tx = spend_tx(&covenant, &state, 151, Amount::from_sats(1000), &payee_key());
        assert_eq!(
            covenant.evaluate(&state, &tx).unwrap_err().kind(),
            ErrorKind::Timing
        );

        let tx = revoke_tx(&covenant, &state, 151, &payer_key());
        assert_eq!(covenant.evaluate(&state, &tx).unwrap(), Transition::Revoked);
    }

    #[test]
    fn test_signature_checked_before_timing() {
        let (covenant, state) = Covenant::deploy(
            standard_params().with_expiration(150),
            100,
            CovenantConfig::default(),
        )
        .unwrap();
        let tx = spend_tx(&covenant, &state, 151, Amount::from_sats(1000), &payer_key());
        assert_eq!(
            covenant.evaluate(&state, &tx).unwrap_err().kind(),
            ErrorKind::Authorization
        );
    }

    #[test]
    fn test_from_wire_round_trip() {
        let (covenant, state) = deployed();
        let bytes = codec::encode_contract(covenant.params(), &state);
        let (restored, restored_state) =
            Covenant::from_wire(&bytes, CovenantConfig::default()).unwrap();
        assert_eq!(restored, covenant);
        assert_eq!(restored_state, state);
    }

    #[test]
    fn test_corrupt_state_rejected() {
        let (covenant, mut state) = deployed();
        state.remaining_amount = Amount::from_sats(3001);
        let tx = revoke_tx(&covenant, &state, 101, &payer_key());
        assert_eq!(
            covenant.evaluate(&state, &tx).unwrap_err().kind(),
            ErrorKind::InvalidParameters
        );
    }
}
