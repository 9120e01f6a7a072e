use crate::codec::sha256;
use crate::{Amount, CovenantError, Result};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Ed25519 public key bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

impl PublicKey {
    /// Wrap a dalek verifying key
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        Self(key.to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// SHA-256 of the key, as committed by hashed identities
    pub fn key_hash(&self) -> [u8; 32] {
        sha256(&self.0)
    }

    /// Pay-to-key-hash destination for this key
    pub fn destination(&self) -> Destination {
        Destination::KeyHash(self.key_hash())
    }

    /// Constant-time equality for signer checks
    pub fn ct_matches(&self, other: &PublicKey) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

/// Where an output's funds are locked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// Spendable by the key whose SHA-256 is this hash
    KeyHash([u8; 32]),
    /// Locked by the covenant instance whose commitment is this hash
    ScriptHash([u8; 32]),
}

impl Destination {
    pub fn hash(&self) -> &[u8; 32] {
        match self {
            Self::KeyHash(h) | Self::ScriptHash(h) => h,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyHash(h) => write!(f, "pkh:{}", hex::encode(h)),
            Self::ScriptHash(h) => write!(f, "sh:{}", hex::encode(h)),
        }
    }
}

/// Who may revoke.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayerIdentity {
    /// Revocation must be signed by exactly this key
    Key(PublicKey),
    /// Revocation may be signed by any key hashing to `key_hash`
    Committed {
        key_hash: [u8; 32],
        destination: Destination,
    },
}

impl PayerIdentity {
    /// Whether `signer` is allowed to revoke
    pub fn admits(&self, signer: &PublicKey) -> bool {
        match self {
            Self::Key(key) => key.ct_matches(signer),
            Self::Committed { key_hash, .. } => {
                key_hash[..].ct_eq(&signer.key_hash()[..]).into()
            }
        }
    }

    /// Payout destination of the payer
    pub fn destination(&self) -> Destination {
        match self {
            Self::Key(key) => key.destination(),
            Self::Committed { destination, .. } => *destination,
        }
    }
}

/// Who receives withdrawals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayeeIdentity {
    Key(PublicKey),
    Destination(Destination),
}

impl PayeeIdentity {
    /// Fixed payout destination of every withdrawal
    pub fn destination(&self) -> Destination {
        match self {
            Self::Key(key) => key.destination(),
            Self::Destination(destination) => *destination,
        }
    }

    pub fn key(&self) -> Option<&PublicKey> {
        match self {
            Self::Key(key) => Some(key),
            Self::Destination(_) => None,
        }
    }
}

/// Which keys may sign a withdrawal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpenderPolicy {
    /// The signer must be the payee key
    #[default]
    SpenderMustBePayee,
    /// Any key may sign; the payout still lands on the payee destination
    SpenderUnrestricted,
}

/// Immutable terms of a covenant instance.
///
/// # Examples
///
/// ```rust
/// use paykit_covenant::{Amount, ContractParameters, PayeeIdentity, PayerIdentity, PublicKey};
///
/// let payer = PayerIdentity::Key(PublicKey([1u8; 32]));
/// let payee = PayeeIdentity::Key(PublicKey([2u8; 32]));
/// let params = ContractParameters::new(payer, payee, 144, Amount::from_sats(50_000))
///     .with_accumulation(true)
///     .with_expiration(900_000);
/// assert!(params.validate(Amount::from_sats(546)).is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractParameters {
    pub payer: PayerIdentity,
    pub payee: PayeeIdentity,
    pub spender: SpenderPolicy,
    /// Carry unused allowance into later windows
    pub accumulation: bool,
    /// Window length in blocks; 0 disables the time constraint
    pub epoch_length: u32,
    pub max_amount_per_epoch: Amount,
    /// Height after which only revocation is possible
    pub expiration: Option<u32>,
}

impl ContractParameters {
    /// Create parameters without accumulation or expiration.
    ///
    /// A key payee defaults to [`SpenderPolicy::SpenderMustBePayee`]; a bare
    /// destination payee can only work with [`SpenderPolicy::SpenderUnrestricted`].
    pub fn new(
        payer: PayerIdentity,
        payee: PayeeIdentity,
        epoch_length: u32,
        max_amount_per_epoch: Amount,
    ) -> Self {
        let spender = match payee {
            PayeeIdentity::Key(_) => SpenderPolicy::SpenderMustBePayee,
            PayeeIdentity::Destination(_) => SpenderPolicy::SpenderUnrestricted,
        };
        Self {
            payer,
            payee,
            spender,
            accumulation: false,
            epoch_length,
            max_amount_per_epoch,
            expiration: None,
        }
    }

    pub fn with_accumulation(mut self, enabled: bool) -> Self {
        self.accumulation = enabled;
        self
    }

    pub fn with_expiration(mut self, height: u32) -> Self {
        self.expiration = Some(height);
        self
    }

    pub fn with_spender(mut self, policy: SpenderPolicy) -> Self {
        self.spender = policy;
        self
    }

    /// Validate parameters against the ledger dust limit.
    pub fn validate(&self, min_transferable: Amount) -> Result<()> {
        if self.max_amount_per_epoch <= min_transferable {
            return Err(CovenantError::invalid_parameters(format!(
                "max amount per epoch {} must exceed the minimum transferable amount {}",
                self.max_amount_per_epoch, min_transferable
            )));
        }
        if self.spender == SpenderPolicy::SpenderMustBePayee && self.payee.key().is_none() {
            return Err(CovenantError::invalid_parameters(
                "restricted spender policy requires a payee public key",
            ));
        }
        if let (PayerIdentity::Key(payer), PayeeIdentity::Key(payee)) = (&self.payer, &self.payee)
        {
            if payer == payee {
                return Err(CovenantError::invalid_parameters(
                    "payer and payee must be different",
                ));
            }
        }
        Ok(())
    }
}

/// Mutable allowance state, replaced wholesale by every accepted spend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractState {
    /// Height at which this state was created
    pub valid_from: u32,
    /// Blocks left in the current window
    pub remaining_time: u32,
    /// Allowance left in the current window
    pub remaining_amount: Amount,
}

impl ContractState {
    /// State of a freshly deployed instance
    pub fn initial(params: &ContractParameters, deployed_at: u32) -> Self {
        Self {
            valid_from: deployed_at,
            remaining_time: params.epoch_length,
            remaining_amount: params.max_amount_per_epoch,
        }
    }

    /// Check the state invariants against its parameters.
    pub fn validate(&self, params: &ContractParameters) -> Result<()> {
        if !self
            .remaining_amount
            .is_within_limit(&params.max_amount_per_epoch)
        {
            return Err(CovenantError::invalid_parameters(format!(
                "remaining amount {} exceeds max amount per epoch {}",
                self.remaining_amount, params.max_amount_per_epoch
            )));
        }
        if self.remaining_time > params.epoch_length {
            return Err(CovenantError::invalid_parameters(format!(
                "remaining time {} exceeds epoch length {}",
                self.remaining_time, params.epoch_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const DUST: Amount = Amount::from_sats(546);

    fn params() -> ContractParameters {
        ContractParameters::new(
            PayerIdentity::Key(PublicKey([1u8; 32])),
            PayeeIdentity::Key(PublicKey([2u8; 32])),
            10,
            Amount::from_sats(3000),
        )
    }

    #[test]
    fn test_default_spender_policy_follows_payee() {
        assert_eq!(params().spender, SpenderPolicy::SpenderMustBePayee);

        let by_destination = ContractParameters::new(
            PayerIdentity::Key(PublicKey([1u8; 32])),
            PayeeIdentity::Destination(Destination::KeyHash([9u8; 32])),
            10,
            Amount::from_sats(3000),
        );
        assert_eq!(by_destination.spender, SpenderPolicy::SpenderUnrestricted);
    }

    #[test]
    fn test_max_amount_must_exceed_dust() {
        let mut p = params();
        p.max_amount_per_epoch = DUST;
        assert_eq!(p.validate(DUST).unwrap_err().kind(), ErrorKind::InvalidParameters);

        p.max_amount_per_epoch = Amount::from_sats(547);
        assert!(p.validate(DUST).is_ok());
    }

    #[test]
    fn test_restricted_policy_needs_payee_key() {
        let p = ContractParameters::new(
            PayerIdentity::Key(PublicKey([1u8; 32])),
            PayeeIdentity::Destination(Destination::KeyHash([9u8; 32])),
            10,
            Amount::from_sats(3000),
        )
        .with_spender(SpenderPolicy::SpenderMustBePayee);
        assert!(p.validate(DUST).is_err());
    }

    #[test]
    fn test_payer_and_payee_must_differ() {
        let mut p = params();
        p.payee = PayeeIdentity::Key(PublicKey([1u8; 32]));
        assert!(p.validate(DUST).is_err());
    }

    #[test]
    fn test_committed_payer_admits_matching_key_only() {
        let key = PublicKey([7u8; 32]);
        let payer = PayerIdentity::Committed {
            key_hash: key.key_hash(),
            destination: key.destination(),
        };
        assert!(payer.admits(&key));
        assert!(!payer.admits(&PublicKey([8u8; 32])));
    }

    #[test]
    fn test_initial_state() {
        let p = params();
        let state = ContractState::initial(&p, 100);
        assert_eq!(state.valid_from, 100);
        assert_eq!(state.remaining_time, 10);
        assert_eq!(state.remaining_amount, Amount::from_sats(3000));
        assert!(state.validate(&p).is_ok());
    }

    #[test]
    fn test_state_invariants() {
        let p = params();
        let mut state = ContractState::initial(&p, 0);
        state.remaining_amount = Amount::from_sats(3001);
        assert!(state.validate(&p).is_err());

        let mut state = ContractState::initial(&p, 0);
        state.remaining_time = 11;
        assert!(state.validate(&p).is_err());
    }
}
