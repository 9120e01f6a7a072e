//! Authorization guard: who is acting, and is their signature valid.

use crate::contract::{ContractParameters, PublicKey, SpenderPolicy};
use crate::signing::{self, SighashInput};
use crate::transaction::{Action, ActionKind, CandidateTransaction};
use crate::{CovenantError, Result};

/// Authenticated actor of a candidate transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The payer, revoking
    Payer(PublicKey),
    /// A key allowed to withdraw under the spender policy
    Spender(PublicKey),
}

/// Digest input the transaction's signature must cover.
pub fn sighash_input(input_commitment: [u8; 32], tx: &CandidateTransaction) -> SighashInput {
    SighashInput {
        action: tx.action.kind(),
        input_commitment,
        input_value: tx.input_value,
        request_time: tx.request_time,
        outputs_hash: tx.outputs_hash,
    }
}

fn check_spender(params: &ContractParameters, signer: &PublicKey) -> Result<()> {
    match params.spender {
        SpenderPolicy::SpenderUnrestricted => Ok(()),
        SpenderPolicy::SpenderMustBePayee => {
            let payee = params.payee.key().ok_or_else(|| {
                CovenantError::authorization("restricted spender policy without a payee key")
            })?;
            if payee.ct_matches(signer) {
                Ok(())
            } else {
                Err(CovenantError::authorization("signer is not the payee"))
            }
        }
    }
}

/// Identify and authenticate the actor.
///
/// `input_commitment` is the commitment of the instance being consumed; it is
/// part of the signed digest so signatures cannot move between instances or
/// states.
pub fn authorize(
    params: &ContractParameters,
    input_commitment: [u8; 32],
    tx: &CandidateTransaction,
) -> Result<Actor> {
    let signature = tx.action.signature();
    let signer = signature.public_key;

    let actor = match &tx.action {
        Action::Revoke(_) => {
            if !params.payer.admits(&signer) {
                return Err(CovenantError::authorization("signer is not the payer"));
            }
            Actor::Payer(signer)
        }
        Action::Spend(_) => {
            check_spender(params, &signer)?;
            Actor::Spender(signer)
        }
    };

    let input = sighash_input(input_commitment, tx);
    if !signing::verify_ed25519(&input, signature)? {
        return Err(CovenantError::authorization(match input.action {
            ActionKind::Revoke => "invalid revoke signature",
            ActionKind::Spend => "invalid spend signature",
        }));
    }

    Ok(actor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{Destination, PayeeIdentity, PayerIdentity};
    use crate::signing::{sign_ed25519, Signature};
    use crate::transaction::SpendRequest;
    use crate::{Amount, ErrorKind};
    use ed25519_dalek::SigningKey;

    const COMMITMENT: [u8; 32] = [0xc0; 32];

    fn key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32])
    }

    fn public(seed: u8) -> PublicKey {
        PublicKey::from_verifying_key(&key(seed).verifying_key())
    }

    fn params() -> ContractParameters {
        ContractParameters::new(
            PayerIdentity::Key(public(1)),
            PayeeIdentity::Key(public(2)),
            10,
            Amount::from_sats(3000),
        )
    }

    fn placeholder() -> Signature {
        Signature::new_ed25519([0u8; 64], public(0))
    }

    fn unsigned(action: Action) -> CandidateTransaction {
        CandidateTransaction {
            input_value: Amount::from_sats(50_000),
            request_time: 120,
            outputs: Vec::new(),
            outputs_hash: [0xaa; 32],
            action,
        }
    }

    fn revoke_signed_by(seed: u8) -> CandidateTransaction {
        let mut tx = unsigned(Action::Revoke(placeholder()));
        let signature = sign_ed25519(&sighash_input(COMMITMENT, &tx), &key(seed)).unwrap();
        tx.action = Action::Revoke(signature);
        tx
    }

    fn spend_signed_by(seed: u8) -> CandidateTransaction {
        let request = |signature| {
            Action::Spend(SpendRequest {
                requested_amount: Amount::from_sats(1000),
                continuation_amount: Amount::from_sats(48_000),
                signature,
            })
        };
        let mut tx = unsigned(request(placeholder()));
        let signature = sign_ed25519(&sighash_input(COMMITMENT, &tx), &key(seed)).unwrap();
        tx.action = request(signature);
        tx
    }

    #[test]
    fn test_payer_revokes() {
        let actor = authorize(&params(), COMMITMENT, &revoke_signed_by(1)).unwrap();
        assert_eq!(actor, Actor::Payer(public(1)));
    }

    #[test]
    fn test_payee_cannot_revoke() {
        let err = authorize(&params(), COMMITMENT, &revoke_signed_by(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_committed_payer_revokes_with_matching_key() {
        let mut p = params();
        p.payer = PayerIdentity::Committed {
            key_hash: public(1).key_hash(),
            destination: Destination::KeyHash([4u8; 32]),
        };
        assert!(authorize(&p, COMMITMENT, &revoke_signed_by(1)).is_ok());
        assert!(authorize(&p, COMMITMENT, &revoke_signed_by(3)).is_err());
    }

    #[test]
    fn test_restricted_spender_must_be_payee() {
        assert_eq!(
            authorize(&params(), COMMITMENT, &spend_signed_by(2)).unwrap(),
            Actor::Spender(public(2))
        );
        let err = authorize(&params(), COMMITMENT, &spend_signed_by(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_unrestricted_spender_accepts_any_key() {
        let p = params().with_spender(SpenderPolicy::SpenderUnrestricted);
        assert_eq!(
            authorize(&p, COMMITMENT, &spend_signed_by(3)).unwrap(),
            Actor::Spender(public(3))
        );
    }

    #[test]
    fn test_signature_bound_to_instance_commitment() {
        let tx = spend_signed_by(2);
        let err = authorize(&params(), [0xc1; 32], &tx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn test_signature_bound_to_outputs() {
        let mut tx = spend_signed_by(2);
        tx.outputs_hash = [0xab; 32];
        assert!(authorize(&params(), COMMITMENT, &tx).is_err());
    }

    #[test]
    fn test_spend_signature_cannot_be_reused_to_revoke() {
        // Payer signs a spend digest; presenting it as a revoke must fail
        let p = params().with_spender(SpenderPolicy::SpenderUnrestricted);
        let tx = spend_signed_by(1);
        let Action::Spend(request) = tx.action.clone() else {
            unreachable!()
        };
        let forged = CandidateTransaction {
            action: Action::Revoke(request.signature),
            ..tx
        };
        assert!(authorize(&p, COMMITMENT, &forged).is_err());
    }
}
