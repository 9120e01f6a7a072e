//! # Transaction Signatures
//!
//! ## Security Model
//!
//! Ed25519 signatures over a digest of the candidate transaction. The digest
//! MUST provide:
//! - Deterministic hashing (canonical serialization via postcard)
//! - Binding to the consumed instance (commitment of its parameters and state)
//! - Binding to the transaction (input value, request time, outputs hash)
//! - Domain separation and action separation (revoke vs spend)
//!
//! A signature is therefore never valid for a different transaction, a
//! different covenant instance, or a later state of the same instance.

use crate::transaction::ActionKind;
use crate::{codec, Amount, CovenantError, PublicKey, Result};
use ed25519_dalek::{Signature as DalekSig, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};

/// Domain separation constant for covenant transaction signatures
const SIGHASH_DOMAIN: &[u8] = b"PAYKIT_COVENANT_SIGHASH_V1";

/// Ed25519 signature together with the key that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signature {
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
    pub public_key: PublicKey,
}

impl Signature {
    pub fn new_ed25519(signature: [u8; 64], public_key: PublicKey) -> Self {
        Self {
            signature: signature.to_vec(),
            public_key,
        }
    }

    /// Get signature as fixed-size array
    pub fn signature_bytes(&self) -> Option<[u8; 64]> {
        if self.signature.len() == 64 {
            let mut arr = [0u8; 64];
            arr.copy_from_slice(&self.signature);
            Some(arr)
        } else {
            None
        }
    }
}

/// Everything a signature commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SighashInput {
    pub action: ActionKind,
    /// Commitment of the instance being consumed
    pub input_commitment: [u8; 32],
    pub input_value: Amount,
    pub request_time: u32,
    pub outputs_hash: [u8; 32],
}

#[derive(Serialize)]
struct SighashPayload<'a> {
    domain: &'static [u8],
    action: ActionKind,
    input_commitment: &'a [u8; 32],
    input_value: u64,
    request_time: u32,
    outputs_hash: &'a [u8; 32],
}

/// Compute the digest a transaction signature covers.
///
/// # Security
///
/// This function MUST produce identical output for identical input.
pub fn sighash(input: &SighashInput) -> Result<[u8; 32]> {
    let payload = SighashPayload {
        domain: SIGHASH_DOMAIN,
        action: input.action,
        input_commitment: &input.input_commitment,
        input_value: input.input_value.as_sats(),
        request_time: input.request_time,
        outputs_hash: &input.outputs_hash,
    };

    let canonical_bytes = postcard::to_allocvec(&payload)
        .map_err(|e| CovenantError::authorization(format!("Serialization error: {}", e)))?;

    Ok(codec::sha256(&canonical_bytes))
}

/// Sign a transaction digest.
pub fn sign_ed25519(input: &SighashInput, signing_key: &SigningKey) -> Result<Signature> {
    let message = sighash(input)?;
    let signature = signing_key.sign(&message);
    Ok(Signature::new_ed25519(
        signature.to_bytes(),
        PublicKey::from_verifying_key(&signing_key.verifying_key()),
    ))
}

/// Verify a transaction signature.
///
/// # Returns
///
/// `Ok(true)` if the signature is valid for this digest and embedded key
/// `Ok(false)` if the signature does not verify
/// `Err(_)` if the key or signature bytes are malformed
pub fn verify_ed25519(input: &SighashInput, signature: &Signature) -> Result<bool> {
    let message = sighash(input)?;

    let verifying_key = VerifyingKey::from_bytes(signature.public_key.as_bytes())
        .map_err(|e| CovenantError::authorization(format!("Invalid public key: {}", e)))?;

    let sig_bytes = signature
        .signature_bytes()
        .ok_or_else(|| CovenantError::authorization("Invalid signature length"))?;
    let sig = DalekSig::from_bytes(&sig_bytes);

    // verify_strict rejects small-order keys and non-canonical signatures
    Ok(verifying_key.verify_strict(&message, &sig).is_ok())
}
