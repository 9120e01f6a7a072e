//! Fixed-width wire layout of covenant parameters, state, and outputs.
//!
//! The encoded parameters and state are hashed into the destination of every
//! covenant output. Field order and widths are therefore frozen: any change
//! makes deployed instances unspendable. All integers are little-endian.
//!
//! ```text
//! parameters (151) = payer identity (66) | payee identity (66)
//!                  | spender policy (1) | accumulation (1)
//!                  | epoch length (4) | max amount per epoch (8)
//!                  | expiration flag (1) | expiration height (4)
//! identity    (66) = tag (1) | key or key hash (32) | destination (33)
//! destination (33) = tag (1) | hash (32)
//! state       (16) = valid from (4) | remaining time (4) | remaining amount (8)
//! output      (41) = amount (8) | destination (33)
//! ```

use crate::contract::{
    ContractParameters, ContractState, Destination, PayeeIdentity, PayerIdentity, PublicKey,
    SpenderPolicy,
};
use crate::transaction::TxOutput;
use crate::{Amount, CovenantError, Result};
use sha2::{Digest, Sha256};

/// Domain separation prefix of instance commitments
pub const COMMITMENT_DOMAIN: &[u8] = b"PAYKIT_COVENANT_V1";

pub const DESTINATION_LEN: usize = 33;
pub const IDENTITY_LEN: usize = 1 + 32 + DESTINATION_LEN;
pub const PARAMETERS_LEN: usize = 2 * IDENTITY_LEN + 1 + 1 + 4 + 8 + 1 + 4;
pub const STATE_LEN: usize = 4 + 4 + 8;
pub const OUTPUT_LEN: usize = 8 + DESTINATION_LEN;

const TAG_KEY_HASH: u8 = 0;
const TAG_SCRIPT_HASH: u8 = 1;

const TAG_PAYER_KEY: u8 = 0;
const TAG_PAYER_COMMITTED: u8 = 1;

const TAG_PAYEE_KEY: u8 = 0;
const TAG_PAYEE_DESTINATION: u8 = 1;

const POLICY_MUST_BE_PAYEE: u8 = 0;
const POLICY_UNRESTRICTED: u8 = 1;

/// SHA-256 helper returning a fixed array
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let hash = Sha256::digest(data);
    let mut result = [0u8; 32];
    result.copy_from_slice(&hash);
    result
}

fn put_destination(out: &mut Vec<u8>, destination: &Destination) {
    let tag = match destination {
        Destination::KeyHash(_) => TAG_KEY_HASH,
        Destination::ScriptHash(_) => TAG_SCRIPT_HASH,
    };
    out.push(tag);
    out.extend_from_slice(destination.hash());
}

fn put_payer(out: &mut Vec<u8>, payer: &PayerIdentity) {
    match payer {
        PayerIdentity::Key(key) => {
            out.push(TAG_PAYER_KEY);
            out.extend_from_slice(key.as_bytes());
            put_destination(out, &key.destination());
        }
        PayerIdentity::Committed {
            key_hash,
            destination,
        } => {
            out.push(TAG_PAYER_COMMITTED);
            out.extend_from_slice(key_hash);
            put_destination(out, destination);
        }
    }
}

fn put_payee(out: &mut Vec<u8>, payee: &PayeeIdentity) {
    match payee {
        PayeeIdentity::Key(key) => {
            out.push(TAG_PAYEE_KEY);
            out.extend_from_slice(key.as_bytes());
            put_destination(out, &key.destination());
        }
        PayeeIdentity::Destination(destination) => {
            out.push(TAG_PAYEE_DESTINATION);
            out.extend_from_slice(&[0u8; 32]);
            put_destination(out, destination);
        }
    }
}

/// Encode contract parameters (151 bytes).
pub fn encode_parameters(params: &ContractParameters) -> Vec<u8> {
    let mut out = Vec::with_capacity(PARAMETERS_LEN);
    put_payer(&mut out, &params.payer);
    put_payee(&mut out, &params.payee);
    out.push(match params.spender {
        SpenderPolicy::SpenderMustBePayee => POLICY_MUST_BE_PAYEE,
        SpenderPolicy::SpenderUnrestricted => POLICY_UNRESTRICTED,
    });
    out.push(u8::from(params.accumulation));
    out.extend_from_slice(&params.epoch_length.to_le_bytes());
    out.extend_from_slice(&params.max_amount_per_epoch.to_le_bytes());
    match params.expiration {
        Some(height) => {
            out.push(1);
            out.extend_from_slice(&height.to_le_bytes());
        }
        None => {
            out.push(0);
            out.extend_from_slice(&0u32.to_le_bytes());
        }
    }
    debug_assert_eq!(out.len(), PARAMETERS_LEN);
    out
}

/// Encode contract state (16 bytes).
pub fn encode_state(state: &ContractState) -> [u8; STATE_LEN] {
    let mut out = [0u8; STATE_LEN];
    out[0..4].copy_from_slice(&state.valid_from.to_le_bytes());
    out[4..8].copy_from_slice(&state.remaining_time.to_le_bytes());
    out[8..16].copy_from_slice(&state.remaining_amount.to_le_bytes());
    out
}

/// Encode parameters followed by state, the layout committed on-chain.
pub fn encode_contract(params: &ContractParameters, state: &ContractState) -> Vec<u8> {
    let mut out = encode_parameters(params);
    out.extend_from_slice(&encode_state(state));
    out
}

/// Commitment hash locking a covenant instance.
pub fn commitment(params: &ContractParameters, state: &ContractState) -> [u8; 32] {
    let mut preimage = Vec::with_capacity(COMMITMENT_DOMAIN.len() + PARAMETERS_LEN + STATE_LEN);
    preimage.extend_from_slice(COMMITMENT_DOMAIN);
    preimage.extend_from_slice(&encode_contract(params, state));
    sha256(&preimage)
}

/// Destination of the output holding a covenant instance.
pub fn contract_destination(params: &ContractParameters, state: &ContractState) -> Destination {
    Destination::ScriptHash(commitment(params, state))
}

/// Encode one output (41 bytes).
pub fn encode_output(output: &TxOutput) -> [u8; OUTPUT_LEN] {
    let mut buf = Vec::with_capacity(OUTPUT_LEN);
    buf.extend_from_slice(&output.amount.to_le_bytes());
    put_destination(&mut buf, &output.destination);
    let mut out = [0u8; OUTPUT_LEN];
    out.copy_from_slice(&buf);
    out
}

/// Encode an ordered output list.
pub fn encode_outputs(outputs: &[TxOutput]) -> Vec<u8> {
    let mut out = Vec::with_capacity(outputs.len() * OUTPUT_LEN);
    for output in outputs {
        out.extend_from_slice(&encode_output(output));
    }
    out
}

/// Ledger hash of an ordered output list.
pub fn outputs_hash(outputs: &[TxOutput]) -> [u8; 32] {
    sha256(&encode_outputs(outputs))
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                CovenantError::decode(format!(
                    "truncated input: need {} bytes at offset {}, have {}",
                    n,
                    self.pos,
                    self.bytes.len()
                ))
            })?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn flag(&mut self, field: &str) -> Result<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CovenantError::decode(format!(
                "{}: invalid flag byte {}",
                field, other
            ))),
        }
    }

    fn bytes32(&mut self) -> Result<[u8; 32]> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.take(32)?);
        Ok(out)
    }

    fn u32_le(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(buf))
    }

    fn u64_le(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn destination(&mut self) -> Result<Destination> {
        let tag = self.u8()?;
        let hash = self.bytes32()?;
        match tag {
            TAG_KEY_HASH => Ok(Destination::KeyHash(hash)),
            TAG_SCRIPT_HASH => Ok(Destination::ScriptHash(hash)),
            other => Err(CovenantError::decode(format!(
                "unknown destination tag {}",
                other
            ))),
        }
    }

    fn key_with_destination(&mut self, role: &str) -> Result<PublicKey> {
        let key = PublicKey(self.bytes32()?);
        let destination = self.destination()?;
        if destination != key.destination() {
            return Err(CovenantError::decode(format!(
                "{} destination does not match its key",
                role
            )));
        }
        Ok(key)
    }

    fn payer(&mut self) -> Result<PayerIdentity> {
        match self.u8()? {
            TAG_PAYER_KEY => Ok(PayerIdentity::Key(self.key_with_destination("payer")?)),
            TAG_PAYER_COMMITTED => Ok(PayerIdentity::Committed {
                key_hash: self.bytes32()?,
                destination: self.destination()?,
            }),
            other => Err(CovenantError::decode(format!(
                "unknown payer identity tag {}",
                other
            ))),
        }
    }

    fn payee(&mut self) -> Result<PayeeIdentity> {
        match self.u8()? {
            TAG_PAYEE_KEY => Ok(PayeeIdentity::Key(self.key_with_destination("payee")?)),
            TAG_PAYEE_DESTINATION => {
                if self.bytes32()? != [0u8; 32] {
                    return Err(CovenantError::decode("payee key padding is not zero"));
                }
                Ok(PayeeIdentity::Destination(self.destination()?))
            }
            other => Err(CovenantError::decode(format!(
                "unknown payee identity tag {}",
                other
            ))),
        }
    }

    fn parameters(&mut self) -> Result<ContractParameters> {
        let payer = self.payer()?;
        let payee = self.payee()?;
        let spender = match self.u8()? {
            POLICY_MUST_BE_PAYEE => SpenderPolicy::SpenderMustBePayee,
            POLICY_UNRESTRICTED => SpenderPolicy::SpenderUnrestricted,
            other => {
                return Err(CovenantError::decode(format!(
                    "unknown spender policy {}",
                    other
                )))
            }
        };
        let accumulation = self.flag("accumulation")?;
        let epoch_length = self.u32_le()?;
        let max_amount_per_epoch = Amount::from_sats(self.u64_le()?);
        let has_expiration = self.flag("expiration")?;
        let height = self.u32_le()?;
        let expiration = match (has_expiration, height) {
            (true, height) => Some(height),
            (false, 0) => None,
            (false, _) => {
                return Err(CovenantError::decode(
                    "expiration height set without expiration flag",
                ))
            }
        };
        Ok(ContractParameters {
            payer,
            payee,
            spender,
            accumulation,
            epoch_length,
            max_amount_per_epoch,
            expiration,
        })
    }

    fn state(&mut self) -> Result<ContractState> {
        Ok(ContractState {
            valid_from: self.u32_le()?,
            remaining_time: self.u32_le()?,
            remaining_amount: Amount::from_sats(self.u64_le()?),
        })
    }

    fn finish(&self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(CovenantError::decode(format!(
                "{} trailing bytes",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}

/// Decode contract parameters.
pub fn decode_parameters(bytes: &[u8]) -> Result<ContractParameters> {
    let mut reader = Reader::new(bytes);
    let params = reader.parameters()?;
    reader.finish()?;
    Ok(params)
}

/// Decode contract state.
pub fn decode_state(bytes: &[u8]) -> Result<ContractState> {
    let mut reader = Reader::new(bytes);
    let state = reader.state()?;
    reader.finish()?;
    Ok(state)
}

/// Decode parameters followed by state.
pub fn decode_contract(bytes: &[u8]) -> Result<(ContractParameters, ContractState)> {
    let mut reader = Reader::new(bytes);
    let params = reader.parameters()?;
    let state = reader.state()?;
    reader.finish()?;
    Ok((params, state))
}
