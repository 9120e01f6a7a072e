//! Candidate transactions as seen by the covenant.
//!
//! Only the parts the covenant can observe are modeled: the value of the
//! consumed covenant output, the effective request time, the declared outputs
//! with their hash, and the witness data selecting the revoke or spend path.

use crate::signing::Signature;
use crate::{Amount, Destination};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single transaction output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: Amount,
    pub destination: Destination,
}

impl TxOutput {
    pub fn new(amount: Amount, destination: Destination) -> Self {
        Self {
            amount,
            destination,
        }
    }
}

/// Witness data for a withdrawal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpendRequest {
    /// Amount paid out to the payee
    pub requested_amount: Amount,
    /// Amount locked into the successor covenant output
    pub continuation_amount: Amount,
    pub signature: Signature,
}

/// Which entry path the transaction takes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    /// Payer takes unconditional control of the funds
    Revoke(Signature),
    /// Withdrawal against the allowance
    Spend(SpendRequest),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Revoke(_) => ActionKind::Revoke,
            Self::Spend(_) => ActionKind::Spend,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Self::Revoke(signature) => signature,
            Self::Spend(request) => &request.signature,
        }
    }
}

/// Action discriminant, committed to by signatures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Revoke,
    Spend,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Revoke => write!(f, "revoke"),
            Self::Spend => write!(f, "spend"),
        }
    }
}

/// A proposed transaction consuming one covenant instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    /// Value of the covenant output being consumed
    pub input_value: Amount,
    /// Effective time (block height) of the transaction
    pub request_time: u32,
    pub outputs: Vec<TxOutput>,
    /// Ledger hash over the encoded outputs
    pub outputs_hash: [u8; 32],
    pub action: Action,
}
