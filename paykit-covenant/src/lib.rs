//! # Paykit Recurring Allowance Covenant
//!
//! A payer locks funds into a covenant instance that lets a payee withdraw at
//! most a fixed amount per window of blocks, until an optional expiration
//! height. The payer can revoke at any time and take the remaining funds.
//!
//! ## Security Model
//!
//! Every candidate transaction is checked fail-closed, in this order:
//! - Authorization: Ed25519 signature over a digest binding the consumed
//!   instance, the transaction amounts, request time and outputs hash
//! - Expiration: the spend path closes for good after the expiration height
//! - Allowance accounting: integer satoshi arithmetic, checked for overflow,
//!   with the successor state always inside `[0, max_amount_per_epoch]`
//! - Output shape: payout to the payee and continuation to the commitment of
//!   the successor state, compared by outputs hash in constant time
//!
//! A rejected candidate has no effect. Evaluation is pure and synchronous.
//!
//! ## Example
//!
//! ```rust
//! use paykit_covenant::{
//!     Amount, ContractParameters, Covenant, CovenantConfig, PayeeIdentity, PayerIdentity,
//!     PublicKey,
//! };
//!
//! let params = ContractParameters::new(
//!     PayerIdentity::Key(PublicKey([1u8; 32])),
//!     PayeeIdentity::Key(PublicKey([2u8; 32])),
//!     4320,
//!     Amount::from_sats(250_000),
//! )
//! .with_accumulation(true);
//!
//! let (covenant, state) = Covenant::deploy(params, 850_000, CovenantConfig::default()).unwrap();
//! let encoded = paykit_covenant::codec::encode_contract(covenant.params(), &state);
//! assert_eq!(encoded.len(), 167);
//! ```

pub mod accountant;
pub mod amount;
pub mod codec;
pub mod config;
pub mod contract;
pub mod covenant;
pub mod error;
pub mod expiration;
pub mod guard;
pub mod outputs;
pub mod signing;
pub mod transaction;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use accountant::{next_state, WindowPosition};
pub use amount::Amount;
pub use config::CovenantConfig;
pub use contract::{
    ContractParameters, ContractState, Destination, PayeeIdentity, PayerIdentity, PublicKey,
    SpenderPolicy,
};
pub use covenant::{ContractStatus, Covenant, Transition};
pub use error::{CovenantError, ErrorKind};
pub use guard::Actor;
pub use signing::{sign_ed25519, verify_ed25519, SighashInput, Signature};
pub use transaction::{Action, ActionKind, CandidateTransaction, SpendRequest, TxOutput};

pub type Result<T> = std::result::Result<T, CovenantError>;
