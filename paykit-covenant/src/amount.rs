//! Satoshi amounts with checked integer arithmetic
//!
//! Covenant accounting must be reproduced bit-for-bit by every validator, so
//! amounts are plain `u64` satoshis. There is no rounding and no floating
//! point anywhere in the allowance math.
//!
//! # Security
//!
//! - Checked operations only (overflow and underflow return `None`)
//! - Serializes transparently as an integer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amount in satoshis
///
/// # Examples
///
/// ```rust
/// use paykit_covenant::Amount;
///
/// let a = Amount::from_sats(1000);
/// let b = Amount::from_sats(500);
/// let total = a.checked_add(&b).unwrap();
/// assert_eq!(total.as_sats(), 1500);
/// ```
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount {
    sats: u64,
}

impl Amount {
    /// Create from satoshis
    pub const fn from_sats(sats: u64) -> Self {
        Self { sats }
    }

    /// Get value in satoshis
    pub const fn as_sats(&self) -> u64 {
        self.sats
    }

    /// Get zero amount
    pub const fn zero() -> Self {
        Self { sats: 0 }
    }

    /// Check if amount is zero
    pub fn is_zero(&self) -> bool {
        self.sats == 0
    }

    /// Checked addition (returns None on overflow)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use paykit_covenant::Amount;
    /// assert!(Amount::from_sats(u64::MAX).checked_add(&Amount::from_sats(1)).is_none());
    /// ```
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        self.sats.checked_add(other.sats).map(Self::from_sats)
    }

    /// Checked subtraction (returns None when the result would be negative)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use paykit_covenant::Amount;
    /// let a = Amount::from_sats(100);
    /// assert_eq!(a.checked_sub(&Amount::from_sats(40)), Some(Amount::from_sats(60)));
    /// assert!(a.checked_sub(&Amount::from_sats(101)).is_none());
    /// ```
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        self.sats.checked_sub(other.sats).map(Self::from_sats)
    }

    /// Checked multiplication by a count (returns None on overflow)
    pub fn checked_mul(&self, count: u64) -> Option<Self> {
        self.sats.checked_mul(count).map(Self::from_sats)
    }

    /// Check if this amount is less than or equal to a limit
    pub fn is_within_limit(&self, limit: &Self) -> bool {
        self.sats <= limit.sats
    }

    /// Little-endian wire bytes
    pub fn to_le_bytes(&self) -> [u8; 8] {
        self.sats.to_le_bytes()
    }
}

impl From<u64> for Amount {
    fn from(sats: u64) -> Self {
        Self::from_sats(sats)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} sats", self.sats)
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self::from_sats)
            .map_err(|e| format!("Invalid amount: {}", e))
    }
}
