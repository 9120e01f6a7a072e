//! Ledger policy knobs consumed by covenant evaluation.

use crate::{Amount, CovenantError, Result};
use serde::{Deserialize, Serialize};

/// Ledger-level limits applied while validating candidate transactions.
///
/// Every validator of a given covenant must run with the same values, so
/// these normally come from a shared deployment file rather than from code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CovenantConfig {
    /// Smallest amount an output may carry (dust limit).
    #[serde(default = "default_min_transferable")]
    pub min_transferable: Amount,

    /// Largest miner fee a spend may leave between input and outputs.
    #[serde(default = "default_max_miner_fee")]
    pub max_miner_fee: Amount,
}

fn default_min_transferable() -> Amount {
    Amount::from_sats(546)
}

fn default_max_miner_fee() -> Amount {
    Amount::from_sats(10_000)
}

impl Default for CovenantConfig {
    fn default() -> Self {
        Self {
            min_transferable: default_min_transferable(),
            max_miner_fee: default_max_miner_fee(),
        }
    }
}

impl CovenantConfig {
    /// Create a configuration with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dust limit.
    pub fn with_min_transferable(mut self, amount: Amount) -> Self {
        self.min_transferable = amount;
        self
    }

    /// Set the maximum miner fee.
    pub fn with_max_miner_fee(mut self, amount: Amount) -> Self {
        self.max_miner_fee = amount;
        self
    }

    /// Parse from JSON, filling absent fields with defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use paykit_covenant::{Amount, CovenantConfig};
    ///
    /// let config = CovenantConfig::from_json(r#"{ "max_miner_fee": 1500 }"#).unwrap();
    /// assert_eq!(config.max_miner_fee, Amount::from_sats(1500));
    /// assert_eq!(config.min_transferable, Amount::from_sats(546));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.min_transferable.is_zero() {
            return Err(CovenantError::Config(
                "min_transferable must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
