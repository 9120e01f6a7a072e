//! Error types for covenant evaluation.
//!
//! Every rejection is terminal for the candidate transaction: nothing is
//! applied, nothing is retried. The variant says why.

/// Stable error kinds, also exposed as numeric codes for FFI callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorKind {
    /// Missing, invalid, or wrong-signer signature
    Authorization = 3000,
    /// Amount or resulting allowance outside bounds
    Range = 5000,
    /// Negative elapsed time or spend after expiration
    Timing = 5100,
    /// Backlog withdrawal does not equal missed epochs times the epoch budget
    AccumulationMismatch = 5200,
    /// Proposed outputs differ from the expected output set
    OutputMismatch = 5300,
    /// Contract parameters or state violate their invariants
    InvalidParameters = 5001,
    /// Malformed wire bytes
    Decode = 5002,
    /// The instance was already revoked
    Revoked = 6000,
    /// Malformed configuration
    Config = 7000,
}

/// Error returned by every fallible covenant operation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CovenantError {
    #[error("authorization failed: {0}")]
    Authorization(String),

    #[error("amount out of range: {0}")]
    Range(String),

    #[error("timing violation: {0}")]
    Timing(String),

    #[error(
        "accumulated withdrawal mismatch: requested {requested}, expected {expected} \
         ({missed_epochs} missed epochs)"
    )]
    AccumulationMismatch {
        requested: u64,
        expected: u64,
        missed_epochs: u64,
    },

    #[error("output mismatch: {0}")]
    OutputMismatch(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("contract instance has been revoked")]
    Revoked,

    #[error("configuration error: {0}")]
    Config(String),
}

impl CovenantError {
    /// Get the error kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Range(_) => ErrorKind::Range,
            Self::Timing(_) => ErrorKind::Timing,
            Self::AccumulationMismatch { .. } => ErrorKind::AccumulationMismatch,
            Self::OutputMismatch(_) => ErrorKind::OutputMismatch,
            Self::InvalidParameters(_) => ErrorKind::InvalidParameters,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Revoked => ErrorKind::Revoked,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Get the numeric error code for FFI/mobile integration.
    pub fn code(&self) -> i32 {
        self.kind() as i32
    }

    pub(crate) fn range(msg: impl Into<String>) -> Self {
        Self::Range(msg.into())
    }

    pub(crate) fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub(crate) fn timing(msg: impl Into<String>) -> Self {
        Self::Timing(msg.into())
    }

    pub(crate) fn invalid_parameters(msg: impl Into<String>) -> Self {
        Self::InvalidParameters(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }
}

impl From<serde_json::Error> for CovenantError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_and_codes() {
        let err = CovenantError::range("requested 3001 exceeds 3000");
        assert_eq!(err.kind(), ErrorKind::Range);
        assert_eq!(err.code(), 5000);

        let err = CovenantError::AccumulationMismatch {
            requested: 9000,
            expected: 10000,
            missed_epochs: 3,
        };
        assert_eq!(err.kind(), ErrorKind::AccumulationMismatch);
        assert!(err.to_string().contains("3 missed epochs"));
    }

    #[test]
    fn test_error_display() {
        let err = CovenantError::authorization("signer is not the payee");
        assert_eq!(err.to_string(), "authorization failed: signer is not the payee");
        assert_eq!(
            CovenantError::Revoked.to_string(),
            "contract instance has been revoked"
        );
    }
}
