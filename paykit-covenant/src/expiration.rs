//! Spend-path cutoff.
//!
//! Once a request lands past the configured height the payee path is closed
//! for good. Revocation never consults this gate.

use crate::contract::ContractParameters;
use crate::{CovenantError, Result};

/// Whether spending is closed at `request_time`.
pub fn is_expired(params: &ContractParameters, request_time: u32) -> bool {
    params
        .expiration
        .is_some_and(|height| request_time > height)
}

/// Reject the spend path after the expiration height.
pub fn check_spend_window(params: &ContractParameters, request_time: u32) -> Result<()> {
    if let Some(height) = params.expiration {
        if request_time > height {
            return Err(CovenantError::timing(format!(
                "spend at {} after expiration height {}",
                request_time, height
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{PayeeIdentity, PayerIdentity, PublicKey};
    use crate::{Amount, ErrorKind};

    fn params() -> ContractParameters {
        ContractParameters::new(
            PayerIdentity::Key(PublicKey([1u8; 32])),
            PayeeIdentity::Key(PublicKey([2u8; 32])),
            10,
            Amount::from_sats(3000),
        )
    }

    #[test]
    fn test_no_deadline_never_expires() {
        let p = params();
        assert!(!is_expired(&p, u32::MAX));
        assert!(check_spend_window(&p, u32::MAX).is_ok());
    }

    #[test]
    fn test_deadline_height_itself_is_still_open() {
        let p = params().with_expiration(500);
        assert!(check_spend_window(&p, 499).is_ok());
        assert!(check_spend_window(&p, 500).is_ok());
        let err = check_spend_window(&p, 501).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timing);
    }

    #[test]
    fn test_gate_never_reopens() {
        let p = params().with_expiration(500);
        for t in [501, 600, 10_000, u32::MAX] {
            assert!(is_expired(&p, t));
        }
    }
}
