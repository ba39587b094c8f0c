//! Errors raised by external transfer capabilities
//!
//! Token contracts and the ether rail report failures with `TransferError`.
//! The exchange maps them onto its own taxonomy depending on direction:
//! a failed pull is a `TransferAuthorization` error, a failed push is
//! `TransferFailed`.

use thiserror::Error;
use types::errors::ExchangeError;

/// Failure reported by a token contract or ether rail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Allowance too low: required {required}, approved {approved}")]
    InsufficientAllowance { required: u128, approved: u128 },

    #[error("Holder balance too low: required {required}, available {available}")]
    InsufficientFunds { required: u128, available: u128 },

    #[error("Recipient balance would overflow")]
    Overflow,

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

impl TransferError {
    /// Map a failed pull (deposit) into the exchange taxonomy
    pub fn into_authorization(self) -> ExchangeError {
        ExchangeError::TransferAuthorization {
            reason: self.to_string(),
        }
    }

    /// Map a failed push (withdrawal) into the exchange taxonomy
    pub fn into_failed(self) -> ExchangeError {
        ExchangeError::TransferFailed {
            reason: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowance_error_display() {
        let err = TransferError::InsufficientAllowance {
            required: 500,
            approved: 100,
        };
        assert_eq!(err.to_string(), "Allowance too low: required 500, approved 100");
    }

    #[test]
    fn test_pull_failure_maps_to_authorization() {
        let err = TransferError::InsufficientAllowance {
            required: 500,
            approved: 0,
        };
        assert!(matches!(
            err.into_authorization(),
            ExchangeError::TransferAuthorization { .. }
        ));
    }

    #[test]
    fn test_push_failure_maps_to_failed() {
        let err = TransferError::Rejected {
            reason: "recipient refused".to_string(),
        };
        let mapped = err.into_failed();
        assert!(mapped.to_string().contains("recipient refused"));
    }
}
