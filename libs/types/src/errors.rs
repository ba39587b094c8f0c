//! Error types for the exchange core
//!
//! Comprehensive error taxonomy using thiserror. Every public operation
//! fails with exactly one of these and leaves no state behind.

use thiserror::Error;

/// Top-level exchange error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Invalid token symbol: {symbol:?}")]
    InvalidSymbol { symbol: String },

    #[error("Unknown token: {symbol}")]
    UnknownToken { symbol: String },

    #[error("Token already registered: {symbol}")]
    DuplicateSymbol { symbol: String },

    #[error("Insufficient balance for {asset}: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: String,
        available: String,
    },

    #[error("Arithmetic overflow or underflow in {context}")]
    Arithmetic { context: String },

    #[error("Unknown order: {key}")]
    UnknownOrder { key: String },

    #[error("Order already filled: {key}")]
    OrderAlreadyFilled { key: String },

    #[error("Token transfer not authorized: {reason}")]
    TransferAuthorization { reason: String },

    #[error("Outgoing transfer failed: {reason}")]
    TransferFailed { reason: String },

    #[error("Unauthorized caller: {caller}")]
    Unauthorized { caller: String },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl ExchangeError {
    pub fn invalid_order(reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            reason: reason.into(),
        }
    }

    pub fn arithmetic(context: impl Into<String>) -> Self {
        Self::Arithmetic {
            context: context.into(),
        }
    }

    pub fn insufficient(asset: impl ToString, required: u128, available: u128) -> Self {
        Self::InsufficientBalance {
            asset: asset.to_string(),
            required: required.to_string(),
            available: available.to_string(),
        }
    }
}
