//! Exchange configuration

use serde::{Deserialize, Serialize};
use types::errors::ExchangeError;
use types::ids::Address;

/// Configuration for the exchange.
///
/// Every field has a default, so a partial JSON document is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Owner allowed to register tokens.
    pub admin: Address,
    /// The exchange's own address: spender and recipient of token pulls,
    /// sender of token pushes.
    pub custody_address: Address,
    /// Insertion sequence given to the first resting order.
    pub starting_sequence: u64,
    /// Emit an `OrderMatched` event for every fill ahead of the outcome event.
    pub emit_fill_events: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            admin: Address::new("owner"),
            custody_address: Address::new("exchange"),
            starting_sequence: 1,
            emit_fill_events: false,
        }
    }
}

impl ExchangeConfig {
    /// Parse a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self, ExchangeError> {
        serde_json::from_str(json).map_err(|e| ExchangeError::InvalidConfig {
            reason: e.to_string(),
        })
    }
}
