//! Exchange events
//!
//! Events are immutable records appended by successful operations. A failed
//! operation appends nothing. Downstream consumers rebuild balances and book
//! views from this log, so variant and field names are part of the surface.

use serde::{Deserialize, Serialize};
use types::ids::{Address, OrderKey, Symbol};
use types::numeric::{Amount, Price, Volume};
use types::order::Side;

/// Every event the exchange emits
///
/// Externally tagged so `u128` fields survive a JSON round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    /// A token became tradeable
    TokenRegistered { symbol: Symbol, token: Address },

    EtherDeposited { account: Address, amount: Amount },
    EtherWithdrawn { account: Address, amount: Amount },
    TokenDeposited { symbol: Symbol, account: Address, amount: Amount },
    TokenWithdrawn { symbol: Symbol, account: Address, amount: Amount },

    /// A buy remainder came to rest
    LimitBuyOrderCreated {
        symbol: Symbol,
        order_key: OrderKey,
        owner: Address,
        price: Price,
        volume: Volume,
    },
    /// A sell remainder came to rest
    LimitSellOrderCreated {
        symbol: Symbol,
        order_key: OrderKey,
        owner: Address,
        price: Price,
        volume: Volume,
    },

    /// An incoming buy filled completely; `price` is the taker's limit
    BuyOrderFulfilled {
        symbol: Symbol,
        taker: Address,
        price: Price,
        volume: Volume,
    },
    /// An incoming sell filled completely; `price` is the taker's limit
    SellOrderFulfilled {
        symbol: Symbol,
        taker: Address,
        price: Price,
        volume: Volume,
    },

    /// `volume` is the remaining volume released by the cancel
    BuyOrderCanceled {
        symbol: Symbol,
        order_key: OrderKey,
        owner: Address,
        price: Price,
        volume: Volume,
    },
    SellOrderCanceled {
        symbol: Symbol,
        order_key: OrderKey,
        owner: Address,
        price: Price,
        volume: Volume,
    },

    /// One fill against a resting order, at the maker's price.
    ///
    /// Only emitted when fill events are enabled in the config.
    OrderMatched {
        symbol: Symbol,
        maker_key: OrderKey,
        maker: Address,
        taker: Address,
        taker_side: Side,
        price: Price,
        volume: Volume,
    },
}

impl ExchangeEvent {
    /// Variant name, as written in the log
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeEvent::TokenRegistered { .. } => "TokenRegistered",
            ExchangeEvent::EtherDeposited { .. } => "EtherDeposited",
            ExchangeEvent::EtherWithdrawn { .. } => "EtherWithdrawn",
            ExchangeEvent::TokenDeposited { .. } => "TokenDeposited",
            ExchangeEvent::TokenWithdrawn { .. } => "TokenWithdrawn",
            ExchangeEvent::LimitBuyOrderCreated { .. } => "LimitBuyOrderCreated",
            ExchangeEvent::LimitSellOrderCreated { .. } => "LimitSellOrderCreated",
            ExchangeEvent::BuyOrderFulfilled { .. } => "BuyOrderFulfilled",
            ExchangeEvent::SellOrderFulfilled { .. } => "SellOrderFulfilled",
            ExchangeEvent::BuyOrderCanceled { .. } => "BuyOrderCanceled",
            ExchangeEvent::SellOrderCanceled { .. } => "SellOrderCanceled",
            ExchangeEvent::OrderMatched { .. } => "OrderMatched",
        }
    }

    /// Whether this is the single outcome event of a buy or sell
    pub fn is_submission_outcome(&self) -> bool {
        matches!(
            self,
            ExchangeEvent::LimitBuyOrderCreated { .. }
                | ExchangeEvent::LimitSellOrderCreated { .. }
                | ExchangeEvent::BuyOrderFulfilled { .. }
                | ExchangeEvent::SellOrderFulfilled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> Symbol {
        Symbol::try_new("FIXED").unwrap()
    }

    #[test]
    fn test_event_serialization_keeps_u128() {
        let event = ExchangeEvent::TokenDeposited {
            symbol: fixed(),
            account: Address::new("alice"),
            amount: u128::MAX,
        };
        let json = serde_json::to_string(&event).unwrap();
        let deser: ExchangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_tagged_by_name() {
        let event = ExchangeEvent::BuyOrderFulfilled {
            symbol: fixed(),
            taker: Address::new("bob"),
            price: Price::new(3000),
            volume: Volume::new(5),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get(event.name()).is_some());
        assert_eq!(json[event.name()]["price"], 3000);
    }

    #[test]
    fn test_submission_outcome() {
        let created = ExchangeEvent::LimitSellOrderCreated {
            symbol: fixed(),
            order_key: OrderKey::from_bytes([1; 32]),
            owner: Address::new("alice"),
            price: Price::new(2000),
            volume: Volume::new(5),
        };
        let deposit = ExchangeEvent::EtherDeposited {
            account: Address::new("alice"),
            amount: 1,
        };
        assert!(created.is_submission_outcome());
        assert!(!deposit.is_submission_outcome());
    }
}
