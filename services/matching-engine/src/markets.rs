//! All token markets plus the global insertion sequencer
//!
//! Markets are kept in a `BTreeMap` so iteration order (and anything hashed
//! from it) is identical on every replica.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;
use types::errors::ExchangeError;
use types::ids::{Address, OrderKey, Symbol};
use types::numeric::{Price, Volume};
use types::order::{Order, Side};

use crate::book::MarketBook;

/// Derive the key of a resting order.
///
/// SHA-256 over the symbol, side, insertion sequence and owner. The
/// sequence is unique per engine, so keys never collide in practice.
pub fn derive_order_key(symbol: &Symbol, side: Side, sequence: u64, owner: &Address) -> OrderKey {
    let mut hasher = Sha256::new();
    hasher.update(symbol.as_str().as_bytes());
    hasher.update([0u8, side.tag()]);
    hasher.update(sequence.to_be_bytes());
    hasher.update(owner.as_str().as_bytes());
    OrderKey::from_bytes(hasher.finalize().into())
}

/// Books for every registered token
#[derive(Debug, Clone)]
pub struct Markets {
    markets: BTreeMap<Symbol, MarketBook>,
    /// Sequence the next resting order receives
    next_sequence: u64,
}

impl Markets {
    pub fn new(starting_sequence: u64) -> Self {
        Self {
            markets: BTreeMap::new(),
            next_sequence: starting_sequence,
        }
    }

    /// Create an empty market for `symbol` if none exists
    pub fn open(&mut self, symbol: &Symbol) {
        if !self.markets.contains_key(symbol) {
            self.markets
                .insert(symbol.clone(), MarketBook::new(symbol.clone()));
            debug!(symbol = %symbol, "Market opened");
        }
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&MarketBook> {
        self.markets.get(symbol)
    }

    pub fn get_mut(&mut self, symbol: &Symbol) -> Option<&mut MarketBook> {
        self.markets.get_mut(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &MarketBook)> {
        self.markets.iter()
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Key the next resting order would receive, without resting anything.
    ///
    /// Fails exactly when [`Markets::rest`] would fail for a nonzero volume,
    /// so callers can check before staging balance changes.
    pub fn next_order_key(
        &self,
        symbol: &Symbol,
        owner: &Address,
        side: Side,
    ) -> Result<OrderKey, ExchangeError> {
        let market = self
            .markets
            .get(symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })?;
        self.next_sequence
            .checked_add(1)
            .ok_or_else(|| ExchangeError::arithmetic("order sequence"))?;

        let key = derive_order_key(symbol, side, self.next_sequence, owner);
        if market.index().contains(&key) {
            return Err(ExchangeError::invalid_order(format!(
                "order key {key} already resting"
            )));
        }
        Ok(key)
    }

    /// Rest the remainder of an incoming order in its own book.
    ///
    /// Assigns the next insertion sequence and derives the order key. The
    /// sequencer only advances once the order is placed.
    pub fn rest(
        &mut self,
        symbol: &Symbol,
        owner: &Address,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<(OrderKey, usize), ExchangeError> {
        let sequence = self.next_sequence;
        let following = sequence
            .checked_add(1)
            .ok_or_else(|| ExchangeError::arithmetic("order sequence"))?;

        let market = self
            .markets
            .get_mut(symbol)
            .ok_or_else(|| ExchangeError::UnknownToken {
                symbol: symbol.to_string(),
            })?;

        let key = derive_order_key(symbol, side, sequence, owner);
        let order = Order::new(key, owner.clone(), side, price, volume, sequence);
        let slot = market.place(order)?;

        self.next_sequence = following;
        Ok((key, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> Symbol {
        Symbol::try_new("FIXED").unwrap()
    }

    #[test]
    fn test_order_key_deterministic() {
        let owner = Address::new("alice");
        let a = derive_order_key(&fixed(), Side::Buy, 7, &owner);
        let b = derive_order_key(&fixed(), Side::Buy, 7, &owner);
        assert_eq!(a, b);
    }

    #[test]
    fn test_order_key_varies_with_inputs() {
        let owner = Address::new("alice");
        let base = derive_order_key(&fixed(), Side::Buy, 7, &owner);
        assert_ne!(base, derive_order_key(&fixed(), Side::Sell, 7, &owner));
        assert_ne!(base, derive_order_key(&fixed(), Side::Buy, 8, &owner));
        assert_ne!(base, derive_order_key(&fixed(), Side::Buy, 7, &Address::new("bob")));
    }

    #[test]
    fn test_rest_advances_sequence() {
        let mut markets = Markets::new(1);
        markets.open(&fixed());
        let owner = Address::new("alice");

        let (key1, slot1) = markets
            .rest(&fixed(), &owner, Side::Buy, Price::new(2000), Volume::new(5))
            .unwrap();
        let (key2, slot2) = markets
            .rest(&fixed(), &owner, Side::Buy, Price::new(2000), Volume::new(5))
            .unwrap();

        assert_ne!(key1, key2);
        assert_eq!((slot1, slot2), (0, 1));
        assert_eq!(markets.next_sequence(), 3);

        let market = markets.get(&fixed()).unwrap();
        assert_eq!(market.order(&key2).unwrap().sequence, 2);
    }

    #[test]
    fn test_rest_unknown_market() {
        let mut markets = Markets::new(1);
        let result = markets.rest(
            &fixed(),
            &Address::new("alice"),
            Side::Sell,
            Price::new(2000),
            Volume::new(5),
        );
        assert!(matches!(result, Err(ExchangeError::UnknownToken { .. })));
        assert_eq!(markets.next_sequence(), 1);
    }

    #[test]
    fn test_next_order_key_matches_rest() {
        let mut markets = Markets::new(1);
        markets.open(&fixed());
        let owner = Address::new("alice");

        let predicted = markets.next_order_key(&fixed(), &owner, Side::Sell).unwrap();
        let (key, _) = markets
            .rest(&fixed(), &owner, Side::Sell, Price::new(2000), Volume::new(1))
            .unwrap();
        assert_eq!(predicted, key);
    }

    #[test]
    fn test_next_order_key_sequence_exhausted() {
        let mut markets = Markets::new(u64::MAX);
        markets.open(&fixed());
        let result = markets.next_order_key(&fixed(), &Address::new("alice"), Side::Buy);
        assert!(matches!(result, Err(ExchangeError::Arithmetic { .. })));
    }

    #[test]
    fn test_open_is_idempotent() {
        let mut markets = Markets::new(1);
        markets.open(&fixed());
        markets
            .rest(&fixed(), &Address::new("alice"), Side::Sell, Price::new(1), Volume::new(1))
            .unwrap();
        markets.open(&fixed());
        assert_eq!(markets.get(&fixed()).unwrap().book(Side::Sell).len(), 1);
    }
}
