//! Both sides of one token's book plus the key index

use tracing::debug;
use types::errors::ExchangeError;
use types::ids::{OrderKey, Symbol};
use types::numeric::{Price, Volume};
use types::order::{Order, Side, SlotState};

use super::order_book::OrderBook;
use crate::matching::executor::{self, MatchPlan};
use super::order_index::{OrderIndex, SlotRef};

/// Order books for a single token
#[derive(Debug, Clone)]
pub struct MarketBook {
    symbol: Symbol,
    buys: OrderBook,
    sells: OrderBook,
    index: OrderIndex,
}

impl MarketBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            buys: OrderBook::new(Side::Buy),
            sells: OrderBook::new(Side::Sell),
            index: OrderIndex::new(),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn book(&self, side: Side) -> &OrderBook {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    pub(crate) fn book_mut(&mut self, side: Side) -> &mut OrderBook {
        match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        }
    }

    pub fn index(&self) -> &OrderIndex {
        &self.index
    }

    /// Rest an order at the end of its side and index its key
    pub fn place(&mut self, order: Order) -> Result<usize, ExchangeError> {
        if self.index.contains(&order.key) {
            return Err(ExchangeError::invalid_order(format!(
                "order key {} already resting",
                order.key
            )));
        }
        if !order.is_live() || order.remaining_volume.is_zero() {
            return Err(ExchangeError::invalid_order("cannot rest an empty order"));
        }

        let key = order.key;
        let side = order.side;
        let slot = self.book_mut(side).push(order);
        self.index.insert(key, SlotRef { side, slot });

        debug!(symbol = %self.symbol, ?side, slot, key = %key, "Order resting");
        Ok(slot)
    }

    /// Apply a fill plan computed against the `resting_side` book
    pub fn apply_plan(&mut self, resting_side: Side, plan: &MatchPlan) -> Result<(), ExchangeError> {
        executor::apply_plan(self.book_mut(resting_side), plan)
    }

    /// Look up an order by key
    pub fn order(&self, key: &OrderKey) -> Option<&Order> {
        let slot = self.index.get(key)?;
        self.book(slot.side).get(slot.slot)
    }

    /// Validate a cancellation without mutating anything.
    ///
    /// The key must be indexed on `side` at `price`. Fails with
    /// `OrderAlreadyFilled` if the slot was consumed by fills and with
    /// `UnknownOrder` for anything else, including a second cancel.
    pub fn check_cancel(
        &self,
        key: &OrderKey,
        side: Side,
        price: Price,
    ) -> Result<(SlotRef, &Order), ExchangeError> {
        let unknown = || ExchangeError::UnknownOrder {
            key: key.to_string(),
        };

        let slot = self.index.get(key).ok_or_else(unknown)?;
        if slot.side != side {
            return Err(unknown());
        }
        let order = self.book(side).get(slot.slot).ok_or_else(unknown)?;
        if order.price != price {
            return Err(unknown());
        }

        match order.state {
            SlotState::Live => Ok((slot, order)),
            SlotState::Filled => Err(ExchangeError::OrderAlreadyFilled {
                key: key.to_string(),
            }),
            SlotState::Cancelled => Err(unknown()),
        }
    }

    /// Tombstone an order, returning its previous remaining volume
    pub fn cancel(
        &mut self,
        key: &OrderKey,
        side: Side,
        price: Price,
    ) -> Result<Volume, ExchangeError> {
        let (slot, _) = self.check_cancel(key, side, price)?;
        let freed = self
            .book_mut(side)
            .get_mut(slot.slot)
            .and_then(Order::cancel)
            .ok_or_else(|| ExchangeError::UnknownOrder {
                key: key.to_string(),
            })?;

        debug!(symbol = %self.symbol, ?side, slot = slot.slot, key = %key, freed = %freed, "Order cancelled");
        Ok(freed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::Address;

    fn market() -> MarketBook {
        MarketBook::new(Symbol::try_new("FIXED").unwrap())
    }

    fn order(key: u8, side: Side, price: u128, volume: u128) -> Order {
        Order::new(
            OrderKey::from_bytes([key; 32]),
            Address::new("alice"),
            side,
            Price::new(price),
            Volume::new(volume),
            key as u64,
        )
    }

    #[test]
    fn test_place_indexes_slot() {
        let mut market = market();
        let slot = market.place(order(1, Side::Buy, 2000, 5)).unwrap();

        assert_eq!(slot, 0);
        assert_eq!(market.book(Side::Buy).len(), 1);
        assert!(market.book(Side::Sell).is_empty());
        assert_eq!(
            market.index().get(&OrderKey::from_bytes([1; 32])),
            Some(SlotRef { side: Side::Buy, slot: 0 })
        );
    }

    #[test]
    fn test_place_duplicate_key_rejected() {
        let mut market = market();
        market.place(order(1, Side::Buy, 2000, 5)).unwrap();
        let result = market.place(order(1, Side::Buy, 2000, 5));
        assert!(matches!(result, Err(ExchangeError::InvalidOrder { .. })));
        assert_eq!(market.book(Side::Buy).len(), 1);
    }

    #[test]
    fn test_cancel_returns_freed_volume() {
        let mut market = market();
        market.place(order(1, Side::Sell, 3000, 5)).unwrap();
        let key = OrderKey::from_bytes([1; 32]);

        let freed = market.cancel(&key, Side::Sell, Price::new(3000)).unwrap();
        assert_eq!(freed, Volume::new(5));

        let snapshot = market.book(Side::Sell).snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.volumes[0], Volume::ZERO);
    }

    #[test]
    fn test_cancel_twice_unknown() {
        let mut market = market();
        market.place(order(1, Side::Buy, 2200, 5)).unwrap();
        let key = OrderKey::from_bytes([1; 32]);

        market.cancel(&key, Side::Buy, Price::new(2200)).unwrap();
        let second = market.cancel(&key, Side::Buy, Price::new(2200));
        assert!(matches!(second, Err(ExchangeError::UnknownOrder { .. })));
    }

    #[test]
    fn test_cancel_filled_order() {
        let mut market = market();
        market.place(order(1, Side::Buy, 2200, 5)).unwrap();
        market.book_mut(Side::Buy).get_mut(0).unwrap().apply_fill(Volume::new(5));
        let key = OrderKey::from_bytes([1; 32]);

        let result = market.cancel(&key, Side::Buy, Price::new(2200));
        assert!(matches!(result, Err(ExchangeError::OrderAlreadyFilled { .. })));
    }

    #[test]
    fn test_apply_plan_on_resting_side() {
        let mut market = market();
        market.place(order(1, Side::Sell, 2000, 5)).unwrap();
        let plan = crate::matching::plan_match(
            market.book(Side::Sell),
            &Address::new("bob"),
            Price::new(2500),
            Volume::new(3),
        );

        market.apply_plan(Side::Sell, &plan).unwrap();
        let resting = market.order(&OrderKey::from_bytes([1; 32])).unwrap();
        assert_eq!(resting.remaining_volume, Volume::new(2));
        assert_eq!(resting.filled_volume(), Volume::new(3));
    }

    #[test]
    fn test_cancel_wrong_side_or_price() {
        let mut market = market();
        market.place(order(1, Side::Buy, 2200, 5)).unwrap();
        let key = OrderKey::from_bytes([1; 32]);

        assert!(matches!(
            market.cancel(&key, Side::Sell, Price::new(2200)),
            Err(ExchangeError::UnknownOrder { .. })
        ));
        assert!(matches!(
            market.cancel(&key, Side::Buy, Price::new(2000)),
            Err(ExchangeError::UnknownOrder { .. })
        ));
        assert!(market.order(&key).unwrap().is_live());
    }
}
