//! One side of a token's order book
//!
//! Slots are kept in insertion order and never removed. A filled or
//! cancelled order stays at its index with zero remaining volume, so an
//! index handed out once keeps pointing at the same order. Price priority
//! is computed at match time by scanning the slots.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::numeric::{Price, Volume};
use types::order::{Order, Side};

use crate::matching::crossing;

/// Parallel price/volume sequences over every slot, tombstones included
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub prices: Vec<Price>,
    pub volumes: Vec<Volume>,
}

impl BookSnapshot {
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// True when every slot is a tombstone (or there are no slots)
    pub fn has_no_live_volume(&self) -> bool {
        self.volumes.iter().all(|v| v.is_zero())
    }
}

/// Slot arena for one side (buy or sell) of one token
#[derive(Debug, Clone)]
pub struct OrderBook {
    side: Side,
    slots: Vec<Order>,
}

impl OrderBook {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            slots: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Append an order; returns its slot index
    pub(crate) fn push(&mut self, order: Order) -> usize {
        self.slots.push(order);
        self.slots.len() - 1
    }

    pub fn get(&self, slot: usize) -> Option<&Order> {
        self.slots.get(slot)
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut Order> {
        self.slots.get_mut(slot)
    }

    /// Slot count, tombstones included
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots still resting with volume
    pub fn live_len(&self) -> usize {
        self.slots.iter().filter(|o| o.is_live()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.slots.iter()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            prices: self.slots.iter().map(|o| o.price).collect(),
            volumes: self.slots.iter().map(|o| o.remaining_volume).collect(),
        }
    }

    /// Live volume aggregated per price level, best price first
    pub fn depth(&self) -> Vec<(Price, Volume)> {
        let mut levels: BTreeMap<Price, u128> = BTreeMap::new();
        for order in self.slots.iter().filter(|o| o.is_live()) {
            let level = levels.entry(order.price).or_insert(0);
            *level = level.saturating_add(order.remaining_volume.get());
        }

        let levels = levels.into_iter().map(|(p, v)| (p, Volume::new(v)));
        match self.side {
            Side::Buy => levels.rev().collect(),
            Side::Sell => levels.collect(),
        }
    }

    /// Best resting price: highest bid or lowest ask
    pub fn best_price(&self) -> Option<Price> {
        let live = self.slots.iter().filter(|o| o.is_live()).map(|o| o.price);
        match self.side {
            Side::Buy => live.max(),
            Side::Sell => live.min(),
        }
    }

    /// Slots an incoming order at `incoming_price` may fill against, in
    /// priority order: best price first, then oldest insertion first.
    pub fn crossing_slots(&self, incoming_price: Price) -> Vec<usize> {
        let incoming_side = self.side.opposite();
        let mut candidates: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, o)| {
                o.is_live() && crossing::incoming_can_match(incoming_side, incoming_price, o.price)
            })
            .map(|(slot, _)| slot)
            .collect();

        let slots = &self.slots;
        match self.side {
            Side::Sell => {
                candidates.sort_by_key(|&i| (slots[i].price, slots[i].sequence));
            }
            Side::Buy => {
                candidates.sort_by_key(|&i| (std::cmp::Reverse(slots[i].price), slots[i].sequence));
            }
        }
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::ids::{Address, OrderKey};

    fn order(side: Side, price: u128, volume: u128, sequence: u64) -> Order {
        Order::new(
            OrderKey::from_bytes([sequence as u8; 32]),
            Address::new("maker"),
            side,
            Price::new(price),
            Volume::new(volume),
            sequence,
        )
    }

    #[test]
    fn test_push_keeps_insertion_order() {
        let mut book = OrderBook::new(Side::Buy);
        book.push(order(Side::Buy, 1000, 5, 1));
        book.push(order(Side::Buy, 2000, 5, 2));
        book.push(order(Side::Buy, 1400, 5, 3));

        let snapshot = book.snapshot();
        assert_eq!(
            snapshot.prices,
            vec![Price::new(1000), Price::new(2000), Price::new(1400)]
        );
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn test_tombstone_stays_in_snapshot() {
        let mut book = OrderBook::new(Side::Buy);
        book.push(order(Side::Buy, 1000, 5, 1));
        let slot = book.push(order(Side::Buy, 2200, 5, 2));
        book.get_mut(slot).unwrap().cancel();

        let snapshot = book.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.volumes[1], Volume::ZERO);
        assert_eq!(book.live_len(), 1);
    }

    #[test]
    fn test_sell_priority_lowest_price_then_oldest() {
        let mut book = OrderBook::new(Side::Sell);
        book.push(order(Side::Sell, 3000, 1, 1));
        book.push(order(Side::Sell, 2000, 1, 2));
        book.push(order(Side::Sell, 2000, 1, 3));
        book.push(order(Side::Sell, 6000, 1, 4));

        // A buy at 3000 crosses the first three only
        assert_eq!(book.crossing_slots(Price::new(3000)), vec![1, 2, 0]);
    }

    #[test]
    fn test_buy_priority_highest_price_then_oldest() {
        let mut book = OrderBook::new(Side::Buy);
        book.push(order(Side::Buy, 1000, 1, 1));
        book.push(order(Side::Buy, 2000, 1, 2));
        book.push(order(Side::Buy, 1400, 1, 3));
        book.push(order(Side::Buy, 2000, 1, 4));

        // A sell at 1200 crosses everything priced at or above 1200
        assert_eq!(book.crossing_slots(Price::new(1200)), vec![1, 3, 2]);
    }

    #[test]
    fn test_crossing_skips_tombstones() {
        let mut book = OrderBook::new(Side::Sell);
        book.push(order(Side::Sell, 2000, 1, 1));
        book.push(order(Side::Sell, 2000, 1, 2));
        book.get_mut(0).unwrap().cancel();

        assert_eq!(book.crossing_slots(Price::new(2000)), vec![1]);
    }

    #[test]
    fn test_depth_aggregates_live_levels() {
        let mut book = OrderBook::new(Side::Buy);
        book.push(order(Side::Buy, 1000, 5, 1));
        book.push(order(Side::Buy, 2000, 5, 2));
        book.push(order(Side::Buy, 1000, 3, 3));
        book.push(order(Side::Buy, 1400, 4, 4));
        book.get_mut(3).unwrap().cancel();

        assert_eq!(
            book.depth(),
            vec![
                (Price::new(2000), Volume::new(5)),
                (Price::new(1000), Volume::new(8)),
            ]
        );
        assert_eq!(book.best_price(), Some(Price::new(2000)));
    }

    #[test]
    fn test_best_price_empty_after_tombstones() {
        let mut book = OrderBook::new(Side::Sell);
        book.push(order(Side::Sell, 2000, 1, 1));
        book.get_mut(0).unwrap().apply_fill(Volume::new(1));

        assert_eq!(book.best_price(), None);
        assert!(book.depth().is_empty());
        assert!(book.snapshot().has_no_live_volume());
        assert!(!book.is_empty());
    }

    #[test]
    fn test_snapshot_json_keeps_tombstones() {
        let mut book = OrderBook::new(Side::Buy);
        book.push(order(Side::Buy, 1500, 2, 1));
        book.push(order(Side::Buy, 1600, 3, 2));
        book.get_mut(0).unwrap().apply_fill(Volume::new(2));

        let json = serde_json::to_string(&book.snapshot()).unwrap();
        let decoded: BookSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, book.snapshot());
        assert_eq!(decoded.volumes, vec![Volume::ZERO, Volume::new(3)]);
    }
}
