//! Order key → book slot index
//!
//! Holds only non-owning references: the side and slot number where an
//! order lives. Slots are never removed or reordered, so an entry stays
//! valid for the lifetime of the book.

use std::collections::HashMap;
use types::ids::OrderKey;
use types::order::Side;

/// Location of an order within a market
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub side: Side,
    pub slot: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OrderIndex {
    entries: HashMap<OrderKey, SlotRef>,
}

impl OrderIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key. Returns `false` if the key is already present.
    pub fn insert(&mut self, key: OrderKey, slot: SlotRef) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, slot);
        true
    }

    pub fn get(&self, key: &OrderKey) -> Option<SlotRef> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, key: &OrderKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
