//! Order lifecycle types
//!
//! A resting order occupies one slot of its book for the lifetime of the
//! book. Filling or cancelling it never removes the slot; it zeroes the
//! remaining volume and records why the slot went dead.

use crate::ids::{Address, OrderKey};
use crate::numeric::{Price, Volume};
use serde::{Deserialize, Serialize};

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy tokens, pay ether
    Buy,
    /// Sell tokens, receive ether
    Sell,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }

    /// Map the `is_sell` flag used by the cancellation surface
    pub fn from_is_sell(is_sell: bool) -> Self {
        if is_sell {
            Side::Sell
        } else {
            Side::Buy
        }
    }

    /// Stable byte tag, used when hashing
    pub fn tag(&self) -> u8 {
        match self {
            Side::Buy => 0,
            Side::Sell => 1,
        }
    }
}

/// Liveness of a book slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotState {
    /// Resting with nonzero remaining volume
    Live,
    /// Tombstoned: fully consumed by fills
    Filled,
    /// Tombstoned: cancelled by its owner
    Cancelled,
}

impl SlotState {
    pub fn is_tombstone(&self) -> bool {
        !matches!(self, SlotState::Live)
    }

    pub fn tag(&self) -> u8 {
        match self {
            SlotState::Live => 0,
            SlotState::Filled => 1,
            SlotState::Cancelled => 2,
        }
    }
}

/// A limit order resting in a book slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub key: OrderKey,
    pub owner: Address,
    pub side: Side,
    pub price: Price,
    /// Volume at the moment the order came to rest
    pub original_volume: Volume,
    pub remaining_volume: Volume,
    /// Volume consumed by fills; a cancel does not count
    pub filled: Volume,
    /// Monotonic insertion sequence, the time-priority tie-break
    pub sequence: u64,
    pub state: SlotState,
}

impl Order {
    /// Create a live order
    pub fn new(
        key: OrderKey,
        owner: Address,
        side: Side,
        price: Price,
        volume: Volume,
        sequence: u64,
    ) -> Self {
        Self {
            key,
            owner,
            side,
            price,
            original_volume: volume,
            remaining_volume: volume,
            filled: Volume::ZERO,
            sequence,
            state: SlotState::Live,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.state.is_tombstone()
    }

    /// Volume filled so far
    pub fn filled_volume(&self) -> Volume {
        self.filled
    }

    /// Consume `volume` from the remaining volume.
    ///
    /// Tombstones the slot as `Filled` when nothing remains. Returns `false`
    /// and leaves the order untouched if the order is not live or `volume`
    /// exceeds what remains.
    pub fn apply_fill(&mut self, volume: Volume) -> bool {
        if !self.is_live() {
            return false;
        }
        let Some(remaining) = self.remaining_volume.checked_sub(volume) else {
            return false;
        };
        let Some(filled) = self.filled.checked_add(volume) else {
            return false;
        };
        self.remaining_volume = remaining;
        self.filled = filled;
        if remaining.is_zero() {
            self.state = SlotState::Filled;
        }
        true
    }

    /// Tombstone the slot as `Cancelled`, returning the freed volume.
    ///
    /// Returns `None` if the slot is already a tombstone.
    pub fn cancel(&mut self) -> Option<Volume> {
        if !self.is_live() {
            return None;
        }
        let freed = self.remaining_volume;
        self.remaining_volume = Volume::ZERO;
        self.state = SlotState::Cancelled;
        Some(freed)
    }
}

/// Outcome of a buy or sell submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    /// The submission was fully matched and nothing rests
    pub filled: bool,
    /// Key of the resting remainder, if any
    pub order_key: Option<OrderKey>,
}

impl OrderResult {
    pub fn fulfilled() -> Self {
        Self {
            filled: true,
            order_key: None,
        }
    }

    pub fn resting(order_key: OrderKey) -> Self {
        Self {
            filled: false,
            order_key: Some(order_key),
        }
    }
}
