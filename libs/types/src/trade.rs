//! Fill records
//!
//! A fill is one maker/taker execution inside a single submission. It always
//! settles at the maker's resting price.

use crate::ids::{Address, OrderKey};
use crate::numeric::{Amount, Price, Volume};
use crate::order::Side;
use serde::{Deserialize, Serialize};

/// One execution between an incoming order and a resting order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Book slot of the resting order
    pub maker_slot: usize,
    pub maker_key: OrderKey,
    pub maker: Address,
    pub taker: Address,
    /// Side of the incoming (taker) order
    pub taker_side: Side,
    /// Settlement price: always the maker's price
    pub price: Price,
    pub volume: Volume,
}

impl Fill {
    /// Ether that changes hands for this fill, `None` on overflow
    pub fn notional(&self) -> Option<Amount> {
        self.price.checked_notional(self.volume)
    }

    pub fn is_self_match(&self) -> bool {
        self.maker == self.taker
    }
}
