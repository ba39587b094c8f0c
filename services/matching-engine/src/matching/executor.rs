//! Fill planning and application
//!
//! Matching happens in two steps so a submission can stay all-or-nothing:
//! `plan_match` walks the opposite book read-only and lists the fills an
//! incoming order would produce, and `apply_plan` writes those fills into
//! the book once the caller has staged every balance change they imply.

use tracing::debug;
use types::errors::ExchangeError;
use types::ids::Address;
use types::numeric::{Price, Volume};
use types::trade::Fill;

use crate::book::OrderBook;

/// Fills an incoming order would produce against one book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPlan {
    pub fills: Vec<Fill>,
    /// Incoming volume left after every fill
    pub remaining: Volume,
}

impl MatchPlan {
    pub fn is_fully_filled(&self) -> bool {
        self.remaining.is_zero()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}

/// Plan the fills for an incoming order against the opposite-side `book`.
///
/// Each fill takes `min(incoming remaining, resting remaining)` at the
/// resting order's price, walking crossing slots best price first and
/// oldest first within a price. Stops when the incoming order is exhausted
/// or nothing else crosses.
pub fn plan_match(
    book: &OrderBook,
    taker: &Address,
    limit: Price,
    volume: Volume,
) -> MatchPlan {
    let taker_side = book.side().opposite();
    let mut remaining = volume;
    let mut fills = Vec::new();

    for slot in book.crossing_slots(limit) {
        if remaining.is_zero() {
            break;
        }
        let Some(resting) = book.get(slot) else {
            continue;
        };

        let fill_volume = remaining.min(resting.remaining_volume);
        remaining = Volume::new(remaining.get() - fill_volume.get());

        fills.push(Fill {
            maker_slot: slot,
            maker_key: resting.key,
            maker: resting.owner.clone(),
            taker: taker.clone(),
            taker_side,
            price: resting.price,
            volume: fill_volume,
        });
    }

    MatchPlan { fills, remaining }
}

/// Write a plan's fills into `book`, tombstoning consumed slots.
///
/// Every fill is checked against the current book before anything is
/// mutated, so the book is either fully updated or untouched.
pub fn apply_plan(book: &mut OrderBook, plan: &MatchPlan) -> Result<(), ExchangeError> {
    for fill in &plan.fills {
        let valid = book.get(fill.maker_slot).is_some_and(|o| {
            o.is_live() && o.key == fill.maker_key && o.remaining_volume >= fill.volume
        });
        if !valid {
            return Err(ExchangeError::UnknownOrder {
                key: fill.maker_key.to_string(),
            });
        }
    }

    for fill in &plan.fills {
        if let Some(order) = book.get_mut(fill.maker_slot) {
            order.apply_fill(fill.volume);
            debug!(
                side = ?fill.taker_side.opposite(),
                slot = fill.maker_slot,
                price = %fill.price,
                volume = %fill.volume,
                "Resting order filled"
            );
        }
    }
    Ok(())
}
