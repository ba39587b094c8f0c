//! Order book infrastructure module
//!
//! Contains the per-side slot arena, the key index, and the per-token
//! market that ties both sides together.

pub mod order_book;
pub mod order_index;
pub mod market;

pub use order_book::{BookSnapshot, OrderBook};
pub use order_index::{OrderIndex, SlotRef};
pub use market::MarketBook;
