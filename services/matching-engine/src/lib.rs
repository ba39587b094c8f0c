//! Matching Engine Service
//!
//! Per-token limit order books and price-time priority fill planning.
//!
//! **Key Invariants:**
//! - Book slots are append-only; fills and cancels tombstone in place
//! - Price-time priority: best price first, oldest insertion first
//! - Fills settle at the resting (maker) price
//! - Deterministic: same inputs produce the same books, keys and plans
//!
//! This crate knows nothing about balances; the custody layer stages the
//! settlement of a [`MatchPlan`] before applying it.

pub mod book;
pub mod matching;
pub mod markets;

pub use book::{BookSnapshot, MarketBook, OrderBook, OrderIndex, SlotRef};
pub use markets::{derive_order_key, Markets};
pub use matching::{apply_plan, plan_match, MatchPlan};
