//! Custody, Settlement & Order Entry
//!
//! This crate implements the custodial layer of the exchange: balances held
//! on behalf of accounts, the token registry, order submission and
//! settlement against the books, and the public `Exchange` surface.
//!
//! # Modules
//! - `exchange`: Public operation surface owning all state
//! - `engine`: Validate, reserve, match, settle and rest orders
//! - `ledger`: Available/reserved balances with staged, checked batches
//! - `registry`: Symbol to token contract handles
//! - `token`: External transfer capabilities and in-memory implementations
//! - `events`: Event log records
//! - `errors`: Transfer capability errors
//! - `security`: Owner access control
//! - `config`: Exchange configuration
//! - `commitment`: State root over ledger, registry and books
//!
//! Every public operation is all-or-nothing: an error leaves balances,
//! books and the event log exactly as they were.

pub mod commitment;
pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod exchange;
pub mod ledger;
pub mod registry;
pub mod security;
pub mod token;

pub use config::ExchangeConfig;
pub use events::ExchangeEvent;
pub use exchange::Exchange;
pub use ledger::{Asset, Balance, Ledger};
pub use token::{EtherTransfer, EtherWallet, FixedSupplyToken, TokenContract, TokenHandle};
