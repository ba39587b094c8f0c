//! Types library for the custodial exchange
//!
//! Core type definitions shared by the matching engine and the custody
//! contracts: identifiers, checked unsigned numerics, orders, fills and the
//! error taxonomy.
//!
//! # Modules
//! - `ids`: Identifiers (Address, Symbol, OrderKey)
//! - `numeric`: Unsigned integer types (Amount, Price, Volume)
//! - `order`: Order, slot liveness and submission results
//! - `trade`: Fill records
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod errors;
