//! Matching logic module
//!
//! Implements price-time priority fill planning

pub mod crossing;
pub mod executor;

pub use crossing::can_match;
pub use executor::{apply_plan, plan_match, MatchPlan};
