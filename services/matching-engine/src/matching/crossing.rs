//! Crossing detection logic
//!
//! Determines when an incoming order is price-compatible with a resting one

use types::numeric::Price;
use types::order::Side;

/// Check if a bid and ask can match at given prices
///
/// For a buy order to match with a sell order the buy price must be at
/// least the sell price.
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order can match against a resting order
pub fn incoming_can_match(incoming_side: Side, incoming_price: Price, resting_price: Price) -> bool {
    match incoming_side {
        Side::Buy => can_match(incoming_price, resting_price),
        Side::Sell => can_match(resting_price, incoming_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_match_crossing() {
        assert!(can_match(Price::new(3000), Price::new(2000)), "Bid >= ask should match");
    }

    #[test]
    fn test_can_match_exact() {
        let price = Price::new(2000);
        assert!(can_match(price, price), "Equal prices should match");
    }

    #[test]
    fn test_can_match_no_cross() {
        assert!(!can_match(Price::new(1000), Price::new(2000)), "Bid < ask should not match");
    }

    #[test]
    fn test_incoming_buy_can_match() {
        assert!(incoming_can_match(Side::Buy, Price::new(3000), Price::new(2000)));
        assert!(!incoming_can_match(Side::Buy, Price::new(1000), Price::new(2000)));
    }

    #[test]
    fn test_incoming_sell_can_match() {
        assert!(incoming_can_match(Side::Sell, Price::new(2000), Price::new(3000)));
        assert!(!incoming_can_match(Side::Sell, Price::new(6000), Price::new(3000)));
    }
}
