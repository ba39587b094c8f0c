//! Unsigned integer amounts, prices and volumes
//!
//! Balances are denominated in the smallest unit of each asset (wei for
//! ether). Prices are ether smallest-units per whole token unit. All
//! arithmetic on these types is checked; nothing wraps or saturates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Balance amount in an asset's smallest unit
pub type Amount = u128;

/// Limit price: settlement-asset smallest units per token unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(u128);

impl Price {
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Ether value of `volume` token units at this price, `None` on overflow
    pub fn checked_notional(self, volume: Volume) -> Option<Amount> {
        self.0.checked_mul(volume.get())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Price {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

/// Order volume in token units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Volume(u128);

impl Volume {
    pub const ZERO: Volume = Volume(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Volume) -> Option<Volume> {
        self.0.checked_add(other.0).map(Volume)
    }

    pub fn checked_sub(self, other: Volume) -> Option<Volume> {
        self.0.checked_sub(other.0).map(Volume)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Volume {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notional() {
        let price = Price::new(2000);
        assert_eq!(price.checked_notional(Volume::new(5)), Some(10_000));
    }

    #[test]
    fn test_notional_overflow() {
        let price = Price::new(u128::MAX / 2 + 1);
        assert_eq!(price.checked_notional(Volume::new(2)), None);
    }

    #[test]
    fn test_volume_checked_sub_underflow() {
        assert_eq!(Volume::new(3).checked_sub(Volume::new(5)), None);
        assert_eq!(Volume::new(5).checked_sub(Volume::new(3)), Some(Volume::new(2)));
    }

    #[test]
    fn test_transparent_serialization() {
        let json = serde_json::to_string(&Price::new(42)).unwrap();
        assert_eq!(json, "42");
        let volume: Volume = serde_json::from_str("7").unwrap();
        assert_eq!(volume, Volume::new(7));
    }

    mod fuzz {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Invariant: notional is exact or absent, never wrapped.
            #[test]
            fn fuzz_notional_never_wraps(price in any::<u128>(), volume in any::<u128>()) {
                let notional = Price::new(price).checked_notional(Volume::new(volume));
                match price.checked_mul(volume) {
                    Some(exact) => prop_assert_eq!(notional, Some(exact)),
                    None => prop_assert_eq!(notional, None),
                }
            }

            /// Invariant: subtracting then adding back restores the volume.
            #[test]
            fn fuzz_volume_sub_add(a in any::<u128>(), b in any::<u128>()) {
                let (a, b) = (Volume::new(a), Volume::new(b));
                match a.checked_sub(b) {
                    Some(diff) => prop_assert_eq!(diff.checked_add(b), Some(a)),
                    None => prop_assert!(a < b),
                }
            }
        }
    }
}
