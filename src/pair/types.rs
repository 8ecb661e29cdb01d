//! Core value types shared across the pair engine.

use crypto_bigint::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amounts are 256-bit unsigned integers in canonical 18-decimal units.
///
/// Products of the form `price * amount` do not fit in 128 bits for
/// realistic token scales, so all notional arithmetic widens to 512 bits
/// internally (see [`crate::pair::num`]).
pub type Amount = U256;

/// Prices are 256-bit unsigned integers denominated in quote units per one
/// base unit, quantized to a multiple of the pair's price precision.
pub type Price = U256;

/// Order identifiers are minted from a single monotonic counter per pair.
pub type OrderId = u64;

/// The number of tree leaves addressable by one inner cancellation tree,
/// and therefore the number of resting-order indices per offset bucket.
pub const OFFSET_PER_PRICE_POINT: u64 = 32_768;

/// Upper bound on the price points one matching pass may visit.
pub const MAX_MATCHED_PRICE_POINTS: usize = 5;

/// Side of the book an order acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Acquire base, spend quote. Matches against resting sell liquidity.
    Buy,
    /// Sell base, receive quote. Matches against resting buy liquidity.
    Sell,
}

impl Side {
    /// The side this side takes liquidity from.
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// One matched price level: the level's price and the amount of base
/// consumed there. Fill vectors are ordered by encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fill {
    /// Price of the matched level.
    pub price: Price,
    /// Base amount consumed at that level.
    pub amount: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_side() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_side_display() {
        assert_eq!(Side::Buy.to_string(), "buy");
        assert_eq!(Side::Sell.to_string(), "sell");
    }
}
