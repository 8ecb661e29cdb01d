//! Maker/taker fee policy for the pair.

use crypto_bigint::U256;
use serde::{Deserialize, Serialize};

use super::error::BookError;
use super::num;
use super::types::Amount;

/// Unit of fee rates: one part in a million, i.e. 0.0001%.
pub const FEE_PRECISION: u32 = 1_000_000;

/// Configurable maker and taker fee rates, expressed in millionths.
///
/// Fees are always charged on the asset being credited: a taker buying base
/// pays the taker fee in base, a maker claiming quote proceeds pays the
/// maker fee in quote. Rebates are not supported; rates are unsigned and
/// strictly below [`FEE_PRECISION`].
///
/// # Examples
///
/// ```
/// use claimbook::FeePolicy;
/// use crypto_bigint::U256;
///
/// let policy = FeePolicy::new(10, 20).unwrap();
/// let (net, fee) = policy.split(U256::from(1_000_000u64), true).unwrap();
/// assert_eq!(fee, U256::from(10u64));
/// assert_eq!(net, U256::from(999_990u64));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    /// Maker fee in millionths, charged when a resting order is claimed.
    pub maker_fee: u32,

    /// Taker fee in millionths, charged on matched taker proceeds.
    pub taker_fee: u32,
}

impl FeePolicy {
    /// Create a new fee policy.
    ///
    /// # Errors
    ///
    /// Returns [`BookError::InvalidFeeRate`] if either rate reaches
    /// [`FEE_PRECISION`] (a 100% fee).
    pub fn new(maker_fee: u32, taker_fee: u32) -> Result<Self, BookError> {
        if maker_fee >= FEE_PRECISION {
            return Err(BookError::InvalidFeeRate { rate: maker_fee });
        }
        if taker_fee >= FEE_PRECISION {
            return Err(BookError::InvalidFeeRate { rate: taker_fee });
        }
        Ok(Self {
            maker_fee,
            taker_fee,
        })
    }

    /// A policy with zero fees on both sides.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            maker_fee: 0,
            taker_fee: 0,
        }
    }

    /// Whether both rates are zero.
    #[must_use]
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.maker_fee == 0 && self.taker_fee == 0
    }

    /// Fee charged on `amount` for the given role, rounded down.
    pub fn fee_of(&self, amount: Amount, is_maker: bool) -> Result<Amount, BookError> {
        let rate = if is_maker {
            self.maker_fee
        } else {
            self.taker_fee
        };
        if rate == 0 {
            return Ok(U256::ZERO);
        }
        let recip = num::limb_reciprocal(u64::from(FEE_PRECISION))?;
        num::mul_div_floor(amount, U256::from(rate), &recip)
    }

    /// Split `amount` into `(net, fee)` for the given role.
    ///
    /// The fee rounds down, so `net + fee == amount` holds exactly.
    pub fn split(&self, amount: Amount, is_maker: bool) -> Result<(Amount, Amount), BookError> {
        let fee = self.fee_of(amount, is_maker)?;
        let net = num::checked_sub(amount, fee)?;
        Ok((net, fee))
    }
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self::zero()
    }
}
