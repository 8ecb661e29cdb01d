//! 256-bit arithmetic helpers.
//!
//! Notional products (`price * amount`) are computed in 512-bit space and
//! narrowed back with an explicit overflow check. Every divisor in the
//! engine (price precision, fee precision, scaling quantum) fits a single
//! 64-bit limb, so divisions run through precomputed [`Reciprocal`]s.

use crypto_bigint::{CheckedAdd, CheckedSub, Limb, NonZero, Reciprocal, U256, U512};
use std::ops::Mul;

use super::error::BookError;
use super::types::Amount;

/// Widen a 256-bit value into 512-bit space for overflow-free products.
#[inline]
pub(crate) fn widen(value: U256) -> U512 {
    U512::ONE.mul(value)
}

/// Build the reciprocal of a single-limb divisor.
///
/// Returns `InvalidPricePrecision` for a zero divisor; the caller decides
/// whether zero means a bad precision or a bad scaling quantum, so both
/// validation paths reject before this is reached in steady state.
pub(crate) fn limb_reciprocal(divisor: u64) -> Result<Reciprocal, BookError> {
    let nz: Option<NonZero<Limb>> = NonZero::new(Limb(divisor)).into();
    nz.map(Reciprocal::new)
        .ok_or(BookError::InvalidPricePrecision { precision: divisor })
}

/// `a * b / divisor`, rounded toward zero.
///
/// The product is exact in 512 bits; the quotient must narrow back to 256
/// bits or the call fails with `Overflow`.
pub(crate) fn mul_div_floor(
    a: U256,
    b: U256,
    divisor: &Reciprocal,
) -> Result<U256, BookError> {
    let wide = widen(a).mul(b);
    let (quotient, _) = wide.div_rem_limb_with_reciprocal(divisor);
    let (lo, hi) = quotient.split();
    if hi == U256::ZERO {
        Ok(lo)
    } else {
        Err(BookError::Overflow)
    }
}

/// Remainder of `value` divided by a single-limb divisor.
pub(crate) fn rem_limb(value: U256, divisor: &Reciprocal) -> u64 {
    let (_, rem) = value.div_rem_limb_with_reciprocal(divisor);
    rem.0 as u64
}

/// `value / divisor`, rounded toward zero.
pub(crate) fn div_limb_floor(value: U256, divisor: &Reciprocal) -> U256 {
    let (quotient, _) = value.div_rem_limb_with_reciprocal(divisor);
    quotient
}

/// Checked 256-bit addition surfaced as a book error.
#[inline]
pub(crate) fn checked_add(a: Amount, b: Amount) -> Result<Amount, BookError> {
    Option::<U256>::from(a.checked_add(&b)).ok_or(BookError::Overflow)
}

/// Checked 256-bit subtraction surfaced as a book error.
#[inline]
pub(crate) fn checked_sub(a: Amount, b: Amount) -> Result<Amount, BookError> {
    Option::<U256>::from(a.checked_sub(&b)).ok_or(BookError::Underflow)
}

/// Narrow to `u64` if the value fits.
pub(crate) fn to_u64(value: U256) -> Option<u64> {
    let bytes = value.to_be_bytes();
    if bytes[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&bytes[24..]);
    Some(u64::from_be_bytes(tail))
}
