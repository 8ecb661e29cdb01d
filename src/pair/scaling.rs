//! Quantization between 256-bit amounts and 64-bit tree leaves.

use crypto_bigint::U256;

use super::error::BookError;
use super::num;
use super::types::Amount;

/// Default quantum: one billionth of a canonical 18-decimal token unit.
pub const DEFAULT_SCALE_QUANTUM: u64 = 1_000_000_000;

/// Converts cancellation amounts between the 256-bit canonical
/// representation and the 64-bit leaves of the cancellation trees.
///
/// The quantum is the smallest representable increment; it is uniform for
/// the pair and exposed through [`AmountScaler::quantum`] so callers can
/// construct boundary cases. `scale_up(scale_down(x)) <= x` always holds,
/// with a residual strictly below one quantum. The residual errs on the
/// side of keeping an order's effective queue position later, so claim
/// amounts can never exceed the order's size.
#[derive(Debug, Clone, Copy)]
pub struct AmountScaler {
    quantum: u64,
}

impl AmountScaler {
    /// Create a scaler with the given quantum.
    ///
    /// # Errors
    ///
    /// Rejects a zero quantum.
    pub fn new(quantum: u64) -> Result<Self, BookError> {
        // Validates the divisor once up front; per-call reciprocals are
        // rebuilt from the stored quantum.
        num::limb_reciprocal(quantum)?;
        Ok(Self { quantum })
    }

    /// The smallest representable increment, in canonical amount units.
    #[must_use]
    #[inline]
    pub fn quantum(&self) -> u64 {
        self.quantum
    }

    /// Quantize an amount to tree units, rounding down.
    ///
    /// # Errors
    ///
    /// `Overflow` if the quantized value does not fit 64 bits.
    pub fn scale_down(&self, amount: Amount) -> Result<u64, BookError> {
        let recip = num::limb_reciprocal(self.quantum)?;
        let scaled = num::div_limb_floor(amount, &recip);
        num::to_u64(scaled).ok_or(BookError::Overflow)
    }

    /// Restore a tree value to canonical amount units.
    #[must_use]
    pub fn scale_up(&self, raw: u64) -> Amount {
        U256::from(raw).saturating_mul(&U256::from(self.quantum))
    }
}

impl Default for AmountScaler {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_SCALE_QUANTUM,
        }
    }
}
