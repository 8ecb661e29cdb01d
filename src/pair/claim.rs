//! Claim decision arithmetic for resting orders.

use super::cancellation::CancellationIndex;
use super::error::BookError;
use super::num;
use super::order_store::OrderRecord;
use super::price_book::PriceBook;
use super::scaling::AmountScaler;
use super::types::Amount;

/// How much of a resting order the fill watermark has covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimStatus {
    /// The watermark passed the order's end; the full amount is claimable.
    FullyClaimable,
    /// The watermark sits inside the order; the carried amount is claimable
    /// and the rest can only be cancelled.
    PartiallyClaimable(Amount),
    /// The watermark has not reached the order.
    NotClaimable,
}

impl ClaimStatus {
    /// The claimable amount this status carries.
    #[must_use]
    pub fn claimable(&self, token_amount: Amount) -> Amount {
        match self {
            ClaimStatus::FullyClaimable => token_amount,
            ClaimStatus::PartiallyClaimable(amount) => *amount,
            ClaimStatus::NotClaimable => crypto_bigint::U256::ZERO,
        }
    }
}

/// Classify an open order against the current book state.
///
/// The order's effective start is its rest-time position minus everything
/// earlier-queued orders have since cancelled; the cancellation index
/// answers that prefix in O(log N). Comparing the effective range against
/// the side's fill watermark yields the decision:
///
/// ```text
/// real_start = queue_position_ahead - scale_up(cumulative_before(idx))
/// real_end   = real_start + token_amount
/// real_end  <= used  =>  fully claimable
/// real_start >= used =>  not claimable
/// otherwise          =>  partially claimable (used - real_start)
/// ```
///
/// Scaling rounds the reconstructed cancellations down, so `real_start`
/// never understates the order's position and the carried partial amount
/// never exceeds `token_amount`.
///
/// # Errors
///
/// `Underflow`/`Overflow` signal a violated accounting invariant and abort
/// the caller's operation before any state changes.
pub(crate) fn evaluate(
    order: &OrderRecord,
    book: &PriceBook,
    cancellations: &CancellationIndex,
    scaler: &AmountScaler,
) -> Result<ClaimStatus, BookError> {
    let raw_cancelled =
        cancellations.cumulative_before(order.price, order.side, order.queue_index)?;
    let cancelled_before = scaler.scale_up(raw_cancelled);
    let real_start = num::checked_sub(order.queue_position_ahead, cancelled_before)?;
    let real_end = num::checked_add(real_start, order.token_amount)?;
    let used = book.used(order.price, order.side);

    if real_end <= used {
        Ok(ClaimStatus::FullyClaimable)
    } else if real_start >= used {
        Ok(ClaimStatus::NotClaimable)
    } else {
        Ok(ClaimStatus::PartiallyClaimable(num::checked_sub(
            used, real_start,
        )?))
    }
}
