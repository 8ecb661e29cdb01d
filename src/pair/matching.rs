//! The matching scan: price-time priority over a bounded price window.

use crypto_bigint::{CheckedAdd, CheckedSub, U256};

use super::price_book::PriceBook;
use super::types::{Amount, Fill, MAX_MATCHED_PRICE_POINTS, Price, Side};

/// The outcome of one planning pass: fills in encounter order plus the
/// unmatched remainder. Planning reads the book without mutating it; the
/// caller applies the corresponding withdrawals after its ledger debit
/// succeeds, so a failed operation never leaves a half-consumed book.
#[derive(Debug, Clone)]
pub struct MatchPlan {
    /// Matched levels in encounter order, at most
    /// [`MAX_MATCHED_PRICE_POINTS`] entries.
    pub fills: Vec<Fill>,
    /// Amount left unmatched after the scan.
    pub remaining: Amount,
}

impl MatchPlan {
    /// Whether the scan matched anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// The price of the last matched level, if any. This is what becomes
    /// the pair's latest trade price on commit.
    #[must_use]
    pub fn last_price(&self) -> Option<Price> {
        self.fills.last().map(|fill| fill.price)
    }
}

/// Plan a match for an incoming `side` order of `amount` starting at
/// `entry`, stepping by `price_precision`.
///
/// A buy scans non-increasing prices from the entry (the best sells it may
/// take are at or below its limit); a sell scans non-decreasing prices. At
/// each visited level the available opposite-side liquidity is consumed up
/// to the remaining amount; at most [`MAX_MATCHED_PRICE_POINTS`] levels are
/// visited. The leading-price gate short-circuits scans that cannot cross.
pub(crate) fn plan_match(
    book: &PriceBook,
    side: Side,
    entry: Price,
    amount: Amount,
    price_precision: u64,
) -> MatchPlan {
    let mut plan = MatchPlan {
        fills: Vec::new(),
        remaining: amount,
    };
    if amount == U256::ZERO || !book.crosses(side, entry) {
        return plan;
    }

    let step = U256::from(price_precision);
    let mut price = entry;
    let mut visited = 0;
    loop {
        let available = book.liquidity(price, side.opposite());
        if available > U256::ZERO {
            let consumed = plan.remaining.min(available);
            plan.fills.push(Fill {
                price,
                amount: consumed,
            });
            plan.remaining = plan.remaining.saturating_sub(&consumed);
            if plan.remaining == U256::ZERO {
                break;
            }
        }
        visited += 1;
        if visited >= MAX_MATCHED_PRICE_POINTS {
            break;
        }
        let next: Option<Price> = match side {
            Side::Buy => Option::from(price.checked_sub(&step)),
            Side::Sell => Option::from(price.checked_add(&step)),
        };
        match next {
            // Price zero is not a valid level; stop at the bottom edge.
            Some(p) if p > U256::ZERO => price = p,
            _ => break,
        }
    }
    plan
}
