//! Per-price liquidity state and the transitions that mutate it.

use crossbeam::atomic::AtomicCell;
use crossbeam_skiplist::SkipMap;
use crypto_bigint::U256;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::types::{Amount, Price, Side};

/// Liquidity state for one discrete price level.
///
/// `total_*` is the liquidity currently resting on each side. `used_*` is
/// the fill watermark: the cumulative amount of each side's queue consumed
/// by opposing takers, in cancellation-adjusted queue coordinates. The
/// watermark only advances; cancels retire resting liquidity from `total_*`
/// and are replayed into later orders' positions through the cancellation
/// index instead of rewinding `used_*`.
///
/// `*_order_count` counts orders ever rested on each side and is never
/// decremented, so it doubles as the next queue index.
#[derive(Debug, Default)]
pub struct PricePoint {
    total_buy: AtomicCell<Amount>,
    total_sell: AtomicCell<Amount>,
    used_buy: AtomicCell<Amount>,
    used_sell: AtomicCell<Amount>,
    buy_order_count: AtomicU64,
    sell_order_count: AtomicU64,
}

impl PricePoint {
    fn new() -> Self {
        Self {
            total_buy: AtomicCell::new(U256::ZERO),
            total_sell: AtomicCell::new(U256::ZERO),
            used_buy: AtomicCell::new(U256::ZERO),
            used_sell: AtomicCell::new(U256::ZERO),
            buy_order_count: AtomicU64::new(0),
            sell_order_count: AtomicU64::new(0),
        }
    }

    /// Resting liquidity on `side`.
    #[must_use]
    pub fn total(&self, side: Side) -> Amount {
        match side {
            Side::Buy => self.total_buy.load(),
            Side::Sell => self.total_sell.load(),
        }
    }

    /// Fill watermark on `side`.
    #[must_use]
    pub fn used(&self, side: Side) -> Amount {
        match side {
            Side::Buy => self.used_buy.load(),
            Side::Sell => self.used_sell.load(),
        }
    }

    /// Orders ever rested on `side`; also the next queue index.
    #[must_use]
    pub fn order_count(&self, side: Side) -> u64 {
        match side {
            Side::Buy => self.buy_order_count.load(Ordering::Acquire),
            Side::Sell => self.sell_order_count.load(Ordering::Acquire),
        }
    }

    pub(crate) fn bump_order_count(&self, side: Side) -> u64 {
        match side {
            Side::Buy => self.buy_order_count.fetch_add(1, Ordering::AcqRel),
            Side::Sell => self.sell_order_count.fetch_add(1, Ordering::AcqRel),
        }
    }

    fn total_cell(&self, side: Side) -> &AtomicCell<Amount> {
        match side {
            Side::Buy => &self.total_buy,
            Side::Sell => &self.total_sell,
        }
    }

    fn used_cell(&self, side: Side) -> &AtomicCell<Amount> {
        match side {
            Side::Buy => &self.used_buy,
            Side::Sell => &self.used_sell,
        }
    }
}

/// A validated per-price state transition.
///
/// The constructors are the only way to build one, which keeps the
/// side/direction/cancel combinations to the three that exist:
///
/// | transition | effect on the affected side |
/// |---|---|
/// | `taker(side)` | opposite `total -= a`, opposite `used += a` |
/// | `maker_deposit(side)` | own `total += a`, may promote the leading hint |
/// | `maker_cancel(side)` | own `total -= a` |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidityTransition {
    side: Side,
    deposit: bool,
    is_cancel: bool,
}

impl LiquidityTransition {
    /// An incoming `side` order consuming opposite-side liquidity.
    #[must_use]
    pub fn taker(side: Side) -> Self {
        Self {
            side,
            deposit: false,
            is_cancel: false,
        }
    }

    /// A `side` maker resting new liquidity.
    #[must_use]
    pub fn maker_deposit(side: Side) -> Self {
        Self {
            side,
            deposit: true,
            is_cancel: false,
        }
    }

    /// A `side` maker withdrawing its unmatched residual.
    #[must_use]
    pub fn maker_cancel(side: Side) -> Self {
        Self {
            side,
            deposit: false,
            is_cancel: true,
        }
    }
}

/// The set of price points for one pair, ordered by price, plus the
/// leading-price hints used to gate matching.
///
/// The hints advance on deposits to a better level and are never retreated
/// when a level drains; they are advisory only and every decision that
/// matters reads the authoritative counters.
pub struct PriceBook {
    points: SkipMap<Price, Arc<PricePoint>>,
    buy_leading: AtomicCell<Option<Price>>,
    sell_leading: AtomicCell<Option<Price>>,
}

impl PriceBook {
    /// Create an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            points: SkipMap::new(),
            buy_leading: AtomicCell::new(None),
            sell_leading: AtomicCell::new(None),
        }
    }

    /// The price point at `price`, if one was ever touched.
    #[must_use]
    pub fn point(&self, price: Price) -> Option<Arc<PricePoint>> {
        self.points.get(&price).map(|entry| entry.value().clone())
    }

    /// The price point at `price`, created empty if absent.
    pub(crate) fn ensure(&self, price: Price) -> Arc<PricePoint> {
        self.points
            .get_or_insert(price, Arc::new(PricePoint::new()))
            .value()
            .clone()
    }

    /// Resting liquidity at (`price`, `side`); zero for untouched levels.
    #[must_use]
    pub fn liquidity(&self, price: Price, side: Side) -> Amount {
        self.point(price).map_or(U256::ZERO, |p| p.total(side))
    }

    /// Fill watermark at (`price`, `side`); zero for untouched levels.
    #[must_use]
    pub fn used(&self, price: Price, side: Side) -> Amount {
        self.point(price).map_or(U256::ZERO, |p| p.used(side))
    }

    /// Orders ever rested at (`price`, `side`).
    #[must_use]
    pub fn order_count(&self, price: Price, side: Side) -> u64 {
        self.point(price).map_or(0, |p| p.order_count(side))
    }

    /// Leading-price hint for `side`: the best price a deposit has ever
    /// promoted. Advisory; may be stale after the level drains.
    #[must_use]
    pub fn leading(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.buy_leading.load(),
            Side::Sell => self.sell_leading.load(),
        }
    }

    /// Highest price with resting buy liquidity, from the counters.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.points
            .iter()
            .rev()
            .find(|entry| entry.value().total(Side::Buy) > U256::ZERO)
            .map(|entry| *entry.key())
    }

    /// Lowest price with resting sell liquidity, from the counters.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.points
            .iter()
            .find(|entry| entry.value().total(Side::Sell) > U256::ZERO)
            .map(|entry| *entry.key())
    }

    /// Whether an incoming `side` order at `entry` may cross resting
    /// opposite liquidity. False positives cost one wasted scan; a false
    /// negative would skip real liquidity, so the hint check is backed by
    /// the authoritative entry-level counter.
    #[must_use]
    pub fn crosses(&self, side: Side, entry: Price) -> bool {
        if self.liquidity(entry, side.opposite()) > U256::ZERO {
            return true;
        }
        match side {
            Side::Buy => self.leading(Side::Sell).is_some_and(|lead| entry >= lead),
            Side::Sell => self.leading(Side::Buy).is_some_and(|lead| entry <= lead),
        }
    }

    /// Apply a transition of `amount` at `price`.
    ///
    /// Callers validate sufficiency and overflow while planning, before
    /// any state mutates; application itself does not fail.
    pub(crate) fn apply(&self, price: Price, transition: LiquidityTransition, amount: Amount) {
        let point = self.ensure(price);
        if transition.deposit {
            let total = point.total_cell(transition.side);
            total.store(total.load().saturating_add(&amount));
            self.promote_leading(transition.side, price);
        } else if transition.is_cancel {
            let total = point.total_cell(transition.side);
            total.store(total.load().saturating_sub(&amount));
        } else {
            let consumed_side = transition.side.opposite();
            let total = point.total_cell(consumed_side);
            total.store(total.load().saturating_sub(&amount));
            let used = point.used_cell(consumed_side);
            used.store(used.load().saturating_add(&amount));
        }
    }

    fn promote_leading(&self, side: Side, price: Price) {
        match side {
            Side::Buy => {
                let current = self.buy_leading.load();
                if current.is_none_or(|lead| price > lead) {
                    self.buy_leading.store(Some(price));
                }
            }
            Side::Sell => {
                let current = self.sell_leading.load();
                if current.is_none_or(|lead| price < lead) {
                    self.sell_leading.store(Some(price));
                }
            }
        }
    }

    /// Iterate every touched price point in ascending price order.
    pub(crate) fn for_each_point(&self, mut f: impl FnMut(Price, &PricePoint)) {
        for entry in self.points.iter() {
            f(*entry.key(), entry.value());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(v: u64) -> Amount {
        U256::from(v)
    }

    #[test]
    fn test_deposit_adds_own_side() {
        let book = PriceBook::new();
        book.apply(amt(100), LiquidityTransition::maker_deposit(Side::Buy), amt(10));
        assert_eq!(book.liquidity(amt(100), Side::Buy), amt(10));
        assert_eq!(book.liquidity(amt(100), Side::Sell), U256::ZERO);
        assert_eq!(book.used(amt(100), Side::Buy), U256::ZERO);
    }

    #[test]
    fn test_taker_consumes_opposite_and_advances_watermark() {
        let book = PriceBook::new();
        book.apply(amt(100), LiquidityTransition::maker_deposit(Side::Sell), amt(10));
        book.apply(amt(100), LiquidityTransition::taker(Side::Buy), amt(4));
        assert_eq!(book.liquidity(amt(100), Side::Sell), amt(6));
        assert_eq!(book.used(amt(100), Side::Sell), amt(4));
        // Buy side untouched by a buy taker.
        assert_eq!(book.liquidity(amt(100), Side::Buy), U256::ZERO);
        assert_eq!(book.used(amt(100), Side::Buy), U256::ZERO);
    }

    #[test]
    fn test_cancel_retires_total_and_keeps_watermark() {
        let book = PriceBook::new();
        book.apply(amt(100), LiquidityTransition::maker_deposit(Side::Sell), amt(10));
        book.apply(amt(100), LiquidityTransition::taker(Side::Buy), amt(4));
        book.apply(amt(100), LiquidityTransition::maker_cancel(Side::Sell), amt(6));
        assert_eq!(book.liquidity(amt(100), Side::Sell), U256::ZERO);
        assert_eq!(book.used(amt(100), Side::Sell), amt(4));
    }

    #[test]
    fn test_leading_hints_promote_only() {
        let book = PriceBook::new();
        assert_eq!(book.leading(Side::Buy), None);
        assert_eq!(book.leading(Side::Sell), None);

        book.apply(amt(100), LiquidityTransition::maker_deposit(Side::Buy), amt(1));
        book.apply(amt(90), LiquidityTransition::maker_deposit(Side::Buy), amt(1));
        assert_eq!(book.leading(Side::Buy), Some(amt(100)));
        book.apply(amt(110), LiquidityTransition::maker_deposit(Side::Buy), amt(1));
        assert_eq!(book.leading(Side::Buy), Some(amt(110)));

        book.apply(amt(200), LiquidityTransition::maker_deposit(Side::Sell), amt(1));
        book.apply(amt(210), LiquidityTransition::maker_deposit(Side::Sell), amt(1));
        assert_eq!(book.leading(Side::Sell), Some(amt(200)));
        book.apply(amt(190), LiquidityTransition::maker_deposit(Side::Sell), amt(1));
        assert_eq!(book.leading(Side::Sell), Some(amt(190)));

        // Draining a level does not retreat the hint.
        book.apply(amt(190), LiquidityTransition::taker(Side::Buy), amt(1));
        assert_eq!(book.leading(Side::Sell), Some(amt(190)));
    }

    #[test]
    fn test_crosses_gate() {
        let book = PriceBook::new();
        // Empty book: nothing crosses.
        assert!(!book.crosses(Side::Buy, amt(100)));
        assert!(!book.crosses(Side::Sell, amt(100)));

        book.apply(amt(100), LiquidityTransition::maker_deposit(Side::Sell), amt(5));
        assert!(book.crosses(Side::Buy, amt(100)));
        assert!(book.crosses(Side::Buy, amt(120)));
        assert!(!book.crosses(Side::Buy, amt(90)));

        book.apply(amt(80), LiquidityTransition::maker_deposit(Side::Buy), amt(5));
        assert!(book.crosses(Side::Sell, amt(80)));
        assert!(book.crosses(Side::Sell, amt(70)));
        assert!(!book.crosses(Side::Sell, amt(90)));
    }

    #[test]
    fn test_best_prices_from_counters() {
        let book = PriceBook::new();
        assert_eq!(book.best_bid(), None);
        assert_eq!(book.best_ask(), None);

        book.apply(amt(95), LiquidityTransition::maker_deposit(Side::Buy), amt(1));
        book.apply(amt(100), LiquidityTransition::maker_deposit(Side::Buy), amt(1));
        book.apply(amt(105), LiquidityTransition::maker_deposit(Side::Sell), amt(1));
        book.apply(amt(110), LiquidityTransition::maker_deposit(Side::Sell), amt(1));
        assert_eq!(book.best_bid(), Some(amt(100)));
        assert_eq!(book.best_ask(), Some(amt(105)));

        // Consuming the best ask moves the authoritative answer even though
        // the hint stays put.
        book.apply(amt(105), LiquidityTransition::taker(Side::Buy), amt(1));
        assert_eq!(book.best_ask(), Some(amt(110)));
        assert_eq!(book.leading(Side::Sell), Some(amt(105)));
    }

    #[test]
    fn test_order_counts_never_decrease() {
        let book = PriceBook::new();
        let point = book.ensure(amt(100));
        assert_eq!(point.bump_order_count(Side::Sell), 0);
        assert_eq!(point.bump_order_count(Side::Sell), 1);
        book.apply(amt(100), LiquidityTransition::maker_cancel(Side::Sell), amt(1));
        assert_eq!(book.order_count(amt(100), Side::Sell), 2);
        assert_eq!(book.order_count(amt(100), Side::Buy), 0);
    }
}
