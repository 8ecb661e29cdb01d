//! Point-in-time snapshots of pair state for market data.

use serde::Serialize;

use super::book::Pair;
use super::types::{Amount, Price, Side};
use crate::utils::current_time_millis;

/// One price level's counters at snapshot time.
#[derive(Debug, Clone, Serialize)]
pub struct PricePointSnapshot {
    /// The level's price.
    pub price: Price,
    /// Resting buy liquidity.
    pub total_buy: Amount,
    /// Resting sell liquidity.
    pub total_sell: Amount,
    /// Buy-side fill watermark.
    pub used_buy: Amount,
    /// Sell-side fill watermark.
    pub used_sell: Amount,
    /// Buy orders ever rested here.
    pub buy_order_count: u64,
    /// Sell orders ever rested here.
    pub sell_order_count: u64,
}

/// A snapshot of the observable pair state at a specific point in time.
#[derive(Debug, Clone, Serialize)]
pub struct PairSnapshot {
    /// Milliseconds since the epoch at capture.
    pub timestamp: u64,
    /// The last traded price, if any.
    pub latest_trade_price: Option<Price>,
    /// Every touched price level, ascending by price.
    pub price_points: Vec<PricePointSnapshot>,
    /// Accumulated quote fees awaiting collection.
    pub quote_fee_balance: Amount,
    /// Accumulated base fees awaiting collection.
    pub base_fee_balance: Amount,
    /// Active maker fee, in millionths.
    pub maker_fee: u32,
    /// Active taker fee, in millionths.
    pub taker_fee: u32,
    /// Active price quantization step.
    pub price_precision: u64,
}

impl PairSnapshot {
    /// Highest price with resting buy liquidity in the snapshot.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.price_points
            .iter()
            .rev()
            .find(|point| point.total_buy > crypto_bigint::U256::ZERO)
            .map(|point| point.price)
    }

    /// Lowest price with resting sell liquidity in the snapshot.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.price_points
            .iter()
            .find(|point| point.total_sell > crypto_bigint::U256::ZERO)
            .map(|point| point.price)
    }
}

impl Pair {
    /// Capture the current book state.
    #[must_use]
    pub fn snapshot(&self) -> PairSnapshot {
        let mut price_points = Vec::new();
        self.book.for_each_point(|price, point| {
            price_points.push(PricePointSnapshot {
                price,
                total_buy: point.total(Side::Buy),
                total_sell: point.total(Side::Sell),
                used_buy: point.used(Side::Buy),
                used_sell: point.used(Side::Sell),
                buy_order_count: point.order_count(Side::Buy),
                sell_order_count: point.order_count(Side::Sell),
            });
        });
        let (quote_fee_balance, base_fee_balance) = self.fee_balances();
        let fees = self.fee_policy();
        PairSnapshot {
            timestamp: current_time_millis(),
            latest_trade_price: self.latest_trade_price(),
            price_points,
            quote_fee_balance,
            base_fee_balance,
            maker_fee: fees.maker_fee,
            taker_fee: fees.taker_fee,
            price_precision: self.price_precision(),
        }
    }
}
