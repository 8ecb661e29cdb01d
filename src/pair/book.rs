//! The pair: all state for one base/quote market and its configuration.

use crossbeam::atomic::AtomicCell;
use crypto_bigint::U256;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

use super::cancellation::CancellationIndex;
use super::error::BookError;
use super::events::{EventListener, MarketEvent, MarketObservation};
use super::fees::FeePolicy;
use super::ledger::{AccountId, AssetId, AssetLedger};
use super::num;
use super::order_store::{OrderRecord, OrderStore};
use super::price_book::PriceBook;
use super::scaling::AmountScaler;
use super::types::{Amount, OrderId, Price, Side};

/// Construction parameters for a [`Pair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairConfig {
    /// The traded asset.
    pub base: AssetId,
    /// The asset prices are denominated in.
    pub quote: AssetId,
    /// Accounting quantum for the cancellation trees: the smallest amount
    /// increment they can represent.
    pub quote_unit: u64,
    /// Initial maker fee, in millionths.
    pub maker_fee: u32,
    /// Initial taker fee, in millionths.
    pub taker_fee: u32,
    /// Price quantization step; every order price must be a non-zero
    /// multiple. Must fit one 64-bit limb so notional divisions stay
    /// single-limb reciprocal divisions.
    pub price_precision: u64,
    /// The account allowed to collect fees and update market policy.
    pub governance: AccountId,
}

/// A single trading pair: a discrete-price order book over one base/quote
/// asset pair, with claim and cancellation accounting in O(log N).
///
/// Every public operation is one serialized, atomic transaction. The pair
/// does not lock internally; a host that multiplexes pairs across threads
/// must hold a per-pair exclusive gate for the duration of each call (see
/// [`crate::pair::manager::PairManager`]). Within an operation all
/// validation and the single fallible ledger debit precede the first state
/// mutation, so a failed call leaves no effects behind.
pub struct Pair {
    pub(super) base: AssetId,
    pub(super) quote: AssetId,
    pub(super) governance: AccountId,
    pub(super) fees: AtomicCell<FeePolicy>,
    pub(super) price_precision: AtomicCell<u64>,
    pub(super) scaler: AmountScaler,
    pub(super) book: PriceBook,
    pub(super) orders: OrderStore,
    pub(super) cancellations: Mutex<CancellationIndex>,
    pub(super) latest_trade_price: AtomicCell<Option<Price>>,
    pub(super) quote_fee_balance: AtomicCell<Amount>,
    pub(super) base_fee_balance: AtomicCell<Amount>,
    pub(super) ledger: Arc<dyn AssetLedger>,
    pub(super) listener: Option<EventListener>,
}

impl Pair {
    /// Create a pair over the given ledger.
    ///
    /// # Errors
    ///
    /// Rejects fee rates at or above the fee precision, a zero price
    /// precision, and a zero quote unit.
    pub fn new(config: PairConfig, ledger: Arc<dyn AssetLedger>) -> Result<Self, BookError> {
        Self::build(config, ledger, None)
    }

    /// Create a pair that forwards every committed operation to `listener`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_listener(
        config: PairConfig,
        ledger: Arc<dyn AssetLedger>,
        listener: EventListener,
    ) -> Result<Self, BookError> {
        Self::build(config, ledger, Some(listener))
    }

    fn build(
        config: PairConfig,
        ledger: Arc<dyn AssetLedger>,
        listener: Option<EventListener>,
    ) -> Result<Self, BookError> {
        let fees = FeePolicy::new(config.maker_fee, config.taker_fee)?;
        num::limb_reciprocal(config.price_precision)?;
        let scaler = AmountScaler::new(config.quote_unit)?;
        Ok(Self {
            base: config.base,
            quote: config.quote,
            governance: config.governance,
            fees: AtomicCell::new(fees),
            price_precision: AtomicCell::new(config.price_precision),
            scaler,
            book: PriceBook::new(),
            orders: OrderStore::new(),
            cancellations: Mutex::new(CancellationIndex::new()),
            latest_trade_price: AtomicCell::new(None),
            quote_fee_balance: AtomicCell::new(U256::ZERO),
            base_fee_balance: AtomicCell::new(U256::ZERO),
            ledger,
            listener,
        })
    }

    /// The traded asset handle.
    #[must_use]
    pub fn base_asset(&self) -> AssetId {
        self.base
    }

    /// The quote asset handle.
    #[must_use]
    pub fn quote_asset(&self) -> AssetId {
        self.quote
    }

    /// The governance account.
    #[must_use]
    pub fn governance(&self) -> AccountId {
        self.governance
    }

    /// The active fee policy.
    #[must_use]
    pub fn fee_policy(&self) -> FeePolicy {
        self.fees.load()
    }

    /// The active price quantization step.
    #[must_use]
    pub fn price_precision(&self) -> u64 {
        self.price_precision.load()
    }

    /// The cancellation-tree quantum; tests use it to build boundary cases.
    #[must_use]
    pub fn scale_quantum(&self) -> u64 {
        self.scaler.quantum()
    }

    /// The last price a trade matched at, if any trade has occurred.
    #[must_use]
    pub fn latest_trade_price(&self) -> Option<Price> {
        self.latest_trade_price.load()
    }

    /// Accumulated (quote, base) fees awaiting collection.
    #[must_use]
    pub fn fee_balances(&self) -> (Amount, Amount) {
        (self.quote_fee_balance.load(), self.base_fee_balance.load())
    }

    /// Highest price with resting buy liquidity.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.book.best_bid()
    }

    /// Lowest price with resting sell liquidity.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.book.best_ask()
    }

    /// Resting liquidity at (`price`, `side`).
    #[must_use]
    pub fn liquidity(&self, price: Price, side: Side) -> Amount {
        self.book.liquidity(price, side)
    }

    /// Fill watermark at (`price`, `side`).
    #[must_use]
    pub fn used_liquidity(&self, price: Price, side: Side) -> Amount {
        self.book.used(price, side)
    }

    /// Orders ever rested at (`price`, `side`).
    #[must_use]
    pub fn resting_order_count(&self, price: Price, side: Side) -> u64 {
        self.book.order_count(price, side)
    }

    /// A copy of the record for `order_id`, if one exists.
    #[must_use]
    pub fn order(&self, order_id: OrderId) -> Option<OrderRecord> {
        self.orders.get(order_id)
    }

    /// The recorded cancellation for one queue slot, in tree units.
    #[must_use]
    pub fn recorded_cancellation(&self, price: Price, side: Side, queue_index: u64) -> u64 {
        self.lock_cancellations().recorded(price, side, queue_index)
    }

    pub(super) fn lock_cancellations(&self) -> std::sync::MutexGuard<'_, CancellationIndex> {
        self.cancellations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn emit(&self, event: MarketEvent) {
        if let Some(listener) = &self.listener {
            listener(&MarketObservation::now(event));
        }
    }

    pub(super) fn accrue_fee(&self, asset: AssetId, fee: Amount) {
        if fee == U256::ZERO {
            return;
        }
        let cell = if asset == self.quote {
            &self.quote_fee_balance
        } else {
            &self.base_fee_balance
        };
        cell.store(cell.load().saturating_add(&fee));
    }
}
