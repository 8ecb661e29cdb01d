//! Public pair operations: insert, claim, cancel, fee administration.

use crypto_bigint::U256;
use tracing::trace;

use super::book::Pair;
use super::claim::{self, ClaimStatus};
use super::error::BookError;
use super::events::MarketEvent;
use super::fees::FeePolicy;
use super::ledger::{AccountId, AssetId};
use super::matching::{MatchPlan, plan_match};
use super::num;
use super::order_store::{OrderRecord, OrderStatus};
use super::price_book::LiquidityTransition;
use super::types::{Amount, OrderId, Price, Side};
use crate::utils::current_time_millis;

/// Plan-time totals for an insert: what the taker spends and receives.
struct TakerTotals {
    /// Quote consumed across fills, each at its own level's price.
    consumed_quote: Amount,
    /// Base consumed across fills.
    consumed_base: Amount,
}

impl Pair {
    /// Insert a limit order.
    ///
    /// The order first takes opposite liquidity at prices from its limit
    /// through the bounded matching window; any residual rests at the limit
    /// price as a maker order owned by `caller`. The entry asset (quote for
    /// a buy, base for a sell) is debited for exactly what the call
    /// consumes plus the escrow behind the residual; matched proceeds are
    /// credited immediately, net of the taker fee.
    ///
    /// Returns the minted order id. The id resolves to a record only when a
    /// residual rested.
    ///
    /// # Errors
    ///
    /// [`BookError::InvalidAmount`], [`BookError::InvalidPrice`], ledger
    /// errors from the entry debit, and arithmetic errors on violated
    /// bounds. A failed call changes nothing.
    pub fn insert_limit_order(
        &self,
        caller: AccountId,
        side: Side,
        price: Price,
        amount: Amount,
    ) -> Result<OrderId, BookError> {
        trace!(
            "limit order: {caller} {side} amount {amount:?} at price {price:?}"
        );
        if amount == U256::ZERO {
            return Err(BookError::InvalidAmount);
        }
        let precision = self.price_precision.load();
        let recip = num::limb_reciprocal(precision)?;
        if price == U256::ZERO || num::rem_limb(price, &recip) != 0 {
            return Err(BookError::InvalidPrice { price, precision });
        }

        let plan = plan_match(&self.book, side, price, amount, precision);
        let residual = plan.remaining;
        let totals = self.taker_totals(&plan)?;

        let (entry_asset, entry_debit) = match side {
            Side::Buy => {
                let escrow = num::mul_div_floor(residual, price, &recip)?;
                (self.quote, num::checked_add(totals.consumed_quote, escrow)?)
            }
            Side::Sell => (self.base, amount),
        };
        let (proceeds_asset, taker_net, taker_fee) = match side {
            Side::Buy => {
                let (net, fee) = self.fees.load().split(totals.consumed_base, false)?;
                (self.base, net, fee)
            }
            Side::Sell => {
                let (net, fee) = self.fees.load().split(totals.consumed_quote, false)?;
                (self.quote, net, fee)
            }
        };

        // Queue position for the residual. Same-side counters at the limit
        // price are untouched by this call's own withdrawals (those hit the
        // opposite side), so the snapshot equals the post-match state the
        // resting order must anchor above.
        let resting = if residual > U256::ZERO {
            let point = self.book.ensure(price);
            let queue_index = point.order_count(side);
            let recorded = self
                .lock_cancellations()
                .cumulative_before(price, side, queue_index)?;
            let ahead = num::checked_add(
                num::checked_add(point.used(side), point.total(side))?,
                self.scaler.scale_up(recorded),
            )?;
            Some((queue_index, ahead))
        } else {
            None
        };

        // The only fallible external effect; nothing is mutated before it.
        self.ledger.debit(caller, entry_asset, entry_debit)?;

        for fill in &plan.fills {
            self.book
                .apply(fill.price, LiquidityTransition::taker(side), fill.amount);
        }
        let order_id = self.orders.next_id();
        if let Some((queue_index, queue_position_ahead)) = resting {
            self.book
                .apply(price, LiquidityTransition::maker_deposit(side), residual);
            self.orders.insert(OrderRecord {
                id: order_id,
                owner: caller,
                side,
                price,
                token_amount: residual,
                queue_index,
                queue_position_ahead,
                status: OrderStatus::Open,
                created_at: current_time_millis(),
            });
            self.book.ensure(price).bump_order_count(side);
        }
        if let Some(last) = plan.last_price() {
            self.latest_trade_price.store(Some(last));
            self.ledger.credit(caller, proceeds_asset, taker_net);
            self.accrue_fee(proceeds_asset, taker_fee);
        }

        self.emit(MarketEvent::LimitOrderInserted {
            order_id,
            account: caller,
            side,
            price,
            matched: plan.fills,
            residual,
        });
        Ok(order_id)
    }

    /// Insert a market order, which must fully fill or fail.
    ///
    /// The scan enters at the latest trade price. Every matched level must
    /// be at or inside `worst_price` (at or below it for a buy, at or above
    /// it for a sell) and the full `amount` must be consumed within the
    /// matching window, otherwise the order is rejected with no effects.
    ///
    /// # Errors
    ///
    /// [`BookError::NotEnoughLiquidity`] when no trade has ever occurred,
    /// nothing matches, or a residual remains;
    /// [`BookError::ExceedWorstPrice`] when a matched level is beyond the
    /// bound; [`BookError::InvalidAmount`]; ledger errors from the debit.
    pub fn insert_market_order(
        &self,
        caller: AccountId,
        side: Side,
        amount: Amount,
        worst_price: Price,
    ) -> Result<OrderId, BookError> {
        trace!(
            "market order: {caller} {side} amount {amount:?} worst {worst_price:?}"
        );
        if amount == U256::ZERO {
            return Err(BookError::InvalidAmount);
        }
        let entry = self
            .latest_trade_price
            .load()
            .ok_or(BookError::NotEnoughLiquidity)?;
        let precision = self.price_precision.load();

        let plan = plan_match(&self.book, side, entry, amount, precision);
        if plan.is_empty() {
            return Err(BookError::NotEnoughLiquidity);
        }
        for fill in &plan.fills {
            let beyond = match side {
                Side::Buy => fill.price > worst_price,
                Side::Sell => fill.price < worst_price,
            };
            if beyond {
                return Err(BookError::ExceedWorstPrice {
                    worst: worst_price,
                    offered: fill.price,
                });
            }
        }
        if plan.remaining > U256::ZERO {
            return Err(BookError::NotEnoughLiquidity);
        }

        let totals = self.taker_totals(&plan)?;
        let (entry_asset, entry_debit) = match side {
            Side::Buy => (self.quote, totals.consumed_quote),
            Side::Sell => (self.base, totals.consumed_base),
        };
        let (proceeds_asset, taker_net, taker_fee) = match side {
            Side::Buy => {
                let (net, fee) = self.fees.load().split(totals.consumed_base, false)?;
                (self.base, net, fee)
            }
            Side::Sell => {
                let (net, fee) = self.fees.load().split(totals.consumed_quote, false)?;
                (self.quote, net, fee)
            }
        };

        self.ledger.debit(caller, entry_asset, entry_debit)?;

        for fill in &plan.fills {
            self.book
                .apply(fill.price, LiquidityTransition::taker(side), fill.amount);
        }
        let order_id = self.orders.next_id();
        self.latest_trade_price.store(plan.last_price());
        self.ledger.credit(caller, proceeds_asset, taker_net);
        self.accrue_fee(proceeds_asset, taker_fee);

        self.emit(MarketEvent::MarketOrderInserted {
            order_id,
            account: caller,
            side,
            amount,
            matched: plan.fills,
            worst_price,
        });
        Ok(order_id)
    }

    /// Claim a fully filled resting order, crediting its proceeds net of
    /// the maker fee: base for a buy maker, quote for a sell maker.
    ///
    /// `owner` must match the order's owner.
    ///
    /// # Errors
    ///
    /// [`BookError::OrderNotFound`], [`BookError::InvalidOrderStatus`],
    /// [`BookError::InvalidCaller`], and [`BookError::NotFullyClaimable`]
    /// when any part of the order is still unfilled.
    pub fn claim_order(&self, owner: AccountId, order_id: OrderId) -> Result<(), BookError> {
        trace!("claim order {order_id} by {owner}");
        let record = self.open_order(owner, order_id)?;
        let status = {
            let cancellations = self.lock_cancellations();
            claim::evaluate(&record, &self.book, &cancellations, &self.scaler)?
        };
        if status != ClaimStatus::FullyClaimable {
            return Err(BookError::NotFullyClaimable { order_id });
        }
        let (asset, net, fee) = self.maker_proceeds(&record, record.token_amount)?;

        self.orders.set_status(order_id, OrderStatus::Claimed);
        self.ledger.credit(record.owner, asset, net);
        self.accrue_fee(asset, fee);
        self.emit(MarketEvent::LimitMakerOrderClaimed {
            order_id,
            owner: record.owner,
            side: record.side,
            price: record.price,
            claimed: net,
            fee,
        });
        Ok(())
    }

    /// Cancel a resting order.
    ///
    /// A fully filled order is claimed instead. A partially filled order
    /// first pays out the filled portion net of the maker fee, then the
    /// unfilled residual is withdrawn, recorded in the cancellation index
    /// at the order's queue slot, and refunded in the entry asset. The
    /// recorded amount is quantized down to the tree unit; the refund is
    /// exact.
    ///
    /// `owner` must match the order's owner.
    ///
    /// # Errors
    ///
    /// [`BookError::OrderNotFound`], [`BookError::InvalidOrderStatus`],
    /// [`BookError::InvalidCaller`], plus arithmetic errors on violated
    /// bounds.
    pub fn cancel_order(&self, owner: AccountId, order_id: OrderId) -> Result<(), BookError> {
        trace!("cancel order {order_id} by {owner}");
        let record = self.open_order(owner, order_id)?;
        let mut cancellations = self.lock_cancellations();
        let status = claim::evaluate(&record, &self.book, &cancellations, &self.scaler)?;

        if status == ClaimStatus::FullyClaimable {
            drop(cancellations);
            let (asset, net, fee) = self.maker_proceeds(&record, record.token_amount)?;
            self.orders.set_status(order_id, OrderStatus::Claimed);
            self.ledger.credit(record.owner, asset, net);
            self.accrue_fee(asset, fee);
            self.emit(MarketEvent::LimitMakerOrderClaimed {
                order_id,
                owner: record.owner,
                side: record.side,
                price: record.price,
                claimed: net,
                fee,
            });
            return Ok(());
        }

        let claimed_amount = status.claimable(record.token_amount);
        let residual = num::checked_sub(record.token_amount, claimed_amount)?;
        let raw = self.scaler.scale_down(residual)?;
        let proceeds = if claimed_amount > U256::ZERO {
            Some(self.maker_proceeds(&record, claimed_amount)?)
        } else {
            None
        };
        let (refund_asset, refund) = match record.side {
            Side::Buy => {
                let recip = num::limb_reciprocal(self.price_precision.load())?;
                (self.quote, num::mul_div_floor(residual, record.price, &recip)?)
            }
            Side::Sell => (self.base, residual),
        };

        // First mutation; everything after it is infallible.
        cancellations.record(record.price, record.side, record.queue_index, raw)?;
        drop(cancellations);

        self.book.apply(
            record.price,
            LiquidityTransition::maker_cancel(record.side),
            residual,
        );
        self.orders.set_status(order_id, OrderStatus::Canceled);
        let (claimed_net, fee) = match proceeds {
            Some((asset, net, fee)) => {
                self.ledger.credit(record.owner, asset, net);
                self.accrue_fee(asset, fee);
                (net, fee)
            }
            None => (U256::ZERO, U256::ZERO),
        };
        self.ledger.credit(record.owner, refund_asset, refund);
        self.emit(MarketEvent::LimitMakerOrderCanceled {
            order_id,
            owner: record.owner,
            side: record.side,
            price: record.price,
            refund,
            claimed: claimed_net,
            fee,
        });
        Ok(())
    }

    /// Credit the accumulated fee balances to the governance treasury and
    /// zero them.
    ///
    /// # Errors
    ///
    /// [`BookError::InvalidCaller`] unless `caller` is governance.
    pub fn collect_fees(&self, caller: AccountId) -> Result<(), BookError> {
        if caller != self.governance {
            return Err(BookError::InvalidCaller(caller));
        }
        let quote_fees = self.quote_fee_balance.swap(U256::ZERO);
        let base_fees = self.base_fee_balance.swap(U256::ZERO);
        trace!(
            "collect fees: quote {quote_fees:?} base {base_fees:?} to {caller}"
        );
        if quote_fees > U256::ZERO {
            self.ledger.credit(self.governance, self.quote, quote_fees);
        }
        if base_fees > U256::ZERO {
            self.ledger.credit(self.governance, self.base, base_fees);
        }
        Ok(())
    }

    /// Replace the fee rates and price precision.
    ///
    /// # Errors
    ///
    /// [`BookError::InvalidCaller`] unless `caller` is governance;
    /// [`BookError::InvalidFeeRate`] and
    /// [`BookError::InvalidPricePrecision`] on out-of-range knobs.
    pub fn update_market_policy(
        &self,
        caller: AccountId,
        maker_fee: u32,
        taker_fee: u32,
        price_precision: u64,
    ) -> Result<(), BookError> {
        if caller != self.governance {
            return Err(BookError::InvalidCaller(caller));
        }
        let policy = FeePolicy::new(maker_fee, taker_fee)?;
        num::limb_reciprocal(price_precision)?;
        self.fees.store(policy);
        self.price_precision.store(price_precision);
        trace!(
            "market policy updated: maker {maker_fee} taker {taker_fee} precision {price_precision}"
        );
        self.emit(MarketEvent::FeePolicyUpdated {
            maker_fee,
            taker_fee,
            price_precision,
        });
        Ok(())
    }

    fn open_order(&self, owner: AccountId, order_id: OrderId) -> Result<OrderRecord, BookError> {
        let record = self
            .orders
            .get(order_id)
            .ok_or(BookError::OrderNotFound(order_id))?;
        if record.status != OrderStatus::Open {
            return Err(BookError::InvalidOrderStatus {
                order_id,
                status: record.status,
            });
        }
        if record.owner != owner {
            return Err(BookError::InvalidCaller(owner));
        }
        Ok(record)
    }

    fn taker_totals(&self, plan: &MatchPlan) -> Result<TakerTotals, BookError> {
        let recip = num::limb_reciprocal(self.price_precision.load())?;
        let mut consumed_quote = U256::ZERO;
        let mut consumed_base = U256::ZERO;
        for fill in &plan.fills {
            let quote = num::mul_div_floor(fill.amount, fill.price, &recip)?;
            consumed_quote = num::checked_add(consumed_quote, quote)?;
            consumed_base = num::checked_add(consumed_base, fill.amount)?;
        }
        Ok(TakerTotals {
            consumed_quote,
            consumed_base,
        })
    }

    /// Asset, net amount, and fee for paying out `claimed_amount` of a
    /// maker order: base for a buy maker, quote at the order's price for a
    /// sell maker.
    fn maker_proceeds(
        &self,
        record: &OrderRecord,
        claimed_amount: Amount,
    ) -> Result<(AssetId, Amount, Amount), BookError> {
        let fees = self.fees.load();
        match record.side {
            Side::Buy => {
                let (net, fee) = fees.split(claimed_amount, true)?;
                Ok((self.base, net, fee))
            }
            Side::Sell => {
                let recip = num::limb_reciprocal(self.price_precision.load())?;
                let proceeds = num::mul_div_floor(claimed_amount, record.price, &recip)?;
                let (net, fee) = fees.split(proceeds, true)?;
                Ok((self.quote, net, fee))
            }
        }
    }
}
