//! Observation records emitted after each committed operation.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::ledger::AccountId;
use super::types::{Amount, Fill, OrderId, Price, Side};
use crate::utils::current_time_millis;

/// What happened, in the order the state changes committed.
#[derive(Debug, Clone, Serialize)]
pub enum MarketEvent {
    /// A limit order was accepted; it may have matched, rested, or both.
    LimitOrderInserted {
        /// The minted order id.
        order_id: OrderId,
        /// The submitting account.
        account: AccountId,
        /// The order side.
        side: Side,
        /// The limit price.
        price: Price,
        /// Matched levels in encounter order.
        matched: Vec<Fill>,
        /// The amount left resting on the book.
        residual: Amount,
    },

    /// A market order fully matched.
    MarketOrderInserted {
        /// The minted order id.
        order_id: OrderId,
        /// The submitting account.
        account: AccountId,
        /// The order side.
        side: Side,
        /// The requested amount, fully consumed.
        amount: Amount,
        /// Matched levels in encounter order.
        matched: Vec<Fill>,
        /// The caller's worst acceptable price.
        worst_price: Price,
    },

    /// A resting maker order was fully claimed.
    LimitMakerOrderClaimed {
        /// The claimed order.
        order_id: OrderId,
        /// The order's owner, who received the proceeds.
        owner: AccountId,
        /// The order side.
        side: Side,
        /// The order's price.
        price: Price,
        /// Proceeds credited, net of the maker fee.
        claimed: Amount,
        /// The maker fee withheld.
        fee: Amount,
    },

    /// A resting maker order was cancelled, possibly after a partial claim.
    LimitMakerOrderCanceled {
        /// The cancelled order.
        order_id: OrderId,
        /// The order's owner, who received refund and proceeds.
        owner: AccountId,
        /// The order side.
        side: Side,
        /// The order's price.
        price: Price,
        /// Entry asset refunded for the unfilled residual.
        refund: Amount,
        /// Filled portion credited, net of the maker fee.
        claimed: Amount,
        /// The maker fee withheld from the claimed portion.
        fee: Amount,
    },

    /// Governance updated the fee rates or price precision.
    FeePolicyUpdated {
        /// New maker fee, in millionths.
        maker_fee: u32,
        /// New taker fee, in millionths.
        taker_fee: u32,
        /// New price precision.
        price_precision: u64,
    },
}

/// An emitted event plus its identity and commit-time timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct MarketObservation {
    /// Unique id for downstream dedup and correlation.
    pub id: Uuid,
    /// Milliseconds since the epoch at emission.
    pub timestamp: u64,
    /// The event payload.
    pub event: MarketEvent,
}

impl MarketObservation {
    pub(crate) fn now(event: MarketEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: current_time_millis(),
            event,
        }
    }
}

/// Listens to committed operations. Emission order matches the order the
/// state changes committed.
pub type EventListener = Arc<dyn Fn(&MarketObservation) + Send + Sync>;
