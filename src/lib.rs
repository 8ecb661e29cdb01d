//! # Claim-Efficient Discrete-Price Order Book
//!
//! A limit order book with continuous matching for a single trading pair,
//! designed around one question: how do you let a maker claim or cancel a
//! partially filled resting order without rescanning every earlier order at
//! its price? The answer here is per-price liquidity watermarks plus a
//! two-level segment tree over per-order cancellations, which together
//! decide any claim in O(log N).
//!
//! ## Key Ideas
//!
//! - **Discrete price points**: orders rest at multiples of a configurable
//!   price precision. Each price point keeps four counters (resting and
//!   used liquidity per side) instead of an order queue.
//!
//! - **Fill watermark**: takers consume a level's resting liquidity and
//!   advance its `used` counter. A resting order snapshots the deposits
//!   ahead of it at rest time; once the watermark passes that range the
//!   order is fully filled, without the order ever being visited.
//!
//! - **Cancellation index**: cancelling an order records its unfilled
//!   amount in a segment tree addressed by the order's queue index. Later
//!   orders subtract the prefix sum of earlier cancellations from their
//!   position, so a cancel costs O(log N) and never rewrites the priority
//!   of anything behind it.
//!
//! - **Bounded matching**: one insertion visits at most five price points,
//!   keeping worst-case work per call constant-bounded.
//!
//! - **Atomic operations**: each public call validates everything, stages
//!   its single fallible ledger debit, and only then mutates state, so a
//!   failed call leaves no partial effects.
//!
//! Amounts and prices are 256-bit (`crypto_bigint::U256`); notional
//! products widen to 512 bits internally. Token custody stays behind the
//! [`AssetLedger`] trait.
//!
//! ## Example
//!
//! ```
//! use claimbook::prelude::*;
//! use crypto_bigint::U256;
//! use std::sync::Arc;
//!
//! let ledger = Arc::new(InMemoryLedger::new());
//! let base = AssetId(1);
//! let quote = AssetId(2);
//! let maker = AccountId(10);
//! let taker = AccountId(11);
//! ledger.mint(maker, base, U256::from(1_000_000_000_000_000_000u128));
//! ledger.mint(taker, quote, U256::from(200_000_000_000_000_000_000u128));
//!
//! let pair = Pair::new(
//!     PairConfig {
//!         base,
//!         quote,
//!         quote_unit: 1_000_000_000,
//!         maker_fee: 10,
//!         taker_fee: 20,
//!         price_precision: 1_000_000_000_000_000_000,
//!         governance: AccountId(0),
//!     },
//!     ledger.clone(),
//! )
//! .unwrap();
//!
//! // A sell rests, a crossing buy consumes it, the seller claims quote.
//! let price = U256::from(100_000_000_000_000_000_000u128); // 100 * 1e18
//! let amount = U256::from(1_000_000_000_000_000_000u128); // 1e18
//! let sell_id = pair
//!     .insert_limit_order(maker, Side::Sell, price, amount)
//!     .unwrap();
//! pair.insert_limit_order(taker, Side::Buy, price, amount)
//!     .unwrap();
//! pair.claim_order(maker, sell_id).unwrap();
//! assert!(ledger.balance(maker, quote) > U256::ZERO);
//! ```

pub mod pair;
pub mod prelude;
mod utils;

pub use pair::book::{Pair, PairConfig};
pub use pair::cancellation::CancellationIndex;
pub use pair::claim::ClaimStatus;
pub use pair::error::BookError;
pub use pair::events::{EventListener, MarketEvent, MarketObservation};
pub use pair::fees::{FEE_PRECISION, FeePolicy};
pub use pair::ledger::{
    AccountId, AssetId, AssetLedger, IdentityScaling, InMemoryLedger, LedgerError, ScalingPolicy,
};
pub use pair::manager::PairManager;
pub use pair::order_store::{OrderRecord, OrderStatus, OrderStore};
pub use pair::price_book::{LiquidityTransition, PriceBook, PricePoint};
pub use pair::scaling::{AmountScaler, DEFAULT_SCALE_QUANTUM};
pub use pair::segment_tree::{SegmentTree, TREE_CAPACITY};
pub use pair::snapshot::{PairSnapshot, PricePointSnapshot};
pub use pair::types::{
    Amount, Fill, MAX_MATCHED_PRICE_POINTS, OFFSET_PER_PRICE_POINT, OrderId, Price, Side,
};
pub use utils::current_time_millis;
