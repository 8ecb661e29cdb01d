//! Pair engine error types.

use std::fmt;

use super::ledger::{AccountId, LedgerError};
use super::order_store::OrderStatus;
use super::types::{OrderId, Price};

/// Errors that can occur within the pair engine.
///
/// Every error aborts its operation atomically: no state change and no
/// external ledger effect survives a failed call.
#[derive(Debug)]
#[non_exhaustive]
pub enum BookError {
    /// A market order matched a level beyond the caller's worst-price bound.
    ExceedWorstPrice {
        /// The caller's bound.
        worst: Price,
        /// The offending matched level.
        offered: Price,
    },

    /// A market order could not fully fill within the matching window.
    NotEnoughLiquidity,

    /// Claim or cancel attempted on an order that is not open.
    InvalidOrderStatus {
        /// The order in question.
        order_id: OrderId,
        /// Its current status.
        status: OrderStatus,
    },

    /// `claim_order` on a partially filled order; the owner must cancel
    /// instead, which pays out the filled portion and refunds the rest.
    NotFullyClaimable {
        /// The order in question.
        order_id: OrderId,
    },

    /// No order record exists under this id. Fully matched inserts mint an
    /// id without creating a resting record.
    OrderNotFound(OrderId),

    /// A gated operation was invoked by an account without the capability,
    /// or an owner handle did not match the order's owner.
    InvalidCaller(AccountId),

    /// Order price is zero or not a multiple of the configured precision.
    InvalidPrice {
        /// The rejected price.
        price: Price,
        /// The configured price precision.
        precision: u64,
    },

    /// Order amount is zero.
    InvalidAmount,

    /// Fee rate at or above the fee precision (100%).
    InvalidFeeRate {
        /// The rejected rate, in millionths.
        rate: u32,
    },

    /// Price precision must be a non-zero value that fits one 64-bit limb.
    InvalidPricePrecision {
        /// The rejected precision.
        precision: u64,
    },

    /// A segment tree index outside the fixed capacity. Indicates either a
    /// price point exhausting its addressable order indices or internal
    /// misuse.
    TreeIndexOutOfRange {
        /// The rejected index.
        index: u64,
    },

    /// 64- or 256-bit arithmetic saturation reached.
    Overflow,

    /// A subtraction would have gone negative; invariant violation.
    Underflow,

    /// Propagated from the external asset ledger; never swallowed.
    Ledger(LedgerError),
}

impl fmt::Display for BookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookError::ExceedWorstPrice { worst, offered } => {
                write!(
                    f,
                    "matched price {offered:?} is beyond the worst-price bound {worst:?}"
                )
            }
            BookError::NotEnoughLiquidity => {
                write!(f, "not enough liquidity within the matching window")
            }
            BookError::InvalidOrderStatus { order_id, status } => {
                write!(f, "order {order_id} is {status}, expected open")
            }
            BookError::NotFullyClaimable { order_id } => {
                write!(
                    f,
                    "order {order_id} is not fully claimable; cancel it to collect the filled portion"
                )
            }
            BookError::OrderNotFound(order_id) => {
                write!(f, "order not found: {order_id}")
            }
            BookError::InvalidCaller(account) => {
                write!(f, "caller {account} is not permitted for this operation")
            }
            BookError::InvalidPrice { price, precision } => {
                write!(
                    f,
                    "invalid price {price:?}: must be a non-zero multiple of {precision}"
                )
            }
            BookError::InvalidAmount => write!(f, "order amount must be non-zero"),
            BookError::InvalidFeeRate { rate } => {
                write!(f, "invalid fee rate {rate}: must be below the fee precision")
            }
            BookError::InvalidPricePrecision { precision } => {
                write!(f, "invalid price precision {precision}")
            }
            BookError::TreeIndexOutOfRange { index } => {
                write!(f, "segment tree index {index} out of range")
            }
            BookError::Overflow => write!(f, "arithmetic overflow"),
            BookError::Underflow => write!(f, "arithmetic underflow"),
            BookError::Ledger(err) => write!(f, "ledger error: {err}"),
        }
    }
}

impl std::error::Error for BookError {}

impl From<LedgerError> for BookError {
    #[cold]
    fn from(err: LedgerError) -> Self {
        BookError::Ledger(err)
    }
}
