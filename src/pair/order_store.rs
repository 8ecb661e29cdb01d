//! Resting-order records and id assignment.

use dashmap::DashMap;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::ledger::AccountId;
use super::types::{Amount, OrderId, Price, Side};

/// Lifecycle status of a resting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OrderStatus {
    /// Resting; may be claimed or cancelled by its owner.
    Open,
    /// Fully claimed; terminal.
    Claimed,
    /// Cancelled, possibly after a partial claim; terminal.
    Canceled,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Open => write!(f, "open"),
            OrderStatus::Claimed => write!(f, "claimed"),
            OrderStatus::Canceled => write!(f, "canceled"),
        }
    }
}

/// A resting limit order.
///
/// `queue_index` is the order's zero-based index within its (price, side)
/// queue. `queue_position_ahead` snapshots the cumulative deposits ahead of
/// the order at rest time, in queue coordinates; together with the
/// cancellation index it determines how much of the fill watermark belongs
/// to this order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    /// Globally unique, monotonically assigned id.
    pub id: OrderId,
    /// The account credited on claim and refunded on cancel.
    pub owner: AccountId,
    /// Side of the book the order rests on.
    pub side: Side,
    /// The order's limit price.
    pub price: Price,
    /// Resting size in base units.
    pub token_amount: Amount,
    /// Zero-based index within the (price, side) queue.
    pub queue_index: u64,
    /// Cumulative deposits ahead of this order at rest time.
    pub queue_position_ahead: Amount,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Milliseconds since the epoch at rest time.
    pub created_at: u64,
}

/// Owns all order records for a pair and mints order ids.
///
/// Ids are minted for every accepted insert operation; a record exists only
/// when the operation left a resting residual.
#[derive(Debug, Default)]
pub struct OrderStore {
    orders: DashMap<OrderId, OrderRecord>,
    next_id: AtomicU64,
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Mint the next order id.
    pub(crate) fn next_id(&self) -> OrderId {
        self.next_id.fetch_add(1, Ordering::AcqRel)
    }

    /// Ids minted so far.
    #[must_use]
    pub fn minted(&self) -> u64 {
        self.next_id.load(Ordering::Acquire)
    }

    /// Number of stored records, across all statuses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether no records are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub(crate) fn insert(&self, record: OrderRecord) {
        self.orders.insert(record.id, record);
    }

    /// Fetch a copy of the record for `id`.
    #[must_use]
    pub fn get(&self, id: OrderId) -> Option<OrderRecord> {
        self.orders.get(&id).map(|entry| entry.value().clone())
    }

    pub(crate) fn set_status(&self, id: OrderId, status: OrderStatus) {
        if let Some(mut entry) = self.orders.get_mut(&id) {
            entry.value_mut().status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_bigint::U256;

    fn record(id: OrderId) -> OrderRecord {
        OrderRecord {
            id,
            owner: AccountId(7),
            side: Side::Sell,
            price: U256::from(100u64),
            token_amount: U256::from(5u64),
            queue_index: 0,
            queue_position_ahead: U256::ZERO,
            status: OrderStatus::Open,
            created_at: 0,
        }
    }

    #[test]
    fn test_ids_are_monotonic_from_zero() {
        let store = OrderStore::new();
        assert_eq!(store.next_id(), 0);
        assert_eq!(store.next_id(), 1);
        assert_eq!(store.next_id(), 2);
        assert_eq!(store.minted(), 3);
    }

    #[test]
    fn test_insert_and_status_transition() {
        let store = OrderStore::new();
        store.insert(record(0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().status, OrderStatus::Open);

        store.set_status(0, OrderStatus::Claimed);
        assert_eq!(store.get(0).unwrap().status, OrderStatus::Claimed);
    }

    #[test]
    fn test_missing_order() {
        let store = OrderStore::new();
        assert!(store.get(42).is_none());
        // Setting status on a missing id is a no-op.
        store.set_status(42, OrderStatus::Canceled);
        assert!(store.is_empty());
    }
}
