//! Two-level cancellation index per price point and side.

use std::collections::HashMap;

use super::error::BookError;
use super::segment_tree::{SegmentTree, TREE_CAPACITY};
use super::types::{OFFSET_PER_PRICE_POINT, Price, Side};

/// Trees for one (price, side) queue: inner trees hold per-order cancelled
/// amounts in 64-bit tree units, bucketed by queue index; the outer tree
/// aggregates bucket totals so prefix sums spanning buckets stay O(log N).
#[derive(Debug, Default)]
struct QueueTrees {
    outer: SegmentTree,
    inner: HashMap<u32, SegmentTree>,
}

/// Records, per (price, side), the scaled-down amount each resting order
/// cancelled, addressable by the order's index in its queue. Answers
/// "how much was cancelled at indices strictly before `k`" in O(log N),
/// which is what makes claim decisions cheap without rescanning the queue.
#[derive(Debug, Default)]
pub struct CancellationIndex {
    queues: HashMap<(Price, Side), QueueTrees>,
}

impl CancellationIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            queues: HashMap::new(),
        }
    }

    #[inline]
    fn split_index(index: u64) -> Result<(usize, usize), BookError> {
        let bucket = index / OFFSET_PER_PRICE_POINT;
        let position = index % OFFSET_PER_PRICE_POINT;
        if bucket >= TREE_CAPACITY as u64 {
            return Err(BookError::TreeIndexOutOfRange { index });
        }
        Ok((bucket as usize, position as usize))
    }

    /// Record the scaled-down cancelled amount for the order at `index`.
    ///
    /// Overwrites any previous value at that index (an order cancels at
    /// most once). Both tree levels are validated before either mutates,
    /// so a failed record leaves the index untouched.
    ///
    /// # Errors
    ///
    /// `TreeIndexOutOfRange` for an index beyond the addressable range,
    /// `Overflow` if a bucket or the outer aggregate would exceed 64 bits.
    pub fn record(
        &mut self,
        price: Price,
        side: Side,
        index: u64,
        raw_amount: u64,
    ) -> Result<(), BookError> {
        let (bucket, position) = Self::split_index(index)?;
        let queue = self.queues.entry((price, side)).or_default();
        let tree = queue.inner.entry(bucket as u32).or_default();

        tree.check_update(position, raw_amount)?;
        let old_leaf = tree.get(position);
        let bucket_total = if raw_amount >= old_leaf {
            tree.total()
                .checked_add(raw_amount - old_leaf)
                .ok_or(BookError::Overflow)?
        } else {
            tree.total() - (old_leaf - raw_amount)
        };
        queue.outer.check_update(bucket, bucket_total)?;

        tree.apply_update(position, raw_amount);
        queue.outer.apply_update(bucket, bucket_total);
        Ok(())
    }

    /// Sum of cancelled tree units at queue indices strictly before
    /// `index`, for the given (price, side).
    ///
    /// # Errors
    ///
    /// `Overflow` if the prefix sum saturates 64 bits.
    pub fn cumulative_before(
        &self,
        price: Price,
        side: Side,
        index: u64,
    ) -> Result<u64, BookError> {
        let (bucket, position) = Self::split_index(index)?;
        let Some(queue) = self.queues.get(&(price, side)) else {
            return Ok(0);
        };
        let earlier_buckets = queue.outer.query(0, bucket);
        let within_bucket = queue
            .inner
            .get(&(bucket as u32))
            .map_or(0, |tree| tree.query(0, position));
        earlier_buckets
            .checked_add(within_bucket)
            .ok_or(BookError::Overflow)
    }

    /// The recorded cancelled tree units for a single order index.
    #[must_use]
    pub fn recorded(&self, price: Price, side: Side, index: u64) -> u64 {
        let Ok((bucket, position)) = Self::split_index(index) else {
            return 0;
        };
        self.queues
            .get(&(price, side))
            .and_then(|queue| queue.inner.get(&(bucket as u32)))
            .map_or(0, |tree| tree.get(position))
    }

    /// Total cancelled tree units across a whole (price, side) queue.
    #[must_use]
    pub fn total(&self, price: Price, side: Side) -> u64 {
        self.queues
            .get(&(price, side))
            .map_or(0, |queue| queue.outer.total())
    }
}
