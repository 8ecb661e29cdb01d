//! Convenience re-exports for the common path: build a ledger, configure a
//! pair, trade against it.
//!
//! ```
//! use claimbook::prelude::*;
//! ```

pub use crate::pair::book::{Pair, PairConfig};
pub use crate::pair::claim::ClaimStatus;
pub use crate::pair::error::BookError;
pub use crate::pair::events::{EventListener, MarketEvent, MarketObservation};
pub use crate::pair::fees::{FEE_PRECISION, FeePolicy};
pub use crate::pair::ledger::{
    AccountId, AssetId, AssetLedger, InMemoryLedger, LedgerError, ScalingPolicy,
};
pub use crate::pair::manager::PairManager;
pub use crate::pair::order_store::{OrderRecord, OrderStatus};
pub use crate::pair::snapshot::PairSnapshot;
pub use crate::pair::types::{Amount, Fill, OrderId, Price, Side};
