//! The pair engine: matching, liquidity accounting, claims and fees for a
//! single base/quote market.

pub mod book;
pub mod cancellation;
pub mod claim;
pub mod error;
pub mod events;
pub mod fees;
pub mod ledger;
pub mod manager;
pub mod matching;
mod num;
mod operations;
pub mod order_store;
pub mod price_book;
pub mod scaling;
pub mod segment_tree;
pub mod snapshot;
pub mod types;

mod tests;

pub use book::{Pair, PairConfig};
pub use error::BookError;
pub use types::{Amount, Fill, OrderId, Price, Side};
