//! Multi-pair management with per-pair exclusive execution.
//!
//! A [`Pair`]'s operations are specified as serialized transactions; the
//! manager is the piece that makes that true when unrelated pairs are
//! multiplexed across threads. Each registered pair carries its own gate,
//! held for the full duration of every call routed through
//! [`PairManager::with_pair`].

use dashmap::DashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use super::book::{Pair, PairConfig};
use super::error::BookError;
use super::events::EventListener;
use super::ledger::AssetLedger;

struct ManagedPair {
    pair: Pair,
    gate: Mutex<()>,
}

/// A registry of named pairs sharing one external ledger.
#[derive(Default)]
pub struct PairManager {
    pairs: DashMap<String, Arc<ManagedPair>>,
}

impl PairManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pairs: DashMap::new(),
        }
    }

    /// Register a pair under `name`.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`Pair::new`].
    pub fn add_pair(
        &self,
        name: &str,
        config: PairConfig,
        ledger: Arc<dyn AssetLedger>,
    ) -> Result<(), BookError> {
        let pair = Pair::new(config, ledger)?;
        self.pairs.insert(
            name.to_string(),
            Arc::new(ManagedPair {
                pair,
                gate: Mutex::new(()),
            }),
        );
        info!("added pair: {name}");
        Ok(())
    }

    /// Register a pair under `name` with an event listener.
    ///
    /// # Errors
    ///
    /// Configuration errors from [`Pair::with_listener`].
    pub fn add_pair_with_listener(
        &self,
        name: &str,
        config: PairConfig,
        ledger: Arc<dyn AssetLedger>,
        listener: EventListener,
    ) -> Result<(), BookError> {
        let pair = Pair::with_listener(config, ledger, listener)?;
        self.pairs.insert(
            name.to_string(),
            Arc::new(ManagedPair {
                pair,
                gate: Mutex::new(()),
            }),
        );
        info!("added pair: {name}");
        Ok(())
    }

    /// Run `f` against the named pair while holding its exclusive gate.
    ///
    /// Returns `None` for an unknown name. Calls against different pairs
    /// proceed concurrently; calls against the same pair serialize.
    pub fn with_pair<R>(&self, name: &str, f: impl FnOnce(&Pair) -> R) -> Option<R> {
        let managed = self.pairs.get(name)?.value().clone();
        let _gate = managed.gate.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&managed.pair))
    }

    /// Whether a pair is registered under `name`.
    #[must_use]
    pub fn has_pair(&self, name: &str) -> bool {
        self.pairs.contains_key(name)
    }

    /// Names of all registered pairs.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.pairs.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Number of registered pairs.
    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    /// Unregister a pair. In-flight calls holding the gate finish first
    /// against their own clone of the registration.
    pub fn remove_pair(&self, name: &str) -> bool {
        self.pairs.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::ledger::{AccountId, AssetId, InMemoryLedger};
    use crate::pair::types::Side;
    use crypto_bigint::U256;

    fn config(base: u64, quote: u64) -> PairConfig {
        PairConfig {
            base: AssetId(base),
            quote: AssetId(quote),
            quote_unit: 1_000,
            maker_fee: 0,
            taker_fee: 0,
            price_precision: 10,
            governance: AccountId(0),
        }
    }

    #[test]
    fn test_register_and_route() {
        let manager = PairManager::new();
        let ledger = Arc::new(InMemoryLedger::new());
        manager
            .add_pair("ETH/USDC", config(1, 2), ledger.clone())
            .unwrap();
        manager.add_pair("WBTC/USDC", config(3, 2), ledger).unwrap();

        assert_eq!(manager.pair_count(), 2);
        assert!(manager.has_pair("ETH/USDC"));
        assert!(!manager.has_pair("DOGE/USDC"));
        let mut names = manager.names();
        names.sort();
        assert_eq!(names, vec!["ETH/USDC", "WBTC/USDC"]);

        let best = manager.with_pair("ETH/USDC", |pair| pair.best_bid());
        assert_eq!(best, Some(None));
        assert_eq!(manager.with_pair("DOGE/USDC", |_| ()), None);
    }

    #[test]
    fn test_operations_route_through_gate() {
        let manager = PairManager::new();
        let ledger = Arc::new(InMemoryLedger::new());
        let maker = AccountId(5);
        ledger.mint(maker, AssetId(1), U256::from(1_000u64));
        manager
            .add_pair("ETH/USDC", config(1, 2), ledger)
            .unwrap();

        let order_id = manager
            .with_pair("ETH/USDC", |pair| {
                pair.insert_limit_order(maker, Side::Sell, U256::from(100u64), U256::from(7u64))
            })
            .unwrap()
            .unwrap();
        assert_eq!(order_id, 0);
        assert_eq!(
            manager.with_pair("ETH/USDC", |pair| pair.best_ask()),
            Some(Some(U256::from(100u64)))
        );
    }

    #[test]
    fn test_remove_pair() {
        let manager = PairManager::new();
        let ledger = Arc::new(InMemoryLedger::new());
        manager.add_pair("ETH/USDC", config(1, 2), ledger).unwrap();
        assert!(manager.remove_pair("ETH/USDC"));
        assert!(!manager.remove_pair("ETH/USDC"));
        assert_eq!(manager.pair_count(), 0);
    }
}
