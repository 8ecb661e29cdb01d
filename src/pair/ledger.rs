//! The external asset ledger seam.
//!
//! Token custody lives outside the pair. The engine only needs two moves:
//! pull an asset from an account (fallible) and push an asset to an account
//! (infallible). Operations stage their single debit after all validation
//! and before any state mutation, so a rejected debit aborts cleanly and
//! credits can never fail a half-committed operation.

use crossbeam::atomic::AtomicCell;
use crypto_bigint::{CheckedSub, U256};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::Amount;

/// Opaque account handle. Caller authentication happens upstream; the pair
/// only compares handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account:{}", self.0)
    }
}

/// Opaque asset handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset:{}", self.0)
    }
}

/// Errors surfaced by an [`AssetLedger`] debit.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    /// The account does not hold the requested amount of the asset.
    InsufficientBalance {
        /// The debited account.
        account: AccountId,
        /// The debited asset.
        asset: AssetId,
    },
    /// The ledger rejected the transfer for a reason of its own.
    Rejected {
        /// Ledger-provided description.
        message: String,
    },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::InsufficientBalance { account, asset } => {
                write!(f, "insufficient balance of {asset} in {account}")
            }
            LedgerError::Rejected { message } => write!(f, "transfer rejected: {message}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Asset custody as the pair sees it.
///
/// `credit` must not fail: the pair orders its effects so every credit
/// follows a successful debit of equal or greater value, and a custody
/// layer that can lose credits cannot host a book.
pub trait AssetLedger: Send + Sync {
    /// Pull `amount` of `asset` from `account`.
    ///
    /// # Errors
    ///
    /// Any [`LedgerError`]; the pair aborts the surrounding operation.
    fn debit(&self, account: AccountId, asset: AssetId, amount: Amount)
    -> Result<(), LedgerError>;

    /// Push `amount` of `asset` to `account`. Infallible by contract.
    fn credit(&self, account: AccountId, asset: AssetId, amount: Amount);
}

/// Normalizes foreign token amounts to the canonical 18-decimal
/// representation and back. The pair core consumes canonical amounts only;
/// adapters wrap their [`AssetLedger`] with a policy when a token's native
/// scale differs.
pub trait ScalingPolicy: Send + Sync {
    /// Convert a native `asset` amount to canonical units.
    fn to_canonical(&self, asset: AssetId, amount: Amount) -> Amount;

    /// Convert a canonical amount back to the native `asset` scale.
    fn from_canonical(&self, asset: AssetId, amount: Amount) -> Amount;
}

/// The identity policy for tokens already carrying 18 decimals.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityScaling;

impl ScalingPolicy for IdentityScaling {
    fn to_canonical(&self, _asset: AssetId, amount: Amount) -> Amount {
        amount
    }

    fn from_canonical(&self, _asset: AssetId, amount: Amount) -> Amount {
        amount
    }
}

/// An in-process ledger keyed by (account, asset), for tests, demos and
/// single-process deployments.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: DashMap<(AccountId, AssetId), AtomicCell<Amount>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// Current balance of `asset` in `account`.
    #[must_use]
    pub fn balance(&self, account: AccountId, asset: AssetId) -> Amount {
        self.balances
            .get(&(account, asset))
            .map_or(U256::ZERO, |cell| cell.load())
    }

    /// Mint `amount` of `asset` into `account`.
    pub fn mint(&self, account: AccountId, asset: AssetId, amount: Amount) {
        self.credit(account, asset, amount);
    }
}

impl AssetLedger for InMemoryLedger {
    fn debit(
        &self,
        account: AccountId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let entry = self
            .balances
            .get(&(account, asset))
            .ok_or(LedgerError::InsufficientBalance { account, asset })?;
        let current = entry.load();
        let next: Option<Amount> = Option::from(current.checked_sub(&amount));
        match next {
            Some(next) => {
                entry.store(next);
                Ok(())
            }
            None => Err(LedgerError::InsufficientBalance { account, asset }),
        }
    }

    fn credit(&self, account: AccountId, asset: AssetId, amount: Amount) {
        let entry = self
            .balances
            .entry((account, asset))
            .or_insert_with(|| AtomicCell::new(U256::ZERO));
        let current = entry.load();
        entry.store(current.saturating_add(&amount));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AccountId = AccountId(1);
    const GOLD: AssetId = AssetId(10);

    #[test]
    fn test_mint_and_balance() {
        let ledger = InMemoryLedger::new();
        assert_eq!(ledger.balance(ALICE, GOLD), U256::ZERO);
        ledger.mint(ALICE, GOLD, U256::from(100u64));
        assert_eq!(ledger.balance(ALICE, GOLD), U256::from(100u64));
    }

    #[test]
    fn test_debit_and_credit_round_trip() {
        let ledger = InMemoryLedger::new();
        ledger.mint(ALICE, GOLD, U256::from(100u64));
        ledger.debit(ALICE, GOLD, U256::from(40u64)).unwrap();
        assert_eq!(ledger.balance(ALICE, GOLD), U256::from(60u64));
        ledger.credit(ALICE, GOLD, U256::from(40u64));
        assert_eq!(ledger.balance(ALICE, GOLD), U256::from(100u64));
    }

    #[test]
    fn test_overdraft_rejected() {
        let ledger = InMemoryLedger::new();
        ledger.mint(ALICE, GOLD, U256::from(10u64));
        let err = ledger.debit(ALICE, GOLD, U256::from(11u64)).unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        // The failed debit must not have touched the balance.
        assert_eq!(ledger.balance(ALICE, GOLD), U256::from(10u64));
    }

    #[test]
    fn test_unknown_account_rejected() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.debit(ALICE, GOLD, U256::from(1u64)).is_err());
    }

    #[test]
    fn test_identity_scaling() {
        let policy = IdentityScaling;
        let amount = U256::from(123u64);
        assert_eq!(policy.to_canonical(GOLD, amount), amount);
        assert_eq!(policy.from_canonical(GOLD, amount), amount);
    }
}
