//! Funds rail: where custodial value actually lives.
//!
//! The custody ledger tracks its balance itself, but the value is held by
//! a rail (a chain, a bank ledger, an in-memory book). The ledger's
//! "custodial balance" query reads the rail, and a debit is not complete
//! until the rail has released the value to the recipient.
//!
//! Rails are not transactional. The custody ledger compensates for that.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use sigvault_types::{AccountId, Result, SigvaultError};

/// Value movement into and out of custody.
pub trait FundsRail: Send + Sync {
    /// Raw value currently held by `account`.
    fn balance_of(&self, account: &AccountId) -> Result<u128>;

    /// Value attached by `from` arrives in `custody`.
    fn receive(&self, custody: &AccountId, from: &AccountId, amount: u128) -> Result<()>;

    /// Move `amount` from `custody` to `to`.
    ///
    /// # Errors
    /// [`SigvaultError::TransferFailed`] if the value could not be delivered.
    /// A failed release must not have moved any value.
    fn release(&self, custody: &AccountId, to: &AccountId, amount: u128) -> Result<()>;
}

#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, u128>,
    rejecting: HashSet<AccountId>,
}

/// In-memory rail: one balance per account.
///
/// Recipients can be marked as rejecting to model a destination that
/// refuses incoming value.
#[derive(Debug, Default)]
pub struct InMemoryRail {
    book: Mutex<Book>,
}

impl InMemoryRail {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future release to `account` fail.
    pub fn reject_incoming(&self, account: AccountId) -> Result<()> {
        self.book()?.rejecting.insert(account);
        Ok(())
    }

    /// Undo [`reject_incoming`](Self::reject_incoming).
    pub fn accept_incoming(&self, account: &AccountId) -> Result<()> {
        self.book()?.rejecting.remove(account);
        Ok(())
    }

    /// Sum of every account balance on the rail.
    pub fn total_supply(&self) -> Result<u128> {
        self.book()?
            .balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
            .ok_or(SigvaultError::BalanceOverflow)
    }

    fn book(&self) -> Result<MutexGuard<'_, Book>> {
        self.book
            .lock()
            .map_err(|_| SigvaultError::Internal("funds rail lock poisoned".into()))
    }
}

impl FundsRail for InMemoryRail {
    fn balance_of(&self, account: &AccountId) -> Result<u128> {
        Ok(self.book()?.balances.get(account).copied().unwrap_or(0))
    }

    fn receive(&self, custody: &AccountId, _from: &AccountId, amount: u128) -> Result<()> {
        let mut book = self.book()?;
        let entry = book.balances.entry(*custody).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(SigvaultError::BalanceOverflow)?;
        Ok(())
    }

    fn release(&self, custody: &AccountId, to: &AccountId, amount: u128) -> Result<()> {
        let mut book = self.book()?;

        if book.rejecting.contains(to) {
            return Err(SigvaultError::TransferFailed {
                reason: format!("recipient {to} refused {amount}"),
            });
        }

        let held = book.balances.get(custody).copied().unwrap_or(0);
        let remaining = held
            .checked_sub(amount)
            .ok_or_else(|| SigvaultError::TransferFailed {
                reason: format!("custody {custody} holds {held}, cannot release {amount}"),
            })?;
        if custody == to {
            return Ok(());
        }
        let received = book
            .balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| SigvaultError::TransferFailed {
                reason: format!("recipient {to} balance would overflow"),
            })?;

        book.balances.insert(*custody, remaining);
        book.balances.insert(*to, received);
        Ok(())
    }
}
