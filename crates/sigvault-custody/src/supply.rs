//! Supply conservation invariant checker.
//!
//! Enforced for every custody instance:
//! ```text
//! tracked balance == custodial balance == Σ(credits) - Σ(successful debits)
//! ```
//!
//! If this ever breaks, value was created or destroyed outside the two
//! sanctioned paths.

use sigvault_types::{Result, SigvaultError};

/// Running credit/debit totals for one custody instance.
///
/// `Copy` so callers can stage an update and only keep it once every
/// other step of the operation succeeded.
///
/// Both totals are lifetime sums in `u128`, so they bound the custody
/// instance: once Σcredits would pass `u128::MAX`, further credits are
/// refused with `BalanceOverflow` even if the current balance is low.
/// Keeping exact totals is what lets `verify` detect drift.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SupplyConservation {
    credits: u128,
    debits: u128,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a credit.
    ///
    /// # Errors
    /// [`SigvaultError::BalanceOverflow`] if the lifetime credit total
    /// would not fit.
    pub fn record_credit(&mut self, amount: u128) -> Result<()> {
        self.credits = self
            .credits
            .checked_add(amount)
            .ok_or(SigvaultError::BalanceOverflow)?;
        Ok(())
    }

    /// Record a successful debit.
    pub fn record_debit(&mut self, amount: u128) -> Result<()> {
        let debits = self
            .debits
            .checked_add(amount)
            .ok_or(SigvaultError::BalanceOverflow)?;
        if debits > self.credits {
            return Err(SigvaultError::SupplyInvariantViolation {
                reason: format!("debits {debits} would exceed credits {}", self.credits),
            });
        }
        self.debits = debits;
        Ok(())
    }

    /// Expected balance: credits - debits.
    #[must_use]
    pub fn expected(&self) -> u128 {
        self.credits - self.debits
    }

    /// Verify both balance figures against the totals.
    ///
    /// # Errors
    /// [`SigvaultError::SupplyInvariantViolation`] if either differs.
    pub fn verify(&self, tracked: u128, custodial: u128) -> Result<()> {
        let expected = self.expected();
        if tracked != expected || custodial != expected {
            return Err(SigvaultError::SupplyInvariantViolation {
                reason: format!(
                    "tracked {tracked}, custodial {custodial}, expected {expected} \
                     (credits={}, debits={})",
                    self.credits, self.debits
                ),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn total_credits(&self) -> u128 {
        self.credits
    }

    #[must_use]
    pub fn total_debits(&self) -> u128 {
        self.debits
    }
}
