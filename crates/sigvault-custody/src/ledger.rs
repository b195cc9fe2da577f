//! Custody ledger: holds value, releases it only on validator approval.
//!
//! ## Debit sequence
//!
//! 1. Reject zero amounts and null / self recipients
//! 2. Check the amount against both the tracked and the custodial balance
//! 3. Decrement the tracked balance
//! 4. Hand the validator a settlement step that releases the value through
//!    the funds rail; the validator verifies, runs it, and only then marks
//!    the permission spent
//! 5. Emit `FundsWithdrawn`
//!
//! If the release fails, the validator leaves the permission unconsumed
//! and the decrement is restored before `TransferFailed` is returned: the
//! call leaves no trace. The whole sequence runs under the ledger's lock;
//! the validator's lock is taken inside it and the rail's inside that.

use std::sync::{Arc, Mutex, MutexGuard};

use sigvault_types::{
    AccountId, CustodyConfig, EventJournal, PermissionId, Proof, Result, SigvaultError,
    VaultEvent,
};
use sigvault_validator::PermissionValidator;

use crate::rail::{FundsRail, InMemoryRail};
use crate::supply::SupplyConservation;

/// Both balance figures of a custody instance. Always equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustodyBalances {
    /// The ledger's own running figure.
    pub tracked: u128,
    /// What the funds rail actually holds for this custody.
    pub custodial: u128,
}

#[derive(Debug, Default)]
struct CustodyState {
    balance: u128,
    supply: SupplyConservation,
}

/// A custody instance.
pub struct CustodyLedger {
    custody_id: AccountId,
    validator: Arc<dyn PermissionValidator>,
    rail: Arc<dyn FundsRail>,
    journal: Arc<EventJournal>,
    state: Mutex<CustodyState>,
}

impl CustodyLedger {
    #[must_use]
    pub fn builder() -> CustodyLedgerBuilder {
        CustodyLedgerBuilder::default()
    }

    /// Build from configuration with a fresh in-memory rail and journal.
    pub fn new(config: &CustodyConfig, validator: Arc<dyn PermissionValidator>) -> Result<Self> {
        Self::builder().config(config).validator(validator).build()
    }

    /// Accept `amount` from `depositor`. No authorization required.
    ///
    /// Returns the new balance.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount` is zero or the depositor is null
    /// - `BalanceOverflow` if the balance would overflow, or if lifetime
    ///   credits would pass `u128::MAX` (see [`SupplyConservation`])
    pub fn credit(&self, depositor: AccountId, amount: u128) -> Result<u128> {
        if amount == 0 {
            return Err(SigvaultError::InvalidAmount {
                reason: "credit amount is zero".into(),
            });
        }
        if depositor.is_null() {
            return Err(SigvaultError::InvalidAmount {
                reason: "depositor is null".into(),
            });
        }

        let mut state = self.state()?;
        let new_balance = state
            .balance
            .checked_add(amount)
            .ok_or(SigvaultError::BalanceOverflow)?;
        let mut supply = state.supply;
        supply.record_credit(amount)?;

        self.rail.receive(&self.custody_id, &depositor, amount)?;

        state.balance = new_balance;
        state.supply = supply;
        self.journal.record(VaultEvent::FundsDeposited {
            depositor,
            amount,
            new_balance,
        });
        drop(state);

        tracing::info!(
            custody = %self.custody_id,
            depositor = %depositor,
            amount,
            new_balance,
            "Funds deposited"
        );
        Ok(new_balance)
    }

    /// Release `amount` to `recipient` under a proof from the authorizer.
    ///
    /// Anyone may submit the call; the proof binds the recipient.
    /// Returns the consumed permission id.
    ///
    /// # Errors
    /// - `InvalidAmount` for a zero amount, a null recipient, or this
    ///   custody instance as recipient
    /// - `InsufficientBalance` if custody cannot cover `amount`
    /// - `Unauthorized` wrapping the validator's `AlreadyConsumed` or
    ///   `InvalidProof`
    /// - `TransferFailed` if the rail could not deliver; nothing changed
    pub fn debit(
        &self,
        recipient: AccountId,
        amount: u128,
        nonce: u64,
        proof: &Proof,
    ) -> Result<PermissionId> {
        if amount == 0 {
            return Err(SigvaultError::InvalidAmount {
                reason: "debit amount is zero".into(),
            });
        }
        if recipient.is_null() {
            return Err(SigvaultError::InvalidAmount {
                reason: "recipient is null".into(),
            });
        }
        if recipient == self.custody_id {
            return Err(SigvaultError::InvalidAmount {
                reason: "recipient is the custody instance itself".into(),
            });
        }

        let mut state = self.state()?;

        let custodial = self.rail.balance_of(&self.custody_id)?;
        let available = state.balance.min(custodial);
        if available < amount {
            tracing::warn!(
                custody = %self.custody_id,
                recipient = %recipient,
                amount,
                tracked = state.balance,
                custodial,
                "Debit refused: insufficient balance"
            );
            return Err(SigvaultError::InsufficientBalance {
                needed: amount,
                available,
            });
        }

        let mut supply = state.supply;
        supply.record_debit(amount)?;

        // State change strictly precedes the value release.
        state.balance -= amount;

        let rail = &self.rail;
        let custody_id = self.custody_id;
        let outcome = self.validator.verify_and_consume_with(
            custody_id,
            recipient,
            amount,
            nonce,
            proof,
            &mut |_| match rail.release(&custody_id, &recipient, amount) {
                Ok(()) => Ok(()),
                Err(transfer @ SigvaultError::TransferFailed { .. }) => Err(transfer),
                Err(other) => Err(SigvaultError::TransferFailed {
                    reason: other.to_string(),
                }),
            },
        );

        let permission_id = match outcome {
            Ok(id) => id,
            Err(err) => {
                state.balance += amount;
                return Err(match err {
                    transfer @ SigvaultError::TransferFailed { .. } => {
                        tracing::warn!(
                            custody = %self.custody_id,
                            recipient = %recipient,
                            amount,
                            nonce,
                            error = %transfer,
                            "Value release failed, debit rolled back"
                        );
                        transfer
                    }
                    refused => SigvaultError::unauthorized(refused),
                });
            }
        };

        state.supply = supply;
        let remaining_balance = state.balance;
        self.journal.record(VaultEvent::FundsWithdrawn {
            recipient,
            amount,
            nonce,
            remaining_balance,
        });
        drop(state);

        tracing::info!(
            custody = %self.custody_id,
            recipient = %recipient,
            amount,
            nonce,
            remaining_balance,
            permission = %permission_id,
            "Funds withdrawn"
        );
        Ok(permission_id)
    }

    /// The tracked balance.
    pub fn balance(&self) -> Result<u128> {
        Ok(self.state()?.balance)
    }

    /// The raw balance the rail holds for this custody.
    pub fn custodial_balance(&self) -> Result<u128> {
        self.rail.balance_of(&self.custody_id)
    }

    /// Both figures read under the ledger lock.
    pub fn balances(&self) -> Result<CustodyBalances> {
        let state = self.state()?;
        Ok(CustodyBalances {
            tracked: state.balance,
            custodial: self.rail.balance_of(&self.custody_id)?,
        })
    }

    /// Check `tracked == custodial == credits - debits`.
    pub fn verify_conservation(&self) -> Result<()> {
        let state = self.state()?;
        let custodial = self.rail.balance_of(&self.custody_id)?;
        state.supply.verify(state.balance, custodial)
    }

    /// Permission id a debit with these parameters would consume.
    #[must_use]
    pub fn permission_id(&self, recipient: AccountId, amount: u128, nonce: u64) -> PermissionId {
        self.validator
            .permission_id(self.custody_id, recipient, amount, nonce)
    }

    /// Whether the permission has been spent.
    #[must_use]
    pub fn is_permission_consumed(&self, id: &PermissionId) -> bool {
        self.validator.is_consumed(id)
    }

    #[must_use]
    pub fn custody_id(&self) -> AccountId {
        self.custody_id
    }

    #[must_use]
    pub fn journal(&self) -> &Arc<EventJournal> {
        &self.journal
    }

    /// Lifetime credit/debit totals.
    pub fn supply(&self) -> Result<SupplyConservation> {
        Ok(self.state()?.supply)
    }

    fn state(&self) -> Result<MutexGuard<'_, CustodyState>> {
        self.state
            .lock()
            .map_err(|_| SigvaultError::Internal("custody ledger lock poisoned".into()))
    }
}

impl std::fmt::Debug for CustodyLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyLedger")
            .field("custody_id", &self.custody_id)
            .field("network", &self.validator.network())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`CustodyLedger`]. The validator and custody id are required.
#[derive(Default)]
pub struct CustodyLedgerBuilder {
    custody_id: Option<AccountId>,
    validator: Option<Arc<dyn PermissionValidator>>,
    rail: Option<Arc<dyn FundsRail>>,
    journal: Option<Arc<EventJournal>>,
}

impl CustodyLedgerBuilder {
    #[must_use]
    pub fn config(mut self, config: &CustodyConfig) -> Self {
        self.custody_id = Some(config.custody_id);
        self
    }

    #[must_use]
    pub fn custody_id(mut self, custody_id: AccountId) -> Self {
        self.custody_id = Some(custody_id);
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn PermissionValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn rail(mut self, rail: Arc<dyn FundsRail>) -> Self {
        self.rail = Some(rail);
        self
    }

    #[must_use]
    pub fn journal(mut self, journal: Arc<EventJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// # Errors
    /// - `NullCustodyId` if no (or the null) custody id was given
    /// - `MissingValidator` if no validator was given
    /// - `Configuration` if the rail already holds value for this custody id
    pub fn build(self) -> Result<CustodyLedger> {
        let custody_id = self.custody_id.ok_or(SigvaultError::NullCustodyId)?;
        CustodyConfig::new(custody_id).validate()?;
        let validator = self.validator.ok_or(SigvaultError::MissingValidator)?;
        let rail = self
            .rail
            .unwrap_or_else(|| Arc::new(InMemoryRail::new()) as Arc<dyn FundsRail>);

        let held = rail.balance_of(&custody_id)?;
        if held != 0 {
            return Err(SigvaultError::Configuration(format!(
                "custody {custody_id} already holds {held} on the rail"
            )));
        }

        tracing::info!(
            custody = %custody_id,
            network = %validator.network(),
            "Custody ledger initialised"
        );
        Ok(CustodyLedger {
            custody_id,
            validator,
            rail,
            journal: self.journal.unwrap_or_default(),
            state: Mutex::new(CustodyState::default()),
        })
    }
}
