//! Observability events for the SigVault audit trail.
//!
//! Every successful state-changing call appends its events to an
//! [`EventJournal`]; failed calls append nothing. The journal is
//! append-only and shared (`Arc`) between the custody ledger and its
//! validator so one log shows the full debit sequence.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, PermissionId};

/// An observable state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultEvent {
    /// Value was credited to custody.
    FundsDeposited {
        depositor: AccountId,
        amount: u128,
        new_balance: u128,
    },
    /// A permission transitioned to consumed.
    PermissionConsumed {
        permission_id: PermissionId,
        recipient: AccountId,
        amount: u128,
    },
    /// Value was released from custody to a recipient.
    FundsWithdrawn {
        recipient: AccountId,
        amount: u128,
        nonce: u64,
        remaining_balance: u128,
    },
}

impl VaultEvent {
    /// Stable event name, as used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FundsDeposited { .. } => "FUNDS_DEPOSITED",
            Self::PermissionConsumed { .. } => "PERMISSION_CONSUMED",
            Self::FundsWithdrawn { .. } => "FUNDS_WITHDRAWN",
        }
    }
}

impl std::fmt::Display for VaultEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A journal entry: the event plus its position and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    /// Zero-based position in the journal.
    pub sequence: u64,
    pub event: VaultEvent,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only event log.
#[derive(Debug, Default)]
pub struct EventJournal {
    entries: Mutex<Vec<RecordedEvent>>,
}

impl EventJournal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn record(&self, event: VaultEvent) -> u64 {
        // A push either happened or it didn't; a poisoned guard is still consistent.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = entries.len() as u64;
        entries.push(RecordedEvent {
            sequence,
            event,
            recorded_at: Utc::now(),
        });
        sequence
    }

    /// Copy of every entry, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<RecordedEvent> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Just the events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<VaultEvent> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|entry| entry.event.clone())
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries with the given event name.
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|entry| entry.event.name() == name)
            .count()
    }
}
