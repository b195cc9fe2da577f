//! Consumption ledger: each permission id is spent at most once.
//!
//! Like a UTXO set: an id that reached CONSUMED can never be used again.
//! Attempting to consume it again returns [`SigvaultError::AlreadyConsumed`].
//!
//! Unlike a settlement cache, entries are never evicted: forgetting a
//! consumed id would make its proof replayable.

use std::collections::HashMap;

use sigvault_types::{ConsumptionState, PermissionId, Result, SigvaultError};

/// Tracks the [`ConsumptionState`] of every permission id ever referenced.
///
/// Ids that are absent are `Unconsumed`.
#[derive(Debug, Default)]
pub struct ConsumptionLedger {
    entries: HashMap<PermissionId, ConsumptionState>,
    consumed: usize,
}

impl ConsumptionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of an id.
    #[must_use]
    pub fn state(&self, id: &PermissionId) -> ConsumptionState {
        self.entries
            .get(id)
            .copied()
            .unwrap_or(ConsumptionState::Unconsumed)
    }

    /// Whether an id has been spent.
    #[must_use]
    pub fn is_consumed(&self, id: &PermissionId) -> bool {
        self.state(id) == ConsumptionState::Consumed
    }

    /// Refuse the id if it is spent.
    ///
    /// # Errors
    /// Returns [`SigvaultError::AlreadyConsumed`] if the id is spent.
    pub fn ensure_available(&self, id: &PermissionId) -> Result<()> {
        if !self.state(id).can_transition_to(ConsumptionState::Consumed) {
            return Err(SigvaultError::AlreadyConsumed(*id));
        }
        Ok(())
    }

    /// `Unconsumed → Consumed`.
    ///
    /// # Errors
    /// Returns [`SigvaultError::AlreadyConsumed`] if the id is spent.
    pub fn consume(&mut self, id: PermissionId) -> Result<()> {
        self.ensure_available(&id)?;
        self.mark_consumed(id);
        Ok(())
    }

    /// Record an id as spent. Callers must have checked availability under
    /// the same borrow; marking an already spent id changes nothing.
    pub(crate) fn mark_consumed(&mut self, id: PermissionId) {
        if self.entries.insert(id, ConsumptionState::Consumed) != Some(ConsumptionState::Consumed) {
            self.consumed += 1;
        }
    }

    /// Number of spent ids.
    #[must_use]
    pub fn consumed_count(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> PermissionId {
        PermissionId([n; 32])
    }

    #[test]
    fn first_consume_ok() {
        let mut ledger = ConsumptionLedger::new();
        assert!(ledger.consume(id(1)).is_ok());
        assert!(ledger.is_consumed(&id(1)));
        assert_eq!(ledger.consumed_count(), 1);
    }

    #[test]
    fn double_consume_blocked() {
        let mut ledger = ConsumptionLedger::new();
        ledger.consume(id(1)).unwrap();

        let err = ledger.consume(id(1)).unwrap_err();
        assert!(
            matches!(err, SigvaultError::AlreadyConsumed(got) if got == id(1)),
            "Expected AlreadyConsumed, got: {err:?}"
        );
        assert_eq!(ledger.consumed_count(), 1);
    }

    #[test]
    fn refused_consume_leaves_state() {
        let mut ledger = ConsumptionLedger::new();
        ledger.consume(id(3)).unwrap();
        assert!(ledger.ensure_available(&id(3)).is_err());
        assert!(ledger.ensure_available(&id(4)).is_ok());
        assert_eq!(ledger.state(&id(4)), ConsumptionState::Unconsumed);
        assert_eq!(ledger.consumed_count(), 1);
    }

    #[test]
    fn repeated_mark_counts_once() {
        let mut ledger = ConsumptionLedger::new();
        ledger.mark_consumed(id(7));
        ledger.mark_consumed(id(7));
        assert!(ledger.is_consumed(&id(7)));
        assert_eq!(ledger.consumed_count(), 1);
    }

    #[test]
    fn distinct_ids_independent() {
        let mut ledger = ConsumptionLedger::new();
        for n in 0..10 {
            ledger.consume(id(n)).unwrap();
        }
        assert_eq!(ledger.consumed_count(), 10);
        assert!(!ledger.is_consumed(&id(10)));
    }
}
