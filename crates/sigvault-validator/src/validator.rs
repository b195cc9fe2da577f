//! The authorization validator.
//!
//! Decides whether a (custody, recipient, amount, nonce) tuple was signed
//! by the authorizing key and has not been used, and records its use.
//!
//! ## Decision order
//!
//! 1. Compute the permission id (includes this validator's network id)
//! 2. Already spent → `AlreadyConsumed`, nothing else runs
//! 3. Verify the proof over the signing payload → `InvalidProof` on failure
//! 4. Run the caller's settlement step, if any; its error aborts the call
//! 5. Mark the id spent and emit `PermissionConsumed`
//!
//! Steps 2–5 run under one lock. Two callers racing with the same proof
//! cannot both pass, and no caller can observe or disturb a permission
//! whose settlement is still running.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ed25519_dalek::VerifyingKey;
use sigvault_types::{
    AccountId, AuthorizerKey, EventJournal, NetworkId, PermissionContext, PermissionId, Proof,
    Result, ValidatorConfig, VaultEvent,
};

use crate::consumption::ConsumptionLedger;
use crate::signer::{decode_authorizer, verify_proof};

/// Work that must succeed before a permission counts as spent.
///
/// Receives the permission id that passed verification.
pub type Settle<'a> = &'a mut dyn FnMut(&PermissionId) -> Result<()>;

/// Capability to validate a permission context and consume it.
///
/// The custody ledger depends only on this trait, so it can be exercised
/// against fakes. Implementations must run the check, the settlement step
/// and the mark atomically with respect to every other call.
pub trait PermissionValidator: Send + Sync {
    /// The network id folded into every permission this validator checks.
    fn network(&self) -> NetworkId;

    /// Deterministic permission id for a context on this validator's network.
    fn permission_id(
        &self,
        custody_id: AccountId,
        recipient: AccountId,
        amount: u128,
        nonce: u64,
    ) -> PermissionId {
        PermissionContext::new(custody_id, recipient, amount, nonce, self.network())
            .permission_id()
    }

    /// Whether the permission has been spent.
    fn is_consumed(&self, id: &PermissionId) -> bool;

    /// Verify and spend in one step.
    fn verify_and_consume(
        &self,
        custody_id: AccountId,
        recipient: AccountId,
        amount: u128,
        nonce: u64,
        proof: &Proof,
    ) -> Result<PermissionId> {
        self.verify_and_consume_with(custody_id, recipient, amount, nonce, proof, &mut |_| {
            Ok(())
        })
    }

    /// Verify, run `settle`, then spend.
    ///
    /// `settle` runs only for a permission that passed every check, and the
    /// permission is marked spent only if `settle` returns `Ok`. A failing
    /// `settle` leaves the permission unconsumed, emits nothing, and its
    /// error is returned unchanged. Marking cannot fail once `settle` has
    /// succeeded.
    fn verify_and_consume_with(
        &self,
        custody_id: AccountId,
        recipient: AccountId,
        amount: u128,
        nonce: u64,
        proof: &Proof,
        settle: Settle<'_>,
    ) -> Result<PermissionId>;
}

/// Ed25519 authorization validator with a single fixed authorizing key.
pub struct AuthorizationValidator {
    network: NetworkId,
    authorizer: AuthorizerKey,
    verifying_key: VerifyingKey,
    ledger: Mutex<ConsumptionLedger>,
    journal: Arc<EventJournal>,
}

impl AuthorizationValidator {
    /// Build a validator with its own event journal.
    ///
    /// # Errors
    /// `NullAuthorizer` / `InvalidAuthorizerKey` if the key is unusable.
    /// No instance exists after a failure.
    pub fn new(config: &ValidatorConfig) -> Result<Self> {
        Self::with_journal(config, Arc::new(EventJournal::new()))
    }

    /// Build a validator that records into a shared journal.
    pub fn with_journal(config: &ValidatorConfig, journal: Arc<EventJournal>) -> Result<Self> {
        config.validate()?;
        let verifying_key = decode_authorizer(&config.authorizer)?;
        tracing::info!(
            network = %config.network,
            authorizer = %config.authorizer,
            "Authorization validator initialised"
        );
        Ok(Self {
            network: config.network,
            authorizer: config.authorizer,
            verifying_key,
            ledger: Mutex::new(ConsumptionLedger::new()),
            journal,
        })
    }

    /// The fixed authorizing key.
    #[must_use]
    pub fn authorizer(&self) -> AuthorizerKey {
        self.authorizer
    }

    /// The journal this validator records into.
    #[must_use]
    pub fn journal(&self) -> &Arc<EventJournal> {
        &self.journal
    }

    /// Number of permissions spent so far.
    #[must_use]
    pub fn consumed_count(&self) -> usize {
        self.ledger().consumed_count()
    }

    fn ledger(&self) -> MutexGuard<'_, ConsumptionLedger> {
        // The ledger is written once, after settlement, so a guard poisoned
        // by a panicking settlement step is still consistent.
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Steps 1–3. Pure with respect to the ledger.
    fn check(
        &self,
        ledger: &ConsumptionLedger,
        context: &PermissionContext,
        proof: &Proof,
    ) -> Result<PermissionId> {
        let id = context.permission_id();

        if let Err(err) = ledger.ensure_available(&id) {
            tracing::warn!(
                permission = %id,
                recipient = %context.recipient,
                amount = context.amount,
                nonce = context.nonce,
                "Replay blocked: permission already consumed"
            );
            return Err(err);
        }

        if let Err(err) = verify_proof(&self.verifying_key, &context.signing_payload(), proof) {
            tracing::warn!(
                permission = %id,
                custody = %context.custody_id,
                recipient = %context.recipient,
                amount = context.amount,
                nonce = context.nonce,
                %proof,
                "Proof rejected"
            );
            return Err(err);
        }

        Ok(id)
    }
}

impl PermissionValidator for AuthorizationValidator {
    fn network(&self) -> NetworkId {
        self.network
    }

    fn is_consumed(&self, id: &PermissionId) -> bool {
        self.ledger().is_consumed(id)
    }

    fn verify_and_consume_with(
        &self,
        custody_id: AccountId,
        recipient: AccountId,
        amount: u128,
        nonce: u64,
        proof: &Proof,
        settle: Settle<'_>,
    ) -> Result<PermissionId> {
        let context = PermissionContext::new(custody_id, recipient, amount, nonce, self.network);
        let mut ledger = self.ledger();
        let id = self.check(&ledger, &context, proof)?;

        if let Err(err) = settle(&id) {
            tracing::debug!(
                permission = %id,
                error = %err,
                "Settlement failed, permission untouched"
            );
            return Err(err);
        }

        ledger.mark_consumed(id);
        self.journal.record(VaultEvent::PermissionConsumed {
            permission_id: id,
            recipient,
            amount,
        });
        drop(ledger);

        tracing::info!(
            permission = %id,
            recipient = %recipient,
            amount,
            "Permission consumed"
        );
        Ok(id)
    }
}

impl std::fmt::Debug for AuthorizationValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationValidator")
            .field("network", &self.network)
            .field("authorizer", &self.authorizer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use sigvault_types::{ConsumptionState, SigvaultError};

    use super::*;
    use crate::signer::PermitSigner;

    struct Fixture {
        signer: PermitSigner,
        validator: AuthorizationValidator,
        custody: AccountId,
        recipient: AccountId,
    }

    fn setup() -> Fixture {
        let signer = PermitSigner::random();
        let validator =
            AuthorizationValidator::new(&ValidatorConfig::new(NetworkId(1), signer.authorizer()))
                .unwrap();
        Fixture {
            signer,
            validator,
            custody: AccountId::labeled("vault"),
            recipient: AccountId::labeled("alice"),
        }
    }

    impl Fixture {
        fn proof(&self, amount: u128, nonce: u64) -> Proof {
            self.signer
                .sign_withdrawal(self.custody, self.recipient, amount, nonce, NetworkId(1))
        }
    }

    #[test]
    fn null_authorizer_construction_fails() {
        let err = AuthorizationValidator::new(&ValidatorConfig::new(
            NetworkId(1),
            AuthorizerKey([0u8; 32]),
        ))
        .unwrap_err();
        assert!(matches!(err, SigvaultError::NullAuthorizer));
    }

    #[test]
    fn permission_id_matches_context() {
        let f = setup();
        let id = f.validator.permission_id(f.custody, f.recipient, 10, 3);
        let ctx = PermissionContext::new(f.custody, f.recipient, 10, 3, NetworkId(1));
        assert_eq!(id, ctx.permission_id());
    }

    #[test]
    fn valid_proof_passes_once() {
        let f = setup();
        let proof = f.proof(2, 1);
        let id = f
            .validator
            .verify_and_consume(f.custody, f.recipient, 2, 1, &proof)
            .unwrap();
        assert!(f.validator.is_consumed(&id));

        let err = f
            .validator
            .verify_and_consume(f.custody, f.recipient, 2, 1, &proof)
            .unwrap_err();
        assert!(matches!(err, SigvaultError::AlreadyConsumed(got) if got == id));
        assert_eq!(f.validator.consumed_count(), 1);
        assert_eq!(f.validator.journal().count("PERMISSION_CONSUMED"), 1);
    }

    #[test]
    fn replay_check_precedes_proof_check() {
        let f = setup();
        f.validator
            .verify_and_consume(f.custody, f.recipient, 2, 1, &f.proof(2, 1))
            .unwrap();
        // Garbage proof on a spent id still reports the replay.
        let err = f
            .validator
            .verify_and_consume(f.custody, f.recipient, 2, 1, &Proof(vec![1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, SigvaultError::AlreadyConsumed(_)));
    }

    #[test]
    fn invalid_proof_changes_nothing() {
        let f = setup();
        let err = f
            .validator
            .verify_and_consume(f.custody, f.recipient, 2, 1, &Proof(vec![0u8; 64]))
            .unwrap_err();
        assert!(matches!(err, SigvaultError::InvalidProof { .. }));
        let id = f.validator.permission_id(f.custody, f.recipient, 2, 1);
        assert!(!f.validator.is_consumed(&id));
        assert!(f.validator.journal().is_empty());

        // The real proof still works afterwards.
        assert!(
            f.validator
                .verify_and_consume(f.custody, f.recipient, 2, 1, &f.proof(2, 1))
                .is_ok()
        );
    }

    #[test]
    fn altered_context_never_passes() {
        let f = setup();
        let proof = f.proof(2, 1);
        let other = AccountId::labeled("mallory");
        let attempts = [
            (other, f.recipient, 2, 1),
            (f.custody, other, 2, 1),
            (f.custody, f.recipient, 3, 1),
            (f.custody, f.recipient, 2, 2),
        ];
        for (custody, recipient, amount, nonce) in attempts {
            let err = f
                .validator
                .verify_and_consume(custody, recipient, amount, nonce, &proof)
                .unwrap_err();
            assert!(matches!(err, SigvaultError::InvalidProof { .. }));
        }
        assert_eq!(f.validator.consumed_count(), 0);
    }

    #[test]
    fn proof_for_other_network_rejected() {
        let f = setup();
        let foreign = AuthorizationValidator::new(&ValidatorConfig::new(
            NetworkId(2),
            f.signer.authorizer(),
        ))
        .unwrap();
        let err = foreign
            .verify_and_consume(f.custody, f.recipient, 2, 1, &f.proof(2, 1))
            .unwrap_err();
        assert!(matches!(err, SigvaultError::InvalidProof { .. }));
    }

    #[test]
    fn settled_permission_emits_once() {
        let f = setup();
        let mut seen = None;
        let id = f
            .validator
            .verify_and_consume_with(f.custody, f.recipient, 4, 9, &f.proof(4, 9), &mut |id| {
                seen = Some(*id);
                Ok(())
            })
            .unwrap();
        assert_eq!(seen, Some(id));
        assert!(f.validator.is_consumed(&id));
        assert_eq!(
            f.validator.journal().events(),
            vec![VaultEvent::PermissionConsumed {
                permission_id: id,
                recipient: f.recipient,
                amount: 4,
            }]
        );
    }

    #[test]
    fn failed_settlement_leaves_permission_unconsumed() {
        let f = setup();
        let proof = f.proof(4, 9);
        let err = f
            .validator
            .verify_and_consume_with(f.custody, f.recipient, 4, 9, &proof, &mut |_| {
                Err(SigvaultError::TransferFailed {
                    reason: "recipient refused".into(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, SigvaultError::TransferFailed { .. }));

        let id = f.validator.permission_id(f.custody, f.recipient, 4, 9);
        assert_eq!(f.validator.ledger().state(&id), ConsumptionState::Unconsumed);
        assert_eq!(f.validator.consumed_count(), 0);
        assert!(f.validator.journal().is_empty());

        f.validator
            .verify_and_consume(f.custody, f.recipient, 4, 9, &proof)
            .unwrap();
        assert!(f.validator.is_consumed(&id));
    }

    #[test]
    fn settlement_never_runs_for_rejected_permission() {
        let f = setup();
        let proof = f.proof(4, 9);
        f.validator
            .verify_and_consume(f.custody, f.recipient, 4, 9, &proof)
            .unwrap();

        let mut runs = 0;
        let mut count = |_: &PermissionId| -> Result<()> {
            runs += 1;
            Ok(())
        };
        let replay =
            f.validator
                .verify_and_consume_with(f.custody, f.recipient, 4, 9, &proof, &mut count);
        assert!(matches!(replay, Err(SigvaultError::AlreadyConsumed(_))));
        let forged = f.validator.verify_and_consume_with(
            f.custody,
            f.recipient,
            4,
            10,
            &Proof(vec![0u8; 64]),
            &mut count,
        );
        assert!(matches!(forged, Err(SigvaultError::InvalidProof { .. })));
        assert_eq!(runs, 0);
    }

    #[test]
    fn panicking_settlement_leaves_validator_usable() {
        let f = setup();
        let proof = f.proof(4, 9);
        let validator = Arc::new(f.validator);

        let crashed = {
            let validator = Arc::clone(&validator);
            let proof = proof.clone();
            let (custody, recipient) = (f.custody, f.recipient);
            std::thread::spawn(move || {
                let _ = validator.verify_and_consume_with(
                    custody,
                    recipient,
                    4,
                    9,
                    &proof,
                    &mut |_| panic!("settlement crashed"),
                );
            })
            .join()
        };
        assert!(crashed.is_err());

        let id = validator
            .verify_and_consume(f.custody, f.recipient, 4, 9, &proof)
            .unwrap();
        assert!(validator.is_consumed(&id));
        assert_eq!(validator.consumed_count(), 1);
    }

    #[test]
    fn concurrent_replays_pass_exactly_once() {
        let f = setup();
        let validator = Arc::new(f.validator);
        let proof = f.signer.sign_withdrawal(f.custody, f.recipient, 7, 7, NetworkId(1));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let validator = Arc::clone(&validator);
                let proof = proof.clone();
                let (custody, recipient) = (f.custody, f.recipient);
                std::thread::spawn(move || {
                    validator
                        .verify_and_consume(custody, recipient, 7, 7, &proof)
                        .is_ok()
                })
            })
            .collect();

        let passes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(passes, 1);
        assert_eq!(validator.consumed_count(), 1);
    }
}
