//! Ed25519 primitives: authorizer key decoding, proof verification, and
//! the [`PermitSigner`] that issues proofs.
//!
//! Verification is strict (`verify_strict`): non-canonical signatures and
//! small-order keys are refused, so a proof has exactly one valid encoding.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use sigvault_types::{
    AccountId, AuthorizerKey, NetworkId, PermissionContext, Proof, Result, SigvaultError,
};

/// Decode the configured authorizer into a verifying key.
///
/// # Errors
/// - [`SigvaultError::NullAuthorizer`] for the all-zero key
/// - [`SigvaultError::InvalidAuthorizerKey`] if the bytes are not a curve
///   point or the point has small order
pub fn decode_authorizer(key: &AuthorizerKey) -> Result<VerifyingKey> {
    if key.is_null() {
        return Err(SigvaultError::NullAuthorizer);
    }
    let verifying = VerifyingKey::from_bytes(key.as_bytes()).map_err(|e| {
        SigvaultError::InvalidAuthorizerKey {
            reason: e.to_string(),
        }
    })?;
    if verifying.is_weak() {
        return Err(SigvaultError::InvalidAuthorizerKey {
            reason: "key has small order".into(),
        });
    }
    Ok(verifying)
}

/// Check that `proof` is the authorizer's signature over `payload`.
///
/// # Errors
/// Returns [`SigvaultError::InvalidProof`] for a malformed proof, a proof
/// by another key, or a proof over different bytes.
pub fn verify_proof(key: &VerifyingKey, payload: &[u8], proof: &Proof) -> Result<()> {
    let signature =
        Signature::from_slice(proof.as_bytes()).map_err(|_| SigvaultError::InvalidProof {
            reason: format!("malformed signature ({} bytes)", proof.as_bytes().len()),
        })?;
    key.verify_strict(payload, &signature)
        .map_err(|_| SigvaultError::InvalidProof {
            reason: "signature does not verify against the authorizing key".into(),
        })
}

/// Holder of the single authorizing key. Issues withdrawal proofs.
pub struct PermitSigner {
    key: SigningKey,
}

impl PermitSigner {
    /// Load a signer from its 32-byte secret seed.
    #[must_use]
    pub fn from_secret(secret: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(secret),
        }
    }

    /// The public identity validators must be configured with.
    #[must_use]
    pub fn authorizer(&self) -> AuthorizerKey {
        AuthorizerKey(self.key.verifying_key().to_bytes())
    }

    /// Sign the exact payload for a permission context.
    #[must_use]
    pub fn sign(&self, context: &PermissionContext) -> Proof {
        Proof::from(self.key.sign(&context.signing_payload()).to_bytes())
    }

    /// Sign a withdrawal of `amount` from `custody_id` to `recipient`.
    #[must_use]
    pub fn sign_withdrawal(
        &self,
        custody_id: AccountId,
        recipient: AccountId,
        amount: u128,
        nonce: u64,
        network: NetworkId,
    ) -> Proof {
        self.sign(&PermissionContext::new(
            custody_id, recipient, amount, nonce, network,
        ))
    }
}

impl std::fmt::Debug for PermitSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermitSigner")
            .field("authorizer", &self.authorizer())
            .finish_non_exhaustive()
    }
}

/// Fresh random signers for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl PermitSigner {
    pub fn random() -> Self {
        Self {
            key: SigningKey::generate(&mut rand::rngs::OsRng),
        }
    }
}
