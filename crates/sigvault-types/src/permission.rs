//! # Permission context: what a withdrawal proof is bound to
//!
//! A [`PermissionContext`] is the exact tuple a proof must match:
//! custody instance, recipient, amount, nonce and network. Its SHA-256
//! digest is the [`PermissionId`], the primary key of the consumption
//! ledger. The authorizer signs a domain-separated payload derived from
//! that id.
//!
//! ## Encoding
//!
//! ```text
//! permission_id = SHA-256("sigvault:permission:v1:"
//!                         || custody_id(32) || recipient(32)
//!                         || amount(u128 BE) || nonce(u64 BE) || network(u64 BE))
//! signing_payload = "sigvault:withdraw:v1:" || permission_id(32)
//! ```
//!
//! Every field is fixed width, so two distinct contexts can never encode
//! to the same preimage.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────────┐ verify + settle ┌──────────┐
//!   │ UNCONSUMED ├────────────────▶│ CONSUMED │
//!   └────────────┘                 └──────────┘
//! ```
//!
//! The mark is written only after the caller's settlement step succeeded,
//! under the same lock as the check. There is no intermediate state.
//! `CONSUMED` is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{PERMISSION_ID_DOMAIN, PERMISSION_PREIMAGE_LEN, PROOF_LEN, SIGNING_DOMAIN};
use crate::{AccountId, NetworkId, PermissionId};

/// The exact tuple a proof authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionContext {
    /// The custody instance funds leave from.
    pub custody_id: AccountId,
    /// Who receives the funds.
    pub recipient: AccountId,
    /// How much is released.
    pub amount: u128,
    /// Caller-chosen value distinguishing otherwise identical permissions.
    ///
    /// Any integer in principle; this encoding narrows it to 64 bits, which
    /// is ample for distinguishing uses but cannot carry a 256-bit nonce
    /// issued elsewhere.
    pub nonce: u64,
    /// The execution environment the validator runs in.
    pub network: NetworkId,
}

impl PermissionContext {
    #[must_use]
    pub fn new(
        custody_id: AccountId,
        recipient: AccountId,
        amount: u128,
        nonce: u64,
        network: NetworkId,
    ) -> Self {
        Self {
            custody_id,
            recipient,
            amount,
            nonce,
            network,
        }
    }

    /// Fixed-width big-endian encoding of all five fields.
    #[must_use]
    pub fn encode(&self) -> [u8; PERMISSION_PREIMAGE_LEN] {
        let mut out = [0u8; PERMISSION_PREIMAGE_LEN];
        out[..32].copy_from_slice(self.custody_id.as_bytes());
        out[32..64].copy_from_slice(self.recipient.as_bytes());
        out[64..80].copy_from_slice(&self.amount.to_be_bytes());
        out[80..88].copy_from_slice(&self.nonce.to_be_bytes());
        out[88..].copy_from_slice(&self.network.0.to_be_bytes());
        out
    }

    /// Deterministic permission identifier for this context.
    #[must_use]
    pub fn permission_id(&self) -> PermissionId {
        let mut hasher = Sha256::new();
        hasher.update(PERMISSION_ID_DOMAIN);
        hasher.update(self.encode());
        let digest = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&digest);
        PermissionId(id)
    }

    /// The bytes the authorizing key signs for this context.
    #[must_use]
    pub fn signing_payload(&self) -> Vec<u8> {
        signing_payload_for(&self.permission_id())
    }
}

/// Signing payload for an already-computed permission id.
#[must_use]
pub fn signing_payload_for(id: &PermissionId) -> Vec<u8> {
    let mut payload = Vec::with_capacity(SIGNING_DOMAIN.len() + id.0.len());
    payload.extend_from_slice(SIGNING_DOMAIN);
    payload.extend_from_slice(id.as_bytes());
    payload
}

// ---------------------------------------------------------------------------
// Proof
// ---------------------------------------------------------------------------

/// A signature produced by the authorizing key over a signing payload.
///
/// Held as raw bytes: a malformed proof is a verification failure, not a
/// decoding error at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proof(pub Vec<u8>);

impl Proof {
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether the proof has the length of an Ed25519 signature.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == PROOF_LEN
    }
}

impl From<[u8; PROOF_LEN]> for Proof {
    fn from(bytes: [u8; PROOF_LEN]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let head = &self.0[..self.0.len().min(8)];
        write!(f, "proof:{}({}B)", hex::encode(head), self.0.len())
    }
}

// ---------------------------------------------------------------------------
// ConsumptionState
// ---------------------------------------------------------------------------

/// Lifecycle of a permission id in the consumption ledger.
///
/// The only transition is `Unconsumed → Consumed`, and it is irreversible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConsumptionState {
    /// Never used.
    Unconsumed,
    /// Spent. **Irreversible.**
    Consumed,
}

impl ConsumptionState {
    /// Can this permission transition to the given target state?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Unconsumed, Self::Consumed))
    }
}

impl fmt::Display for ConsumptionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconsumed => write!(f, "UNCONSUMED"),
            Self::Consumed => write!(f, "CONSUMED"),
        }
    }
}

/// Fixture contexts for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl PermissionContext {
    /// A context with labeled custody/recipient on the default network.
    pub fn dummy(amount: u128, nonce: u64) -> Self {
        Self::new(
            AccountId::labeled("custody"),
            AccountId::labeled("recipient"),
            amount,
            nonce,
            NetworkId::default(),
        )
    }
}
