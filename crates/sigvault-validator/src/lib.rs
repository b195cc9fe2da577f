//! # sigvault-validator
//!
//! **Authorization plane**: decides whether a withdrawal was signed by the
//! authorizing key and has not been used before, and records its use.
//!
//! ## Architecture
//!
//! 1. **ConsumptionLedger**: permission id → UNCONSUMED / CONSUMED
//! 2. **Signer primitives**: authorizer decoding, strict Ed25519 verification,
//!    and the `PermitSigner` that issues proofs
//! 3. **AuthorizationValidator**: the two combined behind the
//!    `PermissionValidator` capability the custody ledger consumes
//!
//! The validator knows nothing about funds.

pub mod consumption;
pub mod signer;
pub mod validator;

pub use consumption::ConsumptionLedger;
pub use signer::{PermitSigner, decode_authorizer, verify_proof};
pub use validator::{AuthorizationValidator, PermissionValidator, Settle};
