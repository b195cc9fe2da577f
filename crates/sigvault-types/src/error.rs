//! Error types for SigVault.
//!
//! All errors use the `SV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Caller input errors
//! - 2xx: Balance errors
//! - 3xx: Authorization errors
//! - 4xx: Value transfer errors
//! - 5xx: Construction errors
//! - 8xx: Invariant violations
//! - 9xx: General / internal errors
//!
//! Every variant is scoped to the single call that produced it: no error
//! leaves a component in a state it cannot serve the next call from.

use thiserror::Error;

use crate::PermissionId;

/// Central error enum for all SigVault operations.
#[derive(Debug, Error)]
pub enum SigvaultError {
    // =================================================================
    // Input Errors (1xx)
    // =================================================================
    /// Zero amount, or a null or self-referential party. Resubmit with
    /// corrected input.
    #[error("SV_ERR_100: Invalid amount or party: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Custody cannot cover the requested debit.
    #[error("SV_ERR_200: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// A credit would push the custody balance past `u128::MAX`.
    #[error("SV_ERR_201: Balance overflow")]
    BalanceOverflow,

    // =================================================================
    // Authorization Errors (3xx)
    // =================================================================
    /// The permission was already spent. Obtain a new one with a new nonce.
    #[error("SV_ERR_300: Permission already consumed: {0}")]
    AlreadyConsumed(PermissionId),

    /// The proof does not verify against the authorizing key for the
    /// exact permission context.
    #[error("SV_ERR_301: Invalid proof: {reason}")]
    InvalidProof { reason: String },

    /// The validator rejected a debit. `source` carries the validator's
    /// own verdict (`AlreadyConsumed` or `InvalidProof`).
    #[error("SV_ERR_302: Unauthorized: {source}")]
    Unauthorized {
        #[source]
        source: Box<SigvaultError>,
    },

    // =================================================================
    // Transfer Errors (4xx)
    // =================================================================
    /// Releasing value to the recipient failed. State is as before the call.
    #[error("SV_ERR_400: Transfer failed: {reason}")]
    TransferFailed { reason: String },

    // =================================================================
    // Construction Errors (5xx)
    // =================================================================
    /// The authorizing key is the all-zero identity.
    #[error("SV_ERR_500: Authorizing key is null")]
    NullAuthorizer,

    /// The authorizing key is not a usable Ed25519 public key.
    #[error("SV_ERR_501: Invalid authorizing key: {reason}")]
    InvalidAuthorizerKey { reason: String },

    /// A custody ledger was built without a validator reference.
    #[error("SV_ERR_502: Validator reference is missing")]
    MissingValidator,

    /// The custody instance identifier is the all-zero identity.
    #[error("SV_ERR_503: Custody identifier is null")]
    NullCustodyId,

    // =================================================================
    // Invariant Violations (8xx)
    // =================================================================
    /// Tracked balance, custodial balance and credit/debit totals disagree.
    #[error("SV_ERR_801: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("SV_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("SV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config document, bad field values).
    #[error("SV_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl SigvaultError {
    /// Wrap a validator rejection as seen from the custody side.
    #[must_use]
    pub fn unauthorized(source: SigvaultError) -> Self {
        Self::Unauthorized {
            source: Box::new(source),
        }
    }

    /// The validator verdict behind an `Unauthorized`, or `self` otherwise.
    #[must_use]
    pub fn root_cause(&self) -> &SigvaultError {
        match self {
            Self::Unauthorized { source } => source.root_cause(),
            other => other,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, SigvaultError>;

impl From<serde_json::Error> for SigvaultError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = SigvaultError::InvalidAmount {
            reason: "amount is zero".into(),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("SV_ERR_100"), "Got: {msg}");
    }

    #[test]
    fn insufficient_balance_display() {
        let err = SigvaultError::InsufficientBalance {
            needed: 10,
            available: 1,
        };
        let msg = format!("{err}");
        assert!(msg.contains("SV_ERR_200"));
        assert!(msg.contains("need 10"));
        assert!(msg.contains("have 1"));
    }

    #[test]
    fn unauthorized_keeps_validator_verdict() {
        let id = PermissionId([7u8; 32]);
        let err = SigvaultError::unauthorized(SigvaultError::AlreadyConsumed(id));
        assert!(format!("{err}").contains("SV_ERR_300"));
        assert!(matches!(
            err.root_cause(),
            SigvaultError::AlreadyConsumed(got) if *got == id
        ));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn all_errors_have_sv_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(SigvaultError::BalanceOverflow),
            Box::new(SigvaultError::NullAuthorizer),
            Box::new(SigvaultError::MissingValidator),
            Box::new(SigvaultError::TransferFailed {
                reason: "rejected".into(),
            }),
            Box::new(SigvaultError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("SV_ERR_"),
                "Error missing SV_ERR_ prefix: {msg}"
            );
        }
    }
}
