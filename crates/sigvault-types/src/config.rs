//! Construction-time configuration for the validator and custody ledger.
//!
//! Both documents are fixed for the lifetime of the instance they build;
//! there is no update path.

use serde::{Deserialize, Serialize};

use crate::{AccountId, AuthorizerKey, NetworkId, Result, SigvaultError};

/// Configuration for an authorization validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// The execution environment this validator runs in.
    #[serde(default)]
    pub network: NetworkId,
    /// The only key whose proofs may pass.
    pub authorizer: AuthorizerKey,
}

impl ValidatorConfig {
    #[must_use]
    pub fn new(network: NetworkId, authorizer: AuthorizerKey) -> Self {
        Self {
            network,
            authorizer,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| SigvaultError::Configuration(format!("validator config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Structural checks that need no cryptography.
    ///
    /// Curve-point decoding of the key happens when the validator is built.
    pub fn validate(&self) -> Result<()> {
        if self.authorizer.is_null() {
            return Err(SigvaultError::NullAuthorizer);
        }
        Ok(())
    }
}

/// Configuration for a custody ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyConfig {
    /// This custody instance's own identity, bound into every permission.
    pub custody_id: AccountId,
}

impl CustodyConfig {
    #[must_use]
    pub fn new(custody_id: AccountId) -> Self {
        Self { custody_id }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| SigvaultError::Configuration(format!("custody config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.custody_id.is_null() {
            return Err(SigvaultError::NullCustodyId);
        }
        Ok(())
    }
}
