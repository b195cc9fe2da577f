//! Identifiers used throughout SigVault.
//!
//! Byte identities are fixed-width and serialize as lowercase hex strings,
//! so configuration documents and event logs stay human-readable.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{ACCOUNT_ID_LEN, PERMISSION_ID_LEN};

/// Serde adapter: `[u8; N]` as a hex string.
mod hex_array {
    use super::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let text = String::deserialize(deserializer)?;
        let raw = hex::decode(text.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
        raw.try_into().map_err(|raw: Vec<u8>| {
            serde::de::Error::custom(format!("expected {N} bytes, got {}", raw.len()))
        })
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of a custody instance, a recipient, or a depositor.
///
/// The all-zero value is the null identity and is never a valid recipient
/// or custody instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct AccountId(pub [u8; ACCOUNT_ID_LEN]);

impl AccountId {
    /// The null identity.
    pub const NULL: Self = Self([0u8; ACCOUNT_ID_LEN]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; ACCOUNT_ID_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; ACCOUNT_ID_LEN]
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "acct:{}", hex::encode(&self.0[..8]))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_array::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        hex_array::deserialize(deserializer).map(Self)
    }
}

// ---------------------------------------------------------------------------
// AuthorizerKey
// ---------------------------------------------------------------------------

/// Raw Ed25519 public key of the single authorizing signer.
///
/// Decoding into a curve point happens in the validator at construction;
/// this type only carries the bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthorizerKey(pub [u8; 32]);

impl AuthorizerKey {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for AuthorizerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "authz:{}", hex::encode(&self.0[..8]))
    }
}

impl Serialize for AuthorizerKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_array::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for AuthorizerKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        hex_array::deserialize(deserializer).map(Self)
    }
}

// ---------------------------------------------------------------------------
// NetworkId
// ---------------------------------------------------------------------------

/// Identifier of the execution environment a validator runs in.
///
/// Folded into every permission id, so a proof issued for one network is
/// worthless on another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

impl Default for NetworkId {
    fn default() -> Self {
        Self(crate::constants::DEFAULT_NETWORK_ID)
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "net:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PermissionId
// ---------------------------------------------------------------------------

/// SHA-256 digest of a [`PermissionContext`](crate::PermissionContext).
///
/// Primary key of the consumption ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct PermissionId(pub [u8; PERMISSION_ID_LEN]);

impl PermissionId {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PERMISSION_ID_LEN] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PermissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "permit:{}", hex::encode(&self.0[..8]))
    }
}

impl Serialize for PermissionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        hex_array::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for PermissionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        hex_array::deserialize(deserializer).map(Self)
    }
}

/// Random identities for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    /// A uniformly random, non-null account.
    pub fn random() -> Self {
        loop {
            let id = Self(rand::random::<[u8; ACCOUNT_ID_LEN]>());
            if !id.is_null() {
                return id;
            }
        }
    }

    /// A deterministic account derived from a label (`"alice"`, `"vault-a"`).
    pub fn labeled(label: &str) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(label.as_bytes());
        let mut bytes = [0u8; ACCOUNT_ID_LEN];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_account_detection() {
        assert!(AccountId::NULL.is_null());
        assert!(!AccountId::labeled("alice").is_null());
        assert!(!AccountId::random().is_null());
    }

    #[test]
    fn labeled_accounts_are_stable() {
        assert_eq!(AccountId::labeled("vault"), AccountId::labeled("vault"));
        assert_ne!(AccountId::labeled("vault"), AccountId::labeled("vault2"));
    }

    #[test]
    fn account_id_serializes_as_hex() {
        let id = AccountId([0xab; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn hex_accepts_0x_prefix() {
        let json = format!("\"0x{}\"", "01".repeat(32));
        let key: AuthorizerKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, AuthorizerKey([1u8; 32]));
    }

    #[test]
    fn wrong_width_is_rejected() {
        let json = format!("\"{}\"", "01".repeat(31));
        let err = serde_json::from_str::<AccountId>(&json).unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"), "Got: {err}");
    }

    #[test]
    fn display_is_prefixed_and_short() {
        let id = PermissionId([0x11; 32]);
        assert_eq!(format!("{id}"), "permit:1111111111111111");
        assert_eq!(format!("{}", NetworkId(5)), "net:5");
    }
}
