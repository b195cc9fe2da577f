//! System-wide constants for SigVault.

/// Domain tag prefixed to every permission-id preimage.
pub const PERMISSION_ID_DOMAIN: &[u8] = b"sigvault:permission:v1:";

/// Domain tag prefixed to the bytes the authorizer signs.
pub const SIGNING_DOMAIN: &[u8] = b"sigvault:withdraw:v1:";

/// Width of an account / authorizer identity in bytes.
pub const ACCOUNT_ID_LEN: usize = 32;

/// Width of a permission identifier (SHA-256 output) in bytes.
pub const PERMISSION_ID_LEN: usize = 32;

/// Length of an Ed25519 signature, the only well-formed proof length.
pub const PROOF_LEN: usize = 64;

/// Length of the permission-id preimage after the domain tag:
/// `custody_id(32) || recipient(32) || amount(16) || nonce(8) || network(8)`.
pub const PERMISSION_PREIMAGE_LEN: usize = ACCOUNT_ID_LEN * 2 + 16 + 8 + 8;

/// Network identifier used when a configuration omits one.
pub const DEFAULT_NETWORK_ID: u64 = 1;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "SigVault";
