//! # sigvault-types
//!
//! Shared types, errors, and configuration for **SigVault**.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AuthorizerKey`], [`NetworkId`], [`PermissionId`]
//! - **Permission model**: [`PermissionContext`], [`Proof`], [`ConsumptionState`]
//! - **Event model**: [`VaultEvent`], [`RecordedEvent`], [`EventJournal`]
//! - **Configuration**: [`ValidatorConfig`], [`CustodyConfig`]
//! - **Errors**: [`SigvaultError`] with `SV_ERR_` prefix codes
//! - **Constants**: domain tags and sizes

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod permission;

// Re-export all primary types at crate root for ergonomic imports:
//   use sigvault_types::{AccountId, PermissionContext, Proof, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use permission::*;

// Constants are accessed via `sigvault_types::constants::FOO`
// (not re-exported to avoid name collisions).
