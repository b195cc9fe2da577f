//! # sigvault-custody
//!
//! **Value plane**: holds deposited value and releases it only against a
//! permission the authorization plane accepts.
//!
//! ## Architecture
//!
//! 1. **FundsRail**: where the value physically sits (`InMemoryRail` here)
//! 2. **SupplyConservation**: `tracked == custodial == Σcredits - Σdebits`
//! 3. **CustodyLedger**: credits are open to anyone; debits go through the
//!    injected `PermissionValidator` with this instance's own id
//!
//! A custody ledger never accepts a permission bound to another custody
//! instance, because it always supplies its own id to the validator.

pub mod ledger;
pub mod rail;
pub mod supply;

pub use ledger::{CustodyBalances, CustodyLedger, CustodyLedgerBuilder};
pub use rail::{FundsRail, InMemoryRail};
pub use supply::SupplyConservation;
