//! Registry Object Transfer
//!
//! Moves a domain, contact, nsset or keyset under a new sponsoring registrar.
//!
//! # Architecture
//!
//! One kernel, [`transfer_object`], does authorization and the ownership
//! change. The typed wrappers differ only in which contacts' transfer
//! passwords are also accepted and which unknown-object error they report:
//!
//! ```text
//! TransferDomain  → registrant + admin contacts ┐
//! TransferNsset   → technical contacts          ├→ transfer_object → copy_to_history
//! TransferKeyset  → technical contacts          │
//! TransferContact → (own password only)         ┘
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Lock-Before-Check**: the object rows are locked `FOR UPDATE` before the
//!    sponsor and password are compared
//! 2. **No-op Rejection**: transferring to the current sponsor always fails,
//!    whatever the password
//! 3. **Caller Commits**: nothing here commits, rolls back or emits poll messages

pub mod contact;
pub mod domain;
pub mod error;
pub mod kernel;
pub mod keyset;
pub mod nsset;

pub use contact::TransferContact;
pub use domain::TransferDomain;
pub use error::TransferError;
pub use kernel::transfer_object;
pub use keyset::TransferKeyset;
pub use nsset::TransferNsset;
