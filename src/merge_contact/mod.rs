//! Contact merge
//!
//! Moves every domain, nsset and keyset reference from a source contact to a
//! destination contact carrying the same data, then deletes the source.
//!
//! # Usage
//!
//! ```ignore
//! let merge = MergeContact::new("SRC-1", "DST-1", "REG-A", Some(Arc::new(DefaultDiffContacts)))?;
//! let report = merge.exec_dry_run(&mut ctx).await?;
//! let output = merge.exec(&mut ctx).await?;
//! create_poll_messages(&output, &mut ctx).await?;
//! ctx.commit().await?;
//! ```

pub mod diff;
pub mod error;
pub mod merge;
pub mod poll;
pub mod types;

pub use diff::{COMPARED_ADDRESS_TYPES, DefaultDiffContacts, DiffContacts, contacts_differ};
pub use error::MergeContactError;
pub use merge::MergeContact;
pub use poll::create_poll_messages;
pub use types::{
    LockedContact, MergeContactLockedContactId, MergeContactOutput,
    MergeContactUpdateDomainAdminContact, MergeContactUpdateDomainRegistrant,
    MergeContactUpdateTechContact,
};
