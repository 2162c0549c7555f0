//! Registry Ops - registry object lifecycle operations
//!
//! Transfer, contact merge, object states and poll messages for a domain
//! registry, executed inside a caller-owned PostgreSQL transaction.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (ObjectId, HistoryId, ObjectType, etc.)
//! - [`db`] - Connection pool and the transactional [`OperationContext`]
//! - [`history`] - Object history chain and per-type history snapshots
//! - [`registrar`] - Registrar lookup
//! - [`object`] - Update/delete/info operations the core drives
//! - [`object_state`] - State snapshots, state-request locking and recomputation
//! - [`transfer`] - Transfer kernel and per-type wrappers
//! - [`merge_contact`] - Duplicate contact merge
//! - [`poll`] - Poll message emission
//! - [`authinfo`] - Transfer password generation
//! - [`config`] / [`logging`] - Application configuration and tracing setup

// Core types - must be first!
pub mod core_types;

// Infrastructure
pub mod config;
pub mod db;
pub mod logging;

// Registry collaborators
pub mod authinfo;
pub mod history;
pub mod object;
pub mod registrar;

// Operations
pub mod merge_contact;
pub mod object_state;
pub mod poll;
pub mod transfer;

// Convenient re-exports at crate root
pub use core_types::{HistoryId, LoggerRequestId, MessageId, ObjectId, ObjectType, RegistrarId};
pub use db::{Database, OperationContext};
pub use merge_contact::{
    DefaultDiffContacts, DiffContacts, MergeContact, MergeContactError, MergeContactOutput,
    create_poll_messages,
};
pub use object_state::{
    LockObjectStateRequestLock, ObjectState, ObjectStateError, ObjectStatesInfo,
    PerformObjectStateRequest,
};
pub use poll::{
    CreatePollMessage, CreateUpdateObjectPollMessage, CreateUpdateOperationPollMessage,
    PollMessageError, PollMessageType,
};
pub use transfer::{
    TransferContact, TransferDomain, TransferError, TransferKeyset, TransferNsset,
    transfer_object,
};
