//! Poll messages
//!
//! Asynchronous notifications queued for registrars about actions on objects
//! they sponsor or reference. Each message is tied to the history entry the
//! action wrote.

pub mod create;
pub mod error;
pub mod message_type;
pub mod update_operation;

pub use create::{CreatePollMessage, POLL_MESSAGE_RETENTION_DAYS};
pub use error::PollMessageError;
pub use message_type::{PollMessageType, Recipient};
pub use update_operation::{CreateUpdateObjectPollMessage, CreateUpdateOperationPollMessage};
