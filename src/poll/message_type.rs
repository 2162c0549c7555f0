//! Poll message types
//!
//! Names match `messagetype.name`.

use serde::Serialize;
use std::fmt;

use crate::core_types::ObjectType;

/// Whose sponsor receives the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Sponsor in the history entry preceding the action (losing registrar)
    SponsorBeforeAction,
    /// Sponsor in the history entry written by the action
    SponsorAfterAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMessageType {
    TransferContact,
    TransferNsset,
    TransferDomain,
    TransferKeyset,
    DeleteContact,
    DeleteNsset,
    DeleteDomain,
    DeleteKeyset,
    UpdateContact,
    UpdateNsset,
    UpdateDomain,
    UpdateKeyset,
}

impl PollMessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollMessageType::TransferContact => "transfer_contact",
            PollMessageType::TransferNsset => "transfer_nsset",
            PollMessageType::TransferDomain => "transfer_domain",
            PollMessageType::TransferKeyset => "transfer_keyset",
            PollMessageType::DeleteContact => "delete_contact",
            PollMessageType::DeleteNsset => "delete_nsset",
            PollMessageType::DeleteDomain => "delete_domain",
            PollMessageType::DeleteKeyset => "delete_keyset",
            PollMessageType::UpdateContact => "update_contact",
            PollMessageType::UpdateNsset => "update_nsset",
            PollMessageType::UpdateDomain => "update_domain",
            PollMessageType::UpdateKeyset => "update_keyset",
        }
    }

    /// Object type the message must be about
    pub fn object_type(&self) -> ObjectType {
        match self {
            PollMessageType::TransferContact
            | PollMessageType::DeleteContact
            | PollMessageType::UpdateContact => ObjectType::Contact,
            PollMessageType::TransferNsset
            | PollMessageType::DeleteNsset
            | PollMessageType::UpdateNsset => ObjectType::Nsset,
            PollMessageType::TransferDomain
            | PollMessageType::DeleteDomain
            | PollMessageType::UpdateDomain => ObjectType::Domain,
            PollMessageType::TransferKeyset
            | PollMessageType::DeleteKeyset
            | PollMessageType::UpdateKeyset => ObjectType::Keyset,
        }
    }

    pub fn recipient(&self) -> Recipient {
        match self {
            PollMessageType::TransferContact
            | PollMessageType::TransferNsset
            | PollMessageType::TransferDomain
            | PollMessageType::TransferKeyset => Recipient::SponsorBeforeAction,
            _ => Recipient::SponsorAfterAction,
        }
    }

    pub fn update_of(object_type: ObjectType) -> Self {
        match object_type {
            ObjectType::Contact => PollMessageType::UpdateContact,
            ObjectType::Nsset => PollMessageType::UpdateNsset,
            ObjectType::Domain => PollMessageType::UpdateDomain,
            ObjectType::Keyset => PollMessageType::UpdateKeyset,
        }
    }

    pub fn transfer_of(object_type: ObjectType) -> Self {
        match object_type {
            ObjectType::Contact => PollMessageType::TransferContact,
            ObjectType::Nsset => PollMessageType::TransferNsset,
            ObjectType::Domain => PollMessageType::TransferDomain,
            ObjectType::Keyset => PollMessageType::TransferKeyset,
        }
    }

    pub fn delete_of(object_type: ObjectType) -> Self {
        match object_type {
            ObjectType::Contact => PollMessageType::DeleteContact,
            ObjectType::Nsset => PollMessageType::DeleteNsset,
            ObjectType::Domain => PollMessageType::DeleteDomain,
            ObjectType::Keyset => PollMessageType::DeleteKeyset,
        }
    }
}

impl fmt::Display for PollMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
