//! Merge Contact Error Types

use thiserror::Error;

use crate::object::UpdateObjectError;
use crate::object_state::ObjectStateError;

#[derive(Error, Debug)]
pub enum MergeContactError {
    // === Validation Errors ===
    #[error("Source and destination contact handles are identical: {0}")]
    IdenticalContactsHandle(String),

    #[error("Source and destination are the same contact object: {0}")]
    IdenticalContactsRoid(String),

    #[error("Unknown source contact handle: {0}")]
    UnknownSourceContactHandle(String),

    #[error("Unknown destination contact handle: {0}")]
    UnknownDestinationContactHandle(String),

    #[error("No contact difference predicate supplied")]
    UnableToGetDifferenceOfContacts,

    #[error("Contacts {src} and {dst} differ")]
    ContactsDiffer { src: String, dst: String },

    #[error("Destination contact is in a state that prevents merge: {0}")]
    DstContactInvalid(String),

    #[error("Source contact is in a state that prevents merge: {0}")]
    SrcContactInvalid(String),

    #[error("Object blocked: {0}")]
    ObjectBlocked(String),

    // === Collaborator / System Errors ===
    #[error("Update failed: {0}")]
    Update(#[from] UpdateObjectError),

    #[error("Object state error: {0}")]
    ObjectState(#[from] ObjectStateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl MergeContactError {
    pub fn code(&self) -> &'static str {
        match self {
            MergeContactError::IdenticalContactsHandle(_) => "IDENTICAL_CONTACTS_HANDLE",
            MergeContactError::IdenticalContactsRoid(_) => "IDENTICAL_CONTACTS_ROID",
            MergeContactError::UnknownSourceContactHandle(_) => "UNKNOWN_SOURCE_CONTACT_HANDLE",
            MergeContactError::UnknownDestinationContactHandle(_) => {
                "UNKNOWN_DESTINATION_CONTACT_HANDLE"
            }
            MergeContactError::UnableToGetDifferenceOfContacts => {
                "UNABLE_TO_GET_DIFFERENCE_OF_CONTACTS"
            }
            MergeContactError::ContactsDiffer { .. } => "CONTACTS_DIFFER",
            MergeContactError::DstContactInvalid(_) => "DST_CONTACT_INVALID",
            MergeContactError::SrcContactInvalid(_) => "SRC_CONTACT_INVALID",
            MergeContactError::ObjectBlocked(_) => "OBJECT_BLOCKED",
            MergeContactError::Update(e) => e.code(),
            MergeContactError::ObjectState(e) => e.code(),
            MergeContactError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn is_internal(&self) -> bool {
        match self {
            MergeContactError::Update(e) => e.is_internal(),
            MergeContactError::ObjectState(e) => e.is_internal(),
            MergeContactError::Database(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(
            MergeContactError::ObjectBlocked("example.cz".into()).code(),
            "OBJECT_BLOCKED"
        );
        assert_eq!(
            MergeContactError::UnableToGetDifferenceOfContacts.code(),
            "UNABLE_TO_GET_DIFFERENCE_OF_CONTACTS"
        );
        assert_eq!(
            MergeContactError::Update(UpdateObjectError::UnknownRegistrar("R".into())).code(),
            "UNKNOWN_REGISTRAR"
        );
    }

    #[test]
    fn test_internal_classification() {
        assert!(!MergeContactError::ContactsDiffer {
            src: "A".into(),
            dst: "B".into()
        }
        .is_internal());
        assert!(MergeContactError::Database(sqlx::Error::RowNotFound).is_internal());
        assert!(
            MergeContactError::ObjectState(ObjectStateError::LockNotAcquired(1)).is_internal()
        );
    }

    #[test]
    fn test_display_names_the_object() {
        assert_eq!(
            MergeContactError::ObjectBlocked("example.cz".into()).to_string(),
            "Object blocked: example.cz"
        );
    }
}
