//! Transfer Error Types

use thiserror::Error;

use crate::core_types::{ObjectId, ObjectType};
use crate::history::HistoryError;

/// Transfer error types
#[derive(Error, Debug)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Unknown registrar: {0}")]
    UnknownRegistrar(String),

    #[error("Unknown object id: {0}")]
    UnknownObjectId(ObjectId),

    #[error("Unknown domain id: {0}")]
    UnknownDomainId(ObjectId),

    #[error("Unknown contact id: {0}")]
    UnknownContactId(ObjectId),

    #[error("Unknown nsset id: {0}")]
    UnknownNssetId(ObjectId),

    #[error("Unknown keyset id: {0}")]
    UnknownKeysetId(ObjectId),

    #[error("New registrar is already sponsoring the object")]
    NewRegistrarIsAlreadySponsoring,

    #[error("Incorrect authinfo password")]
    IncorrectAuthInfoPw,

    // === System Errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

impl TransferError {
    /// Get the error code
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::UnknownRegistrar(_) => "UNKNOWN_REGISTRAR",
            TransferError::UnknownObjectId(_) => "UNKNOWN_OBJECT_ID",
            TransferError::UnknownDomainId(_) => "UNKNOWN_DOMAIN_ID",
            TransferError::UnknownContactId(_) => "UNKNOWN_CONTACT_ID",
            TransferError::UnknownNssetId(_) => "UNKNOWN_NSSET_ID",
            TransferError::UnknownKeysetId(_) => "UNKNOWN_KEYSET_ID",
            TransferError::NewRegistrarIsAlreadySponsoring => "NEW_REGISTRAR_IS_ALREADY_SPONSORING",
            TransferError::IncorrectAuthInfoPw => "INCORRECT_AUTHINFO_PW",
            TransferError::Database(_) => "DATABASE_ERROR",
            TransferError::History(_) => "HISTORY_ERROR",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, TransferError::Database(_) | TransferError::History(_))
    }

    /// Replace the generic unknown-object error with the type-specific one
    pub fn for_object_type(self, object_type: ObjectType) -> Self {
        match self {
            TransferError::UnknownObjectId(id) => match object_type {
                ObjectType::Domain => TransferError::UnknownDomainId(id),
                ObjectType::Contact => TransferError::UnknownContactId(id),
                ObjectType::Nsset => TransferError::UnknownNssetId(id),
                ObjectType::Keyset => TransferError::UnknownKeysetId(id),
            },
            other => other,
        }
    }
}
