use thiserror::Error;

use crate::core_types::{HistoryId, ObjectType};
use crate::db::RowCountError;

#[derive(Error, Debug)]
pub enum PollMessageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("History {0} not found")]
    NotFound(HistoryId),

    #[error("History {0} matches {1} rows")]
    TooManyRows(HistoryId, usize),

    #[error("Message about {expected} cannot refer to a {found}")]
    NotCorrespondingObjectType {
        expected: ObjectType,
        found: ObjectType,
    },

    #[error("Unknown object type id: {0}")]
    UnknownObjectType(i16),

    #[error("Unknown message type: {0}")]
    UnknownMessageType(&'static str),
}

impl PollMessageError {
    pub(crate) fn from_row_count(history_id: HistoryId, e: RowCountError) -> Self {
        match e {
            RowCountError::NotFound(_) => PollMessageError::NotFound(history_id),
            RowCountError::TooManyRows(_, n) => PollMessageError::TooManyRows(history_id, n),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            PollMessageError::Database(_) => "DATABASE_ERROR",
            PollMessageError::NotFound(_) => "NOT_FOUND",
            PollMessageError::TooManyRows(..) => "TOO_MANY_ROWS",
            PollMessageError::NotCorrespondingObjectType { .. } => "NOT_CORRESPONDING_OBJECT_TYPE",
            PollMessageError::UnknownObjectType(_) => "UNKNOWN_OBJECT_TYPE",
            PollMessageError::UnknownMessageType(_) => "UNKNOWN_MESSAGE_TYPE",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            PollMessageError::Database(_)
                | PollMessageError::TooManyRows(..)
                | PollMessageError::UnknownObjectType(_)
                | PollMessageError::UnknownMessageType(_)
        )
    }
}
