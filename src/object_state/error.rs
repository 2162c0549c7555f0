use thiserror::Error;

use super::state::ObjectState;
use crate::core_types::ObjectId;

#[derive(Error, Debug)]
pub enum ObjectStateError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No registry object behind the id, so there is no lock row to take
    #[error("Unable to lock state requests of object {0}")]
    LockNotAcquired(ObjectId),

    #[error("State {state} cannot be requested for object {object_id}")]
    StateNotApplicable {
        object_id: ObjectId,
        state: ObjectState,
    },
}

impl ObjectStateError {
    pub fn code(&self) -> &'static str {
        match self {
            ObjectStateError::Database(_) => "DATABASE_ERROR",
            ObjectStateError::LockNotAcquired(_) => "LOCK_NOT_ACQUIRED",
            ObjectStateError::StateNotApplicable { .. } => "STATE_NOT_APPLICABLE",
        }
    }

    /// Bad-path errors are not meant to be handled by ordinary callers
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ObjectStateError::Database(_) | ObjectStateError::LockNotAcquired(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_failure_is_internal() {
        let err = ObjectStateError::LockNotAcquired(7);
        assert!(err.is_internal());
        assert_eq!(err.code(), "LOCK_NOT_ACQUIRED");
        assert_eq!(err.to_string(), "Unable to lock state requests of object 7");
    }

    #[test]
    fn test_not_applicable_is_superable() {
        let err = ObjectStateError::StateNotApplicable {
            object_id: 3,
            state: ObjectState::ContactPassedManualVerification,
        };
        assert!(!err.is_internal());
        assert_eq!(
            err.to_string(),
            "State contactPassedManualVerification cannot be requested for object 3"
        );
    }
}
