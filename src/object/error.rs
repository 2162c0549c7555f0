use std::fmt;
use thiserror::Error;

use crate::core_types::{ObjectId, ObjectType};
use crate::history::HistoryError;

/// Contact handles an update could not apply, grouped by reason
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRefProblems {
    /// No live contact with this handle
    pub unknown: Vec<String>,
    /// Asked to add a contact that is already linked
    pub already_set: Vec<String>,
    /// Asked to remove a contact that is not linked
    pub unassigned: Vec<String>,
}

impl ContactRefProblems {
    pub fn is_empty(&self) -> bool {
        self.unknown.is_empty() && self.already_set.is_empty() && self.unassigned.is_empty()
    }

    /// The only problem is that `handle`, and nothing else, is already linked
    pub fn is_only_already_set(&self, handle: &str) -> bool {
        self.unknown.is_empty()
            && self.unassigned.is_empty()
            && self.already_set.len() == 1
            && self.already_set[0].eq_ignore_ascii_case(handle)
    }
}

impl fmt::Display for ContactRefProblems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.unknown.is_empty() {
            parts.push(format!("unknown [{}]", self.unknown.join(", ")));
        }
        if !self.already_set.is_empty() {
            parts.push(format!("already set [{}]", self.already_set.join(", ")));
        }
        if !self.unassigned.is_empty() {
            parts.push(format!("unassigned [{}]", self.unassigned.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Errors of the object update/delete collaborators
#[derive(Error, Debug)]
pub enum UpdateObjectError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("History error: {0}")]
    History(#[from] HistoryError),

    #[error("Unknown registrar: {0}")]
    UnknownRegistrar(String),

    #[error("Unknown {object_type} id: {id}")]
    UnknownObjectId { object_type: ObjectType, id: ObjectId },

    #[error("Unknown contact handle: {0}")]
    UnknownContactHandle(String),

    #[error("Unknown registrant handle: {0}")]
    UnknownRegistrantHandle(String),

    #[error("Invalid contacts: {0}")]
    InvalidContacts(ContactRefProblems),

    #[error("Contact {0} is still referenced")]
    ContactLinked(String),
}

impl UpdateObjectError {
    pub fn code(&self) -> &'static str {
        match self {
            UpdateObjectError::Database(_) => "DATABASE_ERROR",
            UpdateObjectError::History(_) => "HISTORY_ERROR",
            UpdateObjectError::UnknownRegistrar(_) => "UNKNOWN_REGISTRAR",
            UpdateObjectError::UnknownObjectId { .. } => "UNKNOWN_OBJECT_ID",
            UpdateObjectError::UnknownContactHandle(_) => "UNKNOWN_CONTACT_HANDLE",
            UpdateObjectError::UnknownRegistrantHandle(_) => "UNKNOWN_REGISTRANT_HANDLE",
            UpdateObjectError::InvalidContacts(_) => "INVALID_CONTACTS",
            UpdateObjectError::ContactLinked(_) => "CONTACT_LINKED",
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            UpdateObjectError::Database(_) | UpdateObjectError::History(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn already_set(handles: &[&str]) -> ContactRefProblems {
        ContactRefProblems {
            already_set: handles.iter().map(|h| h.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_only_already_set_matches_case_insensitively() {
        assert!(already_set(&["DST-1"]).is_only_already_set("dst-1"));
        assert!(!already_set(&["DST-1"]).is_only_already_set("OTHER"));
    }

    #[test]
    fn test_only_already_set_rejects_mixed_problems() {
        assert!(!already_set(&["DST", "X"]).is_only_already_set("DST"));

        let mut problems = already_set(&["DST"]);
        problems.unassigned.push("SRC".to_string());
        assert!(!problems.is_only_already_set("DST"));

        assert!(!ContactRefProblems::default().is_only_already_set("DST"));
    }

    #[test]
    fn test_display() {
        let problems = ContactRefProblems {
            unknown: vec!["A".into()],
            already_set: vec![],
            unassigned: vec!["B".into(), "C".into()],
        };
        assert_eq!(problems.to_string(), "unknown [A]; unassigned [B, C]");
        assert!(!problems.is_empty());
        assert!(ContactRefProblems::default().is_empty());
    }

    #[test]
    fn test_codes() {
        let err = UpdateObjectError::InvalidContacts(already_set(&["DST"]));
        assert_eq!(err.code(), "INVALID_CONTACTS");
        assert!(!err.is_internal());
        assert_eq!(err.to_string(), "Invalid contacts: already set [DST]");
    }
}
