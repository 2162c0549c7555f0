//! Core types used throughout the registry operations
//!
//! Identifiers are plain aliases over the PostgreSQL `bigint` columns they
//! come from, so they bind and decode without conversion.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Object ID - `object_registry.id`.
///
/// # Constraints:
/// - **Immutable**: shared by the live object and all of its history rows
/// - **Unique across types**: a contact and a domain never share an id
pub type ObjectId = i64;

/// History ID - `history.id`, strictly increasing along an object's chain.
pub type HistoryId = i64;

/// Registrar ID - `registrar.id`
pub type RegistrarId = i64;

/// Poll message ID - `message.id`
pub type MessageId = i64;

/// Audit correlation id supplied by the caller and stored on every history row
pub type LoggerRequestId = i64;

/// Registrable object type
///
/// IDs match `enum_object_type` / `object_registry.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum ObjectType {
    Contact = 1,
    Nsset = 2,
    Domain = 3,
    Keyset = 4,
}

impl ObjectType {
    /// Get the numeric type ID for PostgreSQL storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from `object_registry.type`
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(ObjectType::Contact),
            2 => Some(ObjectType::Nsset),
            3 => Some(ObjectType::Domain),
            4 => Some(ObjectType::Keyset),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Contact => "contact",
            ObjectType::Nsset => "nsset",
            ObjectType::Domain => "domain",
            ObjectType::Keyset => "keyset",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contact" => Ok(ObjectType::Contact),
            "nsset" => Ok(ObjectType::Nsset),
            "domain" => Ok(ObjectType::Domain),
            "keyset" => Ok(ObjectType::Keyset),
            _ => Err(format!("Invalid object type: {}", s)),
        }
    }
}
