//! Object state names
//!
//! Names match `enum_object_states.name`.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Named object state tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ObjectState {
    ServerDeleteProhibited,
    ServerRenewProhibited,
    ServerTransferProhibited,
    ServerUpdateProhibited,
    ServerRegistrantChangeProhibited,
    ServerBlocked,
    ServerOutzoneManual,
    ServerInzoneManual,
    Linked,
    ContactInManualVerification,
    ContactPassedManualVerification,
    ContactFailedManualVerification,
    MojeidContact,
    IdentifiedContact,
    ValidatedContact,
    ConditionallyIdentifiedContact,
    Expired,
    Outzone,
    DeleteCandidate,
}

impl ObjectState {
    pub const ALL: [ObjectState; 19] = [
        ObjectState::ServerDeleteProhibited,
        ObjectState::ServerRenewProhibited,
        ObjectState::ServerTransferProhibited,
        ObjectState::ServerUpdateProhibited,
        ObjectState::ServerRegistrantChangeProhibited,
        ObjectState::ServerBlocked,
        ObjectState::ServerOutzoneManual,
        ObjectState::ServerInzoneManual,
        ObjectState::Linked,
        ObjectState::ContactInManualVerification,
        ObjectState::ContactPassedManualVerification,
        ObjectState::ContactFailedManualVerification,
        ObjectState::MojeidContact,
        ObjectState::IdentifiedContact,
        ObjectState::ValidatedContact,
        ObjectState::ConditionallyIdentifiedContact,
        ObjectState::Expired,
        ObjectState::Outzone,
        ObjectState::DeleteCandidate,
    ];

    /// Name stored in `enum_object_states`
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectState::ServerDeleteProhibited => "serverDeleteProhibited",
            ObjectState::ServerRenewProhibited => "serverRenewProhibited",
            ObjectState::ServerTransferProhibited => "serverTransferProhibited",
            ObjectState::ServerUpdateProhibited => "serverUpdateProhibited",
            ObjectState::ServerRegistrantChangeProhibited => "serverRegistrantChangeProhibited",
            ObjectState::ServerBlocked => "serverBlocked",
            ObjectState::ServerOutzoneManual => "serverOutzoneManual",
            ObjectState::ServerInzoneManual => "serverInzoneManual",
            ObjectState::Linked => "linked",
            ObjectState::ContactInManualVerification => "contactInManualVerification",
            ObjectState::ContactPassedManualVerification => "contactPassedManualVerification",
            ObjectState::ContactFailedManualVerification => "contactFailedManualVerification",
            ObjectState::MojeidContact => "mojeidContact",
            ObjectState::IdentifiedContact => "identifiedContact",
            ObjectState::ValidatedContact => "validatedContact",
            ObjectState::ConditionallyIdentifiedContact => "conditionallyIdentifiedContact",
            ObjectState::Expired => "expired",
            ObjectState::Outzone => "outzone",
            ObjectState::DeleteCandidate => "deleteCandidate",
        }
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Unknown object state: {}", s))
    }
}
