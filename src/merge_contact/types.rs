//! Merge report types

use serde::Serialize;

use crate::core_types::{HistoryId, ObjectId};

/// A contact as captured when the merge locked it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockedContact {
    pub id: ObjectId,
    pub history_id: HistoryId,
    pub roid: String,
    pub handle: String,
    pub sponsoring_registrar: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeContactLockedContactId {
    pub src: LockedContact,
    pub dst: LockedContact,
}

/// Domain whose registrant moved from source to destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeContactUpdateDomainRegistrant {
    pub fqdn: String,
    pub domain_id: ObjectId,
    pub sponsoring_registrar: String,
    pub set_registrant: String,
    /// `None` in a dry run
    pub history_id: Option<HistoryId>,
}

/// Domain whose admin contacts lost the source (and gained the destination)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeContactUpdateDomainAdminContact {
    pub fqdn: String,
    pub domain_id: ObjectId,
    pub sponsoring_registrar: String,
    pub rem_admin_contact: String,
    /// `None` when the destination already was an admin contact
    pub add_admin_contact: Option<String>,
    pub history_id: Option<HistoryId>,
}

/// Nsset or keyset whose technical contacts lost the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeContactUpdateTechContact {
    pub handle: String,
    pub id: ObjectId,
    pub sponsoring_registrar: String,
    pub rem_tech_contact: String,
    /// `None` when the destination already was a technical contact
    pub add_tech_contact: Option<String>,
    pub history_id: Option<HistoryId>,
}

/// What a merge changed, or would change in a dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeContactOutput {
    pub contactid: MergeContactLockedContactId,
    pub dry_run: bool,
    pub update_domain_registrant: Vec<MergeContactUpdateDomainRegistrant>,
    pub update_domain_admin_contact: Vec<MergeContactUpdateDomainAdminContact>,
    pub update_nsset_tech_contact: Vec<MergeContactUpdateTechContact>,
    pub update_keyset_tech_contact: Vec<MergeContactUpdateTechContact>,
}

impl MergeContactOutput {
    pub fn new(contactid: MergeContactLockedContactId, dry_run: bool) -> Self {
        Self {
            contactid,
            dry_run,
            update_domain_registrant: Vec::new(),
            update_domain_admin_contact: Vec::new(),
            update_nsset_tech_contact: Vec::new(),
            update_keyset_tech_contact: Vec::new(),
        }
    }

    /// History ids written by the merge, in report order
    pub fn history_ids(&self) -> Vec<HistoryId> {
        self.update_domain_registrant
            .iter()
            .filter_map(|r| r.history_id)
            .chain(
                self.update_domain_admin_contact
                    .iter()
                    .filter_map(|r| r.history_id),
            )
            .chain(self.update_nsset_tech_contact.iter().filter_map(|r| r.history_id))
            .chain(
                self.update_keyset_tech_contact
                    .iter()
                    .filter_map(|r| r.history_id),
            )
            .collect()
    }

    /// Copy with history ids and the dry-run flag cleared, for comparing a dry
    /// run with a real run
    pub fn relations_only(&self) -> Self {
        let mut out = self.clone();
        out.dry_run = false;
        out.update_domain_registrant
            .iter_mut()
            .for_each(|r| r.history_id = None);
        out.update_domain_admin_contact
            .iter_mut()
            .for_each(|r| r.history_id = None);
        out.update_nsset_tech_contact
            .iter_mut()
            .for_each(|r| r.history_id = None);
        out.update_keyset_tech_contact
            .iter_mut()
            .for_each(|r| r.history_id = None);
        out
    }
}
