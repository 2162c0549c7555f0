//! Contact difference predicate
//!
//! A merge only proceeds when the predicate says the two contacts carry the
//! same data and both are in states that allow merging. Callers may plug in
//! their own policy through [`DiffContacts`].

use async_trait::async_trait;

use super::error::MergeContactError;
use crate::core_types::ObjectId;
use crate::db::OperationContext;
use crate::object::{ContactAddress, ContactInfo, InfoContactByHandle};
use crate::object_state::{
    GetObjectStates, LockObjectStateRequestLock, ObjectState, ObjectStatesInfo,
};

/// Address types taken into account when comparing contacts
pub const COMPARED_ADDRESS_TYPES: [&str; 5] =
    ["MAILING", "BILLING", "SHIPPING", "SHIPPING_2", "SHIPPING_3"];

/// Destination states that forbid a merge
const DST_BLOCKING_STATES: [ObjectState; 3] = [
    ObjectState::ServerBlocked,
    ObjectState::ContactInManualVerification,
    ObjectState::ContactFailedManualVerification,
];

/// Source states that forbid a merge
const SRC_BLOCKING_STATES: [ObjectState; 5] = [
    ObjectState::MojeidContact,
    ObjectState::ServerBlocked,
    ObjectState::ServerDeleteProhibited,
    ObjectState::ContactInManualVerification,
    ObjectState::ContactFailedManualVerification,
];

/// Decides whether two contacts differ
#[async_trait]
pub trait DiffContacts: Send + Sync {
    /// `Ok(true)` when the contacts differ and must not be merged.
    ///
    /// Policy violations other than a plain difference are reported as errors.
    async fn differs(
        &self,
        ctx: &mut OperationContext,
        src_handle: &str,
        dst_handle: &str,
    ) -> Result<bool, MergeContactError>;
}

/// Field-by-field comparison plus state gates on both contacts
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultDiffContacts;

#[async_trait]
impl DiffContacts for DefaultDiffContacts {
    async fn differs(
        &self,
        ctx: &mut OperationContext,
        src_handle: &str,
        dst_handle: &str,
    ) -> Result<bool, MergeContactError> {
        if src_handle.eq_ignore_ascii_case(dst_handle) {
            return Err(MergeContactError::IdenticalContactsHandle(
                src_handle.to_string(),
            ));
        }

        let src = InfoContactByHandle::new(src_handle)
            .exec(ctx)
            .await?
            .ok_or_else(|| MergeContactError::UnknownSourceContactHandle(src_handle.to_string()))?;
        let dst = InfoContactByHandle::new(dst_handle)
            .exec(ctx)
            .await?
            .ok_or_else(|| {
                MergeContactError::UnknownDestinationContactHandle(dst_handle.to_string())
            })?;

        for object_id in state_lock_order(src.id, dst.id) {
            LockObjectStateRequestLock::new(object_id).exec(ctx).await?;
        }

        let dst_states = ObjectStatesInfo::new(&GetObjectStates::new(dst.id).exec(ctx).await?);
        if dst_states.presents_any(&DST_BLOCKING_STATES) {
            return Err(MergeContactError::DstContactInvalid(dst.handle));
        }

        let src_states = ObjectStatesInfo::new(&GetObjectStates::new(src.id).exec(ctx).await?);
        if src_states.presents_any(&SRC_BLOCKING_STATES) || has_identity(ctx, src.id).await? {
            return Err(MergeContactError::SrcContactInvalid(src.handle));
        }

        let differ = contacts_differ(&src, &dst);
        tracing::debug!(
            src = %src.handle,
            dst = %dst.handle,
            differ = differ,
            "Contacts compared"
        );
        Ok(differ)
    }
}

/// State-request locks of both contacts are taken in ascending id order,
/// whichever of them is the source
fn state_lock_order(src_id: ObjectId, dst_id: ObjectId) -> [ObjectId; 2] {
    if src_id < dst_id {
        [src_id, dst_id]
    } else {
        [dst_id, src_id]
    }
}

/// The contact is attached to an active identity record
async fn has_identity(
    ctx: &mut OperationContext,
    contact_id: ObjectId,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM contact_identity WHERE contact_id = $1 AND canceled IS NULL)",
    )
    .bind(contact_id)
    .fetch_one(ctx.conn())
    .await
}

/// Trimmed text with NULL and empty treated alike
fn norm(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

fn text_differs(a: &Option<String>, b: &Option<String>) -> bool {
    norm(a) != norm(b)
}

fn address_differs(a: Option<&ContactAddress>, b: Option<&ContactAddress>) -> bool {
    let empty = ContactAddress::default();
    let a = a.unwrap_or(&empty);
    let b = b.unwrap_or(&empty);
    text_differs(&a.company_name, &b.company_name)
        || text_differs(&a.street1, &b.street1)
        || text_differs(&a.street2, &b.street2)
        || text_differs(&a.street3, &b.street3)
        || text_differs(&a.city, &b.city)
        || text_differs(&a.stateorprovince, &b.stateorprovince)
        || text_differs(&a.postalcode, &b.postalcode)
        || text_differs(&a.country, &b.country)
}

/// Compare the data the merge must preserve
pub fn contacts_differ(src: &ContactInfo, dst: &ContactInfo) -> bool {
    let (s, d) = (&src.data, &dst.data);

    let text_fields = [
        (&s.name, &d.name),
        (&s.organization, &d.organization),
        (&s.street1, &d.street1),
        (&s.street2, &d.street2),
        (&s.street3, &d.street3),
        (&s.city, &d.city),
        (&s.stateorprovince, &d.stateorprovince),
        (&s.postalcode, &d.postalcode),
        (&s.country, &d.country),
        (&s.telephone, &d.telephone),
        (&s.fax, &d.fax),
        (&s.email, &d.email),
        (&s.notifyemail, &d.notifyemail),
        (&s.vat, &d.vat),
        (&s.ssn, &d.ssn),
        (&s.ssntype, &d.ssntype),
    ];
    if text_fields.iter().any(|(a, b)| text_differs(a, b)) {
        return true;
    }

    let disclose = [
        (s.disclosename, d.disclosename),
        (s.discloseorganization, d.discloseorganization),
        (s.discloseaddress, d.discloseaddress),
        (s.disclosetelephone, d.disclosetelephone),
        (s.disclosefax, d.disclosefax),
        (s.discloseemail, d.discloseemail),
        (s.disclosevat, d.disclosevat),
        (s.discloseident, d.discloseident),
        (s.disclosenotifyemail, d.disclosenotifyemail),
    ];
    if disclose.iter().any(|(a, b)| a != b) || s.warning_letter != d.warning_letter {
        return true;
    }

    if COMPARED_ADDRESS_TYPES
        .iter()
        .any(|t| address_differs(src.addresses.get(*t), dst.addresses.get(*t)))
    {
        return true;
    }

    !src.sponsoring_registrar
        .eq_ignore_ascii_case(&dst.sponsoring_registrar)
}
