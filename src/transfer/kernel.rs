//! Generic transfer of a registry object to another registrar

use sqlx::Row;
use tracing::{debug, info};

use super::error::TransferError;
use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType, RegistrarId};
use crate::db::OperationContext;
use crate::history::{copy_to_history, create_object_history};
use crate::object::{
    get_domain_joined_contacts, get_keyset_tech_contacts, get_nsset_tech_contacts,
};
use crate::registrar::get_registrar_id_by_handle;

/// Move `object_id` under `new_registrar_handle`.
///
/// # Checks (in order)
/// 1. the registrar exists
/// 2. the object is live (its rows are locked from here on)
/// 3. the registrar is not already the sponsor
/// 4. `authinfo_pw` equals the object's password or that of a live contact
///    named in `joined_contact_handles`
///
/// On success the sponsor and transfer timestamp change and a new history
/// snapshot is written; its id is returned.
pub async fn transfer_object(
    ctx: &mut OperationContext,
    object_id: ObjectId,
    new_registrar_handle: &str,
    authinfo_pw: &str,
    joined_contact_handles: &[String],
    logger_request_id: Option<LoggerRequestId>,
) -> Result<HistoryId, TransferError> {
    transfer_checked(
        ctx,
        object_id,
        None,
        new_registrar_handle,
        authinfo_pw,
        JoinedContacts::Handles(joined_contact_handles),
        logger_request_id,
    )
    .await
}

/// Contacts whose passwords are accepted besides the object's own
enum JoinedContacts<'a> {
    Handles(&'a [String]),
    /// Read from the locked object: registrant and admins of a domain,
    /// technical contacts of an nsset or keyset, none for a contact
    OfObjectType(ObjectType),
}

impl JoinedContacts<'_> {
    async fn resolve(
        &self,
        ctx: &mut OperationContext,
        object_id: ObjectId,
    ) -> Result<Vec<String>, sqlx::Error> {
        match self {
            JoinedContacts::Handles(handles) => Ok(handles.to_vec()),
            JoinedContacts::OfObjectType(ObjectType::Domain) => {
                get_domain_joined_contacts(ctx, object_id).await
            }
            JoinedContacts::OfObjectType(ObjectType::Nsset) => {
                get_nsset_tech_contacts(ctx, object_id).await
            }
            JoinedContacts::OfObjectType(ObjectType::Keyset) => {
                get_keyset_tech_contacts(ctx, object_id).await
            }
            JoinedContacts::OfObjectType(ObjectType::Contact) => Ok(Vec::new()),
        }
    }
}

/// The kernel checks; with `object_type` set, an object of another type
/// counts as missing
async fn transfer_checked(
    ctx: &mut OperationContext,
    object_id: ObjectId,
    object_type: Option<ObjectType>,
    new_registrar_handle: &str,
    authinfo_pw: &str,
    joined_contacts: JoinedContacts<'_>,
    logger_request_id: Option<LoggerRequestId>,
) -> Result<HistoryId, TransferError> {
    let new_registrar_id = get_registrar_id_by_handle(ctx, new_registrar_handle)
        .await?
        .ok_or_else(|| TransferError::UnknownRegistrar(new_registrar_handle.to_string()))?;

    let row = sqlx::query(
        r#"
        SELECT o.clid, o.authinfopw
        FROM object_registry oreg
        JOIN object o ON o.id = oreg.id
        WHERE oreg.id = $1 AND oreg.erdate IS NULL
          AND ($2::smallint IS NULL OR oreg.type = $2)
        FOR UPDATE OF oreg, o
        "#,
    )
    .bind(object_id)
    .bind(object_type.map(|t| t.id()))
    .fetch_optional(ctx.conn())
    .await?
    .ok_or(TransferError::UnknownObjectId(object_id))?;

    let sponsoring_registrar_id: RegistrarId = row.try_get("clid")?;
    if sponsoring_registrar_id == new_registrar_id {
        return Err(TransferError::NewRegistrarIsAlreadySponsoring);
    }

    let object_authinfo_pw: String = row.try_get("authinfopw")?;
    let authorized = if object_authinfo_pw == authinfo_pw {
        true
    } else {
        let handles = joined_contacts.resolve(ctx, object_id).await?;
        contact_authinfo_matches(ctx, &handles, authinfo_pw).await?
    };
    if !authorized {
        debug!(object_id = object_id, "Transfer rejected: authinfo mismatch");
        return Err(TransferError::IncorrectAuthInfoPw);
    }

    sqlx::query("UPDATE object SET clid = $1, trdate = now() WHERE id = $2")
        .bind(new_registrar_id)
        .bind(object_id)
        .execute(ctx.conn())
        .await?;

    let history_id = create_object_history(ctx, object_id, logger_request_id).await?;

    info!(
        object_id = object_id,
        old_registrar_id = sponsoring_registrar_id,
        new_registrar = %new_registrar_handle,
        history_id = history_id,
        "Object transferred"
    );
    Ok(history_id)
}

/// Case-sensitive match against the passwords of the joined contacts
async fn contact_authinfo_matches(
    ctx: &mut OperationContext,
    contact_handles: &[String],
    authinfo_pw: &str,
) -> Result<bool, sqlx::Error> {
    if contact_handles.is_empty() {
        return Ok(false);
    }

    let passwords: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT o.authinfopw
        FROM object_registry oreg
        JOIN object o ON o.id = oreg.id
        WHERE oreg.type = $1
          AND oreg.erdate IS NULL
          AND UPPER(oreg.name) IN (SELECT UPPER(h) FROM unnest($2::text[]) AS h)
        "#,
    )
    .bind(ObjectType::Contact.id())
    .bind(contact_handles)
    .fetch_all(ctx.conn())
    .await?;

    Ok(passwords.iter().any(|pw| pw == authinfo_pw))
}

/// Kernel plus the per-type steps shared by every wrapper
pub(super) async fn transfer_typed_object(
    ctx: &mut OperationContext,
    object_type: ObjectType,
    object_id: ObjectId,
    new_registrar_handle: &str,
    authinfo_pw: &str,
    logger_request_id: Option<LoggerRequestId>,
) -> Result<HistoryId, TransferError> {
    let history_id = transfer_checked(
        ctx,
        object_id,
        Some(object_type),
        new_registrar_handle,
        authinfo_pw,
        JoinedContacts::OfObjectType(object_type),
        logger_request_id,
    )
    .await
    .map_err(|e| e.for_object_type(object_type))?;

    copy_to_history(ctx, object_type, object_id, history_id).await?;
    Ok(history_id)
}
