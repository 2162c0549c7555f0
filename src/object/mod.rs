//! Registry object collaborators
//!
//! The narrow set of per-type update, delete and info operations the transfer
//! and merge operations drive. Each mutating operation locks the object, applies
//! its changes, stamps the updating registrar and appends a history snapshot.

pub(crate) mod contact_map;
pub mod contact;
pub mod domain;
pub mod error;
pub mod keyset;
pub mod nsset;

pub use contact::{
    ContactAddress, ContactData, ContactInfo, DeleteContactByHandle, InfoContactByHandle,
    UpdateContactAuthInfo,
};
pub use domain::{UpdateDomain, get_domain_joined_contacts};
pub use error::{ContactRefProblems, UpdateObjectError};
pub use keyset::{UpdateKeyset, get_keyset_tech_contacts};
pub use nsset::{UpdateNsset, get_nsset_tech_contacts};

use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType, RegistrarId};
use crate::db::OperationContext;
use crate::history::{copy_to_history, create_object_history};
use crate::registrar::get_registrar_id_by_handle;

/// Resolve a live contact handle case-insensitively
pub async fn get_live_contact_id(
    ctx: &mut OperationContext,
    handle: &str,
) -> Result<Option<ObjectId>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT id FROM object_registry
        WHERE type = $1 AND erdate IS NULL AND UPPER(name) = UPPER($2)
        "#,
    )
    .bind(ObjectType::Contact.id())
    .bind(handle)
    .fetch_optional(ctx.conn())
    .await
}

/// Resolve the acting registrar and lock the live object being updated
async fn begin_update(
    ctx: &mut OperationContext,
    object_type: ObjectType,
    object_id: ObjectId,
    registrar_handle: &str,
) -> Result<RegistrarId, UpdateObjectError> {
    let registrar_id = get_registrar_id_by_handle(ctx, registrar_handle)
        .await?
        .ok_or_else(|| UpdateObjectError::UnknownRegistrar(registrar_handle.to_string()))?;

    let locked: Option<ObjectId> = sqlx::query_scalar(
        r#"
        SELECT id FROM object_registry
        WHERE id = $1 AND type = $2 AND erdate IS NULL
        FOR UPDATE
        "#,
    )
    .bind(object_id)
    .bind(object_type.id())
    .fetch_optional(ctx.conn())
    .await?;

    if locked.is_none() {
        return Err(UpdateObjectError::UnknownObjectId {
            object_type,
            id: object_id,
        });
    }
    Ok(registrar_id)
}

/// Stamp the updating registrar and append the history snapshot
async fn finish_update(
    ctx: &mut OperationContext,
    object_type: ObjectType,
    object_id: ObjectId,
    registrar_id: RegistrarId,
    logger_request_id: Option<LoggerRequestId>,
) -> Result<HistoryId, UpdateObjectError> {
    sqlx::query("UPDATE object SET upid = $1, update = now() WHERE id = $2")
        .bind(registrar_id)
        .bind(object_id)
        .execute(ctx.conn())
        .await?;

    let history_id = create_object_history(ctx, object_id, logger_request_id).await?;
    copy_to_history(ctx, object_type, object_id, history_id).await?;

    tracing::info!(
        object_type = %object_type,
        object_id = object_id,
        history_id = history_id,
        "Object updated"
    );
    Ok(history_id)
}
