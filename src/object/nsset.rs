//! Nsset collaborators

use super::contact_map::NSSET_TECH_CONTACTS;
use super::error::UpdateObjectError;
use super::{begin_update, finish_update};
use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType};
use crate::db::OperationContext;

/// Technical contact handles of an nsset, locking the nsset row
pub async fn get_nsset_tech_contacts(
    ctx: &mut OperationContext,
    nsset_id: ObjectId,
) -> Result<Vec<String>, sqlx::Error> {
    let locked: Option<ObjectId> =
        sqlx::query_scalar("SELECT id FROM nsset WHERE id = $1 FOR UPDATE")
            .bind(nsset_id)
            .fetch_optional(ctx.conn())
            .await?;
    if locked.is_none() {
        return Ok(Vec::new());
    }
    NSSET_TECH_CONTACTS.list_handles(ctx, nsset_id).await
}

/// Change the technical contacts of an nsset
#[derive(Debug, Clone)]
pub struct UpdateNsset {
    nsset_id: ObjectId,
    registrar: String,
    add_tech_contacts: Vec<String>,
    rem_tech_contacts: Vec<String>,
    logger_request_id: Option<LoggerRequestId>,
}

impl UpdateNsset {
    pub fn new(nsset_id: ObjectId, registrar: impl Into<String>) -> Self {
        Self {
            nsset_id,
            registrar: registrar.into(),
            add_tech_contacts: Vec::new(),
            rem_tech_contacts: Vec::new(),
            logger_request_id: None,
        }
    }

    pub fn add_tech_contact(mut self, handle: impl Into<String>) -> Self {
        self.add_tech_contacts.push(handle.into());
        self
    }

    pub fn rem_tech_contact(mut self, handle: impl Into<String>) -> Self {
        self.rem_tech_contacts.push(handle.into());
        self
    }

    pub fn set_logger_request_id(mut self, logger_request_id: Option<LoggerRequestId>) -> Self {
        self.logger_request_id = logger_request_id;
        self
    }

    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<HistoryId, UpdateObjectError> {
        let registrar_id =
            begin_update(ctx, ObjectType::Nsset, self.nsset_id, &self.registrar).await?;

        let problems = NSSET_TECH_CONTACTS
            .apply(
                ctx,
                self.nsset_id,
                &self.rem_tech_contacts,
                &self.add_tech_contacts,
            )
            .await?;
        if !problems.is_empty() {
            return Err(UpdateObjectError::InvalidContacts(problems));
        }

        finish_update(
            ctx,
            ObjectType::Nsset,
            self.nsset_id,
            registrar_id,
            self.logger_request_id,
        )
        .await
    }
}
