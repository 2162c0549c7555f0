//! Domain collaborators

use super::contact_map::DOMAIN_ADMIN_CONTACTS;
use super::error::UpdateObjectError;
use super::{begin_update, finish_update, get_live_contact_id};
use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType};
use crate::db::OperationContext;

/// Registrant and admin contact handles of a domain, locking the domain row.
///
/// Empty when the domain does not exist.
pub async fn get_domain_joined_contacts(
    ctx: &mut OperationContext,
    domain_id: ObjectId,
) -> Result<Vec<String>, sqlx::Error> {
    let registrant: Option<String> = sqlx::query_scalar(
        r#"
        SELECT c.name FROM domain d
        JOIN object_registry c ON c.id = d.registrant
        WHERE d.id = $1
        FOR UPDATE OF d
        "#,
    )
    .bind(domain_id)
    .fetch_optional(ctx.conn())
    .await?;

    let Some(registrant) = registrant else {
        return Ok(Vec::new());
    };

    let mut handles = vec![registrant];
    handles.extend(DOMAIN_ADMIN_CONTACTS.list_handles(ctx, domain_id).await?);
    Ok(handles)
}

/// Change the registrant and/or admin contacts of a domain
#[derive(Debug, Clone)]
pub struct UpdateDomain {
    domain_id: ObjectId,
    registrar: String,
    registrant: Option<String>,
    add_admin_contacts: Vec<String>,
    rem_admin_contacts: Vec<String>,
    logger_request_id: Option<LoggerRequestId>,
}

impl UpdateDomain {
    pub fn new(domain_id: ObjectId, registrar: impl Into<String>) -> Self {
        Self {
            domain_id,
            registrar: registrar.into(),
            registrant: None,
            add_admin_contacts: Vec::new(),
            rem_admin_contacts: Vec::new(),
            logger_request_id: None,
        }
    }

    pub fn set_registrant(mut self, handle: impl Into<String>) -> Self {
        self.registrant = Some(handle.into());
        self
    }

    pub fn add_admin_contact(mut self, handle: impl Into<String>) -> Self {
        self.add_admin_contacts.push(handle.into());
        self
    }

    pub fn rem_admin_contact(mut self, handle: impl Into<String>) -> Self {
        self.rem_admin_contacts.push(handle.into());
        self
    }

    pub fn set_logger_request_id(mut self, logger_request_id: Option<LoggerRequestId>) -> Self {
        self.logger_request_id = logger_request_id;
        self
    }

    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<HistoryId, UpdateObjectError> {
        let registrar_id =
            begin_update(ctx, ObjectType::Domain, self.domain_id, &self.registrar).await?;

        if let Some(registrant) = &self.registrant {
            let contact_id = get_live_contact_id(ctx, registrant)
                .await?
                .ok_or_else(|| UpdateObjectError::UnknownRegistrantHandle(registrant.clone()))?;
            sqlx::query("UPDATE domain SET registrant = $1 WHERE id = $2")
                .bind(contact_id)
                .bind(self.domain_id)
                .execute(ctx.conn())
                .await?;
        }

        let problems = DOMAIN_ADMIN_CONTACTS
            .apply(
                ctx,
                self.domain_id,
                &self.rem_admin_contacts,
                &self.add_admin_contacts,
            )
            .await?;
        if !problems.is_empty() {
            return Err(UpdateObjectError::InvalidContacts(problems));
        }

        finish_update(
            ctx,
            ObjectType::Domain,
            self.domain_id,
            registrar_id,
            self.logger_request_id,
        )
        .await
    }
}
