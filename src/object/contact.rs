//! Contact collaborators

use serde::Serialize;
use sqlx::{FromRow, Row};
use std::collections::BTreeMap;

use super::error::UpdateObjectError;
use super::{begin_update, finish_update, get_live_contact_id};
use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType};
use crate::db::OperationContext;
use crate::history::close_object_history;

/// Contact data compared when merging duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct ContactData {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub street3: Option<String>,
    pub city: Option<String>,
    pub stateorprovince: Option<String>,
    pub postalcode: Option<String>,
    pub country: Option<String>,
    pub telephone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
    pub notifyemail: Option<String>,
    pub vat: Option<String>,
    pub ssn: Option<String>,
    pub ssntype: Option<String>,
    pub disclosename: bool,
    pub discloseorganization: bool,
    pub discloseaddress: bool,
    pub disclosetelephone: bool,
    pub disclosefax: bool,
    pub discloseemail: bool,
    pub disclosevat: bool,
    pub discloseident: bool,
    pub disclosenotifyemail: bool,
    pub warning_letter: Option<bool>,
}

/// Typed additional address (`MAILING`, `BILLING`, `SHIPPING`, `SHIPPING_2`, `SHIPPING_3`)
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct ContactAddress {
    pub address_type: String,
    pub company_name: Option<String>,
    pub street1: Option<String>,
    pub street2: Option<String>,
    pub street3: Option<String>,
    pub city: Option<String>,
    pub stateorprovince: Option<String>,
    pub postalcode: Option<String>,
    pub country: Option<String>,
}

/// Current data of a live contact
#[derive(Debug, Clone, Serialize)]
pub struct ContactInfo {
    pub id: ObjectId,
    pub roid: String,
    pub handle: String,
    pub sponsoring_registrar: String,
    #[serde(skip)]
    pub authinfopw: String,
    pub data: ContactData,
    /// Keyed by address type
    pub addresses: BTreeMap<String, ContactAddress>,
}

/// Look up a live contact by handle
pub struct InfoContactByHandle {
    handle: String,
}

impl InfoContactByHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
        }
    }

    /// `None` if no live contact has the handle
    pub async fn exec(
        &self,
        ctx: &mut OperationContext,
    ) -> Result<Option<ContactInfo>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT oreg.id, oreg.roid, oreg.name, r.handle AS sponsoring_registrar, o.authinfopw
            FROM object_registry oreg
            JOIN object o ON o.id = oreg.id
            JOIN registrar r ON r.id = o.clid
            WHERE oreg.type = $1 AND oreg.erdate IS NULL AND UPPER(oreg.name) = UPPER($2)
            "#,
        )
        .bind(ObjectType::Contact.id())
        .bind(&self.handle)
        .fetch_optional(ctx.conn())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let id: ObjectId = row.try_get("id")?;

        let data: ContactData = sqlx::query_as(
            r#"
            SELECT name, organization, street1, street2, street3, city, stateorprovince,
                   postalcode, country, telephone, fax, email, notifyemail, vat, ssn, ssntype,
                   disclosename, discloseorganization, discloseaddress, disclosetelephone,
                   disclosefax, discloseemail, disclosevat, discloseident, disclosenotifyemail,
                   warning_letter
            FROM contact WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_one(ctx.conn())
        .await?;

        let addresses: Vec<ContactAddress> = sqlx::query_as(
            r#"
            SELECT type AS address_type, company_name, street1, street2, street3, city,
                   stateorprovince, postalcode, country
            FROM contact_address WHERE contactid = $1
            "#,
        )
        .bind(id)
        .fetch_all(ctx.conn())
        .await?;

        Ok(Some(ContactInfo {
            id,
            roid: row.try_get("roid")?,
            handle: row.try_get("name")?,
            sponsoring_registrar: row.try_get("sponsoring_registrar")?,
            authinfopw: row.try_get("authinfopw")?,
            data,
            addresses: addresses
                .into_iter()
                .map(|a| (a.address_type.clone(), a))
                .collect(),
        }))
    }
}

/// Replace the transfer password of a contact
pub struct UpdateContactAuthInfo {
    handle: String,
    registrar: String,
    authinfopw: String,
    logger_request_id: Option<LoggerRequestId>,
}

impl UpdateContactAuthInfo {
    pub fn new(
        handle: impl Into<String>,
        registrar: impl Into<String>,
        authinfopw: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            registrar: registrar.into(),
            authinfopw: authinfopw.into(),
            logger_request_id: None,
        }
    }

    pub fn set_logger_request_id(mut self, logger_request_id: Option<LoggerRequestId>) -> Self {
        self.logger_request_id = logger_request_id;
        self
    }

    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<HistoryId, UpdateObjectError> {
        let contact_id = get_live_contact_id(ctx, &self.handle)
            .await?
            .ok_or_else(|| UpdateObjectError::UnknownContactHandle(self.handle.clone()))?;
        let registrar_id =
            begin_update(ctx, ObjectType::Contact, contact_id, &self.registrar).await?;

        sqlx::query("UPDATE object SET authinfopw = $1 WHERE id = $2")
            .bind(&self.authinfopw)
            .bind(contact_id)
            .execute(ctx.conn())
            .await?;

        finish_update(
            ctx,
            ObjectType::Contact,
            contact_id,
            registrar_id,
            self.logger_request_id,
        )
        .await
    }
}

/// Delete an unreferenced live contact
pub struct DeleteContactByHandle {
    handle: String,
}

impl DeleteContactByHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
        }
    }

    /// Returns the contact's final history id
    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<HistoryId, UpdateObjectError> {
        let row = sqlx::query(
            r#"
            SELECT id, historyid FROM object_registry
            WHERE type = $1 AND erdate IS NULL AND UPPER(name) = UPPER($2)
            FOR UPDATE
            "#,
        )
        .bind(ObjectType::Contact.id())
        .bind(&self.handle)
        .fetch_optional(ctx.conn())
        .await?
        .ok_or_else(|| UpdateObjectError::UnknownContactHandle(self.handle.clone()))?;
        let contact_id: ObjectId = row.try_get("id")?;
        let history_id: HistoryId = row.try_get("historyid")?;

        let linked: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM domain WHERE registrant = $1)
                OR EXISTS (SELECT 1 FROM domain_contact_map WHERE contactid = $1)
                OR EXISTS (SELECT 1 FROM nsset_contact_map WHERE contactid = $1)
                OR EXISTS (SELECT 1 FROM keyset_contact_map WHERE contactid = $1)
            "#,
        )
        .bind(contact_id)
        .fetch_one(ctx.conn())
        .await?;
        if linked {
            return Err(UpdateObjectError::ContactLinked(self.handle.clone()));
        }

        close_object_history(ctx, contact_id).await?;

        sqlx::query("UPDATE object_registry SET erdate = now() WHERE id = $1")
            .bind(contact_id)
            .execute(ctx.conn())
            .await?;
        sqlx::query(
            "UPDATE object_state SET valid_to = now() WHERE object_id = $1 AND valid_to IS NULL",
        )
        .bind(contact_id)
        .execute(ctx.conn())
        .await?;
        sqlx::query(
            r#"
            UPDATE object_state_request SET canceled = now()
            WHERE object_id = $1 AND canceled IS NULL
            "#,
        )
        .bind(contact_id)
        .execute(ctx.conn())
        .await?;
        for statement in [
            "DELETE FROM contact_address WHERE contactid = $1",
            "DELETE FROM contact WHERE id = $1",
            "DELETE FROM object WHERE id = $1",
        ] {
            sqlx::query(statement)
                .bind(contact_id)
                .execute(ctx.conn())
                .await?;
        }

        tracing::info!(
            contact = %self.handle,
            contact_id = contact_id,
            history_id = history_id,
            "Contact deleted"
        );
        Ok(history_id)
    }
}
