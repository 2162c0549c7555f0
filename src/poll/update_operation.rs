//! Poll messages about update operations
//!
//! A contact update concerns more registrars than the contact's sponsor: every
//! registrar whose domain names the contact as registrant or admin contact is
//! told as well.

use chrono::{DateTime, Utc};
use sqlx::Row;
use std::collections::BTreeSet;
use tracing::info;

use super::create::{CreatePollMessage, emit_message, object_type_of};
use super::error::PollMessageError;
use super::message_type::PollMessageType;
use crate::core_types::{HistoryId, MessageId, ObjectId, ObjectType, RegistrarId};
use crate::db::{OperationContext, exactly_one};

/// Update messages for one object type
pub struct CreateUpdateOperationPollMessage {
    object_type: ObjectType,
}

impl CreateUpdateOperationPollMessage {
    pub fn new(object_type: ObjectType) -> Self {
        Self { object_type }
    }

    pub async fn exec(
        &self,
        ctx: &mut OperationContext,
        history_id: HistoryId,
    ) -> Result<BTreeSet<MessageId>, PollMessageError> {
        if self.object_type != ObjectType::Contact {
            let message_id = CreatePollMessage::new(PollMessageType::update_of(self.object_type))
                .exec(ctx, history_id)
                .await?;
            return Ok(BTreeSet::from([message_id]));
        }

        let update = ContactUpdate::load(ctx, history_id).await?;
        let mut recipients = update.domain_sponsors(ctx).await?;
        if let Some(updater) = update.updated_by {
            recipients.remove(&updater);
        }
        if !update.was_update_done_by_sponsoring_registrar() {
            recipients.insert(update.sponsoring_registrar);
        }

        let mut message_ids = BTreeSet::new();
        for registrar_id in &recipients {
            let message_id =
                emit_message(ctx, *registrar_id, PollMessageType::UpdateContact, history_id)
                    .await?;
            message_ids.insert(message_id);
        }

        info!(
            history_id = history_id,
            contact_id = update.contact_id,
            recipients = ?recipients,
            "Contact update poll messages created"
        );
        Ok(message_ids)
    }
}

/// The history entry of a contact update
struct ContactUpdate {
    history_id: HistoryId,
    contact_id: ObjectId,
    sponsoring_registrar: RegistrarId,
    updated_by: Option<RegistrarId>,
    updated_at: DateTime<Utc>,
}

impl ContactUpdate {
    async fn load(
        ctx: &mut OperationContext,
        history_id: HistoryId,
    ) -> Result<Self, PollMessageError> {
        let rows = sqlx::query(
            r#"
            SELECT oh.id, oh.clid, oh.upid, oreg.type, h.valid_from
            FROM object_history oh
            JOIN object_registry oreg ON oreg.id = oh.id
            JOIN history h ON h.id = oh.historyid
            WHERE oh.historyid = $1
            "#,
        )
        .bind(history_id)
        .fetch_all(ctx.conn())
        .await?;
        let row = exactly_one(rows, "object_history")
            .map_err(|e| PollMessageError::from_row_count(history_id, e))?;

        let found = object_type_of(row.try_get("type")?)?;
        if found != ObjectType::Contact {
            return Err(PollMessageError::NotCorrespondingObjectType {
                expected: ObjectType::Contact,
                found,
            });
        }

        Ok(Self {
            history_id,
            contact_id: row.try_get("id")?,
            sponsoring_registrar: row.try_get("clid")?,
            updated_by: row.try_get("upid")?,
            updated_at: row.try_get("valid_from")?,
        })
    }

    fn was_update_done_by_sponsoring_registrar(&self) -> bool {
        self.updated_by == Some(self.sponsoring_registrar)
    }

    /// Sponsors of domains referencing the contact when the update happened
    async fn domain_sponsors(
        &self,
        ctx: &mut OperationContext,
    ) -> Result<BTreeSet<RegistrarId>, PollMessageError> {
        let sponsors: Vec<RegistrarId> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT doh.clid
            FROM history dh
            JOIN object_history doh ON doh.historyid = dh.id
            JOIN domain_history d ON d.historyid = dh.id
            WHERE dh.valid_from <= $2
              AND (dh.valid_to IS NULL OR dh.valid_to > $2)
              AND (d.registrant = $1
                   OR EXISTS (
                       SELECT 1 FROM domain_contact_map_history m
                       WHERE m.historyid = dh.id
                         AND m.domainid = d.id
                         AND m.contactid = $1
                         AND m.role = 1))
            "#,
        )
        .bind(self.contact_id)
        .bind(self.updated_at)
        .fetch_all(ctx.conn())
        .await?;

        tracing::debug!(
            history_id = self.history_id,
            sponsors = sponsors.len(),
            "Domain sponsors of updated contact"
        );
        Ok(sponsors.into_iter().collect())
    }
}

/// Route an update history entry to the right per-type variant
#[derive(Default)]
pub struct CreateUpdateObjectPollMessage;

impl CreateUpdateObjectPollMessage {
    pub fn new() -> Self {
        Self
    }

    pub async fn exec(
        &self,
        ctx: &mut OperationContext,
        history_id: HistoryId,
    ) -> Result<BTreeSet<MessageId>, PollMessageError> {
        let types: Vec<i16> = sqlx::query_scalar(
            r#"
            SELECT oreg.type
            FROM object_history oh
            JOIN object_registry oreg ON oreg.id = oh.id
            WHERE oh.historyid = $1
            "#,
        )
        .bind(history_id)
        .fetch_all(ctx.conn())
        .await?;
        let type_id = exactly_one(types, "object_history")
            .map_err(|e| PollMessageError::from_row_count(history_id, e))?;

        CreateUpdateOperationPollMessage::new(object_type_of(type_id)?)
            .exec(ctx, history_id)
            .await
    }
}
