//! Single-recipient poll messages

use sqlx::Row;
use tracing::debug;

use super::error::PollMessageError;
use super::message_type::{PollMessageType, Recipient};
use crate::core_types::{HistoryId, MessageId, ObjectType, RegistrarId};
use crate::db::{OperationContext, exactly_one};

/// Unseen messages expire after this many days
pub const POLL_MESSAGE_RETENTION_DAYS: i32 = 7;

/// Enqueue one message of a fixed type for the registrar chosen by its
/// [`Recipient`] rule.
pub struct CreatePollMessage {
    message_type: PollMessageType,
}

impl CreatePollMessage {
    pub fn new(message_type: PollMessageType) -> Self {
        Self { message_type }
    }

    pub async fn exec(
        &self,
        ctx: &mut OperationContext,
        history_id: HistoryId,
    ) -> Result<MessageId, PollMessageError> {
        let query = match self.message_type.recipient() {
            Recipient::SponsorAfterAction => {
                r#"
                SELECT oh.clid, oreg.type
                FROM object_history oh
                JOIN object_registry oreg ON oreg.id = oh.id
                WHERE oh.historyid = $1
                "#
            }
            Recipient::SponsorBeforeAction => {
                r#"
                SELECT ohp.clid, oreg.type
                FROM object_history oh
                JOIN object_registry oreg ON oreg.id = oh.id
                JOIN history hp ON hp.next = oh.historyid
                JOIN object_history ohp ON ohp.historyid = hp.id
                WHERE oh.historyid = $1
                "#
            }
        };

        let rows = sqlx::query(query)
            .bind(history_id)
            .fetch_all(ctx.conn())
            .await?;
        let row = exactly_one(rows, "object_history")
            .map_err(|e| PollMessageError::from_row_count(history_id, e))?;

        let found = object_type_of(row.try_get("type")?)?;
        let expected = self.message_type.object_type();
        if found != expected {
            return Err(PollMessageError::NotCorrespondingObjectType { expected, found });
        }

        let registrar_id: RegistrarId = row.try_get("clid")?;
        emit_message(ctx, registrar_id, self.message_type, history_id).await
    }
}

pub(crate) fn object_type_of(type_id: i16) -> Result<ObjectType, PollMessageError> {
    ObjectType::from_id(type_id).ok_or(PollMessageError::UnknownObjectType(type_id))
}

/// Insert the message row and tie it to the history entry
pub(crate) async fn emit_message(
    ctx: &mut OperationContext,
    registrar_id: RegistrarId,
    message_type: PollMessageType,
    history_id: HistoryId,
) -> Result<MessageId, PollMessageError> {
    let message_type_id: i32 = sqlx::query_scalar("SELECT id FROM messagetype WHERE name = $1")
        .bind(message_type.as_str())
        .fetch_optional(ctx.conn())
        .await?
        .ok_or(PollMessageError::UnknownMessageType(message_type.as_str()))?;

    let message_id: MessageId = sqlx::query_scalar(
        r#"
        INSERT INTO message (clid, crdate, exdate, seen, msgtype)
        VALUES ($1, now(), now() + make_interval(days => $2), false, $3)
        RETURNING id
        "#,
    )
    .bind(registrar_id)
    .bind(POLL_MESSAGE_RETENTION_DAYS)
    .bind(message_type_id)
    .fetch_one(ctx.conn())
    .await?;

    sqlx::query("INSERT INTO poll_eppaction (msgid, objid) VALUES ($1, $2)")
        .bind(message_id)
        .bind(history_id)
        .execute(ctx.conn())
        .await?;

    debug!(
        message_id = message_id,
        registrar_id = registrar_id,
        message_type = %message_type,
        history_id = history_id,
        "Poll message created"
    );
    Ok(message_id)
}
