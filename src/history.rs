//! Object history chain
//!
//! Every mutation appends one `history` row, links the previous current row to
//! it via `next`, and snapshots `object` plus the type-specific tables under the
//! new id. The current row of a live object is the one with `next IS NULL`.

use thiserror::Error;

use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType};
use crate::db::{OperationContext, RowCountError};

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    RowCount(#[from] RowCountError),
}

/// Append a new history entry for a live object and snapshot `object` into it.
///
/// The object row is locked for the rest of the transaction.
pub async fn create_object_history(
    ctx: &mut OperationContext,
    object_id: ObjectId,
    logger_request_id: Option<LoggerRequestId>,
) -> Result<HistoryId, HistoryError> {
    let previous: Option<Option<HistoryId>> = sqlx::query_scalar(
        "SELECT historyid FROM object_registry WHERE id = $1 AND erdate IS NULL FOR UPDATE",
    )
    .bind(object_id)
    .fetch_optional(ctx.conn())
    .await?;
    let previous = previous.ok_or(RowCountError::NotFound("live object_registry"))?;

    let history_id: HistoryId = sqlx::query_scalar(
        "INSERT INTO history (valid_from, request_id) VALUES (now(), $1) RETURNING id",
    )
    .bind(logger_request_id)
    .fetch_one(ctx.conn())
    .await?;

    if let Some(previous) = previous {
        sqlx::query("UPDATE history SET valid_to = now(), next = $1 WHERE id = $2")
            .bind(history_id)
            .bind(previous)
            .execute(ctx.conn())
            .await?;
    }

    sqlx::query("UPDATE object_registry SET historyid = $1 WHERE id = $2")
        .bind(history_id)
        .bind(object_id)
        .execute(ctx.conn())
        .await?;

    let copied = sqlx::query(
        r#"
        INSERT INTO object_history (historyid, id, clid, upid, trdate, update, authinfopw)
        SELECT $1, id, clid, upid, trdate, update, authinfopw FROM object WHERE id = $2
        "#,
    )
    .bind(history_id)
    .bind(object_id)
    .execute(ctx.conn())
    .await?
    .rows_affected();
    expect_one_row(copied, "object")?;

    tracing::debug!(
        object_id = object_id,
        previous_history_id = ?previous,
        history_id = history_id,
        "Object history appended"
    );
    Ok(history_id)
}

/// Close the current history entry of an object being deleted.
pub async fn close_object_history(
    ctx: &mut OperationContext,
    object_id: ObjectId,
) -> Result<(), HistoryError> {
    let closed = sqlx::query(
        r#"
        UPDATE history SET valid_to = now()
        WHERE id = (SELECT historyid FROM object_registry WHERE id = $1)
        "#,
    )
    .bind(object_id)
    .execute(ctx.conn())
    .await?
    .rows_affected();
    expect_one_row(closed, "current history")?;
    Ok(())
}

/// Materialize the object's current type-specific data under `history_id`.
pub async fn copy_to_history(
    ctx: &mut OperationContext,
    object_type: ObjectType,
    object_id: ObjectId,
    history_id: HistoryId,
) -> Result<(), HistoryError> {
    let (main, children): (&str, &[&str]) = match object_type {
        ObjectType::Contact => (
            "INSERT INTO contact_history SELECT $1, c.* FROM contact c WHERE c.id = $2",
            &[
                "INSERT INTO contact_address_history SELECT $1, a.* FROM contact_address a \
                    WHERE a.contactid = $2",
            ],
        ),
        ObjectType::Domain => (
            "INSERT INTO domain_history SELECT $1, d.* FROM domain d WHERE d.id = $2",
            &[
                "INSERT INTO domain_contact_map_history SELECT $1, m.* FROM domain_contact_map m \
                    WHERE m.domainid = $2",
            ],
        ),
        ObjectType::Nsset => (
            "INSERT INTO nsset_history SELECT $1, n.* FROM nsset n WHERE n.id = $2",
            &[
                "INSERT INTO nsset_contact_map_history SELECT $1, m.* FROM nsset_contact_map m \
                    WHERE m.nssetid = $2",
                "INSERT INTO host_history SELECT $1, h.* FROM host h WHERE h.nssetid = $2",
                "INSERT INTO host_ipaddr_map_history SELECT $1, i.* FROM host_ipaddr_map i \
                    WHERE i.nssetid = $2",
            ],
        ),
        ObjectType::Keyset => (
            "INSERT INTO keyset_history SELECT $1, k.* FROM keyset k WHERE k.id = $2",
            &[
                "INSERT INTO keyset_contact_map_history SELECT $1, m.* FROM keyset_contact_map m \
                    WHERE m.keysetid = $2",
                "INSERT INTO dnskey_history SELECT $1, k.* FROM dnskey k WHERE k.keysetid = $2",
            ],
        ),
    };

    let copied = sqlx::query(main)
        .bind(history_id)
        .bind(object_id)
        .execute(ctx.conn())
        .await?
        .rows_affected();
    expect_one_row(copied, object_type.as_str())?;

    for child in children {
        sqlx::query(child)
            .bind(history_id)
            .bind(object_id)
            .execute(ctx.conn())
            .await?;
    }
    Ok(())
}

fn expect_one_row(affected: u64, what: &'static str) -> Result<(), RowCountError> {
    match affected {
        0 => Err(RowCountError::NotFound(what)),
        1 => Ok(()),
        n => Err(RowCountError::TooManyRows(what, n as usize)),
    }
}
