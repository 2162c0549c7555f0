//! Object state reads, state requests and their recomputation

use chrono::{DateTime, Utc};
use sqlx::Row;
use tracing::{debug, info, warn};

use super::error::ObjectStateError;
use super::state::ObjectState;
use crate::core_types::ObjectId;
use crate::db::OperationContext;

/// One currently effective `object_state` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStateRow {
    pub state: ObjectState,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
}

/// Read the currently effective states of one object
pub struct GetObjectStates {
    object_id: ObjectId,
}

impl GetObjectStates {
    pub fn new(object_id: ObjectId) -> Self {
        Self { object_id }
    }

    pub async fn exec(
        &self,
        ctx: &mut OperationContext,
    ) -> Result<Vec<ObjectStateRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT e.name, s.valid_from, s.valid_to
            FROM object_state s
            JOIN enum_object_states e ON e.id = s.state_id
            WHERE s.object_id = $1 AND s.valid_to IS NULL
            ORDER BY e.id
            "#,
        )
        .bind(self.object_id)
        .fetch_all(ctx.conn())
        .await?;

        let mut states = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("name")?;
            match name.parse::<ObjectState>() {
                Ok(state) => states.push(ObjectStateRow {
                    state,
                    valid_from: row.try_get("valid_from")?,
                    valid_to: row.try_get("valid_to")?,
                }),
                Err(_) => {
                    warn!(
                        object_id = self.object_id,
                        state = %name,
                        "Skipping unknown object state"
                    );
                }
            }
        }
        Ok(states)
    }
}

/// Exclusive lock on the object's state-request bookkeeping row.
///
/// Take it right before reading states that gate a mutation of the object;
/// it serializes against concurrent recomputation until the transaction ends.
/// The bookkeeping row is created together with the registry object.
pub struct LockObjectStateRequestLock {
    object_id: ObjectId,
}

impl LockObjectStateRequestLock {
    pub fn new(object_id: ObjectId) -> Self {
        Self { object_id }
    }

    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<(), ObjectStateError> {
        let locked: Option<ObjectId> = sqlx::query_scalar(
            "SELECT object_id FROM object_state_request_lock WHERE object_id = $1 FOR UPDATE",
        )
        .bind(self.object_id)
        .fetch_optional(ctx.conn())
        .await?;

        match locked {
            Some(_) => Ok(()),
            None => Err(ObjectStateError::LockNotAcquired(self.object_id)),
        }
    }
}

/// Lock, then read, the states of one object
pub async fn get_locked_object_states(
    ctx: &mut OperationContext,
    object_id: ObjectId,
) -> Result<super::ObjectStatesInfo, ObjectStateError> {
    LockObjectStateRequestLock::new(object_id).exec(ctx).await?;
    let rows = GetObjectStates::new(object_id).exec(ctx).await?;
    Ok(super::ObjectStatesInfo::new(&rows))
}

/// Create pending manual state requests for a live object.
///
/// The states become effective only after [`PerformObjectStateRequest`].
pub struct CreateObjectStateRequestId {
    object_id: ObjectId,
    states: Vec<ObjectState>,
}

impl CreateObjectStateRequestId {
    pub fn new(object_id: ObjectId, states: Vec<ObjectState>) -> Self {
        Self { object_id, states }
    }

    /// Returns the new `object_state_request` ids in the order of `states`
    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<Vec<i64>, ObjectStateError> {
        LockObjectStateRequestLock::new(self.object_id)
            .exec(ctx)
            .await?;

        let mut request_ids = Vec::with_capacity(self.states.len());
        for state in &self.states {
            let request_id: Option<i64> = sqlx::query_scalar(
                r#"
                INSERT INTO object_state_request (object_id, state_id, valid_from, crdate)
                SELECT o.id, e.id, now(), now()
                FROM object_registry o
                JOIN enum_object_states e ON e.name = $2 AND e.manual AND o.type = ANY(e.types)
                WHERE o.id = $1 AND o.erdate IS NULL
                RETURNING id
                "#,
            )
            .bind(self.object_id)
            .bind(state.as_str())
            .fetch_optional(ctx.conn())
            .await?;

            match request_id {
                Some(id) => request_ids.push(id),
                None => {
                    return Err(ObjectStateError::StateNotApplicable {
                        object_id: self.object_id,
                        state: *state,
                    });
                }
            }
        }

        debug!(object_id = self.object_id, states = ?self.states, "Object state requests created");
        Ok(request_ids)
    }
}

/// Materialize pending state requests into effective states.
///
/// Opens states of live objects whose request is active and not yet
/// effective, and closes manual states left without an active request.
/// Re-running with nothing pending changes nothing.
pub struct PerformObjectStateRequest {
    object_id: Option<ObjectId>,
}

impl PerformObjectStateRequest {
    /// `None` (or id 0) recomputes every object with pending requests
    pub fn new(object_id: Option<ObjectId>) -> Self {
        Self {
            object_id: object_id.filter(|id| *id != 0),
        }
    }

    pub async fn exec(&self, ctx: &mut OperationContext) -> Result<(), ObjectStateError> {
        let opened = sqlx::query(
            r#"
            INSERT INTO object_state (object_id, state_id, valid_from, ohid_from)
            SELECT DISTINCT r.object_id, r.state_id, now(), o.historyid
            FROM object_state_request r
            JOIN object_registry o ON o.id = r.object_id
            WHERE ($1::bigint IS NULL OR r.object_id = $1)
              AND o.erdate IS NULL
              AND r.canceled IS NULL
              AND r.valid_from <= now()
              AND (r.valid_to IS NULL OR r.valid_to > now())
              AND NOT EXISTS (
                  SELECT 1 FROM object_state s
                  WHERE s.object_id = r.object_id
                    AND s.state_id = r.state_id
                    AND s.valid_to IS NULL)
            "#,
        )
        .bind(self.object_id)
        .execute(ctx.conn())
        .await?
        .rows_affected();

        let closed = sqlx::query(
            r#"
            UPDATE object_state s SET valid_to = now(), ohid_to = o.historyid
            FROM object_registry o, enum_object_states e
            WHERE o.id = s.object_id
              AND e.id = s.state_id
              AND e.manual
              AND s.valid_to IS NULL
              AND ($1::bigint IS NULL OR s.object_id = $1)
              AND NOT EXISTS (
                  SELECT 1 FROM object_state_request r
                  WHERE r.object_id = s.object_id
                    AND r.state_id = s.state_id
                    AND r.canceled IS NULL
                    AND r.valid_from <= now()
                    AND (r.valid_to IS NULL OR r.valid_to > now()))
            "#,
        )
        .bind(self.object_id)
        .execute(ctx.conn())
        .await?
        .rows_affected();

        info!(
            object_id = ?self.object_id,
            opened = opened,
            closed = closed,
            "Object state requests performed"
        );
        Ok(())
    }
}
