//! Contact merge
//!
//! Consolidates a duplicate contact into another one:
//!
//! ```text
//! lock src+dst → diff → repoint registrants → repoint admin/tech contacts
//!     → migrate verification state → delete src → new authinfo for dst
//! ```
//!
//! A dry run walks the same steps without taking row locks and without writing.

use std::sync::Arc;

use sqlx::{FromRow, Row};
use tracing::{debug, info, warn};

use super::diff::DiffContacts;
use super::error::MergeContactError;
use super::types::{
    LockedContact, MergeContactLockedContactId, MergeContactOutput,
    MergeContactUpdateDomainAdminContact, MergeContactUpdateDomainRegistrant,
    MergeContactUpdateTechContact,
};
use crate::authinfo::generate_authinfo_pw;
use crate::core_types::{HistoryId, LoggerRequestId, ObjectId, ObjectType};
use crate::db::OperationContext;
use crate::object::contact_map::{
    ContactMap, DOMAIN_ADMIN_CONTACTS, KEYSET_TECH_CONTACTS, NSSET_TECH_CONTACTS,
};
use crate::object::{
    DeleteContactByHandle, UpdateContactAuthInfo, UpdateDomain, UpdateKeyset, UpdateNsset,
    UpdateObjectError, get_live_contact_id,
};
use crate::object_state::{
    CreateObjectStateRequestId, GetObjectStates, ObjectState, ObjectStatesInfo,
    PerformObjectStateRequest, get_locked_object_states,
};

const MERGE_SAVEPOINT: &str = "merge_contact_update";

const DOMAIN_BLOCKING_STATES: [ObjectState; 2] =
    [ObjectState::ServerBlocked, ObjectState::ServerUpdateProhibited];

const TECH_HOLDER_BLOCKING_STATES: [ObjectState; 1] = [ObjectState::ServerUpdateProhibited];

/// Append the row lock unless this is a dry run
fn lock_clause(sql: &str, dry_run: bool) -> String {
    if dry_run {
        sql.to_string()
    } else {
        format!("{sql} FOR UPDATE OF oreg")
    }
}

/// A live object referencing the source contact
#[derive(Debug, FromRow)]
struct ReferencingObject {
    id: ObjectId,
    handle: String,
    sponsoring_registrar: String,
}

/// Contact lists the merge moves from source to destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContactRelation {
    DomainAdmin,
    NssetTech,
    KeysetTech,
}

impl ContactRelation {
    fn object_type(self) -> ObjectType {
        match self {
            ContactRelation::DomainAdmin => ObjectType::Domain,
            ContactRelation::NssetTech => ObjectType::Nsset,
            ContactRelation::KeysetTech => ObjectType::Keyset,
        }
    }

    fn contact_map(self) -> &'static ContactMap {
        match self {
            ContactRelation::DomainAdmin => &DOMAIN_ADMIN_CONTACTS,
            ContactRelation::NssetTech => &NSSET_TECH_CONTACTS,
            ContactRelation::KeysetTech => &KEYSET_TECH_CONTACTS,
        }
    }

    fn blocking_states(self) -> &'static [ObjectState] {
        match self {
            ContactRelation::DomainAdmin => &DOMAIN_BLOCKING_STATES,
            ContactRelation::NssetTech | ContactRelation::KeysetTech => {
                &TECH_HOLDER_BLOCKING_STATES
            }
        }
    }

    fn referencing_sql(self) -> &'static str {
        match self {
            ContactRelation::DomainAdmin => {
                r#"
                SELECT oreg.id, oreg.name AS handle, r.handle AS sponsoring_registrar
                FROM object_registry oreg
                JOIN domain_contact_map m ON m.domainid = oreg.id AND m.role = 1
                JOIN object o ON o.id = oreg.id
                JOIN registrar r ON r.id = o.clid
                WHERE m.contactid = $1 AND oreg.erdate IS NULL
                ORDER BY oreg.id
                "#
            }
            ContactRelation::NssetTech => {
                r#"
                SELECT oreg.id, oreg.name AS handle, r.handle AS sponsoring_registrar
                FROM object_registry oreg
                JOIN nsset_contact_map m ON m.nssetid = oreg.id
                JOIN object o ON o.id = oreg.id
                JOIN registrar r ON r.id = o.clid
                WHERE m.contactid = $1 AND oreg.erdate IS NULL
                ORDER BY oreg.id
                "#
            }
            ContactRelation::KeysetTech => {
                r#"
                SELECT oreg.id, oreg.name AS handle, r.handle AS sponsoring_registrar
                FROM object_registry oreg
                JOIN keyset_contact_map m ON m.keysetid = oreg.id
                JOIN object o ON o.id = oreg.id
                JOIN registrar r ON r.id = o.clid
                WHERE m.contactid = $1 AND oreg.erdate IS NULL
                ORDER BY oreg.id
                "#
            }
        }
    }

    /// Remove `rem` from the list and, if given, add `add`, as one update
    async fn update(
        self,
        ctx: &mut OperationContext,
        object_id: ObjectId,
        registrar: &str,
        rem: &str,
        add: Option<&str>,
        logger_request_id: Option<LoggerRequestId>,
    ) -> Result<HistoryId, UpdateObjectError> {
        match self {
            ContactRelation::DomainAdmin => {
                let mut update = UpdateDomain::new(object_id, registrar).rem_admin_contact(rem);
                if let Some(add) = add {
                    update = update.add_admin_contact(add);
                }
                update
                    .set_logger_request_id(logger_request_id)
                    .exec(ctx)
                    .await
            }
            ContactRelation::NssetTech => {
                let mut update = UpdateNsset::new(object_id, registrar).rem_tech_contact(rem);
                if let Some(add) = add {
                    update = update.add_tech_contact(add);
                }
                update
                    .set_logger_request_id(logger_request_id)
                    .exec(ctx)
                    .await
            }
            ContactRelation::KeysetTech => {
                let mut update = UpdateKeyset::new(object_id, registrar).rem_tech_contact(rem);
                if let Some(add) = add {
                    update = update.add_tech_contact(add);
                }
                update
                    .set_logger_request_id(logger_request_id)
                    .exec(ctx)
                    .await
            }
        }
    }
}

/// Outcome of the remove-and-add update tried under the savepoint
#[derive(Debug)]
enum RepointAttempt {
    Applied(HistoryId),
    /// Destination was already linked; the savepoint was rolled back
    DestinationAlreadySet,
    Failed(UpdateObjectError),
}

/// One relation entry after repointing
struct Repointed {
    added: Option<String>,
    history_id: Option<HistoryId>,
}

/// Merge a source contact into a destination contact
pub struct MergeContact {
    src_handle: String,
    dst_handle: String,
    registrar: String,
    diff_contacts: Option<Arc<dyn DiffContacts>>,
    logger_request_id: Option<LoggerRequestId>,
}

impl MergeContact {
    pub fn new(
        src_handle: impl Into<String>,
        dst_handle: impl Into<String>,
        registrar: impl Into<String>,
        diff_contacts: Option<Arc<dyn DiffContacts>>,
    ) -> Result<Self, MergeContactError> {
        let src_handle = src_handle.into();
        let dst_handle = dst_handle.into();
        if src_handle.eq_ignore_ascii_case(&dst_handle) {
            return Err(MergeContactError::IdenticalContactsHandle(src_handle));
        }
        Ok(Self {
            src_handle,
            dst_handle,
            registrar: registrar.into(),
            diff_contacts,
            logger_request_id: None,
        })
    }

    pub fn set_logger_request_id(mut self, logger_request_id: Option<LoggerRequestId>) -> Self {
        self.logger_request_id = logger_request_id;
        self
    }

    /// Apply the merge inside the caller's transaction
    pub async fn exec(
        &self,
        ctx: &mut OperationContext,
    ) -> Result<MergeContactOutput, MergeContactError> {
        self.run(ctx, false).await
    }

    /// Report what [`exec`](Self::exec) would change; writes nothing
    pub async fn exec_dry_run(
        &self,
        ctx: &mut OperationContext,
    ) -> Result<MergeContactOutput, MergeContactError> {
        self.run(ctx, true).await
    }

    async fn run(
        &self,
        ctx: &mut OperationContext,
        dry_run: bool,
    ) -> Result<MergeContactOutput, MergeContactError> {
        match self.merge(ctx, dry_run).await {
            Ok(output) => {
                info!(
                    src = %self.src_handle,
                    dst = %self.dst_handle,
                    registrar = %self.registrar,
                    dry_run = dry_run,
                    registrants = output.update_domain_registrant.len(),
                    admin_contacts = output.update_domain_admin_contact.len(),
                    nsset_tech_contacts = output.update_nsset_tech_contact.len(),
                    keyset_tech_contacts = output.update_keyset_tech_contact.len(),
                    "Contact merge completed"
                );
                Ok(output)
            }
            Err(e) => {
                warn!(
                    src = %self.src_handle,
                    dst = %self.dst_handle,
                    registrar = %self.registrar,
                    dry_run = dry_run,
                    code = e.code(),
                    error = %e,
                    "Contact merge failed"
                );
                Err(e)
            }
        }
    }

    async fn merge(
        &self,
        ctx: &mut OperationContext,
        dry_run: bool,
    ) -> Result<MergeContactOutput, MergeContactError> {
        let locked = self.lock_contacts(ctx, dry_run).await?;

        let diff = self
            .diff_contacts
            .as_ref()
            .ok_or(MergeContactError::UnableToGetDifferenceOfContacts)?;
        if diff
            .differs(ctx, &locked.src.handle, &locked.dst.handle)
            .await?
        {
            return Err(MergeContactError::ContactsDiffer {
                src: locked.src.handle.clone(),
                dst: locked.dst.handle.clone(),
            });
        }

        let mut output = MergeContactOutput::new(locked, dry_run);
        let src = output.contactid.src.clone();
        let dst = output.contactid.dst.clone();

        output.update_domain_registrant = self
            .repoint_registrants(ctx, src.id, &dst.handle, dry_run)
            .await?;

        for relation in [
            ContactRelation::DomainAdmin,
            ContactRelation::NssetTech,
            ContactRelation::KeysetTech,
        ] {
            for object in self.referencing(ctx, relation, src.id, dry_run).await? {
                self.check_not_blocked(
                    ctx,
                    object.id,
                    &object.handle,
                    relation.blocking_states(),
                    dry_run,
                )
                .await?;
                let repointed = self
                    .repoint_contact(ctx, relation, object.id, &src.handle, &dst.handle, dry_run)
                    .await?;

                match relation {
                    ContactRelation::DomainAdmin => output.update_domain_admin_contact.push(
                        MergeContactUpdateDomainAdminContact {
                            fqdn: object.handle,
                            domain_id: object.id,
                            sponsoring_registrar: object.sponsoring_registrar,
                            rem_admin_contact: src.handle.clone(),
                            add_admin_contact: repointed.added,
                            history_id: repointed.history_id,
                        },
                    ),
                    ContactRelation::NssetTech | ContactRelation::KeysetTech => {
                        let record = MergeContactUpdateTechContact {
                            handle: object.handle,
                            id: object.id,
                            sponsoring_registrar: object.sponsoring_registrar,
                            rem_tech_contact: src.handle.clone(),
                            add_tech_contact: repointed.added,
                            history_id: repointed.history_id,
                        };
                        if relation == ContactRelation::NssetTech {
                            output.update_nsset_tech_contact.push(record);
                        } else {
                            output.update_keyset_tech_contact.push(record);
                        }
                    }
                }
            }
        }

        self.migrate_states(ctx, &src, &dst, dry_run).await?;

        if !dry_run {
            DeleteContactByHandle::new(src.handle.as_str())
                .exec(ctx)
                .await?;
            UpdateContactAuthInfo::new(
                dst.handle.as_str(),
                self.registrar.as_str(),
                generate_authinfo_pw(),
            )
            .set_logger_request_id(self.logger_request_id)
            .exec(ctx)
            .await?;
        }

        Ok(output)
    }

    /// Resolve both handles, then lock both contacts in ascending id order
    async fn lock_contacts(
        &self,
        ctx: &mut OperationContext,
        dry_run: bool,
    ) -> Result<MergeContactLockedContactId, MergeContactError> {
        let src_id = get_live_contact_id(ctx, &self.src_handle)
            .await?
            .ok_or_else(|| MergeContactError::UnknownSourceContactHandle(self.src_handle.clone()))?;
        let dst_id = get_live_contact_id(ctx, &self.dst_handle)
            .await?
            .ok_or_else(|| {
                MergeContactError::UnknownDestinationContactHandle(self.dst_handle.clone())
            })?;

        let sql = lock_clause(
            r#"
            SELECT oreg.id, oreg.historyid, oreg.roid, oreg.name, r.handle AS sponsoring_registrar
            FROM object_registry oreg
            JOIN object o ON o.id = oreg.id
            JOIN registrar r ON r.id = o.clid
            WHERE oreg.id = ANY($1) AND oreg.type = $2 AND oreg.erdate IS NULL
            ORDER BY oreg.id
            "#,
            dry_run,
        );
        let rows = sqlx::query(&sql)
            .bind(vec![src_id, dst_id])
            .bind(ObjectType::Contact.id())
            .fetch_all(ctx.conn())
            .await?;

        let mut src = None;
        let mut dst = None;
        for row in rows {
            let contact = LockedContact {
                id: row.try_get("id")?,
                history_id: row.try_get("historyid")?,
                roid: row.try_get("roid")?,
                handle: row.try_get("name")?,
                sponsoring_registrar: row.try_get("sponsoring_registrar")?,
            };
            if contact.id == src_id {
                src = Some(contact.clone());
            }
            if contact.id == dst_id {
                dst = Some(contact);
            }
        }

        let src = src
            .ok_or_else(|| MergeContactError::UnknownSourceContactHandle(self.src_handle.clone()))?;
        let dst = dst.ok_or_else(|| {
            MergeContactError::UnknownDestinationContactHandle(self.dst_handle.clone())
        })?;
        if src.roid == dst.roid {
            return Err(MergeContactError::IdenticalContactsRoid(src.roid));
        }

        debug!(
            src = %src.handle,
            src_id = src.id,
            dst = %dst.handle,
            dst_id = dst.id,
            dry_run = dry_run,
            "Merged contacts locked"
        );
        Ok(MergeContactLockedContactId { src, dst })
    }

    /// States of a referencing object; locked first unless this is a dry run
    async fn states(
        &self,
        ctx: &mut OperationContext,
        object_id: ObjectId,
        dry_run: bool,
    ) -> Result<ObjectStatesInfo, MergeContactError> {
        if dry_run {
            let rows = GetObjectStates::new(object_id).exec(ctx).await?;
            Ok(ObjectStatesInfo::new(&rows))
        } else {
            Ok(get_locked_object_states(ctx, object_id).await?)
        }
    }

    async fn check_not_blocked(
        &self,
        ctx: &mut OperationContext,
        object_id: ObjectId,
        handle: &str,
        blocking: &[ObjectState],
        dry_run: bool,
    ) -> Result<(), MergeContactError> {
        if self.states(ctx, object_id, dry_run).await?.presents_any(blocking) {
            return Err(MergeContactError::ObjectBlocked(handle.to_string()));
        }
        Ok(())
    }

    async fn repoint_registrants(
        &self,
        ctx: &mut OperationContext,
        src_id: ObjectId,
        dst_handle: &str,
        dry_run: bool,
    ) -> Result<Vec<MergeContactUpdateDomainRegistrant>, MergeContactError> {
        let sql = lock_clause(
            r#"
            SELECT oreg.id, oreg.name AS handle, r.handle AS sponsoring_registrar
            FROM object_registry oreg
            JOIN domain d ON d.id = oreg.id
            JOIN object o ON o.id = oreg.id
            JOIN registrar r ON r.id = o.clid
            WHERE d.registrant = $1 AND oreg.erdate IS NULL
            ORDER BY oreg.id
            "#,
            dry_run,
        );
        let domains: Vec<ReferencingObject> = sqlx::query_as(&sql)
            .bind(src_id)
            .fetch_all(ctx.conn())
            .await?;

        let mut records = Vec::with_capacity(domains.len());
        for domain in domains {
            self.check_not_blocked(
                ctx,
                domain.id,
                &domain.handle,
                &DOMAIN_BLOCKING_STATES,
                dry_run,
            )
            .await?;

            let history_id = if dry_run {
                None
            } else {
                Some(
                    UpdateDomain::new(domain.id, self.registrar.as_str())
                        .set_registrant(dst_handle)
                        .set_logger_request_id(self.logger_request_id)
                        .exec(ctx)
                        .await?,
                )
            };

            records.push(MergeContactUpdateDomainRegistrant {
                fqdn: domain.handle,
                domain_id: domain.id,
                sponsoring_registrar: domain.sponsoring_registrar,
                set_registrant: dst_handle.to_string(),
                history_id,
            });
        }
        Ok(records)
    }

    async fn referencing(
        &self,
        ctx: &mut OperationContext,
        relation: ContactRelation,
        src_id: ObjectId,
        dry_run: bool,
    ) -> Result<Vec<ReferencingObject>, MergeContactError> {
        let sql = lock_clause(relation.referencing_sql(), dry_run);
        let objects = sqlx::query_as(&sql)
            .bind(src_id)
            .fetch_all(ctx.conn())
            .await?;
        Ok(objects)
    }

    /// Replace source with destination in one contact list.
    ///
    /// When the destination is already listed only the source is removed.
    async fn repoint_contact(
        &self,
        ctx: &mut OperationContext,
        relation: ContactRelation,
        object_id: ObjectId,
        src_handle: &str,
        dst_handle: &str,
        dry_run: bool,
    ) -> Result<Repointed, MergeContactError> {
        if dry_run {
            let already_set = relation
                .contact_map()
                .list_handles(ctx, object_id)
                .await?
                .iter()
                .any(|h| h.eq_ignore_ascii_case(dst_handle));
            return Ok(Repointed {
                added: (!already_set).then(|| dst_handle.to_string()),
                history_id: None,
            });
        }

        match self
            .try_repoint(ctx, relation, object_id, src_handle, dst_handle)
            .await?
        {
            RepointAttempt::Applied(history_id) => Ok(Repointed {
                added: Some(dst_handle.to_string()),
                history_id: Some(history_id),
            }),
            RepointAttempt::DestinationAlreadySet => {
                debug!(
                    object_type = %relation.object_type(),
                    object_id = object_id,
                    dst = %dst_handle,
                    "Destination already linked, removing source only"
                );
                let history_id = relation
                    .update(
                        ctx,
                        object_id,
                        &self.registrar,
                        src_handle,
                        None,
                        self.logger_request_id,
                    )
                    .await?;
                Ok(Repointed {
                    added: None,
                    history_id: Some(history_id),
                })
            }
            RepointAttempt::Failed(e) => Err(e.into()),
        }
    }

    async fn try_repoint(
        &self,
        ctx: &mut OperationContext,
        relation: ContactRelation,
        object_id: ObjectId,
        src_handle: &str,
        dst_handle: &str,
    ) -> Result<RepointAttempt, MergeContactError> {
        ctx.savepoint(MERGE_SAVEPOINT).await?;

        let result = relation
            .update(
                ctx,
                object_id,
                &self.registrar,
                src_handle,
                Some(dst_handle),
                self.logger_request_id,
            )
            .await;

        let attempt = match result {
            Ok(history_id) => RepointAttempt::Applied(history_id),
            Err(UpdateObjectError::InvalidContacts(problems))
                if problems.is_only_already_set(dst_handle) =>
            {
                ctx.rollback_to_savepoint(MERGE_SAVEPOINT).await?;
                RepointAttempt::DestinationAlreadySet
            }
            Err(e) => {
                ctx.rollback_to_savepoint(MERGE_SAVEPOINT).await?;
                RepointAttempt::Failed(e)
            }
        };
        ctx.release_savepoint(MERGE_SAVEPOINT).await?;
        Ok(attempt)
    }

    /// Carry a passed manual verification over to the destination
    async fn migrate_states(
        &self,
        ctx: &mut OperationContext,
        src: &LockedContact,
        dst: &LockedContact,
        dry_run: bool,
    ) -> Result<(), MergeContactError> {
        let src_states = self.states(ctx, src.id, dry_run).await?;
        let dst_states = self.states(ctx, dst.id, dry_run).await?;

        let state = ObjectState::ContactPassedManualVerification;
        if src_states.absents(state) || dst_states.presents(state) {
            return Ok(());
        }

        debug!(
            src = %src.handle,
            dst = %dst.handle,
            state = %state,
            dry_run = dry_run,
            "Migrating contact state"
        );
        if !dry_run {
            CreateObjectStateRequestId::new(dst.id, vec![state])
                .exec(ctx)
                .await?;
            PerformObjectStateRequest::new(Some(dst.id))
                .exec(ctx)
                .await?;
        }
        Ok(())
    }
}
