//! Contact reference lists
//!
//! Domain admin contacts, nsset and keyset technical contacts all live in
//! `<type>_contact_map` tables and are edited the same way.

use super::error::ContactRefProblems;
use super::get_live_contact_id;
use crate::core_types::ObjectId;
use crate::db::OperationContext;

/// SQL for one contact reference table
pub(crate) struct ContactMap {
    list: &'static str,
    exists: &'static str,
    insert: &'static str,
    delete: &'static str,
}

pub(crate) const DOMAIN_ADMIN_CONTACTS: ContactMap = ContactMap {
    list: "SELECT c.name FROM domain_contact_map m JOIN object_registry c ON c.id = m.contactid \
           WHERE m.domainid = $1 AND m.role = 1 ORDER BY c.name",
    exists: "SELECT EXISTS (SELECT 1 FROM domain_contact_map \
             WHERE domainid = $1 AND contactid = $2 AND role = 1)",
    insert: "INSERT INTO domain_contact_map (domainid, contactid, role) VALUES ($1, $2, 1)",
    delete: "DELETE FROM domain_contact_map WHERE domainid = $1 AND contactid = $2 AND role = 1",
};

pub(crate) const NSSET_TECH_CONTACTS: ContactMap = ContactMap {
    list: "SELECT c.name FROM nsset_contact_map m JOIN object_registry c ON c.id = m.contactid \
           WHERE m.nssetid = $1 ORDER BY c.name",
    exists: "SELECT EXISTS (SELECT 1 FROM nsset_contact_map WHERE nssetid = $1 AND contactid = $2)",
    insert: "INSERT INTO nsset_contact_map (nssetid, contactid) VALUES ($1, $2)",
    delete: "DELETE FROM nsset_contact_map WHERE nssetid = $1 AND contactid = $2",
};

pub(crate) const KEYSET_TECH_CONTACTS: ContactMap = ContactMap {
    list: "SELECT c.name FROM keyset_contact_map m JOIN object_registry c ON c.id = m.contactid \
           WHERE m.keysetid = $1 ORDER BY c.name",
    exists: "SELECT EXISTS (SELECT 1 FROM keyset_contact_map \
             WHERE keysetid = $1 AND contactid = $2)",
    insert: "INSERT INTO keyset_contact_map (keysetid, contactid) VALUES ($1, $2)",
    delete: "DELETE FROM keyset_contact_map WHERE keysetid = $1 AND contactid = $2",
};

impl ContactMap {
    /// Handles currently linked to the object
    pub(crate) async fn list_handles(
        &self,
        ctx: &mut OperationContext,
        object_id: ObjectId,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(self.list)
            .bind(object_id)
            .fetch_all(ctx.conn())
            .await
    }

    /// Remove, then add; collect every handle that could not be applied.
    ///
    /// Applied changes are not undone when problems are reported.
    pub(crate) async fn apply(
        &self,
        ctx: &mut OperationContext,
        object_id: ObjectId,
        rem: &[String],
        add: &[String],
    ) -> Result<ContactRefProblems, sqlx::Error> {
        let mut problems = ContactRefProblems::default();

        for handle in rem {
            let Some(contact_id) = get_live_contact_id(ctx, handle).await? else {
                problems.unknown.push(handle.clone());
                continue;
            };
            let removed = sqlx::query(self.delete)
                .bind(object_id)
                .bind(contact_id)
                .execute(ctx.conn())
                .await?
                .rows_affected();
            if removed == 0 {
                problems.unassigned.push(handle.clone());
            }
        }

        for handle in add {
            let Some(contact_id) = get_live_contact_id(ctx, handle).await? else {
                problems.unknown.push(handle.clone());
                continue;
            };
            let exists: bool = sqlx::query_scalar(self.exists)
                .bind(object_id)
                .bind(contact_id)
                .fetch_one(ctx.conn())
                .await?;
            if exists {
                problems.already_set.push(handle.clone());
                continue;
            }
            sqlx::query(self.insert)
                .bind(object_id)
                .bind(contact_id)
                .execute(ctx.conn())
                .await?;
        }

        Ok(problems)
    }
}
