//! Contact merge scenarios against PostgreSQL
//!
//! Run with `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use std::sync::Arc;

use common::*;
use registry_ops::db::OperationContext;
use registry_ops::merge_contact::{
    DefaultDiffContacts, DiffContacts, MergeContact, MergeContactError, create_poll_messages,
};
use registry_ops::object::InfoContactByHandle;
use registry_ops::object_state::{
    GetObjectStates, ObjectState, ObjectStatesInfo, PerformObjectStateRequest,
};
use registry_ops::{ObjectId, RegistrarId};

fn default_diff() -> Option<Arc<dyn DiffContacts>> {
    Some(Arc::new(DefaultDiffContacts))
}

fn merge(src: &str, dst: &str) -> MergeContact {
    MergeContact::new(src, dst, "REG1", default_diff()).unwrap()
}

async fn states_of(ctx: &mut OperationContext, object_id: ObjectId) -> ObjectStatesInfo {
    let rows = GetObjectStates::new(object_id).exec(ctx).await.unwrap();
    ObjectStatesInfo::new(&rows)
}

/// Registrar REG1 sponsoring two contacts with identical data
async fn two_contacts(ctx: &mut OperationContext) -> (RegistrarId, ObjectId, ObjectId) {
    let reg = create_registrar(ctx, "REG1").await;
    let src = create_contact(ctx, "SRC", reg, "src-pw").await;
    let dst = create_contact(ctx, "DST", reg, "dst-pw").await;
    (reg, src, dst)
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_merge_repoints_domains_and_migrates_verification() {
    let mut ctx = begin_test_context().await;
    let (reg, src, dst) = two_contacts(&mut ctx).await;
    let owner = create_contact(&mut ctx, "OWNER", reg, "owner-pw").await;
    let example = create_domain(&mut ctx, "example.cz", reg, "d1", owner, &[src]).await;
    let other = create_domain(&mut ctx, "other.cz", reg, "d2", src, &[]).await;
    set_state(&mut ctx, src, ObjectState::ContactPassedManualVerification).await;
    let dst_authinfo_before = authinfo(&mut ctx, dst).await;
    let other_history_before = current_history_id(&mut ctx, other).await;

    let output = merge("SRC", "DST").exec(&mut ctx).await.unwrap();

    assert!(!output.dry_run);
    assert_eq!(output.contactid.src.id, src);
    assert_eq!(output.contactid.dst.id, dst);
    assert_eq!(output.update_domain_registrant.len(), 1);
    let registrant = &output.update_domain_registrant[0];
    assert_eq!(registrant.fqdn, "other.cz");
    assert_eq!(registrant.set_registrant, "DST");
    assert!(registrant.history_id.unwrap() > other_history_before);

    assert_eq!(output.update_domain_admin_contact.len(), 1);
    let admin = &output.update_domain_admin_contact[0];
    assert_eq!(admin.fqdn, "example.cz");
    assert_eq!(admin.rem_admin_contact, "SRC");
    assert_eq!(admin.add_admin_contact.as_deref(), Some("DST"));

    assert_eq!(domain_registrant(&mut ctx, other).await, dst);
    assert_eq!(
        linked_contacts(&mut ctx, "domain_contact_map", "domainid", example).await,
        vec![dst]
    );
    assert!(
        states_of(&mut ctx, dst)
            .await
            .presents(ObjectState::ContactPassedManualVerification)
    );
    assert!(InfoContactByHandle::new("SRC").exec(&mut ctx).await.unwrap().is_none());
    assert!(is_deleted(&mut ctx, src).await);
    assert_ne!(authinfo(&mut ctx, dst).await, dst_authinfo_before);

    // two domain updates plus the deleted source
    let messages = create_poll_messages(&output, &mut ctx).await.unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(
        message_recipients(&mut ctx, output.contactid.src.history_id, "delete_contact").await,
        vec![reg]
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_dry_run_reports_same_relations_and_writes_nothing() {
    let mut ctx = begin_test_context().await;
    let (reg, src, dst) = two_contacts(&mut ctx).await;
    let owner = create_contact(&mut ctx, "OWNER", reg, "owner-pw").await;
    create_domain(&mut ctx, "example.cz", reg, "d1", owner, &[src, dst]).await;
    create_domain(&mut ctx, "other.cz", reg, "d2", src, &[]).await;
    create_nsset(&mut ctx, "NSS-1", reg, "n1", &[src]).await;
    create_keyset(&mut ctx, "KEY-1", reg, "k1", &[src, dst]).await;

    let history_before = count_rows(&mut ctx, "history").await;
    let dry = merge("SRC", "DST").exec_dry_run(&mut ctx).await.unwrap();
    assert!(dry.dry_run);
    assert!(dry.history_ids().is_empty());
    assert_eq!(count_rows(&mut ctx, "history").await, history_before);
    assert!(!is_deleted(&mut ctx, src).await);
    assert!(create_poll_messages(&dry, &mut ctx).await.unwrap().is_empty());

    let real = merge("SRC", "DST").exec(&mut ctx).await.unwrap();
    assert_eq!(real.history_ids().len(), 4);
    assert_eq!(dry.relations_only(), real.relations_only());

    assert_eq!(dry.update_domain_admin_contact[0].add_admin_contact, None);
    assert_eq!(
        dry.update_nsset_tech_contact[0].add_tech_contact.as_deref(),
        Some("DST")
    );
    assert_eq!(dry.update_keyset_tech_contact[0].add_tech_contact, None);
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_destination_already_linked_removes_source_only() {
    let mut ctx = begin_test_context().await;
    let (reg, src, dst) = two_contacts(&mut ctx).await;
    let owner = create_contact(&mut ctx, "OWNER", reg, "owner-pw").await;
    let domain = create_domain(&mut ctx, "example.cz", reg, "d1", owner, &[src, dst]).await;
    let nsset = create_nsset(&mut ctx, "NSS-1", reg, "n1", &[dst, src]).await;

    let output = merge("SRC", "DST").exec(&mut ctx).await.unwrap();

    let admin = &output.update_domain_admin_contact[0];
    assert_eq!(admin.add_admin_contact, None);
    assert!(admin.history_id.is_some());
    assert_eq!(output.update_nsset_tech_contact[0].add_tech_contact, None);

    assert_eq!(
        linked_contacts(&mut ctx, "domain_contact_map", "domainid", domain).await,
        vec![dst]
    );
    assert_eq!(
        linked_contacts(&mut ctx, "nsset_contact_map", "nssetid", nsset).await,
        vec![dst]
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_blocked_domain_vetoes_whole_merge() {
    let mut ctx = begin_test_context().await;
    let (reg, src, _dst) = two_contacts(&mut ctx).await;
    let owner = create_contact(&mut ctx, "OWNER", reg, "owner-pw").await;
    let other = create_domain(&mut ctx, "other.cz", reg, "d1", src, &[]).await;
    let blocked = create_domain(&mut ctx, "blocked.cz", reg, "d2", owner, &[src]).await;
    set_state(&mut ctx, blocked, ObjectState::ServerBlocked).await;

    ctx.savepoint("before_merge").await.unwrap();
    let err = merge("SRC", "DST").exec(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::ObjectBlocked(ref h) if h == "blocked.cz"));
    assert!(!err.is_internal());
    ctx.rollback_to_savepoint("before_merge").await.unwrap();

    assert_eq!(domain_registrant(&mut ctx, other).await, src);
    assert_eq!(
        linked_contacts(&mut ctx, "domain_contact_map", "domainid", blocked).await,
        vec![src]
    );
    assert!(!is_deleted(&mut ctx, src).await);
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_update_prohibited_keyset_vetoes_merge() {
    let mut ctx = begin_test_context().await;
    let (reg, src, _dst) = two_contacts(&mut ctx).await;
    let nsset = create_nsset(&mut ctx, "NSS-1", reg, "n1", &[src]).await;
    let keyset = create_keyset(&mut ctx, "KEY-1", reg, "k1", &[src]).await;
    // only update prohibition vetoes nssets and keysets
    set_state(&mut ctx, nsset, ObjectState::ServerTransferProhibited).await;
    set_state(&mut ctx, keyset, ObjectState::ServerUpdateProhibited).await;

    let err = merge("SRC", "DST").exec_dry_run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::ObjectBlocked(ref h) if h == "KEY-1"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_only_passed_verification_migrates() {
    let mut ctx = begin_test_context().await;
    let (_reg, src, dst) = two_contacts(&mut ctx).await;
    set_state(&mut ctx, src, ObjectState::ContactPassedManualVerification).await;
    set_state(&mut ctx, src, ObjectState::ServerTransferProhibited).await;
    set_state(&mut ctx, src, ObjectState::IdentifiedContact).await;

    merge("SRC", "DST").exec(&mut ctx).await.unwrap();

    let dst_states = states_of(&mut ctx, dst).await;
    assert!(dst_states.presents(ObjectState::ContactPassedManualVerification));
    assert!(dst_states.absents(ObjectState::ServerTransferProhibited));
    assert!(dst_states.absents(ObjectState::IdentifiedContact));
    assert!(states_of(&mut ctx, src).await.is_empty());
    assert!(is_deleted(&mut ctx, src).await);
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_differing_contacts_are_not_merged() {
    let mut ctx = begin_test_context().await;
    let (_reg, src, dst) = two_contacts(&mut ctx).await;
    set_contact_field(&mut ctx, dst, "email", "other@example.cz").await;

    let err = merge("SRC", "DST").exec(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::ContactsDiffer { .. }));

    // whitespace only is no difference
    set_contact_field(&mut ctx, dst, "email", " jan@example.cz ").await;
    merge("SRC", "DST").exec_dry_run(&mut ctx).await.unwrap();

    // neither is another sponsor
    create_registrar(&mut ctx, "REG2").await;
    sqlx::query(
        "UPDATE object SET clid = (SELECT id FROM registrar WHERE handle = 'REG2') WHERE id = $1",
    )
    .bind(src)
    .execute(ctx.conn())
    .await
    .unwrap();
    let err = merge("SRC", "DST").exec_dry_run(&mut ctx).await.unwrap_err();
    assert_eq!(err.code(), "CONTACTS_DIFFER");
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_contact_state_gates() {
    let mut ctx = begin_test_context().await;
    let (reg, src, dst) = two_contacts(&mut ctx).await;
    let other_src = create_contact(&mut ctx, "SRC2", reg, "pw").await;
    let third_src = create_contact(&mut ctx, "SRC3", reg, "pw").await;

    set_state(&mut ctx, src, ObjectState::MojeidContact).await;
    let err = merge("SRC", "DST").exec_dry_run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::SrcContactInvalid(ref h) if h == "SRC"));

    attach_identity(&mut ctx, other_src).await;
    let err = merge("SRC2", "DST").exec_dry_run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::SrcContactInvalid(_)));

    set_state(&mut ctx, dst, ObjectState::ContactInManualVerification).await;
    let err = merge("SRC3", "DST").exec_dry_run(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::DstContactInvalid(ref h) if h == "DST"));
    assert!(!is_deleted(&mut ctx, third_src).await);
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_unknown_handles_and_missing_predicate() {
    let mut ctx = begin_test_context().await;
    two_contacts(&mut ctx).await;

    let err = merge("NOBODY", "DST").exec(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::UnknownSourceContactHandle(_)));

    let err = merge("SRC", "NOBODY").exec(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::UnknownDestinationContactHandle(_)));

    let err = MergeContact::new("SRC", "DST", "REG1", None)
        .unwrap()
        .exec(&mut ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, MergeContactError::UnableToGetDifferenceOfContacts));

    // handles resolve case-insensitively
    let output = merge("src", "dst").exec_dry_run(&mut ctx).await.unwrap();
    assert_eq!(output.contactid.src.handle, "SRC");
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_deleted_source_stays_without_states_after_recompute() {
    let mut ctx = begin_test_context().await;
    let (_reg, src, dst) = two_contacts(&mut ctx).await;
    set_state(&mut ctx, src, ObjectState::ContactPassedManualVerification).await;
    set_state(&mut ctx, src, ObjectState::ServerTransferProhibited).await;

    merge("SRC", "DST").exec(&mut ctx).await.unwrap();
    PerformObjectStateRequest::new(None)
        .exec(&mut ctx)
        .await
        .unwrap();

    assert!(is_deleted(&mut ctx, src).await);
    assert!(states_of(&mut ctx, src).await.is_empty());
    let pending: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM object_state_request WHERE object_id = $1 AND canceled IS NULL",
    )
    .bind(src)
    .fetch_one(ctx.conn())
    .await
    .unwrap();
    assert_eq!(pending, 0);
    assert!(
        states_of(&mut ctx, dst)
            .await
            .presents(ObjectState::ContactPassedManualVerification)
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_keyset_with_both_contacts_keeps_destination_only() {
    let mut ctx = begin_test_context().await;
    let (reg, src, dst) = two_contacts(&mut ctx).await;
    let keyset = create_keyset(&mut ctx, "KEY-1", reg, "k1", &[src, dst]).await;

    let output = merge("SRC", "DST").exec(&mut ctx).await.unwrap();

    assert_eq!(output.update_keyset_tech_contact.len(), 1);
    let tech = &output.update_keyset_tech_contact[0];
    assert_eq!(tech.handle, "KEY-1");
    assert_eq!(tech.rem_tech_contact, "SRC");
    assert_eq!(tech.add_tech_contact, None);
    assert!(tech.history_id.is_some());
    assert_eq!(
        linked_contacts(&mut ctx, "keyset_contact_map", "keysetid", keyset).await,
        vec![dst]
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_update_prohibited_domain_admin_vetoes_merge() {
    let mut ctx = begin_test_context().await;
    let (reg, src, _dst) = two_contacts(&mut ctx).await;
    let owner = create_contact(&mut ctx, "OWNER", reg, "owner-pw").await;
    let domain = create_domain(&mut ctx, "locked.cz", reg, "d1", owner, &[src]).await;
    set_state(&mut ctx, domain, ObjectState::ServerUpdateProhibited).await;

    let err = merge("SRC", "DST").exec(&mut ctx).await.unwrap_err();
    assert!(matches!(err, MergeContactError::ObjectBlocked(ref h) if h == "locked.cz"));
    assert_eq!(
        linked_contacts(&mut ctx, "domain_contact_map", "domainid", domain).await,
        vec![src]
    );
    assert!(!is_deleted(&mut ctx, src).await);

    let err = merge("SRC", "DST").exec_dry_run(&mut ctx).await.unwrap_err();
    assert_eq!(err.code(), "OBJECT_BLOCKED");
}

#[tokio::test]
#[ignore = "requires PostgreSQL database"]
async fn test_source_registrant_and_admin_with_destination_admin() {
    let mut ctx = begin_test_context().await;
    let (reg, src, dst) = two_contacts(&mut ctx).await;
    let domain = create_domain(&mut ctx, "example.cz", reg, "d1", src, &[src, dst]).await;
    let history_before = current_history_id(&mut ctx, domain).await;

    let dry = merge("SRC", "DST").exec_dry_run(&mut ctx).await.unwrap();
    let output = merge("SRC", "DST").exec(&mut ctx).await.unwrap();
    assert_eq!(dry.relations_only(), output.relations_only());

    let registrant = &output.update_domain_registrant[0];
    let admin = &output.update_domain_admin_contact[0];
    assert_eq!(registrant.fqdn, "example.cz");
    assert_eq!(admin.fqdn, "example.cz");
    assert_eq!(admin.add_admin_contact, None);
    assert!(registrant.history_id.unwrap() > history_before);
    assert!(admin.history_id.unwrap() > registrant.history_id.unwrap());

    assert_eq!(domain_registrant(&mut ctx, domain).await, dst);
    assert_eq!(
        linked_contacts(&mut ctx, "domain_contact_map", "domainid", domain).await,
        vec![dst]
    );
    assert!(is_deleted(&mut ctx, src).await);
}
