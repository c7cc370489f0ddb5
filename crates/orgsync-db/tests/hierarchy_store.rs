//! Integration tests for the hierarchy store: upserts, direct transitions,
//! and cascade-stamped bulk transitions.

use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use orgsync_core::enums::{AuditAction, EntityStatus, HierarchyKind, OrgKind};
use orgsync_db::HierarchyService;
use orgsync_db::error::DatabaseError;
use orgsync_db::repos::{OrganizationUpsert, UpsertOutcome, UserUpsert};

async fn store() -> HierarchyService {
    HierarchyService::open_local(":memory:").await.unwrap()
}

fn org(kind: OrgKind, remote_id: &str, parent: Option<&str>) -> OrganizationUpsert {
    OrganizationUpsert {
        kind,
        remote_id: remote_id.to_string(),
        name: format!("{kind} {remote_id}"),
        description: None,
        custom_data: Some(match parent {
            Some(p) => json!({"type": kind.as_str(), "createdBy": p}),
            None => json!({"type": kind.as_str()}),
        }),
    }
}

fn user(remote_id: &str, organization: &str) -> UserUpsert {
    UserUpsert {
        remote_id: remote_id.to_string(),
        username: remote_id.to_string(),
        name: format!("User {remote_id}"),
        organization_id: Some(organization.to_string()),
        ..UserUpsert::default()
    }
}

/// distributor D1 -> reseller R1 -> customer C1 -> user U1, plus user U0 on D1.
async fn seeded() -> (HierarchyService, Ids) {
    let svc = store().await;
    let (d, _) = svc.upsert_organization(&org(OrgKind::Distributor, "D1", None)).await.unwrap();
    let (r, _) = svc.upsert_organization(&org(OrgKind::Reseller, "R1", Some("D1"))).await.unwrap();
    let (c, _) = svc.upsert_organization(&org(OrgKind::Customer, "C1", Some("R1"))).await.unwrap();
    let (u1, _) = svc.upsert_user(&user("U1", "C1")).await.unwrap();
    let (u0, _) = svc.upsert_user(&user("U0", "D1")).await.unwrap();
    (
        svc,
        Ids {
            distributor: d.id,
            reseller: r.id,
            customer: c.id,
            user_on_customer: u1.id,
            user_on_distributor: u0.id,
        },
    )
}

struct Ids {
    distributor: String,
    reseller: String,
    customer: String,
    user_on_customer: String,
    user_on_distributor: String,
}

// =============================================================================
// Upserts
// =============================================================================

#[tokio::test]
async fn organization_upsert_creates_then_updates() {
    let svc = store().await;
    let (first, outcome) = svc
        .upsert_organization(&org(OrgKind::Reseller, "R9", Some("D1")))
        .await
        .unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);
    assert!(first.id.starts_with("rsl-"));
    assert_eq!(first.created_by(), Some("D1"));

    let mut renamed = org(OrgKind::Reseller, "R9", Some("D1"));
    renamed.name = "Renamed".into();
    let (second, outcome) = svc.upsert_organization(&renamed).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated);
    assert_eq!(second.id, first.id);
    assert_eq!(second.name, "Renamed");
    assert!(second.synced_at.is_some());

    let audit = svc.audit_for(HierarchyKind::Reseller, &first.id).await.unwrap();
    let actions: Vec<_> = audit.iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Created, AuditAction::Updated]);
}

#[tokio::test]
async fn user_upsert_keeps_role_ids() {
    let svc = store().await;
    let mut u = user("U5", "D1");
    u.user_role_ids = vec!["r1".into(), "r2".into()];
    u.email = Some("u5@example.com".into());
    let (created, outcome) = svc.upsert_user(&u).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Created);
    assert_eq!(created.user_role_ids, vec!["r1".to_string(), "r2".to_string()]);
    assert_eq!(created.email.as_deref(), Some("u5@example.com"));
    assert_eq!(created.status(), EntityStatus::Active);

    let found = svc.find_user_by_remote_id("U5").await.unwrap().unwrap();
    assert_eq!(found, created);
}

#[tokio::test]
async fn find_any_kind_searches_all_tables() {
    let (svc, ids) = seeded().await;
    let found = svc.find_organization_any_kind("C1").await.unwrap().unwrap();
    assert_eq!(found.kind, OrgKind::Customer);
    assert_eq!(found.id, ids.customer);
    assert!(svc.find_organization_any_kind("nope").await.unwrap().is_none());
}

// =============================================================================
// Direct transitions
// =============================================================================

#[tokio::test]
async fn direct_suspend_records_no_origin() {
    let (svc, ids) = seeded().await;
    svc.suspend(HierarchyKind::Reseller, &ids.reseller).await.unwrap();
    let r = svc.get_organization(OrgKind::Reseller, &ids.reseller).await.unwrap();
    assert_eq!(r.status(), EntityStatus::Suspended);
    assert_eq!(r.suspended_by_org_id, None);
}

#[tokio::test]
async fn suspending_twice_is_rejected() {
    let (svc, ids) = seeded().await;
    svc.suspend(HierarchyKind::Customer, &ids.customer).await.unwrap();
    let err = svc
        .suspend(HierarchyKind::Customer, &ids.customer)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::InvalidTransition {
            from: EntityStatus::Suspended,
            to: EntityStatus::Suspended,
            ..
        }
    ));
}

#[rstest]
#[case(HierarchyKind::Distributor)]
#[case(HierarchyKind::Reseller)]
#[case(HierarchyKind::Customer)]
#[case(HierarchyKind::User)]
#[tokio::test]
async fn missing_rows_are_not_found(#[case] kind: HierarchyKind) {
    let svc = store().await;
    let err = svc.suspend(kind, "ghost").await.unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound { .. }));
    let err = svc.reactivate(kind, "ghost").await.unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound { .. }));
}

#[tokio::test]
async fn reactivating_an_active_row_is_rejected() {
    let (svc, ids) = seeded().await;
    let err = svc
        .reactivate(HierarchyKind::Distributor, &ids.distributor)
        .await
        .unwrap_err();
    assert!(matches!(err, DatabaseError::InvalidTransition { .. }));
}

#[tokio::test]
async fn soft_deleted_rows_leave_listings_and_cannot_be_suspended() {
    let (svc, ids) = seeded().await;
    svc.soft_delete(HierarchyKind::Customer, &ids.customer).await.unwrap();
    assert!(svc.list_organizations(OrgKind::Customer).await.unwrap().is_empty());
    assert!(svc.find_organization_by_remote_id(OrgKind::Customer, "C1").await.unwrap().is_none());
    let err = svc
        .suspend(HierarchyKind::Customer, &ids.customer)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DatabaseError::InvalidTransition {
            from: EntityStatus::Deleted,
            ..
        }
    ));
}

#[tokio::test]
async fn hard_delete_purges_and_audits() {
    let (svc, ids) = seeded().await;
    svc.hard_delete(HierarchyKind::User, &ids.user_on_customer).await.unwrap();
    assert_eq!(
        svc.entity_status(HierarchyKind::User, &ids.user_on_customer).await.unwrap(),
        None
    );
    let audit = svc.audit_for(HierarchyKind::User, &ids.user_on_customer).await.unwrap();
    assert_eq!(audit.last().map(|e| e.action), Some(AuditAction::Purged));
    assert!(matches!(
        svc.hard_delete(HierarchyKind::User, &ids.user_on_customer).await,
        Err(DatabaseError::NotFound { .. })
    ));
}

#[tokio::test]
async fn purge_live_removes_all_but_soft_deleted_rows() {
    let (svc, ids) = seeded().await;
    svc.soft_delete(HierarchyKind::User, &ids.user_on_distributor).await.unwrap();
    svc.suspend(HierarchyKind::User, &ids.user_on_customer).await.unwrap();
    assert_eq!(svc.count_live(HierarchyKind::User).await.unwrap(), 1);

    let purged = svc.purge_live(HierarchyKind::User).await.unwrap();
    assert_eq!(purged, vec![ids.user_on_customer.clone()]);
    assert_eq!(svc.count_live(HierarchyKind::User).await.unwrap(), 0);
    assert_eq!(
        svc.entity_status(HierarchyKind::User, &ids.user_on_distributor).await.unwrap(),
        Some(EntityStatus::Deleted)
    );
    let audit = svc.audit_for(HierarchyKind::User, &ids.user_on_customer).await.unwrap();
    assert_eq!(audit.last().map(|e| e.action), Some(AuditAction::Purged));

    assert_eq!(svc.count_live(HierarchyKind::Distributor).await.unwrap(), 1);
    assert!(svc.purge_live(HierarchyKind::User).await.unwrap().is_empty());
}

// =============================================================================
// Cascade transitions
// =============================================================================

#[tokio::test]
async fn suspend_by_created_by_stamps_origin() {
    let (svc, ids) = seeded().await;
    let affected = svc
        .suspend_by_created_by(HierarchyKind::Reseller, "D1", "D1")
        .await
        .unwrap();
    assert_eq!(affected.len(), 1);
    assert_eq!(affected[0].id, ids.reseller);
    assert_eq!(affected[0].remote_id.as_deref(), Some("R1"));

    let r = svc.get_organization(OrgKind::Reseller, &ids.reseller).await.unwrap();
    assert_eq!(r.suspended_by_org_id.as_deref(), Some("D1"));
    let audit = svc.audit_by_origin("D1").await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::Suspended);
}

#[tokio::test]
async fn suspend_children_matches_users_by_organization() {
    let (svc, ids) = seeded().await;
    let affected = svc
        .suspend_children(HierarchyKind::User, &["D1".into(), "C1".into()], "D1")
        .await
        .unwrap();
    let mut touched: Vec<_> = affected.into_iter().map(|a| a.id).collect();
    touched.sort();
    let mut expected = vec![ids.user_on_customer.clone(), ids.user_on_distributor.clone()];
    expected.sort();
    assert_eq!(touched, expected);
}

#[tokio::test]
async fn suspend_children_with_no_parents_is_a_no_op() {
    let (svc, _) = seeded().await;
    let affected = svc.suspend_children(HierarchyKind::Customer, &[], "D1").await.unwrap();
    assert!(affected.is_empty());
}

#[tokio::test]
async fn cascade_reactivation_skips_directly_suspended_rows() {
    let (svc, ids) = seeded().await;
    // Suspended on its own before the cascade.
    svc.suspend(HierarchyKind::User, &ids.user_on_distributor).await.unwrap();

    let affected = svc
        .suspend_children(HierarchyKind::User, &["D1".into(), "C1".into()], "D1")
        .await
        .unwrap();
    assert_eq!(affected.len(), 1, "already suspended rows are not restamped");

    let reactivated = svc
        .reactivate_by_suspended_by_org_id(HierarchyKind::User, "D1")
        .await
        .unwrap();
    assert_eq!(reactivated.len(), 1);
    assert_eq!(reactivated[0].id, ids.user_on_customer);

    assert_eq!(
        svc.entity_status(HierarchyKind::User, &ids.user_on_customer).await.unwrap(),
        Some(EntityStatus::Active)
    );
    assert_eq!(
        svc.entity_status(HierarchyKind::User, &ids.user_on_distributor).await.unwrap(),
        Some(EntityStatus::Suspended)
    );
}

#[tokio::test]
async fn reactivation_only_clears_matching_origin() {
    let (svc, ids) = seeded().await;
    svc.suspend_with_cascade_origin(HierarchyKind::Customer, &ids.customer, "R1")
        .await
        .unwrap();
    let none = svc
        .reactivate_by_suspended_by_org_id(HierarchyKind::Customer, "D1")
        .await
        .unwrap();
    assert!(none.is_empty());
    let some = svc
        .reactivate_by_suspended_by_org_id(HierarchyKind::Customer, "R1")
        .await
        .unwrap();
    assert_eq!(some.len(), 1);
    let c = svc.get_organization(OrgKind::Customer, &ids.customer).await.unwrap();
    assert_eq!(c.suspended_at, None);
    assert_eq!(c.suspended_by_org_id, None);
}

#[tokio::test]
async fn suspend_children_handles_more_parents_than_sqlite_binds() {
    let (svc, ids) = seeded().await;
    let mut parents: Vec<String> = (0..40_000).map(|i| format!("ghost-{i}")).collect();
    parents.push("C1".into());
    parents.push("D1".into());

    let affected = svc
        .suspend_children(HierarchyKind::User, &parents, "D1")
        .await
        .unwrap();
    let mut touched: Vec<_> = affected.into_iter().map(|a| a.id).collect();
    touched.sort();
    let mut expected = vec![ids.user_on_customer, ids.user_on_distributor];
    expected.sort();
    assert_eq!(touched, expected);
}

#[tokio::test]
async fn cascade_members_lists_rows_stamped_by_origin() {
    let (svc, ids) = seeded().await;
    svc.suspend(HierarchyKind::User, &ids.user_on_distributor).await.unwrap();
    svc.suspend_children(HierarchyKind::User, &["C1".into()], "D1")
        .await
        .unwrap();

    let members = svc.cascade_members(HierarchyKind::User, "D1").await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].id, ids.user_on_customer);
    assert_eq!(members[0].remote_id.as_deref(), Some("U1"));
    assert!(svc.cascade_members(HierarchyKind::Reseller, "D1").await.unwrap().is_empty());
}
