//! Pulling remote organizations and users into the local store.

use pretty_assertions::assert_eq;
use serde_json::json;

use orgsync_client::memory::InMemoryRemote;
use orgsync_core::entities::{RemoteOrganization, RemoteRole, RemoteUser};
use orgsync_core::enums::{OperationAction, OperationKind, OrgKind};
use orgsync_db::HierarchyService;
use orgsync_db::repos::OrganizationUpsert;
use orgsync_engine::{PullOptions, PullReconciler, PullReport};

fn organization(id: &str, name: &str, marker: Option<&str>) -> RemoteOrganization {
    RemoteOrganization {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        custom_data: marker.map(|m| json!({ "type": m })),
    }
}

fn remote() -> InMemoryRemote {
    let remote = InMemoryRemote::new();
    remote.seed(|state| {
        state.organizations = vec![
            organization("org_owner", "Owner", None),
            organization("D1", "Acme Distribution", Some("distributor")),
            organization("R1", "Resell Co", Some("reseller")),
            organization("C1", "Customer Ltd", Some("partner")),
        ];
        state.users = vec![
            RemoteUser {
                id: "u_owner".into(),
                username: Some("Owner".into()),
                ..RemoteUser::default()
            },
            RemoteUser {
                id: "U1".into(),
                name: Some("Alice".into()),
                primary_email: Some("alice@example.com".into()),
                primary_phone: Some("+39000".into()),
                ..RemoteUser::default()
            },
            RemoteUser {
                id: "U2".into(),
                ..RemoteUser::default()
            },
        ];
        state.user_roles.insert(
            "U1".into(),
            vec![RemoteRole {
                id: "role_support".into(),
                name: "Support".into(),
                description: String::new(),
            }],
        );
    });
    remote
}

async fn pull(remote: &InMemoryRemote, store: &HierarchyService, options: PullOptions) -> PullReport {
    PullReconciler::new(remote, store, options).run().await.unwrap()
}

#[tokio::test]
async fn organizations_and_users_are_mirrored() {
    let remote = remote();
    let store = HierarchyService::open_local(":memory:").await.unwrap();

    let report = pull(&remote, &store, PullOptions::default()).await;

    assert!(report.success, "errors: {:?}", report.errors);
    let s = &report.summary;
    assert_eq!((s.organizations_created, s.organizations_skipped), (3, 1));
    assert_eq!((s.users_created, s.users_skipped), (2, 1));
    assert_eq!(s.conflicts_detected, 0);

    assert_eq!(report.operations[0].action, OperationAction::Skip);
    assert_eq!(report.operations[0].description, "Owner organization skipped (Logto-only)");
    assert_eq!(report.operations[1].kind, OperationKind::Distributor);
    assert_eq!(report.operations[1].description, "Created distributor Acme Distribution");

    // Unknown marker falls back to customer.
    let customers = store.list_organizations(OrgKind::Customer).await.unwrap();
    assert_eq!(customers.len(), 1);
    assert_eq!(customers[0].remote_id.as_deref(), Some("C1"));

    let alice = store.find_user_by_remote_id("U1").await.unwrap().unwrap();
    assert_eq!(alice.name, "Alice");
    assert_eq!(alice.email.as_deref(), Some("alice@example.com"));
    assert_eq!(alice.phone.as_deref(), Some("+39000"));
    assert_eq!(alice.organization_id.as_deref(), Some("D1"));
    assert_eq!(alice.user_role_ids, vec!["role_support".to_string()]);

    let unnamed = store.find_user_by_remote_id("U2").await.unwrap().unwrap();
    assert_eq!(unnamed.name, "Unknown User");
    assert!(store.find_user_by_remote_id("u_owner").await.unwrap().is_none());
}

#[tokio::test]
async fn second_pull_updates_in_place() {
    let remote = remote();
    let store = HierarchyService::open_local(":memory:").await.unwrap();
    pull(&remote, &store, PullOptions::default()).await;

    let report = pull(&remote, &store, PullOptions::default()).await;
    assert_eq!(report.summary.organizations_created, 0);
    assert_eq!(report.summary.organizations_updated, 3);
    assert_eq!(report.summary.users_updated, 2);
    assert_eq!(store.list_organizations(OrgKind::Distributor).await.unwrap().len(), 1);
}

#[tokio::test]
async fn dry_run_reports_without_writing() {
    let remote = remote();
    let store = HierarchyService::open_local(":memory:").await.unwrap();

    let report = pull(
        &remote,
        &store,
        PullOptions {
            dry_run: true,
            ..PullOptions::default()
        },
    )
    .await;

    assert!(report.dry_run);
    assert_eq!(report.summary.organizations_created, 3);
    assert_eq!(report.summary.users_created, 2);
    assert!(report.operations.iter().any(|o| o.description == "Would create user Alice"));
    for kind in OrgKind::ALL {
        assert!(store.list_organizations(kind).await.unwrap().is_empty());
    }
    assert!(store.list_users().await.unwrap().is_empty());
    assert!(!remote.calls().contains(&"user_roles".to_string()));
}

#[tokio::test]
async fn kind_change_is_a_conflict_and_keeps_the_local_row() {
    let remote = remote();
    let store = HierarchyService::open_local(":memory:").await.unwrap();
    store
        .upsert_organization(&OrganizationUpsert {
            kind: OrgKind::Reseller,
            remote_id: "C1".into(),
            name: "Customer Ltd".into(),
            description: None,
            custom_data: Some(json!({ "type": "reseller" })),
        })
        .await
        .unwrap();

    let report = pull(
        &remote,
        &store,
        PullOptions {
            organizations_only: true,
            ..PullOptions::default()
        },
    )
    .await;

    assert_eq!(report.summary.conflicts_detected, 1);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].resource, "Customer Ltd");
    assert_eq!(report.conflicts[0].local_value, json!("reseller"));
    assert_eq!(report.conflicts[0].remote_value, json!("customer"));
    assert!(report.operations.iter().any(|o| o.conflict));

    let stored = store.find_organization_any_kind("C1").await.unwrap().unwrap();
    assert_eq!(stored.kind, OrgKind::Reseller);
    assert!(store.list_organizations(OrgKind::Customer).await.unwrap().is_empty());
    assert!(!remote.calls().contains(&"list_users".to_string()));
}

#[tokio::test]
async fn listing_failure_is_recorded_per_section() {
    let remote = remote();
    remote.fail_on("list_organizations");
    let store = HierarchyService::open_local(":memory:").await.unwrap();

    let report = pull(&remote, &store, PullOptions::default()).await;

    assert!(!report.success);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Organizations pull failed: "));
    // Users still pulled, without an organization to attach to.
    assert_eq!(report.summary.users_created, 2);
    let alice = store.find_user_by_remote_id("U1").await.unwrap().unwrap();
    assert_eq!(alice.organization_id, None);
}
