//! Pruning the provider tenant and the local store.

use pretty_assertions::assert_eq;

use orgsync_client::memory::InMemoryRemote;
use orgsync_core::entities::{RemoteOrganization, RemoteUser};
use orgsync_core::enums::{EntityStatus, HierarchyKind, OperationAction, OrgKind};
use orgsync_db::HierarchyService;
use orgsync_db::repos::{OrganizationUpsert, UserUpsert};
use orgsync_engine::{EngineError, PruneOptions, Pruner};

fn organization(id: &str, name: &str) -> RemoteOrganization {
    RemoteOrganization {
        id: id.into(),
        name: name.into(),
        ..RemoteOrganization::default()
    }
}

fn user(id: &str, username: Option<&str>) -> RemoteUser {
    RemoteUser {
        id: id.into(),
        username: username.map(Into::into),
        ..RemoteUser::default()
    }
}

fn remote() -> InMemoryRemote {
    let remote = InMemoryRemote::new();
    remote.seed(|state| {
        state.organizations = vec![
            organization("org_owner", "Owner"),
            organization("D1", "Acme Distribution"),
            organization("C1", "Customer Ltd"),
        ];
        state.users = vec![
            user("u_owner", Some("OWNER")),
            user("U1", Some("alice")),
            user("U2", None),
        ];
    });
    remote
}

async fn seeded_store() -> HierarchyService {
    let store = HierarchyService::open_local(":memory:").await.unwrap();
    store
        .upsert_organization(&OrganizationUpsert {
            kind: OrgKind::Distributor,
            remote_id: "D1".into(),
            name: "Acme Distribution".into(),
            description: None,
            custom_data: None,
        })
        .await
        .unwrap();
    store
        .upsert_user(&UserUpsert {
            remote_id: "U1".into(),
            username: "alice".into(),
            name: "Alice".into(),
            organization_id: Some("D1".into()),
            ..UserUpsert::default()
        })
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn everything_but_the_bootstrap_pair_is_deleted() {
    let remote = remote();
    let store = seeded_store().await;

    let report = Pruner::new(&remote, Some(&store), PruneOptions::default())
        .run()
        .await
        .unwrap();

    assert!(report.success, "errors: {:?}", report.errors);
    let s = &report.summary;
    assert_eq!((s.organizations_deleted, s.organizations_skipped), (2, 1));
    assert_eq!((s.users_deleted, s.users_skipped), (2, 1));
    assert_eq!((s.local.distributors, s.local.users), (1, 1));
    assert!(report.local_store);

    let state = remote.snapshot();
    assert_eq!(
        state.organizations.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
        vec!["org_owner"]
    );
    assert_eq!(
        state.users.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
        vec!["u_owner"]
    );
    assert_eq!(store.count_live(HierarchyKind::Distributor).await.unwrap(), 0);
    assert_eq!(store.count_live(HierarchyKind::User).await.unwrap(), 0);
}

#[tokio::test]
async fn dry_run_counts_without_mutating() {
    let remote = remote();
    let store = seeded_store().await;
    let options = PruneOptions {
        dry_run: true,
        ..PruneOptions::default()
    };

    let report = Pruner::new(&remote, Some(&store), options).run().await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.summary.organizations_deleted, 2);
    assert_eq!(report.summary.local.users, 1);
    assert!(remote.mutation_calls().is_empty());
    assert_eq!(remote.snapshot().users.len(), 3);
    assert_eq!(store.count_live(HierarchyKind::User).await.unwrap(), 1);
    assert!(
        report
            .operations
            .iter()
            .any(|op| op.description == "Would delete organization D1")
    );
}

#[tokio::test]
async fn include_owner_deletes_the_bootstrap_pair() {
    let remote = remote();
    let options = PruneOptions {
        include_owner: true,
        ..PruneOptions::default()
    };

    let report = Pruner::new(&remote, None, options).run().await.unwrap();

    assert_eq!(report.summary.organizations_deleted, 3);
    assert_eq!(report.summary.users_deleted, 3);
    assert!(!report.local_store);
    let state = remote.snapshot();
    assert!(state.organizations.is_empty());
    assert!(state.users.is_empty());
}

#[tokio::test]
async fn failed_deletes_are_reported_and_the_run_continues() {
    let remote = remote();
    remote.fail_on("delete_user");

    let report = Pruner::new(&remote, None, PruneOptions::default())
        .run()
        .await
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.summary.organizations_deleted, 2);
    assert_eq!((report.summary.users_deleted, report.summary.users_skipped), (0, 3));
    assert_eq!(report.errors.len(), 2);
    let failed: Vec<_> = report.operations.iter().filter(|op| !op.success).collect();
    assert_eq!(failed.len(), 2);
    assert!(failed.iter().all(|op| op.action == OperationAction::Delete));
    assert_eq!(remote.snapshot().users.len(), 3);
}

#[tokio::test]
async fn listing_failure_stops_before_anything_is_deleted() {
    let remote = remote();
    remote.fail_on("list_organizations");
    let store = seeded_store().await;

    let err = Pruner::new(&remote, Some(&store), PruneOptions::default())
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Step { .. }));
    assert!(remote.mutation_calls().is_empty());
    assert_eq!(
        store.count_live(HierarchyKind::Distributor).await.unwrap(),
        1
    );
    let d1 = store
        .find_organization_by_remote_id(OrgKind::Distributor, "D1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        store.entity_status(HierarchyKind::Distributor, &d1.id).await.unwrap(),
        Some(EntityStatus::Active)
    );
}
