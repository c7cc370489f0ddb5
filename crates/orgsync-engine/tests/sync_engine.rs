//! Reconciliation scenarios against the in-memory remote.

use pretty_assertions::assert_eq;
use rstest::rstest;

use orgsync_client::memory::InMemoryRemote;
use orgsync_config::DesiredState;
use orgsync_core::entities::{RemoteResource, RemoteRole, ThirdPartyApplication};
use orgsync_core::enums::{OperationAction, OperationKind};
use orgsync_engine::{ReconciliationEngine, SyncOptions, SyncReport};

const API_BASE: &str = "https://api.example.com";

const RESOURCES_ONLY: &str = r"
metadata: { name: resources, version: '1.0' }
hierarchy:
  resources:
    - name: systems
      actions: [read, manage]
";

const FULL: &str = r"
metadata: { name: full, version: '1.0' }
hierarchy:
  organization_roles:
    - id: distributor
      name: Distributor
      type: org
      priority: 1
      permissions:
        - { id: 'read:systems', name: Read systems }
  user_roles:
    - id: support
      name: Support
      type: user
      priority: 2
      permissions:
        - { id: 'read:systems' }
        - { id: 'manage:systems' }
  resources:
    - name: systems
      actions: [read, manage]
";

fn doc(yaml: &str) -> DesiredState {
    DesiredState::from_yaml_str(yaml).unwrap()
}

fn options() -> SyncOptions {
    SyncOptions {
        api_base_url: API_BASE.to_string(),
        ..SyncOptions::default()
    }
}

async fn run(remote: &InMemoryRemote, options: SyncOptions, document: &DesiredState) -> SyncReport {
    ReconciliationEngine::new(remote, options)
        .sync(document)
        .await
        .unwrap()
}

fn kinds_and_actions(report: &SyncReport) -> Vec<(OperationKind, OperationAction)> {
    report.operations.iter().map(|o| (o.kind, o.action)).collect()
}

/// Remote with a stale description on `Support`, an unconfigured role, and a
/// provider-managed role.
fn seeded_remote() -> InMemoryRemote {
    let remote = InMemoryRemote::new();
    remote.seed(|state| {
        for (id, name, description) in [
            ("role_support", "Support", "old description"),
            ("role_obsolete", "obsolete-role", "no longer configured"),
            ("role_admin", "logto-admin", "Logto administrator"),
        ] {
            state.roles.push(RemoteRole {
                id: id.into(),
                name: name.into(),
                description: description.into(),
            });
        }
    });
    remote
}

// =============================================================================
// Resources
// =============================================================================

#[tokio::test]
async fn new_resource_creates_one_scope_per_action() {
    let remote = InMemoryRemote::new();
    let report = run(&remote, options(), &doc(RESOURCES_ONLY)).await;

    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(report.summary.resources_created, 1);
    assert_eq!(report.summary.scopes_created, 2);
    assert_eq!(
        kinds_and_actions(&report),
        vec![
            (OperationKind::Resource, OperationAction::Create),
            (OperationKind::Scope, OperationAction::Create),
            (OperationKind::Scope, OperationAction::Create),
        ]
    );
    assert_eq!(report.operations[0].description, "Created new resource");

    let state = remote.snapshot();
    assert_eq!(state.resources.len(), 1);
    assert_eq!(state.resources[0].indicator, "https://api.example.com/api/systems");
    assert_eq!(state.resources[0].access_token_ttl, 3600);
    let mut scopes: Vec<_> = state.scopes[&state.resources[0].id]
        .iter()
        .map(|s| (s.name.clone(), s.description.clone()))
        .collect();
    scopes.sort();
    assert_eq!(
        scopes,
        vec![
            ("manage:systems".to_string(), "Permission to manage systems".to_string()),
            ("read:systems".to_string(), "Permission to read systems".to_string()),
        ]
    );
}

#[tokio::test]
async fn changed_indicator_recreates_the_resource() {
    let remote = InMemoryRemote::new();
    remote.seed(|state| {
        state.resources.push(RemoteResource {
            id: "res_old".into(),
            name: "systems".into(),
            indicator: "https://old.example.com/api/systems".into(),
            is_default: false,
            access_token_ttl: 3600,
        });
        state.scopes.insert("res_old".into(), Vec::new());
    });

    let report = run(&remote, options(), &doc(RESOURCES_ONLY)).await;

    assert_eq!(
        report.operations[..2]
            .iter()
            .map(|o| (o.action, o.description.as_str()))
            .collect::<Vec<_>>(),
        vec![
            (OperationAction::Delete, "Deleted resource for recreation"),
            (OperationAction::Create, "Created resource with new indicator"),
        ]
    );
    assert_eq!(report.summary.resources_deleted, 1);
    assert_eq!(report.summary.resources_created, 1);
    assert_eq!(report.summary.scopes_created, 2);
    assert!(!remote.calls().contains(&"update_resource".to_string()));

    let state = remote.snapshot();
    assert_eq!(state.resources.len(), 1);
    assert_ne!(state.resources[0].id, "res_old");
    assert_eq!(state.resources[0].indicator, "https://api.example.com/api/systems");
}

#[tokio::test]
async fn matching_resource_is_left_alone() {
    let remote = InMemoryRemote::new();
    let document = doc(RESOURCES_ONLY);
    run(&remote, options(), &document).await;
    remote.reset_calls();

    let second = run(&remote, options(), &document).await;
    assert!(second.operations.is_empty());
    assert_eq!(second.summary, orgsync_engine::report::Summary::default());
    assert!(remote.mutation_calls().is_empty());
}

#[tokio::test]
async fn cleanup_keeps_the_management_resource() {
    let remote = InMemoryRemote::new();
    remote.seed(|state| {
        for (id, name, indicator, is_default) in [
            ("res_mgmt", "Logto Management API", "https://default.logto.app/api", true),
            ("res_stale", "legacy", "https://api.example.com/api/legacy", false),
        ] {
            state.resources.push(RemoteResource {
                id: id.into(),
                name: name.into(),
                indicator: indicator.into(),
                is_default,
                access_token_ttl: 3600,
            });
        }
    });
    let report = run(
        &remote,
        SyncOptions {
            cleanup: true,
            ..options()
        },
        &doc(RESOURCES_ONLY),
    )
    .await;

    assert_eq!(report.summary.resources_deleted, 1);
    let names: Vec<_> = remote
        .snapshot()
        .resources
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Logto Management API", "systems"]);
}

// =============================================================================
// Dry run
// =============================================================================

#[tokio::test]
async fn dry_run_matches_real_run_without_mutating() {
    let document = doc(FULL);
    let dry_remote = seeded_remote();
    let real_remote = seeded_remote();
    let cleanup = SyncOptions {
        cleanup: true,
        ..options()
    };

    let dry = run(
        &dry_remote,
        SyncOptions {
            dry_run: true,
            ..cleanup.clone()
        },
        &document,
    )
    .await;
    let real = run(&real_remote, cleanup, &document).await;

    assert!(dry.success, "errors: {:?}", dry.errors);
    assert!(real.success, "errors: {:?}", real.errors);
    assert_eq!(dry.summary, real.summary);
    assert_eq!(kinds_and_actions(&dry), kinds_and_actions(&real));
    assert!(dry_remote.mutation_calls().is_empty(), "{:?}", dry_remote.mutation_calls());
    assert!(dry.operations.iter().all(|o| o.description.starts_with("Would ")));

    assert_eq!(real.summary.resources_created, 1);
    assert_eq!(real.summary.roles_created, 1);
    assert_eq!(real.summary.roles_updated, 1);
    assert_eq!(real.summary.roles_deleted, 1);
    // One organization role scope plus two user role permissions.
    assert_eq!(real.summary.permissions_created, 3);
}

#[tokio::test]
async fn cleanup_never_deletes_provider_roles() {
    let remote = seeded_remote();
    let report = run(
        &remote,
        SyncOptions {
            cleanup: true,
            ..options()
        },
        &doc(FULL),
    )
    .await;
    assert!(report.success);

    let names: Vec<_> = remote.snapshot().roles.into_iter().map(|r| r.name).collect();
    assert!(names.contains(&"logto-admin".to_string()));
    assert!(!names.contains(&"obsolete-role".to_string()));
    let support = remote
        .snapshot()
        .roles
        .into_iter()
        .find(|r| r.name == "Support")
        .unwrap();
    assert_eq!(support.description, "User role (Priority: 2)");
    assert_eq!(remote.snapshot().role_scopes[&support.id].len(), 2);
}

// =============================================================================
// Failures and skips
// =============================================================================

#[tokio::test]
async fn failed_phase_is_reported_and_later_phases_run() {
    let remote = InMemoryRemote::new();
    remote.fail_on("create_organization_role");

    let report = run(&remote, options(), &doc(FULL)).await;

    assert!(!report.success);
    assert_eq!(report.errors.len(), 1);
    assert!(
        report.errors[0]
            .starts_with("Organization roles sync failed: failed to create organization role Distributor"),
        "{}",
        report.errors[0]
    );
    let failed: Vec<_> = report.operations.iter().filter(|o| !o.success).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind, OperationKind::OrganizationRole);
    assert!(failed[0].error.as_deref().unwrap().contains("injected failure"));

    // User roles and their permissions still went through.
    assert_eq!(report.summary.roles_created, 1);
    assert_eq!(report.summary.permissions_created, 2);
}

#[rstest]
#[case::roles(SyncOptions { skip_roles: true, ..options() }, &["list_roles", "list_organization_roles"])]
#[case::permissions(SyncOptions { skip_permissions: true, ..options() }, &["list_organization_scopes", "role_permissions"])]
#[case::resources(SyncOptions { skip_resources: true, ..options() }, &["create_resource"])]
#[tokio::test]
async fn skip_flags_keep_phases_off_the_wire(
    #[case] options: SyncOptions,
    #[case] absent: &[&str],
) {
    let remote = InMemoryRemote::new();
    run(&remote, options, &doc(FULL)).await;
    let calls = remote.calls();
    for method in absent {
        assert!(!calls.iter().any(|c| c == method), "{method} was called: {calls:?}");
    }
}

// =============================================================================
// Applications and sign-in experience
// =============================================================================

const APPS: &str = r"
metadata: { name: apps, version: '1.0' }
third_party_apps:
  - name: portal
    description: Customer portal
    display_name: Portal
    redirect_uris: ['https://portal.example.com/callback']
  - name: billing
    description: Billing
    display_name: Billing
    scopes: [profile, email]
";

#[tokio::test]
async fn applications_are_created_updated_and_cleaned_up() {
    let remote = InMemoryRemote::new();
    remote.seed(|state| {
        for (id, name) in [("app_portal", "portal"), ("app_stale", "stale")] {
            state.applications.push(ThirdPartyApplication {
                id: id.into(),
                name: name.into(),
                app_type: "SPA".into(),
                is_third_party: true,
                ..ThirdPartyApplication::default()
            });
        }
    });

    let report = run(
        &remote,
        SyncOptions {
            cleanup: true,
            ..options()
        },
        &doc(APPS),
    )
    .await;

    assert!(report.success, "errors: {:?}", report.errors);
    assert_eq!(report.summary.applications_updated, 1);
    assert_eq!(report.summary.applications_created, 1);
    assert_eq!(report.summary.applications_deleted, 1);

    let state = remote.snapshot();
    let names: Vec<_> = state.applications.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["portal", "billing"]);
    let billing = &state.applications[1];
    assert_eq!(billing.app_type, "Traditional");
    assert!(billing.is_third_party);
    assert_eq!(state.application_scopes[&billing.id], vec!["profile", "email"]);
    assert_eq!(state.application_branding["app_portal"], "Portal");
    assert_eq!(state.application_scopes["app_portal"].len(), 5);
    assert_eq!(
        state.applications[0]
            .oidc_client_metadata
            .as_ref()
            .map(|m| m.redirect_uris.clone()),
        Some(vec!["https://portal.example.com/callback".to_string()])
    );
}

#[tokio::test]
async fn one_failing_application_does_not_stop_the_next() {
    let remote = InMemoryRemote::new();
    remote.fail_on("create_third_party_application");

    let report = run(&remote, options(), &doc(APPS)).await;

    assert_eq!(
        report.errors.iter().map(|e| e.split(':').next().unwrap_or_default()).collect::<Vec<_>>(),
        vec!["Application portal sync failed", "Application billing sync failed"]
    );
    let attempts = remote
        .calls()
        .iter()
        .filter(|c| *c == "create_third_party_application")
        .count();
    assert_eq!(attempts, 2);
    assert!(report.operations.iter().all(|o| !o.success));
}

const SIGN_IN: &str = r"
metadata: { name: sign-in, version: '1.0' }
sign_in_experience:
  colors: { primary_color: '#0069a8', primary_color_dark: '#0087db', dark_mode_enabled: true }
  language: { auto_detect: true, fallback_language: en }
";

#[tokio::test]
async fn sign_in_experience_is_pushed_as_one_update() {
    let remote = InMemoryRemote::new();
    let report = run(&remote, options(), &doc(SIGN_IN)).await;

    assert!(report.success);
    let ops: Vec<_> = report.operations_of(OperationKind::SignInExperience).collect();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].resource, "configuration");
    assert_eq!(ops[0].description, "Updated sign-in experience configuration");

    let update = remote.snapshot().sign_in_experience.unwrap();
    let color = update.color.unwrap();
    assert_eq!(color.primary_color, "#0069a8");
    assert!(color.is_dark_mode_enabled);
    assert_eq!(update.language_info.unwrap().fallback_language, "en");
    assert_eq!(update.branding, None);
}

#[tokio::test]
async fn dry_run_sign_in_experience_is_not_sent() {
    let remote = InMemoryRemote::new();
    let report = run(
        &remote,
        SyncOptions {
            dry_run: true,
            ..options()
        },
        &doc(SIGN_IN),
    )
    .await;

    assert_eq!(
        report.operations[0].description,
        "Would update sign-in experience configuration"
    );
    assert!(remote.mutation_calls().is_empty());
    assert_eq!(remote.snapshot().sign_in_experience, None);
}
