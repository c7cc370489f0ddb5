//! Third-party OIDC applications.
//!
//! Each configured application is processed on its own: a failure is
//! recorded as `"Application <name> sync failed: ..."` and the next one
//! proceeds. Existing applications are always updated.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value, json};

use orgsync_config::document::Application;
use orgsync_core::constants::DEFAULT_APPLICATION_TYPE;
use orgsync_core::entities::{OidcClientMetadata, ThirdPartyApplication};
use orgsync_core::enums::{OperationAction, OperationKind};

use orgsync_client::ClientError;

use super::RunContext;
use crate::error::EngineError;
use crate::report::Operation;

pub(super) async fn sync_applications(ctx: &mut RunContext<'_>) -> Result<(), EngineError> {
    let document = ctx.document;
    tracing::info!(
        count = document.third_party_apps.len(),
        dry_run = ctx.dry_run(),
        "syncing third-party applications"
    );

    let existing = ctx
        .client
        .list_third_party_applications()
        .await
        .map_err(|e| EngineError::step("failed to get existing third-party applications", e))?;
    let by_name: HashMap<&str, &ThirdPartyApplication> =
        existing.iter().map(|a| (a.name.as_str(), a)).collect();

    for app in &document.third_party_apps {
        if let Err(err) = sync_application(ctx, app, by_name.get(app.name.as_str()).copied()).await {
            tracing::error!(app = %app.name, error = %err, "application sync failed");
            ctx.report
                .errors
                .push(format!("Application {} sync failed: {err}", app.name));
        }
    }

    if ctx.options.cleanup
        && let Err(err) = cleanup_applications(ctx, &existing).await
    {
        tracing::error!(error = %err, "application cleanup failed");
        ctx.report
            .errors
            .push(format!("Applications cleanup failed: {err}"));
    }

    Ok(())
}

/// Payload for `app`. `app_type` is kept from the remote copy on update.
fn application_payload(app: &Application, id: String, app_type: String) -> ThirdPartyApplication {
    let mut custom = Map::new();
    if let Some(access) = &app.access_control {
        custom.insert(
            "access_control".to_string(),
            json!({
                "organization_roles": access.organization_roles,
                "user_roles": access.user_roles,
            }),
        );
    }
    if !app.login_url.is_empty() {
        custom.insert("login_url".to_string(), Value::String(app.login_url.clone()));
    }

    let oidc = (!app.redirect_uris.is_empty() || !app.post_logout_redirect_uris.is_empty()).then(
        || OidcClientMetadata {
            redirect_uris: app.redirect_uris.clone(),
            post_logout_redirect_uris: app.post_logout_redirect_uris.clone(),
        },
    );

    ThirdPartyApplication {
        id,
        name: app.name.clone(),
        description: app.description.clone(),
        app_type,
        is_third_party: true,
        oidc_client_metadata: oidc,
        custom_data: (!custom.is_empty()).then_some(Value::Object(custom)),
    }
}

async fn sync_application(
    ctx: &mut RunContext<'_>,
    app: &Application,
    current: Option<&ThirdPartyApplication>,
) -> Result<(), EngineError> {
    let scopes = app.effective_scopes();

    if let Some(current) = current {
        tracing::info!(app = %app.name, "updating third-party application");
        if !ctx.dry_run() {
            let payload = application_payload(app, current.id.clone(), current.app_type.clone());
            let outcome = ctx
                .client
                .update_third_party_application(&current.id, &payload)
                .await;
            check_step(ctx, app, OperationAction::Update, "Update application", outcome)?;
            let outcome = ctx
                .client
                .update_application_branding(&current.id, &app.display_name)
                .await;
            check_step(ctx, app, OperationAction::UpdateBranding, "Update branding for", outcome)?;
            let outcome = ctx.client.update_application_scopes(&current.id, &scopes).await;
            check_step(ctx, app, OperationAction::UpdateScopes, "Update scopes for", outcome)?;
        }
        ctx.record_ok(
            OperationKind::Application,
            OperationAction::Update,
            &app.name,
            format!("Update application {}", app.name),
        );
        ctx.report.summary.applications_updated += 1;
        return Ok(());
    }

    tracing::info!(app = %app.name, "creating third-party application");
    if !ctx.dry_run() {
        let payload = application_payload(app, String::new(), DEFAULT_APPLICATION_TYPE.to_string());
        let outcome = ctx.client.create_third_party_application(&payload).await;
        let created = check_step(ctx, app, OperationAction::Create, "Create application", outcome)?;
        let outcome = ctx
            .client
            .update_application_branding(&created.id, &app.display_name)
            .await;
        check_step(ctx, app, OperationAction::CreateBranding, "Set branding for", outcome)?;
        let outcome = ctx.client.update_application_scopes(&created.id, &scopes).await;
        check_step(ctx, app, OperationAction::CreateScopes, "Set scopes for", outcome)?;
    }
    ctx.record_ok(
        OperationKind::Application,
        OperationAction::Create,
        &app.name,
        format!("Create application {}", app.name),
    );
    ctx.report.summary.applications_created += 1;
    Ok(())
}

/// Record a failed step as `"<verb> <name>"` and turn it into an error.
fn check_step<T>(
    ctx: &mut RunContext<'_>,
    app: &Application,
    action: OperationAction,
    verb: &str,
    outcome: Result<T, ClientError>,
) -> Result<T, EngineError> {
    let source = match outcome {
        Ok(value) => return Ok(value),
        Err(source) => source,
    };
    let description = format!("{verb} {}", app.name);
    ctx.report.record(Operation::new(
        OperationKind::Application,
        action,
        &app.name,
        description.clone(),
        Some(source.to_string()),
    ));
    Err(EngineError::step(description, source))
}

/// Delete third-party applications that are not configured. Stops at the
/// first failure.
async fn cleanup_applications(
    ctx: &mut RunContext<'_>,
    existing: &[ThirdPartyApplication],
) -> Result<(), EngineError> {
    let configured: HashSet<&str> = ctx
        .document
        .third_party_apps
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    let stale: Vec<&ThirdPartyApplication> = existing
        .iter()
        .filter(|a| !configured.contains(a.name.as_str()))
        .collect();
    if stale.is_empty() {
        tracing::info!("no applications to clean up");
        return Ok(());
    }

    for app in stale {
        let description = format!("Delete application {}", app.name);
        if !ctx.dry_run() {
            let outcome = ctx.client.delete_third_party_application(&app.id).await;
            if outcome.is_err() {
                ctx.record(
                    OperationKind::Application,
                    OperationAction::Delete,
                    &app.name,
                    description.clone(),
                    &outcome,
                );
                return outcome.map_err(|e| EngineError::step(description, e));
            }
        }
        ctx.record_ok(
            OperationKind::Application,
            OperationAction::Delete,
            &app.name,
            description,
        );
        ctx.report.summary.applications_deleted += 1;
    }
    Ok(())
}
