//! Resources and the scopes derived from their actions.

use std::collections::{HashMap, HashSet};

use orgsync_config::document::Resource;
use orgsync_core::constants::{
    DEFAULT_ACCESS_TOKEN_TTL, DEFAULT_MANAGEMENT_INDICATOR, MANAGEMENT_API_RESOURCE_NAME,
    resource_indicator, scope_name,
};
use orgsync_core::entities::{RemoteResource, RemoteScope};
use orgsync_core::enums::{OperationAction, OperationKind};
use orgsync_core::ids::RemoteId;

use super::RunContext;
use crate::error::EngineError;
use crate::identity::IdentityMapping;
use crate::protect::{PERMISSIONS, is_protected};

pub(super) async fn sync_resources(ctx: &mut RunContext<'_>) -> Result<(), EngineError> {
    tracing::info!(dry_run = ctx.dry_run(), "syncing resources");
    let document = ctx.document;

    let existing = ctx
        .client
        .list_resources()
        .await
        .map_err(|e| EngineError::step("failed to get existing resources", e))?;
    let by_name: HashMap<&str, &RemoteResource> =
        existing.iter().map(|r| (r.name.as_str(), r)).collect();

    let mut resources =
        IdentityMapping::from_entries(existing.iter().map(|r| (r.name.as_str(), r.id.as_str())));
    let mut scopes = IdentityMapping::new();

    for resource in &document.hierarchy.resources {
        let indicator = resource_indicator(&ctx.options.api_base_url, &resource.name);
        let (resource_id, fresh) = match by_name.get(resource.name.as_str()) {
            Some(current) if current.indicator == indicator => {
                (RemoteId::from(current.id.as_str()), false)
            }
            Some(current) => {
                tracing::info!(
                    resource = %resource.name,
                    from = %current.indicator,
                    to = %indicator,
                    "recreating resource with new indicator"
                );
                if ctx.dry_run() {
                    ctx.record_ok(
                        OperationKind::Resource,
                        OperationAction::Delete,
                        &resource.name,
                        "Would delete resource for recreation",
                    );
                } else {
                    let outcome = ctx.client.delete_resource(&current.id).await;
                    ctx.record(
                        OperationKind::Resource,
                        OperationAction::Delete,
                        &resource.name,
                        "Deleted resource for recreation",
                        &outcome,
                    );
                    outcome.map_err(|e| {
                        EngineError::step(format!("failed to delete resource {}", resource.name), e)
                    })?;
                }
                ctx.report.summary.resources_deleted += 1;
                let id = create_resource(
                    ctx,
                    resource,
                    &indicator,
                    "Created resource with new indicator",
                    "Would create resource with new indicator",
                )
                .await?;
                (id, true)
            }
            None => {
                let id = create_resource(
                    ctx,
                    resource,
                    &indicator,
                    "Created new resource",
                    "Would create new resource",
                )
                .await?;
                (id, true)
            }
        };
        resources.insert(&resource.name, resource_id.clone());
        sync_scopes(ctx, resource, &resource_id, fresh, &mut scopes).await?;
    }

    if ctx.options.cleanup {
        let configured: HashSet<&str> = document
            .hierarchy
            .resources
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        for current in &existing {
            if current.is_default
                || current.name == MANAGEMENT_API_RESOURCE_NAME
                || current.indicator == DEFAULT_MANAGEMENT_INDICATOR
                || configured.contains(current.name.as_str())
            {
                continue;
            }
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::Resource,
                    OperationAction::Cleanup,
                    &current.name,
                    "Would remove resource not in config",
                );
                ctx.report.summary.resources_deleted += 1;
                continue;
            }
            tracing::warn!(resource = %current.name, "removing resource not in config");
            let outcome = ctx.client.delete_resource(&current.id).await;
            ctx.record(
                OperationKind::Resource,
                OperationAction::Cleanup,
                &current.name,
                "Removed resource not in config",
                &outcome,
            );
            match outcome {
                Ok(()) => ctx.report.summary.resources_deleted += 1,
                Err(e) => tracing::error!(resource = %current.name, error = %e, "failed to remove resource"),
            }
        }
    }

    ctx.outputs.resources = Some(resources);
    ctx.outputs.scopes = Some(scopes);
    tracing::info!("resources sync completed");
    Ok(())
}

async fn create_resource(
    ctx: &mut RunContext<'_>,
    resource: &Resource,
    indicator: &str,
    done: &str,
    would: &str,
) -> Result<RemoteId, EngineError> {
    if ctx.dry_run() {
        ctx.record_ok(
            OperationKind::Resource,
            OperationAction::Create,
            &resource.name,
            would,
        );
        ctx.report.summary.resources_created += 1;
        return Ok(RemoteId::simulated("resource", &resource.name));
    }

    let outcome = ctx
        .client
        .create_resource(&RemoteResource {
            id: String::new(),
            name: resource.name.clone(),
            indicator: indicator.to_string(),
            is_default: false,
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
        })
        .await;
    ctx.record(
        OperationKind::Resource,
        OperationAction::Create,
        &resource.name,
        done,
        &outcome,
    );
    let created = outcome
        .map_err(|e| EngineError::step(format!("failed to create resource {}", resource.name), e))?;
    ctx.report.summary.resources_created += 1;
    Ok(RemoteId::Real(created.id))
}

/// Create missing scopes for `resource` and, in cleanup mode, remove
/// unconfigured ones. A `fresh` resource has no scopes yet.
async fn sync_scopes(
    ctx: &mut RunContext<'_>,
    resource: &Resource,
    resource_id: &RemoteId,
    fresh: bool,
    scopes: &mut IdentityMapping,
) -> Result<(), EngineError> {
    let existing = match resource_id.as_real() {
        Some(id) if !fresh => ctx.client.list_scopes(id).await.map_err(|e| {
            EngineError::step(
                format!("failed to get existing scopes for resource {}", resource.name),
                e,
            )
        })?,
        _ => Vec::new(),
    };
    let existing_names: HashSet<&str> = existing.iter().map(|s| s.name.as_str()).collect();
    for scope in &existing {
        scopes.insert(&scope.name, scope.id.as_str().into());
    }

    for action in &resource.actions {
        let name = scope_name(action, &resource.name);
        if existing_names.contains(name.as_str()) {
            continue;
        }
        if ctx.dry_run() {
            ctx.record_ok(
                OperationKind::Scope,
                OperationAction::Create,
                &name,
                format!("Would create scope for {}", resource.name),
            );
            ctx.report.summary.scopes_created += 1;
            scopes.simulate("scope", &name);
            continue;
        }
        let Some(real_resource_id) = resource_id.as_real() else {
            continue;
        };
        let outcome = ctx
            .client
            .create_scope(
                real_resource_id,
                &RemoteScope {
                    id: String::new(),
                    name: name.clone(),
                    description: format!("Permission to {action} {}", resource.name),
                },
            )
            .await;
        ctx.record(
            OperationKind::Scope,
            OperationAction::Create,
            &name,
            format!("Created scope for {}", resource.name),
            &outcome,
        );
        let created =
            outcome.map_err(|e| EngineError::step(format!("failed to create scope {name}"), e))?;
        ctx.report.summary.scopes_created += 1;
        scopes.insert(&name, RemoteId::Real(created.id));
    }

    if !ctx.options.cleanup {
        return Ok(());
    }
    let configured: HashSet<String> = resource.scope_names().collect();
    for scope in &existing {
        if configured.contains(&scope.name) {
            continue;
        }
        if is_protected(&scope.name, &scope.description, &PERMISSIONS) {
            tracing::debug!(scope = %scope.name, "keeping protected scope");
            continue;
        }
        if ctx.dry_run() {
            ctx.record_ok(
                OperationKind::Scope,
                OperationAction::Cleanup,
                &scope.name,
                format!("Would remove scope not in config from {}", resource.name),
            );
            ctx.report.summary.scopes_deleted += 1;
            scopes.remove(&scope.name);
            continue;
        }
        let Some(real_resource_id) = resource_id.as_real() else {
            continue;
        };
        let outcome = ctx.client.delete_scope(real_resource_id, &scope.id).await;
        ctx.record(
            OperationKind::Scope,
            OperationAction::Cleanup,
            &scope.name,
            format!("Removed scope not in config from {}", resource.name),
            &outcome,
        );
        match outcome {
            Ok(()) => {
                ctx.report.summary.scopes_deleted += 1;
                scopes.remove(&scope.name);
            }
            Err(e) => tracing::warn!(scope = %scope.name, error = %e, "failed to remove scope"),
        }
    }
    Ok(())
}
