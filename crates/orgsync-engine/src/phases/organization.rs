//! Organization scopes, organization roles, and the scopes granted to each role.

use std::collections::{HashMap, HashSet};

use orgsync_core::entities::{OrganizationRole, OrganizationScope};
use orgsync_core::enums::{OperationAction, OperationKind};
use orgsync_core::ids::RemoteId;

use super::RunContext;
use crate::diff::calculate_permission_diff;
use crate::error::EngineError;
use crate::identity::IdentityMapping;
use crate::protect::{
    ORGANIZATION_ROLE_SCOPE_REMOVAL, ORGANIZATION_ROLES, ORGANIZATION_SCOPES, is_protected,
};

// ---------------------------------------------------------------------------
// Organization scopes
// ---------------------------------------------------------------------------

pub(super) async fn sync_organization_scopes(ctx: &mut RunContext<'_>) -> Result<(), EngineError> {
    tracing::info!(dry_run = ctx.dry_run(), "syncing organization scopes");
    let permissions = ctx.document.all_permissions();

    let existing = ctx
        .client
        .list_organization_scopes()
        .await
        .map_err(|e| EngineError::step("failed to get existing organization scopes", e))?;
    let by_name: HashMap<&str, &OrganizationScope> =
        existing.iter().map(|s| (s.name.as_str(), s)).collect();
    let mut mapping =
        IdentityMapping::from_entries(existing.iter().map(|s| (s.name.as_str(), s.id.as_str())));

    for (scope_name, permission) in &permissions {
        let display = if permission.name.is_empty() {
            scope_name.as_str()
        } else {
            permission.name.as_str()
        };
        let description = format!("Organization scope: {display}");

        if let Some(current) = by_name.get(scope_name.as_str()) {
            if current.description == description {
                continue;
            }
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::OrganizationScope,
                    OperationAction::Update,
                    scope_name,
                    "Would update organization scope",
                );
            } else {
                let outcome = ctx
                    .client
                    .update_organization_scope(
                        &current.id,
                        &OrganizationScope {
                            id: current.id.clone(),
                            name: scope_name.clone(),
                            description,
                        },
                    )
                    .await;
                ctx.record(
                    OperationKind::OrganizationScope,
                    OperationAction::Update,
                    scope_name,
                    "Updated organization scope",
                    &outcome,
                );
                outcome.map_err(|e| {
                    EngineError::step(format!("failed to update organization scope {scope_name}"), e)
                })?;
            }
            ctx.report.summary.scopes_updated += 1;
            continue;
        }

        if ctx.dry_run() {
            ctx.record_ok(
                OperationKind::OrganizationScope,
                OperationAction::Create,
                scope_name,
                "Would create organization scope",
            );
            mapping.simulate("org-scope", scope_name);
        } else {
            let outcome = ctx
                .client
                .create_organization_scope(&OrganizationScope {
                    id: String::new(),
                    name: scope_name.clone(),
                    description,
                })
                .await;
            ctx.record(
                OperationKind::OrganizationScope,
                OperationAction::Create,
                scope_name,
                "Created organization scope",
                &outcome,
            );
            let created = outcome.map_err(|e| {
                EngineError::step(format!("failed to create organization scope {scope_name}"), e)
            })?;
            mapping.insert(scope_name, RemoteId::Real(created.id));
        }
        ctx.report.summary.scopes_created += 1;
    }

    if ctx.options.cleanup {
        for current in &existing {
            if permissions.contains_key(&current.name) {
                continue;
            }
            if is_protected(&current.name, &current.description, &ORGANIZATION_SCOPES) {
                tracing::debug!(scope = %current.name, "keeping protected organization scope");
                continue;
            }
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::OrganizationScope,
                    OperationAction::Delete,
                    &current.name,
                    "Would remove organization scope not in config",
                );
                ctx.report.summary.scopes_deleted += 1;
                mapping.remove(&current.name);
                continue;
            }
            let outcome = ctx.client.delete_organization_scope(&current.id).await;
            ctx.record(
                OperationKind::OrganizationScope,
                OperationAction::Delete,
                &current.name,
                "Removed organization scope not in config",
                &outcome,
            );
            match outcome {
                Ok(()) => {
                    ctx.report.summary.scopes_deleted += 1;
                    mapping.remove(&current.name);
                }
                Err(e) => tracing::warn!(
                    scope = %current.name,
                    error = %e,
                    "failed to delete organization scope"
                ),
            }
        }
    }

    ctx.outputs.organization_scopes = Some(mapping);
    tracing::info!("organization scopes sync completed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Organization roles
// ---------------------------------------------------------------------------

pub(super) async fn sync_organization_roles(ctx: &mut RunContext<'_>) -> Result<(), EngineError> {
    tracing::info!(dry_run = ctx.dry_run(), "syncing organization roles");
    let document = ctx.document;
    let roles = document.organization_roles();

    let existing = ctx
        .client
        .list_organization_roles()
        .await
        .map_err(|e| EngineError::step("failed to get existing organization roles", e))?;
    let by_name: HashMap<String, &OrganizationRole> = existing
        .iter()
        .map(|r| (r.name.to_lowercase(), r))
        .collect();
    let configured: HashSet<String> = roles.iter().map(|r| r.name.to_lowercase()).collect();
    let mut mapping = IdentityMapping::from_entries_case_insensitive(
        existing.iter().map(|r| (r.name.as_str(), r.id.as_str())),
    );

    for role in roles {
        let description = format!("Organization role: {}", role.name);

        if let Some(current) = by_name.get(&role.name.to_lowercase()) {
            if current.description == description {
                continue;
            }
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::OrganizationRole,
                    OperationAction::Update,
                    &role.name,
                    "Would update organization role",
                );
            } else {
                let outcome = ctx
                    .client
                    .update_organization_role(
                        &current.id,
                        &OrganizationRole {
                            id: current.id.clone(),
                            name: current.name.clone(),
                            description,
                        },
                    )
                    .await;
                ctx.record(
                    OperationKind::OrganizationRole,
                    OperationAction::Update,
                    &role.name,
                    "Updated organization role",
                    &outcome,
                );
                outcome.map_err(|e| {
                    EngineError::step(format!("failed to update organization role {}", role.name), e)
                })?;
            }
            ctx.report.summary.roles_updated += 1;
            continue;
        }

        if ctx.dry_run() {
            ctx.record_ok(
                OperationKind::OrganizationRole,
                OperationAction::Create,
                &role.name,
                "Would create organization role",
            );
            mapping.simulate("org-role", &role.name);
        } else {
            let outcome = ctx
                .client
                .create_organization_role(&OrganizationRole {
                    id: String::new(),
                    name: role.name.clone(),
                    description,
                })
                .await;
            ctx.record(
                OperationKind::OrganizationRole,
                OperationAction::Create,
                &role.name,
                "Created organization role",
                &outcome,
            );
            let created = outcome.map_err(|e| {
                EngineError::step(format!("failed to create organization role {}", role.name), e)
            })?;
            mapping.insert(&role.name, RemoteId::Real(created.id));
        }
        ctx.report.summary.roles_created += 1;
    }

    if ctx.options.cleanup {
        for current in &existing {
            if configured.contains(&current.name.to_lowercase())
                || is_protected(&current.name, &current.description, &ORGANIZATION_ROLES)
            {
                continue;
            }
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::OrganizationRole,
                    OperationAction::Delete,
                    &current.name,
                    "Would remove organization role not in config",
                );
                ctx.report.summary.roles_deleted += 1;
                continue;
            }
            let outcome = ctx.client.delete_organization_role(&current.id).await;
            ctx.record(
                OperationKind::OrganizationRole,
                OperationAction::Delete,
                &current.name,
                "Removed organization role not in config",
                &outcome,
            );
            match outcome {
                Ok(()) => ctx.report.summary.roles_deleted += 1,
                Err(e) => tracing::warn!(
                    role = %current.name,
                    error = %e,
                    "failed to delete organization role"
                ),
            }
        }
    }

    ctx.outputs.organization_roles = Some(mapping);
    tracing::info!("organization roles sync completed");
    Ok(())
}

// ---------------------------------------------------------------------------
// Organization role scopes
// ---------------------------------------------------------------------------

pub(super) async fn sync_organization_role_scopes(
    ctx: &mut RunContext<'_>,
) -> Result<(), EngineError> {
    tracing::info!(dry_run = ctx.dry_run(), "syncing organization role scopes");
    let document = ctx.document;
    let mut scopes = ctx.organization_scope_mapping().await?;
    let mut roles = ctx.organization_role_mapping().await?;

    for role in document.organization_roles() {
        let role_id = match roles.id_for(&role.name) {
            Some(id) => id.clone(),
            None if ctx.dry_run() => roles.simulate("org-role", &role.name),
            None => {
                tracing::warn!(role = %role.name, "organization role not found, skipping scope assignment");
                continue;
            }
        };

        let current_ids: Vec<RemoteId> = match role_id.as_real() {
            Some(id) => ctx
                .client
                .organization_role_scopes(id)
                .await
                .map_err(|e| {
                    EngineError::step(
                        format!("failed to get scopes for organization role {}", role.name),
                        e,
                    )
                })?
                .into_iter()
                .map(|s| RemoteId::Real(s.id))
                .collect(),
            None => Vec::new(),
        };
        let current = scopes.names_for(&current_ids);
        let desired: Vec<&str> = role.permission_ids().collect();
        let diff = calculate_permission_diff(&current, &desired)
            .without_protected(&ORGANIZATION_ROLE_SCOPE_REMOVAL);

        for scope_name in &diff.to_add {
            let scope_id = match scopes.id_for(scope_name) {
                Some(id) => id.clone(),
                None if ctx.dry_run() => scopes.simulate("org-scope", scope_name),
                None => {
                    tracing::warn!(
                        scope = %scope_name,
                        role = %role.name,
                        "organization scope not found, skipping assignment"
                    );
                    continue;
                }
            };
            let resource = format!("{}->{scope_name}", role.name);
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::OrganizationRoleScope,
                    OperationAction::Assign,
                    &resource,
                    "Would assign scope to organization role",
                );
                ctx.report.summary.permissions_created += 1;
                continue;
            }
            let (Some(role_real), Some(scope_real)) = (role_id.as_real(), scope_id.as_real()) else {
                continue;
            };
            let outcome = ctx
                .client
                .assign_scope_to_organization_role(role_real, scope_real)
                .await;
            ctx.record(
                OperationKind::OrganizationRoleScope,
                OperationAction::Assign,
                &resource,
                "Assigned scope to organization role",
                &outcome,
            );
            outcome.map_err(|e| {
                EngineError::step(
                    format!("failed to assign scope {scope_name} to organization role {}", role.name),
                    e,
                )
            })?;
            ctx.report.summary.permissions_created += 1;
        }

        for scope_name in &diff.to_remove {
            let Some(scope_id) = scopes.id_for(scope_name).cloned() else {
                continue;
            };
            let resource = format!("{}->{scope_name}", role.name);
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::OrganizationRoleScope,
                    OperationAction::Remove,
                    &resource,
                    "Would remove scope from organization role",
                );
                ctx.report.summary.permissions_deleted += 1;
                continue;
            }
            let (Some(role_real), Some(scope_real)) = (role_id.as_real(), scope_id.as_real()) else {
                continue;
            };
            let outcome = ctx
                .client
                .remove_scope_from_organization_role(role_real, scope_real)
                .await;
            ctx.record(
                OperationKind::OrganizationRoleScope,
                OperationAction::Remove,
                &resource,
                "Removed scope from organization role",
                &outcome,
            );
            match outcome {
                Ok(()) => ctx.report.summary.permissions_deleted += 1,
                Err(e) => tracing::warn!(
                    scope = %scope_name,
                    role = %role.name,
                    error = %e,
                    "failed to remove scope from organization role"
                ),
            }
        }
    }

    ctx.outputs.organization_scopes = Some(scopes);
    ctx.outputs.organization_roles = Some(roles);
    tracing::info!("organization role scopes sync completed");
    Ok(())
}
