//! Tenant-wide user roles and the resource permissions granted to them.

use std::collections::{HashMap, HashSet};

use orgsync_core::entities::RemoteRole;
use orgsync_core::enums::{OperationAction, OperationKind};
use orgsync_core::ids::RemoteId;

use super::{RunContext, count};
use crate::diff::calculate_permission_diff;
use crate::error::EngineError;
use crate::identity::IdentityMapping;
use crate::protect::{PERMISSIONS, USER_ROLES, is_protected};

// ---------------------------------------------------------------------------
// User roles
// ---------------------------------------------------------------------------

pub(super) async fn sync_user_roles(ctx: &mut RunContext<'_>) -> Result<(), EngineError> {
    tracing::info!(dry_run = ctx.dry_run(), "syncing user roles");
    let document = ctx.document;
    let roles = document.user_roles();

    let existing = ctx
        .client
        .list_roles()
        .await
        .map_err(|e| EngineError::step("failed to get existing user roles", e))?;
    let by_name: HashMap<String, &RemoteRole> = existing
        .iter()
        .map(|r| (r.name.to_lowercase(), r))
        .collect();
    let configured: HashSet<String> = roles.iter().map(|r| r.name.to_lowercase()).collect();
    let mut mapping = IdentityMapping::from_entries_case_insensitive(
        existing.iter().map(|r| (r.name.as_str(), r.id.as_str())),
    );

    for role in roles {
        let description = format!("User role (Priority: {})", role.priority);

        if let Some(current) = by_name.get(&role.name.to_lowercase()) {
            if current.description == description {
                continue;
            }
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::UserRole,
                    OperationAction::Update,
                    &role.name,
                    "Would update user role",
                );
            } else {
                let outcome = ctx
                    .client
                    .update_role(
                        &current.id,
                        &RemoteRole {
                            id: current.id.clone(),
                            name: current.name.clone(),
                            description,
                        },
                    )
                    .await;
                ctx.record(
                    OperationKind::UserRole,
                    OperationAction::Update,
                    &role.name,
                    "Updated user role",
                    &outcome,
                );
                outcome.map_err(|e| {
                    EngineError::step(format!("failed to update user role {}", role.name), e)
                })?;
            }
            ctx.report.summary.roles_updated += 1;
            continue;
        }

        if ctx.dry_run() {
            ctx.record_ok(
                OperationKind::UserRole,
                OperationAction::Create,
                &role.name,
                "Would create user role",
            );
            mapping.simulate("role", &role.name);
        } else {
            let outcome = ctx
                .client
                .create_role(&RemoteRole {
                    id: String::new(),
                    name: role.name.clone(),
                    description,
                })
                .await;
            ctx.record(
                OperationKind::UserRole,
                OperationAction::Create,
                &role.name,
                "Created user role",
                &outcome,
            );
            let created = outcome.map_err(|e| {
                EngineError::step(format!("failed to create user role {}", role.name), e)
            })?;
            mapping.insert(&role.name, RemoteId::Real(created.id));
        }
        ctx.report.summary.roles_created += 1;
    }

    if ctx.options.cleanup {
        for current in &existing {
            if configured.contains(&current.name.to_lowercase()) {
                continue;
            }
            if is_protected(&current.name, &current.description, &USER_ROLES) {
                tracing::debug!(role = %current.name, "keeping protected user role");
                continue;
            }
            if ctx.dry_run() {
                ctx.record_ok(
                    OperationKind::UserRole,
                    OperationAction::Delete,
                    &current.name,
                    "Would remove user role not in config",
                );
                ctx.report.summary.roles_deleted += 1;
                continue;
            }
            let outcome = ctx.client.delete_role(&current.id).await;
            ctx.record(
                OperationKind::UserRole,
                OperationAction::Delete,
                &current.name,
                "Removed user role not in config",
                &outcome,
            );
            match outcome {
                Ok(()) => ctx.report.summary.roles_deleted += 1,
                Err(e) => tracing::warn!(role = %current.name, error = %e, "failed to delete user role"),
            }
        }
    }

    ctx.outputs.user_roles = Some(mapping);
    tracing::info!("user roles sync completed");
    Ok(())
}

// ---------------------------------------------------------------------------
// User role permissions
// ---------------------------------------------------------------------------

pub(super) async fn sync_user_role_permissions(
    ctx: &mut RunContext<'_>,
) -> Result<(), EngineError> {
    tracing::info!(dry_run = ctx.dry_run(), "syncing user role permissions");
    let document = ctx.document;
    let mut roles = ctx.user_role_mapping().await?;
    let scopes = ctx.scope_mapping().await?;

    for role in document.user_roles() {
        let role_id = match roles.id_for(&role.name) {
            Some(id) => id.clone(),
            None if ctx.dry_run() => roles.simulate("role", &role.name),
            None => {
                tracing::warn!(role = %role.name, "user role not found, skipping permission assignment");
                continue;
            }
        };

        let current_ids: Vec<RemoteId> = match role_id.as_real() {
            Some(id) => ctx
                .client
                .role_permissions(id)
                .await
                .map_err(|e| {
                    EngineError::step(format!("failed to get permissions for role {}", role.name), e)
                })?
                .into_iter()
                .map(|s| RemoteId::Real(s.id))
                .collect(),
            None => Vec::new(),
        };
        let current = scopes.names_for(&current_ids);

        let mut desired = Vec::new();
        for permission in role.permission_ids() {
            if scopes.id_for(permission).is_some() {
                desired.push(permission);
            } else {
                tracing::warn!(permission, role = %role.name, "permission scope not found");
            }
        }

        let diff = calculate_permission_diff(&current, &desired).without_protected(&PERMISSIONS);
        apply_changes(ctx, &role.name, &role_id, &diff.to_add, &scopes, true).await?;
        apply_changes(ctx, &role.name, &role_id, &diff.to_remove, &scopes, false).await?;
    }

    ctx.outputs.user_roles = Some(roles);
    tracing::info!("user role permissions sync completed");
    Ok(())
}

/// Assign (`grant`) or remove one batch of permissions. Assignment failures
/// fail the phase; removal failures are logged.
async fn apply_changes(
    ctx: &mut RunContext<'_>,
    role_name: &str,
    role_id: &RemoteId,
    names: &[String],
    scopes: &IdentityMapping,
    grant: bool,
) -> Result<(), EngineError> {
    let ids: Vec<&RemoteId> = names.iter().filter_map(|n| scopes.id_for(n)).collect();
    if ids.is_empty() {
        return Ok(());
    }
    let resource = format!("{role_name} ({} permissions)", ids.len());
    let action = if grant {
        OperationAction::Assign
    } else {
        OperationAction::Remove
    };

    if ctx.dry_run() {
        let description = if grant {
            "Would assign permissions to user role"
        } else {
            "Would remove permissions from user role"
        };
        ctx.record_ok(OperationKind::UserRolePermission, action, &resource, description);
        if grant {
            ctx.report.summary.permissions_created += count(ids.len());
        } else {
            ctx.report.summary.permissions_deleted += count(ids.len());
        }
        return Ok(());
    }

    let Some(role_real) = role_id.as_real() else {
        return Ok(());
    };
    let real_ids: Vec<String> = ids
        .iter()
        .filter_map(|id| id.as_real())
        .map(ToString::to_string)
        .collect();

    if grant {
        let outcome = ctx
            .client
            .assign_permissions_to_role(role_real, &real_ids)
            .await;
        ctx.record(
            OperationKind::UserRolePermission,
            action,
            &resource,
            "Assigned permissions to user role",
            &outcome,
        );
        outcome.map_err(|e| {
            EngineError::step(format!("failed to assign permissions to role {role_name}"), e)
        })?;
        ctx.report.summary.permissions_created += count(real_ids.len());
    } else {
        let outcome = ctx
            .client
            .remove_permissions_from_role(role_real, &real_ids)
            .await;
        ctx.record(
            OperationKind::UserRolePermission,
            action,
            &resource,
            "Removed permissions from user role",
            &outcome,
        );
        match outcome {
            Ok(()) => ctx.report.summary.permissions_deleted += count(real_ids.len()),
            Err(e) => tracing::warn!(role = %role_name, error = %e, "failed to remove permissions from role"),
        }
    }
    Ok(())
}
