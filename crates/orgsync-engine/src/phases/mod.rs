//! Sync phases, their declared dependencies, and the per-run context they share.
//!
//! ```text
//! resources ─────────────────────────────┐
//! organization scopes ──┐                │
//! organization roles ───┴─ org role scopes│
//! user roles ─────────────────────────── user role permissions
//! third-party applications
//! sign-in experience
//! ```
//!
//! Each phase publishes the name → id mapping it produced into
//! [`PhaseOutputs`]. A consumer whose producer was skipped rebuilds the
//! mapping from remote listings instead.

mod applications;
mod organization;
mod resources;
mod roles;
mod sign_in;

pub use sign_in::build_sign_in_update;

use orgsync_client::{ClientError, RemoteClient};
use orgsync_config::DesiredState;
use orgsync_core::enums::{OperationAction, OperationKind};

use crate::engine::SyncOptions;
use crate::error::EngineError;
use crate::identity::IdentityMapping;
use crate::report::{Operation, SyncReport};

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseId {
    Resources,
    OrganizationScopes,
    OrganizationRoles,
    OrganizationRoleScopes,
    UserRoles,
    UserRolePermissions,
    Applications,
    SignInExperience,
}

/// Command-line switch that disables a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipFlag {
    Resources,
    Roles,
    Permissions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDescriptor {
    pub id: PhaseId,
    /// Prefix of the `"<label> sync failed: ..."` report error.
    pub label: &'static str,
    /// Phases whose outputs this one reads.
    pub depends_on: &'static [PhaseId],
    pub skipped_by: &'static [SkipFlag],
}

/// Every phase, in execution order.
pub const PHASES: [PhaseDescriptor; 8] = [
    PhaseDescriptor {
        id: PhaseId::Resources,
        label: "Resource",
        depends_on: &[],
        skipped_by: &[SkipFlag::Resources],
    },
    PhaseDescriptor {
        id: PhaseId::OrganizationScopes,
        label: "Organization scopes",
        depends_on: &[],
        skipped_by: &[SkipFlag::Permissions],
    },
    PhaseDescriptor {
        id: PhaseId::OrganizationRoles,
        label: "Organization roles",
        depends_on: &[],
        skipped_by: &[SkipFlag::Roles],
    },
    PhaseDescriptor {
        id: PhaseId::OrganizationRoleScopes,
        label: "Organization role scopes",
        depends_on: &[PhaseId::OrganizationScopes, PhaseId::OrganizationRoles],
        skipped_by: &[SkipFlag::Roles, SkipFlag::Permissions],
    },
    PhaseDescriptor {
        id: PhaseId::UserRoles,
        label: "User roles",
        depends_on: &[],
        skipped_by: &[SkipFlag::Roles],
    },
    PhaseDescriptor {
        id: PhaseId::UserRolePermissions,
        label: "User role permissions",
        depends_on: &[PhaseId::Resources, PhaseId::UserRoles],
        skipped_by: &[SkipFlag::Roles, SkipFlag::Permissions],
    },
    PhaseDescriptor {
        id: PhaseId::Applications,
        label: "Third-party applications",
        depends_on: &[],
        skipped_by: &[],
    },
    PhaseDescriptor {
        id: PhaseId::SignInExperience,
        label: "Sign-in experience",
        depends_on: &[],
        skipped_by: &[],
    },
];

impl PhaseDescriptor {
    /// Whether this phase runs for `options` and `document`.
    #[must_use]
    pub fn is_enabled(&self, options: &SyncOptions, document: &DesiredState) -> bool {
        let skipped = self.skipped_by.iter().any(|flag| match flag {
            SkipFlag::Resources => options.skip_resources,
            SkipFlag::Roles => options.skip_roles,
            SkipFlag::Permissions => options.skip_permissions,
        });
        if skipped {
            return false;
        }
        match self.id {
            PhaseId::Applications => !document.third_party_apps.is_empty(),
            PhaseId::SignInExperience => document.sign_in_experience.is_some(),
            _ => true,
        }
    }
}

impl PhaseId {
    pub(crate) async fn run(self, ctx: &mut RunContext<'_>) -> Result<(), EngineError> {
        match self {
            Self::Resources => resources::sync_resources(ctx).await,
            Self::OrganizationScopes => organization::sync_organization_scopes(ctx).await,
            Self::OrganizationRoles => organization::sync_organization_roles(ctx).await,
            Self::OrganizationRoleScopes => organization::sync_organization_role_scopes(ctx).await,
            Self::UserRoles => roles::sync_user_roles(ctx).await,
            Self::UserRolePermissions => roles::sync_user_role_permissions(ctx).await,
            Self::Applications => applications::sync_applications(ctx).await,
            Self::SignInExperience => sign_in::sync_sign_in_experience(ctx).await,
        }
    }
}

/// Counter increment for `n` items.
pub(crate) fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Run context
// ---------------------------------------------------------------------------

/// Mappings published by producer phases.
#[derive(Debug, Default)]
pub(crate) struct PhaseOutputs {
    /// Resource name → resource id.
    pub resources: Option<IdentityMapping>,
    /// Scope name → scope id across every configured resource.
    pub scopes: Option<IdentityMapping>,
    pub organization_scopes: Option<IdentityMapping>,
    /// Case-insensitive.
    pub organization_roles: Option<IdentityMapping>,
    /// Case-insensitive.
    pub user_roles: Option<IdentityMapping>,
}

pub(crate) struct RunContext<'a> {
    pub client: &'a dyn RemoteClient,
    pub options: &'a SyncOptions,
    pub document: &'a DesiredState,
    pub report: SyncReport,
    pub outputs: PhaseOutputs,
}

impl<'a> RunContext<'a> {
    pub fn new(
        client: &'a dyn RemoteClient,
        options: &'a SyncOptions,
        document: &'a DesiredState,
    ) -> Self {
        Self {
            client,
            options,
            document,
            report: SyncReport::new(options.dry_run),
            outputs: PhaseOutputs::default(),
        }
    }

    pub const fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// `done` for a real run, `would` for a dry run.
    pub fn say(&self, done: &str, would: &str) -> String {
        let text = if self.dry_run() { would } else { done };
        text.to_string()
    }

    pub fn record<T>(
        &mut self,
        kind: OperationKind,
        action: OperationAction,
        resource: &str,
        description: impl Into<String>,
        outcome: &Result<T, ClientError>,
    ) {
        let error = outcome.as_ref().err().map(ToString::to_string);
        self.report
            .record(Operation::new(kind, action, resource, description, error));
    }

    pub fn record_ok(
        &mut self,
        kind: OperationKind,
        action: OperationAction,
        resource: &str,
        description: impl Into<String>,
    ) {
        self.report
            .record(Operation::new(kind, action, resource, description, None));
    }

    // -- Mappings, rebuilt from listings when the producer did not run --

    pub async fn resource_mapping(&mut self) -> Result<IdentityMapping, EngineError> {
        if let Some(mapping) = &self.outputs.resources {
            return Ok(mapping.clone());
        }
        let resources = self
            .client
            .list_resources()
            .await
            .map_err(|e| EngineError::step("failed to get resources", e))?;
        let mapping =
            IdentityMapping::from_entries(resources.iter().map(|r| (r.name.as_str(), r.id.as_str())));
        self.outputs.resources = Some(mapping.clone());
        Ok(mapping)
    }

    pub async fn scope_mapping(&mut self) -> Result<IdentityMapping, EngineError> {
        if let Some(mapping) = &self.outputs.scopes {
            return Ok(mapping.clone());
        }
        let resources = self.resource_mapping().await?;
        let mut mapping = IdentityMapping::new();
        for resource in &self.document.hierarchy.resources {
            let Some(resource_id) = resources.id_for(&resource.name) else {
                tracing::warn!(resource = %resource.name, "resource not found, its scopes are unmapped");
                continue;
            };
            let Some(resource_id) = resource_id.as_real() else {
                continue;
            };
            let scopes = self.client.list_scopes(resource_id).await.map_err(|e| {
                EngineError::step(format!("failed to get scopes for resource {}", resource.name), e)
            })?;
            for scope in &scopes {
                mapping.insert(&scope.name, scope.id.as_str().into());
            }
        }
        self.outputs.scopes = Some(mapping.clone());
        Ok(mapping)
    }

    pub async fn organization_scope_mapping(&mut self) -> Result<IdentityMapping, EngineError> {
        if let Some(mapping) = &self.outputs.organization_scopes {
            return Ok(mapping.clone());
        }
        let scopes = self
            .client
            .list_organization_scopes()
            .await
            .map_err(|e| EngineError::step("failed to get organization scopes", e))?;
        let mapping =
            IdentityMapping::from_entries(scopes.iter().map(|s| (s.name.as_str(), s.id.as_str())));
        self.outputs.organization_scopes = Some(mapping.clone());
        Ok(mapping)
    }

    pub async fn organization_role_mapping(&mut self) -> Result<IdentityMapping, EngineError> {
        if let Some(mapping) = &self.outputs.organization_roles {
            return Ok(mapping.clone());
        }
        let roles = self
            .client
            .list_organization_roles()
            .await
            .map_err(|e| EngineError::step("failed to get organization roles", e))?;
        let mapping = IdentityMapping::from_entries_case_insensitive(
            roles.iter().map(|r| (r.name.as_str(), r.id.as_str())),
        );
        self.outputs.organization_roles = Some(mapping.clone());
        Ok(mapping)
    }

    pub async fn user_role_mapping(&mut self) -> Result<IdentityMapping, EngineError> {
        if let Some(mapping) = &self.outputs.user_roles {
            return Ok(mapping.clone());
        }
        let roles = self
            .client
            .list_roles()
            .await
            .map_err(|e| EngineError::step("failed to get user roles", e))?;
        let mapping = IdentityMapping::from_entries_case_insensitive(
            roles.iter().map(|r| (r.name.as_str(), r.id.as_str())),
        );
        self.outputs.user_roles = Some(mapping.clone());
        Ok(mapping)
    }
}
