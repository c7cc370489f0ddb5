//! In-memory [`RemoteClient`] for tests.
//!
//! Holds the full remote state behind a mutex, records every call by method
//! name, and can be told to fail specific methods with an HTTP 500.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use orgsync_core::entities::{
    OrganizationRole, OrganizationScope, RemoteOrganization, RemoteResource, RemoteRole,
    RemoteScope, RemoteUser, SignInExperienceUpdate, ThirdPartyApplication,
};

use crate::RemoteClient;
use crate::error::ClientError;

/// Everything the fake remote knows about.
#[derive(Debug, Clone, Default)]
pub struct RemoteState {
    pub resources: Vec<RemoteResource>,
    /// Scopes keyed by resource id.
    pub scopes: BTreeMap<String, Vec<RemoteScope>>,
    pub organization_scopes: Vec<OrganizationScope>,
    pub organization_roles: Vec<OrganizationRole>,
    /// Organization scope ids keyed by organization role id.
    pub organization_role_scopes: BTreeMap<String, BTreeSet<String>>,
    pub roles: Vec<RemoteRole>,
    /// Resource scope ids keyed by user role id.
    pub role_scopes: BTreeMap<String, BTreeSet<String>>,
    pub applications: Vec<ThirdPartyApplication>,
    /// Display name set through the application sign-in experience endpoint.
    pub application_branding: BTreeMap<String, String>,
    pub application_scopes: BTreeMap<String, Vec<String>>,
    pub sign_in_experience: Option<SignInExperienceUpdate>,
    pub organizations: Vec<RemoteOrganization>,
    pub users: Vec<RemoteUser>,
    pub user_roles: BTreeMap<String, Vec<RemoteRole>>,
}

impl RemoteState {
    fn find_scope(&self, scope_id: &str) -> Option<&RemoteScope> {
        self.scopes.values().flatten().find(|s| s.id == scope_id)
    }
}

/// Stateful fake of the management API.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<RemoteState>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<BTreeSet<String>>,
    next_id: AtomicU64,
}

const READ_PREFIXES: [&str; 2] = ["list_", "get_"];
const READ_METHODS: [&str; 3] = ["organization_role_scopes", "role_permissions", "user_roles"];

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(kind: &'static str, id: &str) -> ClientError {
    ClientError::NotFound {
        kind,
        id: id.to_string(),
    }
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a prepared state.
    #[must_use]
    pub fn with_state(state: RemoteState) -> Self {
        Self {
            state: Mutex::new(state),
            ..Self::default()
        }
    }

    /// Make every subsequent call to `method` fail with a 500.
    pub fn fail_on(&self, method: &str) {
        lock(&self.failing).insert(method.to_string());
    }

    pub fn clear_failures(&self) {
        lock(&self.failing).clear();
    }

    /// Copy of the current remote state.
    #[must_use]
    pub fn snapshot(&self) -> RemoteState {
        lock(&self.state).clone()
    }

    /// Mutate the state directly, bypassing the call log.
    pub fn seed(&self, f: impl FnOnce(&mut RemoteState)) {
        f(&mut lock(&self.state));
    }

    /// Method names of every call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    /// Calls that would change remote state.
    #[must_use]
    pub fn mutation_calls(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter(|c| {
                !READ_PREFIXES.iter().any(|p| c.starts_with(p))
                    && !READ_METHODS.contains(&c.as_str())
            })
            .cloned()
            .collect()
    }

    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Generate a fresh remote id like `res_3`.
    #[must_use]
    pub fn fresh_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{n}")
    }

    fn record(&self, method: &str) -> Result<MutexGuard<'_, RemoteState>, ClientError> {
        lock(&self.calls).push(method.to_string());
        if lock(&self.failing).contains(method) {
            return Err(ClientError::Api {
                status: 500,
                message: format!("injected failure in {method}"),
            });
        }
        Ok(lock(&self.state))
    }
}

#[async_trait]
impl RemoteClient for InMemoryRemote {
    async fn list_resources(&self) -> Result<Vec<RemoteResource>, ClientError> {
        Ok(self.record("list_resources")?.resources.clone())
    }

    async fn create_resource(
        &self,
        resource: &RemoteResource,
    ) -> Result<RemoteResource, ClientError> {
        let id = self.fresh_id("res");
        let mut state = self.record("create_resource")?;
        let created = RemoteResource {
            id: id.clone(),
            ..resource.clone()
        };
        state.resources.push(created.clone());
        state.scopes.insert(id, Vec::new());
        Ok(created)
    }

    async fn update_resource(
        &self,
        id: &str,
        resource: &RemoteResource,
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_resource")?;
        let existing = state
            .resources
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("resource", id))?;
        existing.name.clone_from(&resource.name);
        existing.access_token_ttl = resource.access_token_ttl;
        Ok(())
    }

    async fn delete_resource(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_resource")?;
        let before = state.resources.len();
        state.resources.retain(|r| r.id != id);
        if state.resources.len() == before {
            return Err(not_found("resource", id));
        }
        state.scopes.remove(id);
        Ok(())
    }

    async fn list_scopes(&self, resource_id: &str) -> Result<Vec<RemoteScope>, ClientError> {
        let state = self.record("list_scopes")?;
        Ok(state.scopes.get(resource_id).cloned().unwrap_or_default())
    }

    async fn create_scope(
        &self,
        resource_id: &str,
        scope: &RemoteScope,
    ) -> Result<RemoteScope, ClientError> {
        let id = self.fresh_id("scp");
        let mut state = self.record("create_scope")?;
        let created = RemoteScope {
            id,
            ..scope.clone()
        };
        state
            .scopes
            .get_mut(resource_id)
            .ok_or_else(|| not_found("resource", resource_id))?
            .push(created.clone());
        Ok(created)
    }

    async fn update_scope(
        &self,
        resource_id: &str,
        scope_id: &str,
        scope: &RemoteScope,
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_scope")?;
        let existing = state
            .scopes
            .get_mut(resource_id)
            .and_then(|scopes| scopes.iter_mut().find(|s| s.id == scope_id))
            .ok_or_else(|| not_found("scope", scope_id))?;
        existing.name.clone_from(&scope.name);
        existing.description.clone_from(&scope.description);
        Ok(())
    }

    async fn delete_scope(&self, resource_id: &str, scope_id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_scope")?;
        let scopes = state
            .scopes
            .get_mut(resource_id)
            .ok_or_else(|| not_found("resource", resource_id))?;
        scopes.retain(|s| s.id != scope_id);
        for assigned in state.role_scopes.values_mut() {
            assigned.remove(scope_id);
        }
        Ok(())
    }

    async fn list_organization_scopes(&self) -> Result<Vec<OrganizationScope>, ClientError> {
        Ok(self
            .record("list_organization_scopes")?
            .organization_scopes
            .clone())
    }

    async fn create_organization_scope(
        &self,
        scope: &OrganizationScope,
    ) -> Result<OrganizationScope, ClientError> {
        let id = self.fresh_id("osc");
        let mut state = self.record("create_organization_scope")?;
        let created = OrganizationScope {
            id,
            ..scope.clone()
        };
        state.organization_scopes.push(created.clone());
        Ok(created)
    }

    async fn update_organization_scope(
        &self,
        id: &str,
        scope: &OrganizationScope,
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_organization_scope")?;
        let existing = state
            .organization_scopes
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("organization scope", id))?;
        existing.name.clone_from(&scope.name);
        existing.description.clone_from(&scope.description);
        Ok(())
    }

    async fn delete_organization_scope(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_organization_scope")?;
        state.organization_scopes.retain(|s| s.id != id);
        for assigned in state.organization_role_scopes.values_mut() {
            assigned.remove(id);
        }
        Ok(())
    }

    async fn list_organization_roles(&self) -> Result<Vec<OrganizationRole>, ClientError> {
        Ok(self
            .record("list_organization_roles")?
            .organization_roles
            .clone())
    }

    async fn create_organization_role(
        &self,
        role: &OrganizationRole,
    ) -> Result<OrganizationRole, ClientError> {
        let id = self.fresh_id("orl");
        let mut state = self.record("create_organization_role")?;
        let created = OrganizationRole {
            id,
            ..role.clone()
        };
        state.organization_roles.push(created.clone());
        Ok(created)
    }

    async fn update_organization_role(
        &self,
        id: &str,
        role: &OrganizationRole,
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_organization_role")?;
        let existing = state
            .organization_roles
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("organization role", id))?;
        existing.name.clone_from(&role.name);
        existing.description.clone_from(&role.description);
        Ok(())
    }

    async fn delete_organization_role(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_organization_role")?;
        state.organization_roles.retain(|r| r.id != id);
        state.organization_role_scopes.remove(id);
        Ok(())
    }

    async fn organization_role_scopes(
        &self,
        role_id: &str,
    ) -> Result<Vec<OrganizationScope>, ClientError> {
        let state = self.record("organization_role_scopes")?;
        let Some(ids) = state.organization_role_scopes.get(role_id) else {
            return Ok(Vec::new());
        };
        Ok(state
            .organization_scopes
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn assign_scope_to_organization_role(
        &self,
        role_id: &str,
        scope_id: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.record("assign_scope_to_organization_role")?;
        state
            .organization_role_scopes
            .entry(role_id.to_string())
            .or_default()
            .insert(scope_id.to_string());
        Ok(())
    }

    async fn remove_scope_from_organization_role(
        &self,
        role_id: &str,
        scope_id: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.record("remove_scope_from_organization_role")?;
        if let Some(ids) = state.organization_role_scopes.get_mut(role_id) {
            ids.remove(scope_id);
        }
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<RemoteRole>, ClientError> {
        Ok(self.record("list_roles")?.roles.clone())
    }

    async fn create_role(&self, role: &RemoteRole) -> Result<RemoteRole, ClientError> {
        let id = self.fresh_id("rol");
        let mut state = self.record("create_role")?;
        let created = RemoteRole {
            id,
            ..role.clone()
        };
        state.roles.push(created.clone());
        Ok(created)
    }

    async fn update_role(&self, id: &str, role: &RemoteRole) -> Result<(), ClientError> {
        let mut state = self.record("update_role")?;
        let existing = state
            .roles
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| not_found("role", id))?;
        existing.name.clone_from(&role.name);
        existing.description.clone_from(&role.description);
        Ok(())
    }

    async fn delete_role(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_role")?;
        state.roles.retain(|r| r.id != id);
        state.role_scopes.remove(id);
        Ok(())
    }

    async fn role_permissions(&self, role_id: &str) -> Result<Vec<RemoteScope>, ClientError> {
        let state = self.record("role_permissions")?;
        let Some(ids) = state.role_scopes.get(role_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| state.find_scope(id).cloned())
            .collect())
    }

    async fn assign_permissions_to_role(
        &self,
        role_id: &str,
        scope_ids: &[String],
    ) -> Result<(), ClientError> {
        let mut state = self.record("assign_permissions_to_role")?;
        state
            .role_scopes
            .entry(role_id.to_string())
            .or_default()
            .extend(scope_ids.iter().cloned());
        Ok(())
    }

    async fn remove_permissions_from_role(
        &self,
        role_id: &str,
        scope_ids: &[String],
    ) -> Result<(), ClientError> {
        let mut state = self.record("remove_permissions_from_role")?;
        if let Some(ids) = state.role_scopes.get_mut(role_id) {
            for scope_id in scope_ids {
                ids.remove(scope_id);
            }
        }
        Ok(())
    }

    async fn list_third_party_applications(
        &self,
    ) -> Result<Vec<ThirdPartyApplication>, ClientError> {
        let state = self.record("list_third_party_applications")?;
        Ok(state
            .applications
            .iter()
            .filter(|a| a.is_third_party)
            .cloned()
            .collect())
    }

    async fn create_third_party_application(
        &self,
        app: &ThirdPartyApplication,
    ) -> Result<ThirdPartyApplication, ClientError> {
        let id = self.fresh_id("app");
        let mut state = self.record("create_third_party_application")?;
        let created = ThirdPartyApplication {
            id,
            ..app.clone()
        };
        state.applications.push(created.clone());
        Ok(created)
    }

    async fn update_third_party_application(
        &self,
        id: &str,
        app: &ThirdPartyApplication,
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_third_party_application")?;
        let existing = state
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found("application", id))?;
        existing.name.clone_from(&app.name);
        existing.description.clone_from(&app.description);
        existing
            .oidc_client_metadata
            .clone_from(&app.oidc_client_metadata);
        existing.custom_data.clone_from(&app.custom_data);
        Ok(())
    }

    async fn delete_third_party_application(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_third_party_application")?;
        state.applications.retain(|a| a.id != id);
        state.application_branding.remove(id);
        state.application_scopes.remove(id);
        Ok(())
    }

    async fn update_application_branding(
        &self,
        id: &str,
        display_name: &str,
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_application_branding")?;
        state
            .application_branding
            .insert(id.to_string(), display_name.to_string());
        Ok(())
    }

    async fn update_application_scopes(
        &self,
        id: &str,
        user_scopes: &[String],
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_application_scopes")?;
        state
            .application_scopes
            .insert(id.to_string(), user_scopes.to_vec());
        Ok(())
    }

    async fn update_sign_in_experience(
        &self,
        update: &SignInExperienceUpdate,
    ) -> Result<(), ClientError> {
        let mut state = self.record("update_sign_in_experience")?;
        state.sign_in_experience = Some(update.clone());
        Ok(())
    }

    async fn list_organizations(&self) -> Result<Vec<RemoteOrganization>, ClientError> {
        Ok(self.record("list_organizations")?.organizations.clone())
    }

    async fn get_organization(&self, id: &str) -> Result<RemoteOrganization, ClientError> {
        let state = self.record("get_organization")?;
        state
            .organizations
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| not_found("organization", id))
    }

    async fn list_users(&self) -> Result<Vec<RemoteUser>, ClientError> {
        Ok(self.record("list_users")?.users.clone())
    }

    async fn get_user(&self, id: &str) -> Result<RemoteUser, ClientError> {
        let state = self.record("get_user")?;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| not_found("user", id))
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<RemoteRole>, ClientError> {
        let state = self.record("user_roles")?;
        Ok(state.user_roles.get(user_id).cloned().unwrap_or_default())
    }

    async fn set_user_suspended(&self, user_id: &str, suspended: bool) -> Result<(), ClientError> {
        let mut state = self.record("set_user_suspended")?;
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| not_found("user", user_id))?;
        user.is_suspended = suspended;
        Ok(())
    }

    async fn delete_organization(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_organization")?;
        let before = state.organizations.len();
        state.organizations.retain(|o| o.id != id);
        if state.organizations.len() == before {
            return Err(not_found("organization", id));
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        let mut state = self.record("delete_user")?;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(not_found("user", id));
        }
        state.user_roles.remove(id);
        Ok(())
    }
}
