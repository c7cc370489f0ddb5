//! # orgsync-client
//!
//! Identity-provider management API client for orgsync.
//!
//! - [`RemoteClient`]: the async contract the reconciliation engine, pull
//!   reconciler, and cascade service depend on
//! - [`ManagementClient`]: reqwest implementation with a cached
//!   client-credentials token
//! - `memory::InMemoryRemote` (feature `test-support`): stateful fake with a
//!   call log and failure injection

mod auth;
mod error;
mod http;
mod management;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use auth::Credentials;
pub use error::ClientError;
pub use management::ManagementClient;

use async_trait::async_trait;
use orgsync_core::entities::{
    OrganizationRole, OrganizationScope, RemoteOrganization, RemoteResource, RemoteRole,
    RemoteScope, RemoteUser, SignInExperienceUpdate, ThirdPartyApplication,
};

/// Operations against the identity provider's management API.
///
/// Create methods return the entity as stored remotely (with its assigned id).
#[async_trait]
pub trait RemoteClient: Send + Sync {
    // -- Resources and their scopes --

    async fn list_resources(&self) -> Result<Vec<RemoteResource>, ClientError>;
    async fn create_resource(&self, resource: &RemoteResource)
    -> Result<RemoteResource, ClientError>;
    async fn update_resource(&self, id: &str, resource: &RemoteResource)
    -> Result<(), ClientError>;
    async fn delete_resource(&self, id: &str) -> Result<(), ClientError>;

    async fn list_scopes(&self, resource_id: &str) -> Result<Vec<RemoteScope>, ClientError>;
    async fn create_scope(
        &self,
        resource_id: &str,
        scope: &RemoteScope,
    ) -> Result<RemoteScope, ClientError>;
    async fn update_scope(
        &self,
        resource_id: &str,
        scope_id: &str,
        scope: &RemoteScope,
    ) -> Result<(), ClientError>;
    async fn delete_scope(&self, resource_id: &str, scope_id: &str) -> Result<(), ClientError>;

    // -- Organization scopes and roles --

    async fn list_organization_scopes(&self) -> Result<Vec<OrganizationScope>, ClientError>;
    async fn create_organization_scope(
        &self,
        scope: &OrganizationScope,
    ) -> Result<OrganizationScope, ClientError>;
    async fn update_organization_scope(
        &self,
        id: &str,
        scope: &OrganizationScope,
    ) -> Result<(), ClientError>;
    async fn delete_organization_scope(&self, id: &str) -> Result<(), ClientError>;

    async fn list_organization_roles(&self) -> Result<Vec<OrganizationRole>, ClientError>;
    async fn create_organization_role(
        &self,
        role: &OrganizationRole,
    ) -> Result<OrganizationRole, ClientError>;
    async fn update_organization_role(
        &self,
        id: &str,
        role: &OrganizationRole,
    ) -> Result<(), ClientError>;
    async fn delete_organization_role(&self, id: &str) -> Result<(), ClientError>;

    async fn organization_role_scopes(
        &self,
        role_id: &str,
    ) -> Result<Vec<OrganizationScope>, ClientError>;
    async fn assign_scope_to_organization_role(
        &self,
        role_id: &str,
        scope_id: &str,
    ) -> Result<(), ClientError>;
    async fn remove_scope_from_organization_role(
        &self,
        role_id: &str,
        scope_id: &str,
    ) -> Result<(), ClientError>;

    // -- User roles --

    async fn list_roles(&self) -> Result<Vec<RemoteRole>, ClientError>;
    async fn create_role(&self, role: &RemoteRole) -> Result<RemoteRole, ClientError>;
    async fn update_role(&self, id: &str, role: &RemoteRole) -> Result<(), ClientError>;
    async fn delete_role(&self, id: &str) -> Result<(), ClientError>;

    async fn role_permissions(&self, role_id: &str) -> Result<Vec<RemoteScope>, ClientError>;
    async fn assign_permissions_to_role(
        &self,
        role_id: &str,
        scope_ids: &[String],
    ) -> Result<(), ClientError>;
    async fn remove_permissions_from_role(
        &self,
        role_id: &str,
        scope_ids: &[String],
    ) -> Result<(), ClientError>;

    // -- Third-party applications --

    async fn list_third_party_applications(
        &self,
    ) -> Result<Vec<ThirdPartyApplication>, ClientError>;
    async fn create_third_party_application(
        &self,
        app: &ThirdPartyApplication,
    ) -> Result<ThirdPartyApplication, ClientError>;
    async fn update_third_party_application(
        &self,
        id: &str,
        app: &ThirdPartyApplication,
    ) -> Result<(), ClientError>;
    async fn delete_third_party_application(&self, id: &str) -> Result<(), ClientError>;
    async fn update_application_branding(
        &self,
        id: &str,
        display_name: &str,
    ) -> Result<(), ClientError>;
    async fn update_application_scopes(
        &self,
        id: &str,
        user_scopes: &[String],
    ) -> Result<(), ClientError>;

    // -- Sign-in experience --

    async fn update_sign_in_experience(
        &self,
        update: &SignInExperienceUpdate,
    ) -> Result<(), ClientError>;

    // -- Organizations and users --

    async fn list_organizations(&self) -> Result<Vec<RemoteOrganization>, ClientError>;
    async fn get_organization(&self, id: &str) -> Result<RemoteOrganization, ClientError>;
    async fn list_users(&self) -> Result<Vec<RemoteUser>, ClientError>;
    async fn get_user(&self, id: &str) -> Result<RemoteUser, ClientError>;
    async fn user_roles(&self, user_id: &str) -> Result<Vec<RemoteRole>, ClientError>;
    async fn set_user_suspended(&self, user_id: &str, suspended: bool) -> Result<(), ClientError>;
    async fn delete_organization(&self, id: &str) -> Result<(), ClientError>;
    async fn delete_user(&self, id: &str) -> Result<(), ClientError>;
}
