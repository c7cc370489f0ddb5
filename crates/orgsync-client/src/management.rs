//! reqwest implementation of [`RemoteClient`] for the management API.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use orgsync_core::entities::{
    OrganizationRole, OrganizationScope, RemoteOrganization, RemoteResource, RemoteRole,
    RemoteScope, RemoteUser, SignInExperienceUpdate, ThirdPartyApplication,
};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::Mutex;

use crate::RemoteClient;
use crate::auth::{self, CachedToken, Credentials};
use crate::error::ClientError;
use crate::http::{check_response, parse_list};

/// HTTP client for the identity provider's management API.
///
/// The bearer token is fetched lazily and shared by all requests until it
/// comes within five minutes of expiry.
pub struct ManagementClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    token: Mutex<Option<CachedToken>>,
}

fn seg(id: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(id)
}

impl ManagementClient {
    /// Create a client for `base_url` (e.g. `https://tenant.logto.app`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("orgsync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            token: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a token and list resources, proving credentials and connectivity.
    ///
    /// # Errors
    ///
    /// Propagates authentication and HTTP failures.
    pub async fn test_connection(&self) -> Result<(), ClientError> {
        self.send(Method::GET, "/api/resources").await.map(|_| ())
    }

    async fn bearer(&self) -> Result<String, ClientError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(Instant::now())) {
            return Ok(token.access_token.clone());
        }
        let token = auth::request_token(&self.http, &self.base_url, &self.credentials).await?;
        let access_token = token.access_token.clone();
        *cached = Some(token);
        Ok(access_token)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let token = self.bearer().await?;
        tracing::debug!(%method, path, "management API request");
        Ok(self
            .http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(token))
    }

    async fn send(&self, method: Method, path: &str) -> Result<reqwest::Response, ClientError> {
        let req = self.request(method, path).await?;
        check_response(req.send().await?).await
    }

    async fn send_json<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ClientError> {
        let req = self.request(method, path).await?.json(body);
        check_response(req.send().await?).await
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ClientError> {
        let resp = self.send(Method::GET, path).await?;
        parse_list(&resp.text().await?)
    }

    async fn get_one<T: DeserializeOwned>(
        &self,
        path: &str,
        kind: &'static str,
        id: &str,
    ) -> Result<T, ClientError> {
        match self.send(Method::GET, path).await {
            Ok(resp) => Ok(serde_json::from_str(&resp.text().await?)?),
            Err(ClientError::Api { status: 404, .. }) => Err(ClientError::NotFound {
                kind,
                id: id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn create<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let resp = self.send_json(Method::POST, path, body).await?;
        Ok(serde_json::from_str(&resp.text().await?)?)
    }
}

#[async_trait]
impl RemoteClient for ManagementClient {
    // -- Resources and their scopes --

    async fn list_resources(&self) -> Result<Vec<RemoteResource>, ClientError> {
        self.get_list("/api/resources").await
    }

    async fn create_resource(
        &self,
        resource: &RemoteResource,
    ) -> Result<RemoteResource, ClientError> {
        self.create("/api/resources", resource).await
    }

    async fn update_resource(
        &self,
        id: &str,
        resource: &RemoteResource,
    ) -> Result<(), ClientError> {
        let body = json!({
            "name": resource.name,
            "accessTokenTtl": resource.access_token_ttl,
        });
        self.send_json(Method::PATCH, &format!("/api/resources/{}", seg(id)), &body)
            .await
            .map(|_| ())
    }

    async fn delete_resource(&self, id: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, &format!("/api/resources/{}", seg(id)))
            .await
            .map(|_| ())
    }

    async fn list_scopes(&self, resource_id: &str) -> Result<Vec<RemoteScope>, ClientError> {
        self.get_list(&format!("/api/resources/{}/scopes", seg(resource_id)))
            .await
    }

    async fn create_scope(
        &self,
        resource_id: &str,
        scope: &RemoteScope,
    ) -> Result<RemoteScope, ClientError> {
        self.create(&format!("/api/resources/{}/scopes", seg(resource_id)), scope)
            .await
    }

    async fn update_scope(
        &self,
        resource_id: &str,
        scope_id: &str,
        scope: &RemoteScope,
    ) -> Result<(), ClientError> {
        let path = format!(
            "/api/resources/{}/scopes/{}",
            seg(resource_id),
            seg(scope_id)
        );
        self.send_json(Method::PATCH, &path, scope).await.map(|_| ())
    }

    async fn delete_scope(&self, resource_id: &str, scope_id: &str) -> Result<(), ClientError> {
        let path = format!(
            "/api/resources/{}/scopes/{}",
            seg(resource_id),
            seg(scope_id)
        );
        self.send(Method::DELETE, &path).await.map(|_| ())
    }

    // -- Organization scopes and roles --

    async fn list_organization_scopes(&self) -> Result<Vec<OrganizationScope>, ClientError> {
        self.get_list("/api/organization-scopes").await
    }

    async fn create_organization_scope(
        &self,
        scope: &OrganizationScope,
    ) -> Result<OrganizationScope, ClientError> {
        self.create("/api/organization-scopes", scope).await
    }

    async fn update_organization_scope(
        &self,
        id: &str,
        scope: &OrganizationScope,
    ) -> Result<(), ClientError> {
        let path = format!("/api/organization-scopes/{}", seg(id));
        self.send_json(Method::PATCH, &path, scope).await.map(|_| ())
    }

    async fn delete_organization_scope(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/api/organization-scopes/{}", seg(id));
        self.send(Method::DELETE, &path).await.map(|_| ())
    }

    async fn list_organization_roles(&self) -> Result<Vec<OrganizationRole>, ClientError> {
        self.get_list("/api/organization-roles").await
    }

    async fn create_organization_role(
        &self,
        role: &OrganizationRole,
    ) -> Result<OrganizationRole, ClientError> {
        self.create("/api/organization-roles", role).await
    }

    async fn update_organization_role(
        &self,
        id: &str,
        role: &OrganizationRole,
    ) -> Result<(), ClientError> {
        let path = format!("/api/organization-roles/{}", seg(id));
        self.send_json(Method::PATCH, &path, role).await.map(|_| ())
    }

    async fn delete_organization_role(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/api/organization-roles/{}", seg(id));
        self.send(Method::DELETE, &path).await.map(|_| ())
    }

    async fn organization_role_scopes(
        &self,
        role_id: &str,
    ) -> Result<Vec<OrganizationScope>, ClientError> {
        self.get_list(&format!("/api/organization-roles/{}/scopes", seg(role_id)))
            .await
    }

    async fn assign_scope_to_organization_role(
        &self,
        role_id: &str,
        scope_id: &str,
    ) -> Result<(), ClientError> {
        let path = format!("/api/organization-roles/{}/scopes", seg(role_id));
        let body = json!({ "organizationScopeIds": [scope_id] });
        self.send_json(Method::POST, &path, &body).await.map(|_| ())
    }

    async fn remove_scope_from_organization_role(
        &self,
        role_id: &str,
        scope_id: &str,
    ) -> Result<(), ClientError> {
        let path = format!(
            "/api/organization-roles/{}/scopes/{}",
            seg(role_id),
            seg(scope_id)
        );
        self.send(Method::DELETE, &path).await.map(|_| ())
    }

    // -- User roles --

    async fn list_roles(&self) -> Result<Vec<RemoteRole>, ClientError> {
        self.get_list("/api/roles").await
    }

    async fn create_role(&self, role: &RemoteRole) -> Result<RemoteRole, ClientError> {
        self.create("/api/roles", role).await
    }

    async fn update_role(&self, id: &str, role: &RemoteRole) -> Result<(), ClientError> {
        let path = format!("/api/roles/{}", seg(id));
        self.send_json(Method::PATCH, &path, role).await.map(|_| ())
    }

    async fn delete_role(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/api/roles/{}", seg(id));
        self.send(Method::DELETE, &path).await.map(|_| ())
    }

    async fn role_permissions(&self, role_id: &str) -> Result<Vec<RemoteScope>, ClientError> {
        self.get_list(&format!("/api/roles/{}/scopes", seg(role_id)))
            .await
    }

    async fn assign_permissions_to_role(
        &self,
        role_id: &str,
        scope_ids: &[String],
    ) -> Result<(), ClientError> {
        let path = format!("/api/roles/{}/scopes", seg(role_id));
        let body = json!({ "scopeIds": scope_ids });
        self.send_json(Method::POST, &path, &body).await.map(|_| ())
    }

    async fn remove_permissions_from_role(
        &self,
        role_id: &str,
        scope_ids: &[String],
    ) -> Result<(), ClientError> {
        for scope_id in scope_ids {
            let path = format!("/api/roles/{}/scopes/{}", seg(role_id), seg(scope_id));
            self.send(Method::DELETE, &path).await?;
        }
        Ok(())
    }

    // -- Third-party applications --

    async fn list_third_party_applications(
        &self,
    ) -> Result<Vec<ThirdPartyApplication>, ClientError> {
        let apps: Vec<ThirdPartyApplication> =
            self.get_list("/api/applications?isThirdParty=true").await?;
        Ok(apps.into_iter().filter(|a| a.is_third_party).collect())
    }

    async fn create_third_party_application(
        &self,
        app: &ThirdPartyApplication,
    ) -> Result<ThirdPartyApplication, ClientError> {
        self.create("/api/applications", app).await
    }

    async fn update_third_party_application(
        &self,
        id: &str,
        app: &ThirdPartyApplication,
    ) -> Result<(), ClientError> {
        let path = format!("/api/applications/{}", seg(id));
        let body = json!({
            "name": app.name,
            "description": app.description,
            "oidcClientMetadata": app.oidc_client_metadata,
            "customData": app.custom_data,
        });
        self.send_json(Method::PATCH, &path, &body).await.map(|_| ())
    }

    async fn delete_third_party_application(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/api/applications/{}", seg(id));
        self.send(Method::DELETE, &path).await.map(|_| ())
    }

    async fn update_application_branding(
        &self,
        id: &str,
        display_name: &str,
    ) -> Result<(), ClientError> {
        let path = format!("/api/applications/{}/sign-in-experience", seg(id));
        let body = json!({ "displayName": display_name });
        self.send_json(Method::PUT, &path, &body).await.map(|_| ())
    }

    async fn update_application_scopes(
        &self,
        id: &str,
        user_scopes: &[String],
    ) -> Result<(), ClientError> {
        let path = format!("/api/applications/{}/user-consent-scopes", seg(id));
        let body = json!({ "userScopes": user_scopes });
        self.send_json(Method::PUT, &path, &body).await.map(|_| ())
    }

    // -- Sign-in experience --

    async fn update_sign_in_experience(
        &self,
        update: &SignInExperienceUpdate,
    ) -> Result<(), ClientError> {
        self.send_json(Method::PATCH, "/api/sign-in-exp", update)
            .await
            .map(|_| ())
    }

    // -- Organizations and users --

    async fn list_organizations(&self) -> Result<Vec<RemoteOrganization>, ClientError> {
        self.get_list("/api/organizations").await
    }

    async fn get_organization(&self, id: &str) -> Result<RemoteOrganization, ClientError> {
        let path = format!("/api/organizations/{}", seg(id));
        self.get_one(&path, "organization", id).await
    }

    async fn list_users(&self) -> Result<Vec<RemoteUser>, ClientError> {
        self.get_list("/api/users").await
    }

    async fn get_user(&self, id: &str) -> Result<RemoteUser, ClientError> {
        let path = format!("/api/users/{}", seg(id));
        self.get_one(&path, "user", id).await
    }

    async fn user_roles(&self, user_id: &str) -> Result<Vec<RemoteRole>, ClientError> {
        self.get_list(&format!("/api/users/{}/roles", seg(user_id)))
            .await
    }

    async fn set_user_suspended(&self, user_id: &str, suspended: bool) -> Result<(), ClientError> {
        let path = format!("/api/users/{}/is-suspended", seg(user_id));
        let body = json!({ "isSuspended": suspended });
        self.send_json(Method::PATCH, &path, &body).await.map(|_| ())
    }

    async fn delete_organization(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/api/organizations/{}", seg(id));
        self.send(Method::DELETE, &path).await.map(|_| ())
    }

    async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        let path = format!("/api/users/{}", seg(id));
        self.send(Method::DELETE, &path).await.map(|_| ())
    }
}
