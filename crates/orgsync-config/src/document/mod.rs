//! Desired-state document: the declarative RBAC model a sync reconciles.
//!
//! ```yaml
//! metadata: { name, version, description }
//! hierarchy:
//!   organization_roles: [{ id, name, type, priority, permissions: [{ id, name }] }]
//!   user_roles: [...]
//!   resources: [{ name, actions: [...] }]
//! third_party_apps: [...]
//! sign_in_experience: { ... }
//! ```

mod sign_in;
mod validate;

pub use sign_in::{
    BrandingPaths, SignInColors, SignInExperience, SignInLanguage, SignInMethodItem,
    SignInMethods, SignUpMethods,
};

use std::collections::BTreeMap;
use std::path::Path;

use orgsync_core::constants::{DEFAULT_APP_SCOPES, scope_name};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DesiredState {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub hierarchy: Hierarchy,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub third_party_apps: Vec<Application>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in_experience: Option<SignInExperience>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Hierarchy {
    #[serde(default)]
    pub organization_roles: Vec<Role>,
    #[serde(default)]
    pub user_roles: Vec<Role>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

/// An organization or user role and the scope names it grants.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Role {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// `org`/`organization`, `user`, or empty (defaults to the section kind).
    #[serde(rename = "type", default)]
    pub role_type: String,
    /// Informational ordering only.
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Permission ids in declaration order, skipping empty ids.
    pub fn permission_ids(&self) -> impl Iterator<Item = &str> {
        self.permissions
            .iter()
            .map(|p| p.id.as_str())
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Permission {
    /// Scope name, `action:resource`.
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Resource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Resource {
    /// Scope names derived from this resource's actions.
    pub fn scope_names(&self) -> impl Iterator<Item = String> + '_ {
        self.actions
            .iter()
            .map(|action| scope_name(action, &self.name))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Application {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub login_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirect_uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_logout_redirect_uris: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_control: Option<AccessControl>,
}

impl Application {
    /// Configured consent scopes, or the defaults when none are declared.
    pub fn effective_scopes(&self) -> Vec<String> {
        if self.scopes.is_empty() {
            default_app_scopes()
        } else {
            self.scopes.clone()
        }
    }
}

/// Role ids allowed to use a third-party application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AccessControl {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub organization_roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_roles: Vec<String>,
}

/// Consent scopes granted to applications that declare none.
pub fn default_app_scopes() -> Vec<String> {
    DEFAULT_APP_SCOPES.iter().map(ToString::to_string).collect()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl DesiredState {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// JSON Schema of the document.
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(Self)).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl DesiredState {
    /// Organization roles managed by a sync (type `org`, `organization`, or empty).
    pub fn organization_roles(&self) -> Vec<&Role> {
        self.hierarchy
            .organization_roles
            .iter()
            .filter(|r| matches!(r.role_type.as_str(), "" | "org" | "organization"))
            .collect()
    }

    /// User roles managed by a sync (type `user` or empty).
    pub fn user_roles(&self) -> Vec<&Role> {
        self.hierarchy
            .user_roles
            .iter()
            .filter(|r| matches!(r.role_type.as_str(), "" | "user"))
            .collect()
    }

    /// Every permission referenced by a managed role, keyed by id.
    pub fn all_permissions(&self) -> BTreeMap<String, Permission> {
        self.organization_roles()
            .into_iter()
            .chain(self.user_roles())
            .flat_map(|role| role.permissions.iter())
            .filter(|p| !p.id.is_empty())
            .map(|p| (p.id.clone(), p.clone()))
            .collect()
    }

    /// Scope names derived from all resources, in declaration order.
    pub fn scope_names(&self) -> Vec<String> {
        self.hierarchy
            .resources
            .iter()
            .flat_map(Resource::scope_names)
            .collect()
    }

    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.hierarchy.resources.iter().find(|r| r.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = r"
metadata:
  name: test
  version: '1.0'
hierarchy:
  organization_roles:
    - id: owner
      name: Owner
      type: org
      priority: 0
      permissions:
        - id: manage:distributors
    - id: reseller
      name: Reseller
      permissions:
        - id: read:systems
  user_roles:
    - id: admin
      name: Admin
      type: user
      permissions:
        - id: manage:systems
        - id: read:systems
    - id: stray
      name: Stray
      type: org
  resources:
    - name: systems
      actions: [read, manage]
    - name: distributors
      actions: [manage]
";

    #[test]
    fn parses_hierarchy_sections() {
        let doc = DesiredState::from_yaml_str(DOC).unwrap();
        assert_eq!(doc.metadata.name, "test");
        assert_eq!(doc.hierarchy.organization_roles.len(), 2);
        assert_eq!(doc.hierarchy.resources[0].actions, vec!["read", "manage"]);
        assert!(doc.third_party_apps.is_empty());
        assert!(doc.sign_in_experience.is_none());
    }

    #[test]
    fn role_filters_default_empty_type_to_section_kind() {
        let doc = DesiredState::from_yaml_str(DOC).unwrap();
        let org: Vec<_> = doc.organization_roles().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(org, vec!["owner", "reseller"]);
        let user: Vec<_> = doc.user_roles().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(user, vec!["admin"]);
    }

    #[test]
    fn all_permissions_dedupes_across_sections() {
        let doc = DesiredState::from_yaml_str(DOC).unwrap();
        let ids: Vec<_> = doc.all_permissions().into_keys().collect();
        assert_eq!(
            ids,
            vec!["manage:distributors", "manage:systems", "read:systems"]
        );
    }

    #[test]
    fn scope_names_follow_declaration_order() {
        let doc = DesiredState::from_yaml_str(DOC).unwrap();
        assert_eq!(
            doc.scope_names(),
            vec!["read:systems", "manage:systems", "manage:distributors"]
        );
    }

    #[test]
    fn application_scopes_default_when_empty() {
        let app = Application {
            name: "portal".into(),
            ..Application::default()
        };
        assert_eq!(app.effective_scopes().len(), DEFAULT_APP_SCOPES.len());

        let custom = Application {
            scopes: vec!["profile".into()],
            ..app
        };
        assert_eq!(custom.effective_scopes(), vec!["profile"]);
    }

    #[test]
    fn yaml_roundtrip_preserves_document() {
        let doc = DesiredState::from_yaml_str(DOC).unwrap();
        let yaml = doc.to_yaml().unwrap();
        assert_eq!(DesiredState::from_yaml_str(&yaml).unwrap(), doc);
    }
}
