//! Structural validation of a desired-state document. The first violation wins.

use std::collections::HashSet;

use super::{AccessControl, Application, DesiredState, Resource, Role};
use crate::ConfigError;

/// Permission prefixes accepted without a matching resource action.
const SYSTEM_PERMISSION_PREFIXES: [&str; 10] = [
    "admin:", "manage:", "view:", "create:", "read:", "update:", "delete:", "destroy:", "audit:",
    "backup:",
];

#[derive(Clone, Copy)]
enum Section {
    Organization,
    User,
}

impl Section {
    const fn field(self) -> &'static str {
        match self {
            Self::Organization => "hierarchy.organization_roles",
            Self::User => "hierarchy.user_roles",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::User => "user",
        }
    }
}

fn is_system_permission(id: &str) -> bool {
    SYSTEM_PERMISSION_PREFIXES
        .iter()
        .any(|prefix| id.starts_with(prefix))
}

impl DesiredState {
    /// Check required fields, uniqueness, and cross references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metadata.name.is_empty() {
            return Err(ConfigError::invalid("metadata.name", "is required"));
        }
        if self.metadata.version.is_empty() {
            return Err(ConfigError::invalid("metadata.version", "is required"));
        }

        validate_roles(&self.hierarchy.organization_roles, Section::Organization)?;
        validate_roles(&self.hierarchy.user_roles, Section::User)?;

        let mut resource_names = HashSet::new();
        for resource in &self.hierarchy.resources {
            validate_resource(resource)?;
            if !resource_names.insert(resource.name.as_str()) {
                return Err(ConfigError::invalid(
                    "hierarchy.resources",
                    format!("duplicate resource name: {}", resource.name),
                ));
            }
        }

        self.validate_permission_references()?;

        let mut app_names = HashSet::new();
        for app in &self.third_party_apps {
            self.validate_application(app)?;
            if !app_names.insert(app.name.as_str()) {
                return Err(ConfigError::invalid(
                    "third_party_apps",
                    format!("duplicate third-party app name: {}", app.name),
                ));
            }
        }

        Ok(())
    }

    fn validate_permission_references(&self) -> Result<(), ConfigError> {
        let known: HashSet<String> = self.scope_names().into_iter().collect();
        let sections = [
            (Section::Organization, &self.hierarchy.organization_roles),
            (Section::User, &self.hierarchy.user_roles),
        ];
        for (section, roles) in sections {
            for role in roles {
                for perm in &role.permissions {
                    if !known.contains(&perm.id) && !is_system_permission(&perm.id) {
                        return Err(ConfigError::invalid(
                            section.field(),
                            format!(
                                "invalid permission reference {} in {} role {}",
                                perm.id,
                                section.label(),
                                role.id
                            ),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_application(&self, app: &Application) -> Result<(), ConfigError> {
        const FIELD: &str = "third_party_apps";
        if app.name.is_empty() {
            return Err(ConfigError::invalid(FIELD, "application name is required"));
        }
        if app.description.is_empty() {
            return Err(ConfigError::invalid(
                FIELD,
                format!("application description is required for app {}", app.name),
            ));
        }
        if app.display_name.is_empty() {
            return Err(ConfigError::invalid(
                FIELD,
                format!("application display_name is required for app {}", app.name),
            ));
        }

        let mut scopes = HashSet::new();
        for scope in &app.scopes {
            if scope.is_empty() {
                return Err(ConfigError::invalid(
                    FIELD,
                    format!("empty scope in application {}", app.name),
                ));
            }
            if !scopes.insert(scope.as_str()) {
                return Err(ConfigError::invalid(
                    FIELD,
                    format!("duplicate scope {scope} in application {}", app.name),
                ));
            }
        }

        if let Some(access) = &app.access_control {
            self.validate_access_control(access, &app.name)?;
        }
        Ok(())
    }

    fn validate_access_control(
        &self,
        access: &AccessControl,
        app_name: &str,
    ) -> Result<(), ConfigError> {
        const FIELD: &str = "third_party_apps.access_control";
        let checks = [
            (
                Section::Organization,
                &access.organization_roles,
                &self.hierarchy.organization_roles,
            ),
            (Section::User, &access.user_roles, &self.hierarchy.user_roles),
        ];
        for (section, referenced, declared) in checks {
            for role_id in referenced {
                if role_id.is_empty() {
                    return Err(ConfigError::invalid(
                        FIELD,
                        format!("empty {} role in application {app_name}", section.label()),
                    ));
                }
                if !declared.iter().any(|r| &r.id == role_id) {
                    return Err(ConfigError::invalid(
                        FIELD,
                        format!(
                            "invalid {} role {role_id} in application {app_name}",
                            section.label()
                        ),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn validate_roles(roles: &[Role], section: Section) -> Result<(), ConfigError> {
    let mut ids = HashSet::new();
    for role in roles {
        validate_role(role, section)?;
        if !ids.insert(role.id.as_str()) {
            return Err(ConfigError::invalid(
                section.field(),
                format!("duplicate {} role ID: {}", section.label(), role.id),
            ));
        }
    }
    Ok(())
}

fn validate_role(role: &Role, section: Section) -> Result<(), ConfigError> {
    let field = section.field();
    if role.id.is_empty() {
        return Err(ConfigError::invalid(field, "role ID is required"));
    }
    if role.name.is_empty() {
        return Err(ConfigError::invalid(
            field,
            format!("role name is required for role {}", role.id),
        ));
    }
    if !matches!(role.role_type.as_str(), "" | "user" | "org" | "organization") {
        return Err(ConfigError::invalid(
            field,
            format!("invalid role type {} for role {}", role.role_type, role.id),
        ));
    }
    if role.priority < 0 {
        return Err(ConfigError::invalid(
            field,
            format!("role priority must be non-negative for role {}", role.id),
        ));
    }

    let mut perm_ids = HashSet::new();
    for perm in &role.permissions {
        if perm.id.is_empty() {
            return Err(ConfigError::invalid(
                field,
                format!("permission ID is required for role {}", role.id),
            ));
        }
        if !perm_ids.insert(perm.id.as_str()) {
            return Err(ConfigError::invalid(
                field,
                format!("duplicate permission ID {} in role {}", perm.id, role.id),
            ));
        }
    }
    Ok(())
}

fn validate_resource(resource: &Resource) -> Result<(), ConfigError> {
    const FIELD: &str = "hierarchy.resources";
    if resource.name.is_empty() {
        return Err(ConfigError::invalid(FIELD, "resource name is required"));
    }
    if resource.actions.is_empty() {
        return Err(ConfigError::invalid(
            FIELD,
            format!("resource {} must have at least one action", resource.name),
        ));
    }
    let mut actions = HashSet::new();
    for action in &resource.actions {
        if action.is_empty() {
            return Err(ConfigError::invalid(
                FIELD,
                format!("empty action in resource {}", resource.name),
            ));
        }
        if !actions.insert(action.as_str()) {
            return Err(ConfigError::invalid(
                FIELD,
                format!("duplicate action {action} in resource {}", resource.name),
            ));
        }
    }
    Ok(())
}
