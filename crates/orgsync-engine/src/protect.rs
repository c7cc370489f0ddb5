//! Classification of remote entities that cleanup must never delete.
//!
//! Matching is a case-insensitive substring test against explicit marker
//! tables. The heuristic is intentionally loose: a role named
//! "Systematic User" is protected because it contains `system`.

/// Markers that flag an entity as provider-owned or human-managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerTable {
    /// Substrings matched against the entity name.
    pub names: &'static [&'static str],
    /// Substrings matched against the entity description.
    pub descriptions: &'static [&'static str],
    /// `(marker, prefix)`: the description marker applies unless the
    /// description starts with `prefix`.
    pub descriptions_unless_prefixed: &'static [(&'static str, &'static str)],
}

impl MarkerTable {
    /// Whether an entity with this name and description is protected.
    #[must_use]
    pub fn protects(&self, name: &str, description: &str) -> bool {
        let name = name.to_lowercase();
        let description = description.to_lowercase();
        self.names.iter().any(|m| name.contains(m))
            || self.descriptions.iter().any(|m| description.contains(m))
            || self
                .descriptions_unless_prefixed
                .iter()
                .any(|(m, prefix)| description.contains(m) && !description.starts_with(prefix))
    }
}

/// Tenant-wide user roles.
pub const USER_ROLES: MarkerTable = MarkerTable {
    names: &["logto", "admin", "machine-to-machine", "system", "default"],
    descriptions: &["system", "default", "logto"],
    descriptions_unless_prefixed: &[],
};

/// Organization roles.
pub const ORGANIZATION_ROLES: MarkerTable = MarkerTable {
    names: &["logto", "admin", "system", "default", "owner", "member"],
    descriptions: &["system", "default", "logto"],
    descriptions_unless_prefixed: &[],
};

/// Organization scopes. Scopes this tool created carry the
/// `Organization scope: ` description and may mention `system`.
pub const ORGANIZATION_SCOPES: MarkerTable = MarkerTable {
    names: &["logto", "system", "default", "management", "api"],
    descriptions: &["logto", "management"],
    descriptions_unless_prefixed: &[("system", "organization scope: ")],
};

/// Resource scopes and user-role permissions.
pub const PERMISSIONS: MarkerTable = MarkerTable {
    names: &["logto:", "urn:logto:", "management api", "machine to machine"],
    descriptions: &["logto:", "urn:logto:", "management api", "machine to machine"],
    descriptions_unless_prefixed: &[],
};

/// Scopes that are never unassigned from an organization role.
pub const ORGANIZATION_ROLE_SCOPE_REMOVAL: MarkerTable = MarkerTable {
    names: &["management"],
    descriptions: &[],
    descriptions_unless_prefixed: &[],
};

/// Whether `table` protects an entity with this name and description.
#[must_use]
pub fn is_protected(name: &str, description: &str, table: &MarkerTable) -> bool {
    table.protects(name, description)
}
