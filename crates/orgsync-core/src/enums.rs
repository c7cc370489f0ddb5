//! Kind, status, and operation enums for orgsync.
//!
//! Storage-facing enums use `snake_case` serialization; operation kinds use
//! the `kebab-case` labels that appear in sync reports. Status enums with
//! state machines provide `allowed_next_states()` to enforce valid
//! transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// OrgKind
// ---------------------------------------------------------------------------

/// Commercial organization kind, carried remotely as `customData.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrgKind {
    Distributor,
    Reseller,
    Customer,
}

impl OrgKind {
    pub const ALL: [Self; 3] = [Self::Distributor, Self::Reseller, Self::Customer];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distributor => "distributor",
            Self::Reseller => "reseller",
            Self::Customer => "customer",
        }
    }

    /// Match a remote type marker exactly. Unknown markers return `None`.
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "distributor" => Some(Self::Distributor),
            "reseller" => Some(Self::Reseller),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }
}

impl fmt::Display for OrgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// HierarchyKind
// ---------------------------------------------------------------------------

/// Level of the commercial hierarchy.
///
/// ```text
/// distributor → reseller → customer → user
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyKind {
    Distributor,
    Reseller,
    Customer,
    User,
}

impl HierarchyKind {
    /// All levels, root first.
    pub const ALL: [Self; 4] = [Self::Distributor, Self::Reseller, Self::Customer, Self::User];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Distributor => "distributor",
            Self::Reseller => "reseller",
            Self::Customer => "customer",
            Self::User => "user",
        }
    }

    /// Depth from the root of the hierarchy (distributor = 0).
    #[must_use]
    pub const fn depth(self) -> usize {
        match self {
            Self::Distributor => 0,
            Self::Reseller => 1,
            Self::Customer => 2,
            Self::User => 3,
        }
    }

    /// The organization kind for this level, `None` for users.
    #[must_use]
    pub const fn org_kind(self) -> Option<OrgKind> {
        match self {
            Self::Distributor => Some(OrgKind::Distributor),
            Self::Reseller => Some(OrgKind::Reseller),
            Self::Customer => Some(OrgKind::Customer),
            Self::User => None,
        }
    }
}

impl From<OrgKind> for HierarchyKind {
    fn from(kind: OrgKind) -> Self {
        match kind {
            OrgKind::Distributor => Self::Distributor,
            OrgKind::Reseller => Self::Reseller,
            OrgKind::Customer => Self::Customer,
        }
    }
}

impl fmt::Display for HierarchyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a local hierarchy entity, derived from its timestamps.
///
/// ```text
/// active ⇄ suspended
/// active | suspended → deleted (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    Suspended,
    Deleted,
}

impl EntityStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Active => &[Self::Suspended, Self::Deleted],
            Self::Suspended => &[Self::Active, Self::Deleted],
            Self::Deleted => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationKind
// ---------------------------------------------------------------------------

/// Entity kind recorded on a report operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    Resource,
    Scope,
    OrganizationScope,
    OrganizationRole,
    OrganizationRoleScope,
    UserRole,
    UserRolePermission,
    Application,
    SignInExperience,
    Organization,
    Distributor,
    Reseller,
    Customer,
    User,
}

impl OperationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Scope => "scope",
            Self::OrganizationScope => "organization-scope",
            Self::OrganizationRole => "organization-role",
            Self::OrganizationRoleScope => "organization-role-scope",
            Self::UserRole => "user-role",
            Self::UserRolePermission => "user-role-permission",
            Self::Application => "application",
            Self::SignInExperience => "sign-in-experience",
            Self::Organization => "organization",
            Self::Distributor => "distributor",
            Self::Reseller => "reseller",
            Self::Customer => "customer",
            Self::User => "user",
        }
    }
}

impl From<OrgKind> for OperationKind {
    fn from(kind: OrgKind) -> Self {
        match kind {
            OrgKind::Distributor => Self::Distributor,
            OrgKind::Reseller => Self::Reseller,
            OrgKind::Customer => Self::Customer,
        }
    }
}

impl From<HierarchyKind> for OperationKind {
    fn from(kind: HierarchyKind) -> Self {
        match kind {
            HierarchyKind::Distributor => Self::Distributor,
            HierarchyKind::Reseller => Self::Reseller,
            HierarchyKind::Customer => Self::Customer,
            HierarchyKind::User => Self::User,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OperationAction
// ---------------------------------------------------------------------------

/// Action recorded on a report operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OperationAction {
    Create,
    Update,
    Delete,
    Cleanup,
    Assign,
    Remove,
    CreateBranding,
    CreateScopes,
    UpdateBranding,
    UpdateScopes,
    Build,
    Upsert,
    Skip,
    Suspend,
    Reactivate,
}

impl OperationAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Cleanup => "cleanup",
            Self::Assign => "assign",
            Self::Remove => "remove",
            Self::CreateBranding => "create_branding",
            Self::CreateScopes => "create_scopes",
            Self::UpdateBranding => "update_branding",
            Self::UpdateScopes => "update_scopes",
            Self::Build => "build",
            Self::Upsert => "upsert",
            Self::Skip => "skip",
            Self::Suspend => "suspend",
            Self::Reactivate => "reactivate",
        }
    }
}

impl fmt::Display for OperationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of state change recorded in the hierarchy audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Suspended,
    Reactivated,
    Deleted,
    Purged,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Suspended => "suspended",
            Self::Reactivated => "reactivated",
            Self::Deleted => "deleted",
            Self::Purged => "purged",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected_str:expr) => {
            #[test]
            fn $name() {
                let val = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected_str));
                let recovered: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(recovered, val);
                assert_eq!(val.as_str(), $expected_str);
            }
        };
    }

    test_serde_roundtrip!(org_kind_reseller, OrgKind, OrgKind::Reseller, "reseller");
    test_serde_roundtrip!(
        hierarchy_kind_user,
        HierarchyKind,
        HierarchyKind::User,
        "user"
    );
    test_serde_roundtrip!(
        status_suspended,
        EntityStatus,
        EntityStatus::Suspended,
        "suspended"
    );
    test_serde_roundtrip!(
        op_kind_org_role_scope,
        OperationKind,
        OperationKind::OrganizationRoleScope,
        "organization-role-scope"
    );
    test_serde_roundtrip!(
        op_kind_sign_in,
        OperationKind,
        OperationKind::SignInExperience,
        "sign-in-experience"
    );
    test_serde_roundtrip!(
        op_action_update_branding,
        OperationAction,
        OperationAction::UpdateBranding,
        "update_branding"
    );
    test_serde_roundtrip!(audit_purged, AuditAction, AuditAction::Purged, "purged");

    #[test]
    fn org_kind_marker_is_exact() {
        assert_eq!(OrgKind::from_marker("distributor"), Some(OrgKind::Distributor));
        assert_eq!(OrgKind::from_marker("customer"), Some(OrgKind::Customer));
        assert_eq!(OrgKind::from_marker("Distributor"), None);
        assert_eq!(OrgKind::from_marker("partner"), None);
        assert_eq!(OrgKind::from_marker(""), None);
    }

    #[test]
    fn status_transitions() {
        assert!(EntityStatus::Active.can_transition_to(EntityStatus::Suspended));
        assert!(EntityStatus::Suspended.can_transition_to(EntityStatus::Active));
        assert!(EntityStatus::Suspended.can_transition_to(EntityStatus::Deleted));
        assert!(!EntityStatus::Active.can_transition_to(EntityStatus::Active));
        assert!(!EntityStatus::Deleted.can_transition_to(EntityStatus::Active));
        assert!(EntityStatus::Deleted.allowed_next_states().is_empty());
    }

    #[test]
    fn hierarchy_depth_follows_root_first_order() {
        for (idx, kind) in HierarchyKind::ALL.iter().enumerate() {
            assert_eq!(kind.depth(), idx);
        }
        assert_eq!(HierarchyKind::User.org_kind(), None);
        assert_eq!(
            HierarchyKind::from(OrgKind::Reseller).org_kind(),
            Some(OrgKind::Reseller)
        );
    }
}
