use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuditAction, EntityStatus, HierarchyKind, OrgKind};

/// Lifecycle status from the suspension and deletion timestamps.
const fn status_from(
    suspended_at: Option<&DateTime<Utc>>,
    deleted_at: Option<&DateTime<Utc>>,
) -> EntityStatus {
    if deleted_at.is_some() {
        EntityStatus::Deleted
    } else if suspended_at.is_some() {
        EntityStatus::Suspended
    } else {
        EntityStatus::Active
    }
}

/// A distributor, reseller, or customer in the local store.
///
/// The parent link lives in `custom_data.createdBy` and holds the parent's
/// remote organization id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Organization {
    pub id: String,
    pub kind: OrgKind,
    pub remote_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub custom_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    /// Remote id of the ancestor whose cascade suspended this row.
    pub suspended_by_org_id: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Organization {
    #[must_use]
    pub const fn status(&self) -> EntityStatus {
        status_from(self.suspended_at.as_ref(), self.deleted_at.as_ref())
    }

    /// Remote id of the parent organization, if recorded.
    #[must_use]
    pub fn created_by(&self) -> Option<&str> {
        self.custom_data.as_ref()?.get("createdBy")?.as_str()
    }
}

/// A user in the local store, attached to an organization by remote id.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LocalUser {
    pub id: String,
    pub remote_id: Option<String>,
    pub username: String,
    pub email: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub organization_id: Option<String>,
    pub user_role_ids: Vec<String>,
    pub custom_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
    pub suspended_at: Option<DateTime<Utc>>,
    pub suspended_by_org_id: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LocalUser {
    #[must_use]
    pub const fn status(&self) -> EntityStatus {
        status_from(self.suspended_at.as_ref(), self.deleted_at.as_ref())
    }
}

/// A row touched by a bulk cascade step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AffectedEntity {
    pub id: String,
    pub remote_id: Option<String>,
}

/// Append-only record of a hierarchy state transition.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct HierarchyAuditEntry {
    pub id: String,
    pub entity_kind: HierarchyKind,
    pub entity_id: String,
    pub action: AuditAction,
    /// Remote id of the cascade origin, `None` for direct actions.
    pub origin: Option<String>,
    pub created_at: DateTime<Utc>,
}
