//! Organization repository: distributors, resellers, and customers.
//!
//! The three tables share one shape; the [`OrgKind`] picks the table.

use chrono::Utc;

use orgsync_core::entities::Organization;
use orgsync_core::enums::{AuditAction, HierarchyKind, OrgKind};
use orgsync_core::ids::prefix_for;

use crate::error::DatabaseError;
use crate::helpers::{
    get_opt_datetime, get_opt_string, parse_datetime, parse_optional_json, table_for,
};
use crate::repos::UpsertOutcome;
use crate::repos::audit::append_audit_on;
use crate::service::HierarchyService;

const ORG_COLUMNS: &str = "id, remote_id, name, description, custom_data, created_at, updated_at, \
                           synced_at, suspended_at, suspended_by_org_id, deleted_at";

fn row_to_organization(kind: OrgKind, row: &libsql::Row) -> Result<Organization, DatabaseError> {
    Ok(Organization {
        id: row.get::<String>(0)?,
        kind,
        remote_id: get_opt_string(row, 1)?,
        name: row.get::<String>(2)?,
        description: get_opt_string(row, 3)?,
        custom_data: parse_optional_json(get_opt_string(row, 4)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
        synced_at: get_opt_datetime(row, 7)?,
        suspended_at: get_opt_datetime(row, 8)?,
        suspended_by_org_id: get_opt_string(row, 9)?,
        deleted_at: get_opt_datetime(row, 10)?,
    })
}

/// Fields written when a remote organization is pulled.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationUpsert {
    pub kind: OrgKind,
    pub remote_id: String,
    pub name: String,
    pub description: Option<String>,
    pub custom_data: Option<serde_json::Value>,
}

impl HierarchyService {
    /// Fetch an organization by local id, including soft-deleted rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no row has this id.
    pub async fn get_organization(
        &self,
        kind: OrgKind,
        id: &str,
    ) -> Result<Organization, DatabaseError> {
        let sql = format!(
            "SELECT {ORG_COLUMNS} FROM {} WHERE id = ?1",
            table_for(kind.into())
        );
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            kind: kind.into(),
            id: id.to_string(),
        })?;
        row_to_organization(kind, &row)
    }

    /// Live organization of `kind` with this remote id.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_organization_by_remote_id(
        &self,
        kind: OrgKind,
        remote_id: &str,
    ) -> Result<Option<Organization>, DatabaseError> {
        let sql = format!(
            "SELECT {ORG_COLUMNS} FROM {} WHERE remote_id = ?1 AND deleted_at IS NULL",
            table_for(kind.into())
        );
        let mut rows = self.db().conn().query(&sql, [remote_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_organization(kind, &row)?)),
            None => Ok(None),
        }
    }

    /// Live organization with this remote id in any of the three tables.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn find_organization_any_kind(
        &self,
        remote_id: &str,
    ) -> Result<Option<Organization>, DatabaseError> {
        for kind in OrgKind::ALL {
            if let Some(org) = self.find_organization_by_remote_id(kind, remote_id).await? {
                return Ok(Some(org));
            }
        }
        Ok(None)
    }

    /// Live organizations of `kind` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_organizations(
        &self,
        kind: OrgKind,
    ) -> Result<Vec<Organization>, DatabaseError> {
        let sql = format!(
            "SELECT {ORG_COLUMNS} FROM {} WHERE deleted_at IS NULL ORDER BY created_at, rowid",
            table_for(kind.into())
        );
        let mut rows = self.db().conn().query(&sql, ()).await?;
        let mut orgs = Vec::new();
        while let Some(row) = rows.next().await? {
            orgs.push(row_to_organization(kind, &row)?);
        }
        Ok(orgs)
    }

    /// Insert or update the live row matching `org.remote_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a statement fails.
    pub async fn upsert_organization(
        &self,
        org: &OrganizationUpsert,
    ) -> Result<(Organization, UpsertOutcome), DatabaseError> {
        let kind: HierarchyKind = org.kind.into();
        let table = table_for(kind);
        let now = Utc::now().to_rfc3339();
        let custom_data = org.custom_data.as_ref().map(ToString::to_string);
        let existing = self
            .find_organization_by_remote_id(org.kind, &org.remote_id)
            .await?;

        let tx = self.db().conn().transaction().await?;
        let (id, outcome, action) = if let Some(existing) = existing {
            tx.execute(
                &format!(
                    "UPDATE {table} SET name = ?1, description = ?2, custom_data = ?3,
                     updated_at = ?4, synced_at = ?4 WHERE id = ?5"
                ),
                libsql::params![
                    org.name.as_str(),
                    org.description.as_deref(),
                    custom_data.as_deref(),
                    now.as_str(),
                    existing.id.as_str()
                ],
            )
            .await?;
            (existing.id, UpsertOutcome::Updated, AuditAction::Updated)
        } else {
            let id = crate::generate_id_on(&tx, prefix_for(kind)).await?;
            tx.execute(
                &format!(
                    "INSERT INTO {table} (id, remote_id, name, description, custom_data,
                     created_at, updated_at, synced_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6, ?6)"
                ),
                libsql::params![
                    id.as_str(),
                    org.remote_id.as_str(),
                    org.name.as_str(),
                    org.description.as_deref(),
                    custom_data.as_deref(),
                    now.as_str()
                ],
            )
            .await?;
            (id, UpsertOutcome::Created, AuditAction::Created)
        };
        append_audit_on(&tx, kind, &id, action, None, Utc::now()).await?;
        tx.commit().await?;

        tracing::debug!(kind = %org.kind, remote_id = %org.remote_id, ?outcome, "organization upserted");
        Ok((self.get_organization(org.kind, &id).await?, outcome))
    }
}
