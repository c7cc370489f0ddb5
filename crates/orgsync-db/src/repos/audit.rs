//! Hierarchy audit repository.
//!
//! Append-only rows recording every create, update, and state transition.

use chrono::{DateTime, Utc};

use orgsync_core::entities::HierarchyAuditEntry;
use orgsync_core::enums::{AuditAction, HierarchyKind};
use orgsync_core::ids::PREFIX_AUDIT;

use crate::error::DatabaseError;
use crate::generate_id_on;
use crate::helpers::{get_opt_string, parse_datetime, parse_enum};
use crate::service::HierarchyService;

/// Append an audit row on `conn`, which may be an open transaction.
pub(crate) async fn append_audit_on(
    conn: &libsql::Connection,
    kind: HierarchyKind,
    entity_id: &str,
    action: AuditAction,
    origin: Option<&str>,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    let id = generate_id_on(conn, PREFIX_AUDIT).await?;
    conn.execute(
        "INSERT INTO hierarchy_audit (id, entity_kind, entity_id, action, origin, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        libsql::params![
            id.as_str(),
            kind.as_str(),
            entity_id,
            action.as_str(),
            origin,
            at.to_rfc3339()
        ],
    )
    .await?;
    Ok(())
}

fn row_to_entry(row: &libsql::Row) -> Result<HierarchyAuditEntry, DatabaseError> {
    Ok(HierarchyAuditEntry {
        id: row.get::<String>(0)?,
        entity_kind: parse_enum(&row.get::<String>(1)?)?,
        entity_id: row.get::<String>(2)?,
        action: parse_enum(&row.get::<String>(3)?)?,
        origin: get_opt_string(row, 4)?,
        created_at: parse_datetime(&row.get::<String>(5)?)?,
    })
}

impl HierarchyService {
    /// Audit history of one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn audit_for(
        &self,
        kind: HierarchyKind,
        entity_id: &str,
    ) -> Result<Vec<HierarchyAuditEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, entity_kind, entity_id, action, origin, created_at
                 FROM hierarchy_audit WHERE entity_kind = ?1 AND entity_id = ?2
                 ORDER BY created_at, rowid",
                [kind.as_str(), entity_id],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }

    /// Every audit row stamped with cascade `origin`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn audit_by_origin(
        &self,
        origin: &str,
    ) -> Result<Vec<HierarchyAuditEntry>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id, entity_kind, entity_id, action, origin, created_at
                 FROM hierarchy_audit WHERE origin = ?1
                 ORDER BY created_at, rowid",
                [origin],
            )
            .await?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(row_to_entry(&row)?);
        }
        Ok(entries)
    }
}
