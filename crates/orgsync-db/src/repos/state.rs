//! Suspension, reactivation, and deletion for every hierarchy level.
//!
//! Direct transitions never set `suspended_by_org_id`; cascade transitions
//! always do, so a cascade reactivation only touches rows its own origin
//! suspended. Bulk steps run in one transaction per level.

use chrono::Utc;

use orgsync_core::entities::AffectedEntity;
use orgsync_core::enums::{AuditAction, EntityStatus, HierarchyKind};

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parent_expr, placeholders, table_for};
use crate::repos::audit::append_audit_on;
use crate::service::HierarchyService;

/// Parent ids bound per `IN (...)` query, well under SQLite's variable limit.
const MAX_BOUND_PARENTS: usize = 500;

impl HierarchyService {
    /// Current status of a row, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn entity_status(
        &self,
        kind: HierarchyKind,
        id: &str,
    ) -> Result<Option<EntityStatus>, DatabaseError> {
        let sql = format!(
            "SELECT suspended_at, deleted_at FROM {} WHERE id = ?1",
            table_for(kind)
        );
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let status = if get_opt_string(&row, 1)?.is_some() {
            EntityStatus::Deleted
        } else if get_opt_string(&row, 0)?.is_some() {
            EntityStatus::Suspended
        } else {
            EntityStatus::Active
        };
        Ok(Some(status))
    }

    /// Remote id of a row, if it has one.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if the row does not exist.
    pub async fn remote_id_of(
        &self,
        kind: HierarchyKind,
        id: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let sql = format!("SELECT remote_id FROM {} WHERE id = ?1", table_for(kind));
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            kind,
            id: id.to_string(),
        })?;
        get_opt_string(&row, 0)
    }

    async fn require_transition(
        &self,
        kind: HierarchyKind,
        id: &str,
        to: EntityStatus,
    ) -> Result<(), DatabaseError> {
        let from = self
            .entity_status(kind, id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound {
                kind,
                id: id.to_string(),
            })?;
        if from.can_transition_to(to) {
            Ok(())
        } else {
            Err(DatabaseError::InvalidTransition {
                kind,
                id: id.to_string(),
                from,
                to,
            })
        }
    }

    async fn suspend_one(
        &self,
        kind: HierarchyKind,
        id: &str,
        origin: Option<&str>,
    ) -> Result<(), DatabaseError> {
        self.require_transition(kind, id, EntityStatus::Suspended)
            .await?;
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        let changed = tx
            .execute(
                &format!(
                    "UPDATE {} SET suspended_at = ?1, suspended_by_org_id = ?2, updated_at = ?1
                     WHERE id = ?3 AND deleted_at IS NULL AND suspended_at IS NULL",
                    table_for(kind)
                ),
                libsql::params![now.to_rfc3339(), origin, id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        append_audit_on(&tx, kind, id, AuditAction::Suspended, origin, now).await?;
        tx.commit().await?;
        tracing::debug!(%kind, id, origin, "suspended");
        Ok(())
    }

    /// Suspend one row directly. No cascade origin is recorded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing row and `InvalidTransition` when the
    /// row is deleted or already suspended.
    pub async fn suspend(&self, kind: HierarchyKind, id: &str) -> Result<(), DatabaseError> {
        self.suspend_one(kind, id, None).await
    }

    /// Suspend one row on behalf of the cascade started at `origin`.
    ///
    /// # Errors
    ///
    /// Same as [`HierarchyService::suspend`].
    pub async fn suspend_with_cascade_origin(
        &self,
        kind: HierarchyKind,
        id: &str,
        origin: &str,
    ) -> Result<(), DatabaseError> {
        self.suspend_one(kind, id, Some(origin)).await
    }

    /// Suspend every live, active direct child of `parent_org_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction fails; nothing is changed then.
    pub async fn suspend_by_created_by(
        &self,
        kind: HierarchyKind,
        parent_org_id: &str,
        origin: &str,
    ) -> Result<Vec<AffectedEntity>, DatabaseError> {
        self.suspend_children(kind, &[parent_org_id.to_string()], origin)
            .await
    }

    /// Suspend every live, active row of `kind` whose parent is in `parents`,
    /// in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction fails; nothing is changed then.
    pub async fn suspend_children(
        &self,
        kind: HierarchyKind,
        parents: &[String],
        origin: &str,
    ) -> Result<Vec<AffectedEntity>, DatabaseError> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }
        let table = table_for(kind);
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;

        let mut affected = Vec::new();
        for chunk in parents.chunks(MAX_BOUND_PARENTS) {
            let sql = format!(
                "SELECT id, remote_id FROM {table}
                 WHERE {} IN ({}) AND deleted_at IS NULL AND suspended_at IS NULL
                 ORDER BY created_at, rowid",
                parent_expr(kind),
                placeholders(1, chunk.len())
            );
            let params: Vec<libsql::Value> = chunk.iter().map(|p| p.as_str().into()).collect();
            let mut rows = tx.query(&sql, libsql::params_from_iter(params)).await?;
            while let Some(row) = rows.next().await? {
                affected.push(AffectedEntity {
                    id: row.get::<String>(0)?,
                    remote_id: get_opt_string(&row, 1)?,
                });
            }
        }

        for entity in &affected {
            tx.execute(
                &format!(
                    "UPDATE {table} SET suspended_at = ?1, suspended_by_org_id = ?2, updated_at = ?1
                     WHERE id = ?3"
                ),
                libsql::params![now.to_rfc3339(), origin, entity.id.as_str()],
            )
            .await?;
            append_audit_on(
                &tx,
                kind,
                &entity.id,
                AuditAction::Suspended,
                Some(origin),
                now,
            )
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(%kind, origin, count = affected.len(), "cascade suspended level");
        Ok(affected)
    }

    /// Live rows of `kind` currently stamped with the cascade `origin`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn cascade_members(
        &self,
        kind: HierarchyKind,
        origin: &str,
    ) -> Result<Vec<AffectedEntity>, DatabaseError> {
        let sql = format!(
            "SELECT id, remote_id FROM {} WHERE suspended_by_org_id = ?1 AND deleted_at IS NULL
             ORDER BY created_at, rowid",
            table_for(kind)
        );
        let mut rows = self.db().conn().query(&sql, [origin]).await?;
        let mut members = Vec::new();
        while let Some(row) = rows.next().await? {
            members.push(AffectedEntity {
                id: row.get::<String>(0)?,
                remote_id: get_opt_string(&row, 1)?,
            });
        }
        Ok(members)
    }

    /// Reactivate one row directly, clearing any cascade origin.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing row and `InvalidTransition` unless
    /// the row is suspended.
    pub async fn reactivate(&self, kind: HierarchyKind, id: &str) -> Result<(), DatabaseError> {
        self.require_transition(kind, id, EntityStatus::Active)
            .await?;
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        let changed = tx
            .execute(
                &format!(
                    "UPDATE {} SET suspended_at = NULL, suspended_by_org_id = NULL, updated_at = ?1
                     WHERE id = ?2 AND deleted_at IS NULL AND suspended_at IS NOT NULL",
                    table_for(kind)
                ),
                libsql::params![now.to_rfc3339(), id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        append_audit_on(&tx, kind, id, AuditAction::Reactivated, None, now).await?;
        tx.commit().await?;
        tracing::debug!(%kind, id, "reactivated");
        Ok(())
    }

    /// Reactivate every live row of `kind` suspended by the cascade `origin`,
    /// in a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction fails; nothing is changed then.
    pub async fn reactivate_by_suspended_by_org_id(
        &self,
        kind: HierarchyKind,
        origin: &str,
    ) -> Result<Vec<AffectedEntity>, DatabaseError> {
        let table = table_for(kind);
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;

        let mut rows = tx
            .query(
                &format!(
                    "SELECT id, remote_id FROM {table}
                     WHERE suspended_by_org_id = ?1 AND deleted_at IS NULL
                     ORDER BY created_at, rowid"
                ),
                [origin],
            )
            .await?;
        let mut affected = Vec::new();
        while let Some(row) = rows.next().await? {
            affected.push(AffectedEntity {
                id: row.get::<String>(0)?,
                remote_id: get_opt_string(&row, 1)?,
            });
        }
        drop(rows);

        for entity in &affected {
            tx.execute(
                &format!(
                    "UPDATE {table} SET suspended_at = NULL, suspended_by_org_id = NULL, updated_at = ?1
                     WHERE id = ?2"
                ),
                libsql::params![now.to_rfc3339(), entity.id.as_str()],
            )
            .await?;
            append_audit_on(
                &tx,
                kind,
                &entity.id,
                AuditAction::Reactivated,
                Some(origin),
                now,
            )
            .await?;
        }
        tx.commit().await?;

        tracing::debug!(%kind, origin, count = affected.len(), "cascade reactivated level");
        Ok(affected)
    }

    /// Mark a row deleted. It disappears from listings and remote-id lookups.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing row and `InvalidTransition` if it is
    /// already deleted.
    pub async fn soft_delete(&self, kind: HierarchyKind, id: &str) -> Result<(), DatabaseError> {
        self.require_transition(kind, id, EntityStatus::Deleted)
            .await?;
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        tx.execute(
            &format!(
                "UPDATE {} SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                table_for(kind)
            ),
            libsql::params![now.to_rfc3339(), id],
        )
        .await?;
        append_audit_on(&tx, kind, id, AuditAction::Deleted, None, now).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Remove a row permanently. The audit log keeps a `purged` entry.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row has this id.
    pub async fn hard_delete(&self, kind: HierarchyKind, id: &str) -> Result<(), DatabaseError> {
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;
        let changed = tx
            .execute(&format!("DELETE FROM {} WHERE id = ?1", table_for(kind)), [id])
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        append_audit_on(&tx, kind, id, AuditAction::Purged, None, now).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Number of rows of `kind` that are not soft-deleted.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_live(&self, kind: HierarchyKind) -> Result<u64, DatabaseError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
            table_for(kind)
        );
        let mut rows = self.db().conn().query(&sql, ()).await?;
        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Permanently remove every row of `kind` that is not soft-deleted, in a
    /// single transaction. Each removed row gets a `purged` audit entry.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the transaction fails; nothing is changed then.
    pub async fn purge_live(&self, kind: HierarchyKind) -> Result<Vec<String>, DatabaseError> {
        let table = table_for(kind);
        let now = Utc::now();
        let tx = self.db().conn().transaction().await?;

        let mut rows = tx
            .query(
                &format!("SELECT id FROM {table} WHERE deleted_at IS NULL ORDER BY created_at, rowid"),
                (),
            )
            .await?;
        let mut purged = Vec::new();
        while let Some(row) = rows.next().await? {
            purged.push(row.get::<String>(0)?);
        }
        drop(rows);

        tx.execute(&format!("DELETE FROM {table} WHERE deleted_at IS NULL"), ())
            .await?;
        for id in &purged {
            append_audit_on(&tx, kind, id, AuditAction::Purged, None, now).await?;
        }
        tx.commit().await?;

        tracing::debug!(%kind, count = purged.len(), "purged live rows");
        Ok(purged)
    }
}
