//! User repository.

use chrono::Utc;

use orgsync_core::entities::LocalUser;
use orgsync_core::enums::{AuditAction, HierarchyKind};
use orgsync_core::ids::PREFIX_USER;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_datetime, get_opt_string, parse_datetime, parse_optional_json};
use crate::repos::UpsertOutcome;
use crate::repos::audit::append_audit_on;
use crate::service::HierarchyService;

const USER_COLUMNS: &str = "id, remote_id, username, email, name, phone, organization_id, \
                            user_role_ids, custom_data, created_at, updated_at, synced_at, \
                            suspended_at, suspended_by_org_id, deleted_at";

fn row_to_user(row: &libsql::Row) -> Result<LocalUser, DatabaseError> {
    let role_ids = row.get::<String>(7)?;
    Ok(LocalUser {
        id: row.get::<String>(0)?,
        remote_id: get_opt_string(row, 1)?,
        username: row.get::<String>(2)?,
        email: get_opt_string(row, 3)?,
        name: row.get::<String>(4)?,
        phone: get_opt_string(row, 5)?,
        organization_id: get_opt_string(row, 6)?,
        user_role_ids: serde_json::from_str(&role_ids)
            .map_err(|e| DatabaseError::Query(format!("Invalid user_role_ids: {e}")))?,
        custom_data: parse_optional_json(get_opt_string(row, 8)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(9)?)?,
        updated_at: parse_datetime(&row.get::<String>(10)?)?,
        synced_at: get_opt_datetime(row, 11)?,
        suspended_at: get_opt_datetime(row, 12)?,
        suspended_by_org_id: get_opt_string(row, 13)?,
        deleted_at: get_opt_datetime(row, 14)?,
    })
}

/// Fields written when a remote user is pulled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UserUpsert {
    pub remote_id: String,
    pub username: String,
    pub email: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    /// Remote id of the owning organization.
    pub organization_id: Option<String>,
    pub user_role_ids: Vec<String>,
    pub custom_data: Option<serde_json::Value>,
}

impl HierarchyService {
    /// Fetch a user by local id, including soft-deleted rows.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no row has this id.
    pub async fn get_user(&self, id: &str) -> Result<LocalUser, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let mut rows = self.db().conn().query(&sql, [id]).await?;
        let row = rows.next().await?.ok_or_else(|| DatabaseError::NotFound {
            kind: HierarchyKind::User,
            id: id.to_string(),
        })?;
        row_to_user(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_user_by_remote_id(
        &self,
        remote_id: &str,
    ) -> Result<Option<LocalUser>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE remote_id = ?1 AND deleted_at IS NULL"
        );
        let mut rows = self.db().conn().query(&sql, [remote_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Live users in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_users(&self) -> Result<Vec<LocalUser>, DatabaseError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY created_at, rowid"
        );
        let mut rows = self.db().conn().query(&sql, ()).await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Insert or update the live row matching `user.remote_id`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a statement fails or role ids cannot be encoded.
    pub async fn upsert_user(
        &self,
        user: &UserUpsert,
    ) -> Result<(LocalUser, UpsertOutcome), DatabaseError> {
        let now = Utc::now().to_rfc3339();
        let role_ids =
            serde_json::to_string(&user.user_role_ids).map_err(|e| DatabaseError::Other(e.into()))?;
        let custom_data = user.custom_data.as_ref().map(ToString::to_string);
        let existing = self.find_user_by_remote_id(&user.remote_id).await?;

        let tx = self.db().conn().transaction().await?;
        let (id, outcome, action) = if let Some(existing) = existing {
            tx.execute(
                "UPDATE users SET username = ?1, email = ?2, name = ?3, phone = ?4,
                 organization_id = ?5, user_role_ids = ?6, custom_data = ?7,
                 updated_at = ?8, synced_at = ?8 WHERE id = ?9",
                libsql::params![
                    user.username.as_str(),
                    user.email.as_deref(),
                    user.name.as_str(),
                    user.phone.as_deref(),
                    user.organization_id.as_deref(),
                    role_ids.as_str(),
                    custom_data.as_deref(),
                    now.as_str(),
                    existing.id.as_str()
                ],
            )
            .await?;
            (existing.id, UpsertOutcome::Updated, AuditAction::Updated)
        } else {
            let id = crate::generate_id_on(&tx, PREFIX_USER).await?;
            tx.execute(
                "INSERT INTO users (id, remote_id, username, email, name, phone, organization_id,
                 user_role_ids, custom_data, created_at, updated_at, synced_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, ?10)",
                libsql::params![
                    id.as_str(),
                    user.remote_id.as_str(),
                    user.username.as_str(),
                    user.email.as_deref(),
                    user.name.as_str(),
                    user.phone.as_deref(),
                    user.organization_id.as_deref(),
                    role_ids.as_str(),
                    custom_data.as_deref(),
                    now.as_str()
                ],
            )
            .await?;
            (id, UpsertOutcome::Created, AuditAction::Created)
        };
        append_audit_on(&tx, HierarchyKind::User, &id, action, None, Utc::now()).await?;
        tx.commit().await?;

        tracing::debug!(remote_id = %user.remote_id, ?outcome, "user upserted");
        Ok((self.get_user(&id).await?, outcome))
    }
}
