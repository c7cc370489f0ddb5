//! Database error types for orgsync-db.

use orgsync_core::enums::{EntityStatus, HierarchyKind};
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// No live row with this id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: HierarchyKind, id: String },

    /// The row exists but cannot move to the requested state.
    #[error("{kind} {id} cannot go from {from} to {to}")]
    InvalidTransition {
        kind: HierarchyKind,
        id: String,
        from: EntityStatus,
        to: EntityStatus,
    },

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
