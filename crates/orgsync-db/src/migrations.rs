//! Database migration runner.
//!
//! Embeds the SQL migration files at compile time and executes them on
//! database open. All statements use `IF NOT EXISTS` for idempotent re-running.

use crate::SyncDb;
use crate::error::DatabaseError;

/// Hierarchy tables, the audit log, and their indexes.
const MIGRATION_001: &str = include_str!("../migrations/001_hierarchy.sql");

impl SyncDb {
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(MIGRATION_001)
            .await
            .map_err(|e| DatabaseError::Migration(format!("001_hierarchy: {e}")))?;
        Ok(())
    }
}
