//! Service layer over the hierarchy store.
//!
//! `HierarchyService` wraps `SyncDb`; the repository methods in
//! [`crate::repos`] are implemented as `impl HierarchyService` blocks. Every
//! state transition appends a `hierarchy_audit` row in the same statement
//! batch or transaction as the change it records.

use crate::SyncDb;
use crate::error::DatabaseError;

pub struct HierarchyService {
    db: SyncDb,
}

impl HierarchyService {
    /// Open (and migrate) a local store at `db_path`, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn open_local(db_path: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            db: SyncDb::open_local(db_path).await?,
        })
    }

    #[must_use]
    pub const fn from_db(db: SyncDb) -> Self {
        Self { db }
    }

    #[must_use]
    pub const fn db(&self) -> &SyncDb {
        &self.db
    }
}
