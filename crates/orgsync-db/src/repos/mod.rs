//! Repository methods on [`crate::HierarchyService`].

pub mod audit;
pub mod organization;
pub mod state;
pub mod user;

pub use organization::OrganizationUpsert;
pub use user::UserUpsert;

/// Whether an upsert inserted a new row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}
