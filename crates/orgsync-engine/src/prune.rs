//! Prune: remove every organization and user from the identity provider and
//! clear the local hierarchy store.
//!
//! The bootstrap organization and user are kept unless `include_owner` is
//! set. A failed delete is recorded and the run moves on to the next entity.
//! A dry run only lists and counts.

use orgsync_client::RemoteClient;
use orgsync_core::constants::{BOOTSTRAP_ORGANIZATION_NAME, BOOTSTRAP_USER_NAME};
use orgsync_core::entities::{RemoteOrganization, RemoteUser};
use orgsync_core::enums::{HierarchyKind, OperationAction, OperationKind};
use orgsync_db::HierarchyService;

use crate::error::EngineError;
use crate::report::{Operation, PruneReport};

/// Leaf level first.
const LOCAL_PURGE_ORDER: [HierarchyKind; 4] = [
    HierarchyKind::User,
    HierarchyKind::Customer,
    HierarchyKind::Reseller,
    HierarchyKind::Distributor,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PruneOptions {
    pub dry_run: bool,
    /// Delete the bootstrap organization and user too.
    pub include_owner: bool,
}

pub struct Pruner<'a> {
    client: &'a dyn RemoteClient,
    store: Option<&'a HierarchyService>,
    options: PruneOptions,
}

fn is_bootstrap_organization(org: &RemoteOrganization) -> bool {
    org.name == BOOTSTRAP_ORGANIZATION_NAME
}

fn is_bootstrap_user(user: &RemoteUser) -> bool {
    user.username
        .as_deref()
        .is_some_and(|u| u.eq_ignore_ascii_case(BOOTSTRAP_USER_NAME))
}

fn user_label(user: &RemoteUser) -> String {
    user.username.clone().unwrap_or_else(|| user.id.clone())
}

impl<'a> Pruner<'a> {
    /// `store` is `None` to leave the local database untouched.
    pub const fn new(
        client: &'a dyn RemoteClient,
        store: Option<&'a HierarchyService>,
        options: PruneOptions,
    ) -> Self {
        Self {
            client,
            store,
            options,
        }
    }

    /// Delete remote organizations, then remote users, then local rows.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Step` if a listing fails and
    /// `EngineError::Database` if the local purge fails. Individual deletes
    /// that fail are recorded in the report instead.
    pub async fn run(&self) -> Result<PruneReport, EngineError> {
        tracing::warn!(
            dry_run = self.options.dry_run,
            include_owner = self.options.include_owner,
            "starting prune"
        );
        let mut report = PruneReport::new(self.options.dry_run);

        self.prune_organizations(&mut report).await?;
        self.prune_users(&mut report).await?;
        if let Some(store) = self.store {
            self.purge_local(store, &mut report).await?;
        }

        report.finish();
        tracing::info!(
            success = report.success,
            organizations = report.summary.organizations_deleted,
            users = report.summary.users_deleted,
            "prune finished"
        );
        Ok(report)
    }

    async fn prune_organizations(&self, report: &mut PruneReport) -> Result<(), EngineError> {
        let orgs = self
            .client
            .list_organizations()
            .await
            .map_err(|e| EngineError::step("failed to fetch organizations", e))?;
        tracing::info!(count = orgs.len(), "fetched remote organizations");

        for org in &orgs {
            if !self.options.include_owner && is_bootstrap_organization(org) {
                report.summary.organizations_skipped += 1;
                report.record(Operation::new(
                    OperationKind::Organization,
                    OperationAction::Skip,
                    &org.name,
                    "Owner organization kept",
                    None,
                ));
                continue;
            }
            if self.options.dry_run {
                report.summary.organizations_deleted += 1;
                report.record(Operation::new(
                    OperationKind::Organization,
                    OperationAction::Delete,
                    &org.name,
                    format!("Would delete organization {}", org.id),
                    None,
                ));
                continue;
            }
            match self.client.delete_organization(&org.id).await {
                Ok(()) => {
                    report.summary.organizations_deleted += 1;
                    report.record(Operation::new(
                        OperationKind::Organization,
                        OperationAction::Delete,
                        &org.name,
                        format!("Deleted organization {}", org.id),
                        None,
                    ));
                }
                Err(err) => {
                    report.summary.organizations_skipped += 1;
                    report
                        .errors
                        .push(format!("Failed to delete organization {}: {err}", org.name));
                    report.record(Operation::new(
                        OperationKind::Organization,
                        OperationAction::Delete,
                        &org.name,
                        format!("Delete organization {}", org.id),
                        Some(err.to_string()),
                    ));
                }
            }
        }
        Ok(())
    }

    async fn prune_users(&self, report: &mut PruneReport) -> Result<(), EngineError> {
        let users = self
            .client
            .list_users()
            .await
            .map_err(|e| EngineError::step("failed to fetch users", e))?;
        tracing::info!(count = users.len(), "fetched remote users");

        for user in &users {
            let label = user_label(user);
            if !self.options.include_owner && is_bootstrap_user(user) {
                report.summary.users_skipped += 1;
                report.record(Operation::new(
                    OperationKind::User,
                    OperationAction::Skip,
                    &label,
                    "Owner user kept",
                    None,
                ));
                continue;
            }
            if self.options.dry_run {
                report.summary.users_deleted += 1;
                report.record(Operation::new(
                    OperationKind::User,
                    OperationAction::Delete,
                    &label,
                    format!("Would delete user {}", user.id),
                    None,
                ));
                continue;
            }
            match self.client.delete_user(&user.id).await {
                Ok(()) => {
                    report.summary.users_deleted += 1;
                    report.record(Operation::new(
                        OperationKind::User,
                        OperationAction::Delete,
                        &label,
                        format!("Deleted user {}", user.id),
                        None,
                    ));
                }
                Err(err) => {
                    report.summary.users_skipped += 1;
                    report
                        .errors
                        .push(format!("Failed to delete user {label}: {err}"));
                    report.record(Operation::new(
                        OperationKind::User,
                        OperationAction::Delete,
                        &label,
                        format!("Delete user {}", user.id),
                        Some(err.to_string()),
                    ));
                }
            }
        }
        Ok(())
    }

    async fn purge_local(
        &self,
        store: &HierarchyService,
        report: &mut PruneReport,
    ) -> Result<(), EngineError> {
        for kind in LOCAL_PURGE_ORDER {
            let count = if self.options.dry_run {
                store.count_live(kind).await?
            } else {
                u64::try_from(store.purge_live(kind).await?.len()).unwrap_or_default()
            };
            let count = u32::try_from(count).unwrap_or(u32::MAX);
            report.summary.add_local(kind, count);
            if count > 0 {
                let verb = if self.options.dry_run { "Would purge" } else { "Purged" };
                report.record(Operation::new(
                    kind.into(),
                    OperationAction::Cleanup,
                    kind.to_string(),
                    format!("{verb} {count} local row(s)"),
                    None,
                ));
            }
        }
        report.local_store = true;
        Ok(())
    }
}
