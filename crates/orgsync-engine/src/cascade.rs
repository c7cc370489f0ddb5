//! Cascade-aware suspension, reactivation and deletion of the local
//! hierarchy.
//!
//! ```text
//! distributor ──► resellers ──► customers ──► users
//! ```
//!
//! Suspending an organization walks every level below it. Each level is one
//! store transaction whose rows are stamped with the root's remote id, so
//! reactivating the root only brings back what its own cascade suspended.
//! Users stamped by the cascade get their remote suspension flag mirrored;
//! a failed mirror is recorded and the walk carries on. Both directions are
//! safe to rerun after an interruption.

use orgsync_client::RemoteClient;
use orgsync_core::entities::AffectedEntity;
use orgsync_core::enums::{EntityStatus, HierarchyKind, OperationAction, OperationKind};
use orgsync_db::HierarchyService;

use crate::error::EngineError;
use crate::phases::count;
use crate::report::{CascadeReport, Operation};

pub struct CascadeService<'a> {
    store: &'a HierarchyService,
    /// Provider used to mirror user suspension; `None` keeps changes local.
    remote: Option<&'a dyn RemoteClient>,
}

impl<'a> CascadeService<'a> {
    pub const fn new(store: &'a HierarchyService, remote: Option<&'a dyn RemoteClient>) -> Self {
        Self { store, remote }
    }

    /// Suspend `id`, and with `cascade` every active row below it.
    ///
    /// A cascade whose root is already suspended resumes the walk, so an
    /// interrupted run is finished by running it again. Every user stamped
    /// with the origin is mirrored on each run.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Database` when the root cannot be suspended or
    /// a level transaction fails. Levels committed before the failure stay
    /// suspended; rerunning the cascade completes the rest.
    pub async fn suspend(
        &self,
        kind: HierarchyKind,
        id: &str,
        cascade: bool,
    ) -> Result<CascadeReport, EngineError> {
        let mut report = CascadeReport::new(OperationAction::Suspend, kind, id);
        let root_remote = self.store.remote_id_of(kind, id).await?;
        let origin = if cascade {
            Self::cascade_origin(kind, root_remote.as_deref())
        } else {
            None
        };

        if origin.is_some() && self.root_in(kind, id, EntityStatus::Suspended).await? {
            tracing::info!(%kind, id, "root already suspended, resuming cascade");
            report.record(Operation::new(
                kind.into(),
                OperationAction::Skip,
                id,
                "Already suspended",
                None,
            ));
        } else {
            self.store.suspend(kind, id).await?;
            Self::record_level(
                &mut report,
                kind,
                OperationAction::Suspend,
                &[AffectedEntity {
                    id: id.to_string(),
                    remote_id: root_remote.clone(),
                }],
                "Suspended directly",
            );
            if kind == HierarchyKind::User {
                self.mirror(&mut report, root_remote.as_deref(), true).await;
            }
        }

        if let Some(origin) = origin {
            report.origin = Some(origin.clone());
            // Remote ids of the root and every organization its cascade holds.
            let mut parents = vec![origin.clone()];
            for level in levels_below(kind) {
                let affected = self.store.suspend_children(level, &parents, &origin).await?;
                let description = format!("Suspended by cascade from {origin}");
                Self::record_level(&mut report, level, OperationAction::Suspend, &affected, &description);
                let members = self.store.cascade_members(level, &origin).await?;
                if level == HierarchyKind::User {
                    for user in &members {
                        self.mirror(&mut report, user.remote_id.as_deref(), true).await;
                    }
                } else {
                    parents.extend(members.into_iter().filter_map(|m| m.remote_id));
                }
            }
        }

        report.finish();
        Ok(report)
    }

    /// Reactivate `id`, and with `cascade` every row its cascade suspended.
    /// Rows suspended directly, or by another origin, stay suspended.
    ///
    /// A cascade whose root is already active resumes the walk. Users are
    /// mirrored before their local rows are cleared, so a rerun still finds
    /// any user whose remote flag was not yet restored.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Database` when the root cannot be reactivated
    /// or a level transaction fails.
    pub async fn reactivate(
        &self,
        kind: HierarchyKind,
        id: &str,
        cascade: bool,
    ) -> Result<CascadeReport, EngineError> {
        let mut report = CascadeReport::new(OperationAction::Reactivate, kind, id);
        let root_remote = self.store.remote_id_of(kind, id).await?;
        let origin = if cascade {
            Self::cascade_origin(kind, root_remote.as_deref())
        } else {
            None
        };

        if origin.is_some() && self.root_in(kind, id, EntityStatus::Active).await? {
            tracing::info!(%kind, id, "root already active, resuming cascade");
            report.record(Operation::new(
                kind.into(),
                OperationAction::Skip,
                id,
                "Already active",
                None,
            ));
        } else {
            self.store.reactivate(kind, id).await?;
            Self::record_level(
                &mut report,
                kind,
                OperationAction::Reactivate,
                &[AffectedEntity {
                    id: id.to_string(),
                    remote_id: root_remote.clone(),
                }],
                "Reactivated directly",
            );
            if kind == HierarchyKind::User {
                self.mirror(&mut report, root_remote.as_deref(), false).await;
            }
        }

        if let Some(origin) = origin {
            report.origin = Some(origin.clone());
            for level in levels_below(kind) {
                if level == HierarchyKind::User {
                    for user in &self.store.cascade_members(level, &origin).await? {
                        self.mirror(&mut report, user.remote_id.as_deref(), false).await;
                    }
                }
                let affected = self
                    .store
                    .reactivate_by_suspended_by_org_id(level, &origin)
                    .await?;
                let description = format!("Reactivated with cascade from {origin}");
                Self::record_level(
                    &mut report,
                    level,
                    OperationAction::Reactivate,
                    &affected,
                    &description,
                );
            }
        }

        report.finish();
        Ok(report)
    }

    /// Soft-delete `id`, or purge it with `hard`. Rows below it are left as
    /// they are.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Database` when the row is missing or, for a
    /// soft delete, already deleted.
    pub async fn delete(
        &self,
        kind: HierarchyKind,
        id: &str,
        hard: bool,
    ) -> Result<CascadeReport, EngineError> {
        let mut report = CascadeReport::new(OperationAction::Delete, kind, id);
        let description = if hard {
            self.store.hard_delete(kind, id).await?;
            "Deleted permanently"
        } else {
            self.store.soft_delete(kind, id).await?;
            "Marked deleted"
        };
        report.summary.add(kind, 1);
        report.record(Operation::new(kind.into(), OperationAction::Delete, id, description, None));
        report.finish();
        Ok(report)
    }

    async fn root_in(
        &self,
        kind: HierarchyKind,
        id: &str,
        status: EntityStatus,
    ) -> Result<bool, EngineError> {
        Ok(self.store.entity_status(kind, id).await? == Some(status))
    }

    fn cascade_origin(kind: HierarchyKind, root_remote: Option<&str>) -> Option<String> {
        if kind == HierarchyKind::User {
            return None;
        }
        if root_remote.is_none() {
            tracing::warn!(%kind, "root has no remote id, cascade skipped");
        }
        root_remote.map(str::to_string)
    }

    fn record_level(
        report: &mut CascadeReport,
        level: HierarchyKind,
        action: OperationAction,
        affected: &[AffectedEntity],
        description: &str,
    ) {
        tracing::debug!(%level, count = affected.len(), %action, "cascade level applied");
        report.summary.add(level, count(affected.len()));
        for entity in affected {
            report.record(Operation::new(level.into(), action, &entity.id, description, None));
        }
    }

    /// Push a user's suspension flag to the provider. Users without a remote
    /// id, or runs without a provider, are left local.
    async fn mirror(&self, report: &mut CascadeReport, remote_id: Option<&str>, suspended: bool) {
        let (Some(remote), Some(remote_id)) = (self.remote, remote_id) else {
            return;
        };
        let action = if suspended {
            OperationAction::Suspend
        } else {
            OperationAction::Reactivate
        };
        let description = if suspended {
            "Suspended remote user"
        } else {
            "Reactivated remote user"
        };
        match remote.set_user_suspended(remote_id, suspended).await {
            Ok(()) => {
                report.summary.mirrored += 1;
                report.record(Operation::new(OperationKind::User, action, remote_id, description, None));
            }
            Err(e) => {
                report.summary.mirror_failures += 1;
                report.record(Operation::new(
                    OperationKind::User,
                    action,
                    remote_id,
                    format!("Failed to mirror user suspension: {remote_id}"),
                    Some(e.to_string()),
                ));
            }
        }
    }
}

/// Hierarchy levels strictly below `kind`, nearest first.
fn levels_below(kind: HierarchyKind) -> impl Iterator<Item = HierarchyKind> {
    HierarchyKind::ALL
        .into_iter()
        .filter(move |level| level.depth() > kind.depth())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn levels_walk_down_from_the_root() {
        assert_eq!(
            levels_below(HierarchyKind::Distributor).collect::<Vec<_>>(),
            vec![HierarchyKind::Reseller, HierarchyKind::Customer, HierarchyKind::User]
        );
        assert_eq!(
            levels_below(HierarchyKind::Customer).collect::<Vec<_>>(),
            vec![HierarchyKind::User]
        );
        assert_eq!(levels_below(HierarchyKind::User).count(), 0);
    }
}
