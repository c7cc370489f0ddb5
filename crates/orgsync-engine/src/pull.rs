//! Pull reconciliation: mirror remote organizations and users into the
//! local hierarchy store.
//!
//! Organizations are classified by their `customData.type` marker. The
//! bootstrap organization and user exist only on the provider and are
//! skipped. A dry run reads the store to report the same create/update
//! decisions without writing.

use chrono::Utc;
use serde_json::json;

use orgsync_client::RemoteClient;
use orgsync_core::constants::{BOOTSTRAP_ORGANIZATION_NAME, BOOTSTRAP_USER_NAME, UNKNOWN_USER_NAME};
use orgsync_core::entities::{RemoteOrganization, RemoteUser};
use orgsync_core::enums::{OperationAction, OperationKind, OrgKind};
use orgsync_db::HierarchyService;
use orgsync_db::repos::{OrganizationUpsert, UpsertOutcome, UserUpsert};

use crate::error::EngineError;
use crate::report::{Conflict, Operation, PullReport};

#[derive(Debug, Clone, Copy, Default)]
pub struct PullOptions {
    pub dry_run: bool,
    pub organizations_only: bool,
    pub users_only: bool,
}

pub struct PullReconciler<'a> {
    client: &'a dyn RemoteClient,
    store: &'a HierarchyService,
    options: PullOptions,
}

/// Kind for a remote organization. Missing or unknown markers fall back to
/// customer.
#[must_use]
pub fn classify_organization(org: &RemoteOrganization) -> OrgKind {
    match org.type_marker() {
        Some(marker) => OrgKind::from_marker(marker).unwrap_or_else(|| {
            tracing::warn!(organization = %org.name, marker, "unknown organization type, treating as customer");
            OrgKind::Customer
        }),
        None => {
            tracing::warn!(organization = %org.name, "organization has no type marker, treating as customer");
            OrgKind::Customer
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl<'a> PullReconciler<'a> {
    pub const fn new(
        client: &'a dyn RemoteClient,
        store: &'a HierarchyService,
        options: PullOptions,
    ) -> Self {
        Self {
            client,
            store,
            options,
        }
    }

    /// Pull organizations then users, as selected by the options.
    ///
    /// # Errors
    ///
    /// Reserved for failures that prevent a report from being produced;
    /// listing failures are recorded in the report instead.
    pub async fn run(&self) -> Result<PullReport, EngineError> {
        tracing::info!(dry_run = self.options.dry_run, "starting pull");
        let mut report = PullReport::new(self.options.dry_run);

        if !self.options.users_only
            && let Err(err) = self.pull_organizations(&mut report).await
        {
            tracing::error!(error = %err, "organizations pull failed");
            report.errors.push(format!("Organizations pull failed: {err}"));
        }
        if !self.options.organizations_only
            && let Err(err) = self.pull_users(&mut report).await
        {
            tracing::error!(error = %err, "users pull failed");
            report.errors.push(format!("Users pull failed: {err}"));
        }

        report.finish();
        tracing::info!(
            success = report.success,
            conflicts = report.summary.conflicts_detected,
            "pull finished"
        );
        Ok(report)
    }

    fn describe(&self, outcome: UpsertOutcome, kind: impl std::fmt::Display, name: &str) -> String {
        match (self.options.dry_run, outcome) {
            (false, UpsertOutcome::Created) => format!("Created {kind} {name}"),
            (false, UpsertOutcome::Updated) => format!("Updated {kind} {name}"),
            (true, UpsertOutcome::Created) => format!("Would create {kind} {name}"),
            (true, UpsertOutcome::Updated) => format!("Would update {kind} {name}"),
        }
    }

    // -----------------------------------------------------------------------
    // Organizations
    // -----------------------------------------------------------------------

    async fn pull_organizations(&self, report: &mut PullReport) -> Result<(), EngineError> {
        let orgs = self
            .client
            .list_organizations()
            .await
            .map_err(|e| EngineError::step("failed to fetch organizations", e))?;
        tracing::info!(count = orgs.len(), "fetched remote organizations");

        for org in &orgs {
            if org.name == BOOTSTRAP_ORGANIZATION_NAME {
                report.summary.organizations_skipped += 1;
                report.record(Operation::new(
                    OperationKind::Organization,
                    OperationAction::Skip,
                    &org.name,
                    "Owner organization skipped (Logto-only)",
                    None,
                ));
                continue;
            }
            if let Err(err) = self.pull_organization(org, report).await {
                report.record(Operation::new(
                    OperationKind::Organization,
                    OperationAction::Upsert,
                    &org.name,
                    format!("Process organization {}", org.name),
                    Some(err.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn pull_organization(
        &self,
        org: &RemoteOrganization,
        report: &mut PullReport,
    ) -> Result<(), EngineError> {
        let kind = classify_organization(org);

        if let Some(stored) = self.store.find_organization_any_kind(&org.id).await?
            && stored.kind != kind
        {
            let description = format!(
                "Organization {} is stored as {} but classified remotely as {kind}",
                org.name, stored.kind
            );
            report.conflicts.push(Conflict {
                kind: OperationKind::Organization,
                resource: org.name.clone(),
                description: description.clone(),
                local_value: json!(stored.kind),
                remote_value: json!(kind),
                resolution: "kept local record".to_string(),
                timestamp: Utc::now(),
            });
            report.summary.conflicts_detected += 1;
            report.record(
                Operation::new(kind.into(), OperationAction::Skip, &org.name, description, None)
                    .with_conflict(),
            );
            return Ok(());
        }

        let outcome = if self.options.dry_run {
            match self.store.find_organization_by_remote_id(kind, &org.id).await? {
                Some(_) => UpsertOutcome::Updated,
                None => UpsertOutcome::Created,
            }
        } else {
            let upsert = OrganizationUpsert {
                kind,
                remote_id: org.id.clone(),
                name: org.name.clone(),
                description: non_empty(&org.description),
                custom_data: org.custom_data.clone(),
            };
            self.store.upsert_organization(&upsert).await?.1
        };

        let action = match outcome {
            UpsertOutcome::Created => {
                report.summary.organizations_created += 1;
                OperationAction::Create
            }
            UpsertOutcome::Updated => {
                report.summary.organizations_updated += 1;
                OperationAction::Update
            }
        };
        let description = self.describe(outcome, kind, &org.name);
        report.record(Operation::new(kind.into(), action, &org.name, description, None));
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    async fn pull_users(&self, report: &mut PullReport) -> Result<(), EngineError> {
        let users = self
            .client
            .list_users()
            .await
            .map_err(|e| EngineError::step("failed to fetch users", e))?;
        tracing::info!(count = users.len(), "fetched remote users");

        let organization_id = self
            .store
            .list_organizations(OrgKind::Distributor)
            .await?
            .into_iter()
            .find_map(|d| d.remote_id);
        if organization_id.is_none() {
            tracing::warn!("no local distributor, pulled users will have no organization");
        }

        for user in &users {
            let name = user.display_name().unwrap_or(UNKNOWN_USER_NAME);
            if name.eq_ignore_ascii_case(BOOTSTRAP_USER_NAME) {
                report.summary.users_skipped += 1;
                report.record(Operation::new(
                    OperationKind::User,
                    OperationAction::Skip,
                    name,
                    "Owner user skipped (Logto-only)",
                    None,
                ));
                continue;
            }
            if let Err(err) = self
                .pull_user(user, name, organization_id.as_deref(), report)
                .await
            {
                report.record(Operation::new(
                    OperationKind::User,
                    OperationAction::Upsert,
                    name,
                    format!("Process user {name}"),
                    Some(err.to_string()),
                ));
            }
        }
        Ok(())
    }

    async fn pull_user(
        &self,
        user: &RemoteUser,
        name: &str,
        organization_id: Option<&str>,
        report: &mut PullReport,
    ) -> Result<(), EngineError> {
        let outcome = if self.options.dry_run {
            match self.store.find_user_by_remote_id(&user.id).await? {
                Some(_) => UpsertOutcome::Updated,
                None => UpsertOutcome::Created,
            }
        } else {
            let user_role_ids = match self.client.user_roles(&user.id).await {
                Ok(roles) => roles.into_iter().map(|r| r.id).collect(),
                Err(e) => {
                    tracing::warn!(user = name, error = %e, "failed to fetch user roles");
                    Vec::new()
                }
            };
            let upsert = UserUpsert {
                remote_id: user.id.clone(),
                username: name.to_string(),
                email: user.primary_email.clone(),
                name: name.to_string(),
                phone: user.primary_phone.clone(),
                organization_id: organization_id.map(str::to_string),
                user_role_ids,
                custom_data: user.custom_data.clone(),
            };
            self.store.upsert_user(&upsert).await?.1
        };

        let action = match outcome {
            UpsertOutcome::Created => {
                report.summary.users_created += 1;
                OperationAction::Create
            }
            UpsertOutcome::Updated => {
                report.summary.users_updated += 1;
                OperationAction::Update
            }
        };
        let description = self.describe(outcome, "user", name);
        report.record(Operation::new(OperationKind::User, action, name, description, None));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn org(custom: Option<serde_json::Value>) -> RemoteOrganization {
        RemoteOrganization {
            id: "o1".into(),
            name: "Acme".into(),
            custom_data: custom,
            ..RemoteOrganization::default()
        }
    }

    #[rstest]
    #[case(Some(json!({"type": "distributor"})), OrgKind::Distributor)]
    #[case(Some(json!({"type": "reseller"})), OrgKind::Reseller)]
    #[case(Some(json!({"type": "customer"})), OrgKind::Customer)]
    #[case(Some(json!({"type": "partner"})), OrgKind::Customer)]
    #[case(Some(json!({"type": 3})), OrgKind::Customer)]
    #[case(Some(json!({})), OrgKind::Customer)]
    #[case(None, OrgKind::Customer)]
    fn organizations_classify_by_type_marker(
        #[case] custom: Option<serde_json::Value>,
        #[case] expected: OrgKind,
    ) {
        assert_eq!(classify_organization(&org(custom)), expected);
    }
}
