//! Push reconciliation: drive every enabled phase against a remote tenant.

use std::path::PathBuf;

use orgsync_client::RemoteClient;
use orgsync_config::DesiredState;

use crate::error::EngineError;
use crate::phases::{PHASES, RunContext};
use crate::report::SyncReport;

/// Switches for one sync run.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Report what would change without issuing mutating calls.
    pub dry_run: bool,
    pub skip_resources: bool,
    pub skip_roles: bool,
    pub skip_permissions: bool,
    /// Delete remote entities that are absent from the document.
    pub cleanup: bool,
    /// Prefix of every resource indicator, e.g. `https://api.example.com`.
    pub api_base_url: String,
    /// Location of the document; sign-in assets resolve next to it.
    pub config_path: Option<PathBuf>,
}

/// Reconciles a [`DesiredState`] against a [`RemoteClient`].
pub struct ReconciliationEngine<'a> {
    client: &'a dyn RemoteClient,
    options: SyncOptions,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(client: &'a dyn RemoteClient, options: SyncOptions) -> Self {
        Self { client, options }
    }

    #[must_use]
    pub const fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run every enabled phase in order and return the finished report.
    ///
    /// A failing phase is recorded as `"<label> sync failed: <error>"` and
    /// the run continues with the next phase.
    ///
    /// # Errors
    ///
    /// Reserved for failures that prevent a report from being produced.
    pub async fn sync(&self, document: &DesiredState) -> Result<SyncReport, EngineError> {
        tracing::info!(
            name = %document.metadata.name,
            dry_run = self.options.dry_run,
            cleanup = self.options.cleanup,
            "starting synchronization"
        );
        let mut ctx = RunContext::new(self.client, &self.options, document);

        for phase in &PHASES {
            if !phase.is_enabled(&self.options, document) {
                tracing::debug!(phase = phase.label, "phase skipped");
                continue;
            }
            tracing::debug!(phase = phase.label, "phase started");
            if let Err(err) = phase.id.run(&mut ctx).await {
                tracing::error!(phase = phase.label, error = %err, "phase failed");
                ctx.report
                    .errors
                    .push(format!("{} sync failed: {err}", phase.label));
            }
        }

        let mut report = ctx.report;
        report.finish();
        tracing::info!(
            success = report.success,
            operations = report.operations.len(),
            errors = report.errors.len(),
            "synchronization finished"
        );
        Ok(report)
    }
}
