use anyhow::bail;
use orgsync_client::RemoteClient;
use orgsync_engine::{CascadeReport, CascadeService};

use crate::cli::subcommands::HierarchyCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `orgsync hierarchy`.
pub async fn handle(action: &HierarchyCommands, ctx: &AppContext) -> anyhow::Result<()> {
    let database = match action {
        HierarchyCommands::Suspend(args) | HierarchyCommands::Reactivate(args) => {
            args.database.as_deref()
        }
        HierarchyCommands::Delete(args) => args.database.as_deref(),
    };
    let store = ctx.open_store(database).await?;
    let client = ctx.optional_management_client()?;
    if client.is_none() && !matches!(action, HierarchyCommands::Delete(_)) {
        tracing::warn!("remote is not configured; user suspension will not be mirrored");
    }
    let service = CascadeService::new(&store, client.as_ref().map(|c| c as &dyn RemoteClient));

    let report = run(&service, action).await?;
    output(&report, ctx.format)?;

    if !report.success {
        bail!("hierarchy {} finished with {} error(s)", report.action, report.errors.len());
    }
    Ok(())
}

async fn run(
    service: &CascadeService<'_>,
    action: &HierarchyCommands,
) -> anyhow::Result<CascadeReport> {
    let report = match action {
        HierarchyCommands::Suspend(args) => {
            service
                .suspend(args.kind.into(), &args.id, !args.no_cascade)
                .await?
        }
        HierarchyCommands::Reactivate(args) => {
            service
                .reactivate(args.kind.into(), &args.id, !args.no_cascade)
                .await?
        }
        HierarchyCommands::Delete(args) => {
            service.delete(args.kind.into(), &args.id, args.hard).await?
        }
    };
    Ok(report)
}
