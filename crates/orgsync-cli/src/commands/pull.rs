use anyhow::bail;
use orgsync_engine::{PullOptions, PullReconciler};

use crate::cli::root_commands::PullArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `orgsync pull`.
pub async fn handle(args: &PullArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let client = ctx.management_client()?;
    let store = ctx.open_store(args.database.as_deref()).await?;
    let options = PullOptions {
        dry_run: args.dry_run,
        organizations_only: args.organizations_only,
        users_only: args.users_only,
    };

    let report = PullReconciler::new(&client, &store, options).run().await?;
    output(&report, ctx.format)?;

    if !report.success {
        bail!("pull finished with {} error(s)", report.errors.len());
    }
    Ok(())
}
