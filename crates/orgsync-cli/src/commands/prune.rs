use anyhow::bail;
use orgsync_engine::{PruneOptions, Pruner};

use crate::cli::root_commands::PruneArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `orgsync prune`.
pub async fn handle(args: &PruneArgs, ctx: &AppContext) -> anyhow::Result<()> {
    if !args.confirmed() {
        bail!("prune deletes every organization and user; pass --force to proceed or --dry-run to preview");
    }
    let client = ctx.management_client()?;
    let store = if args.keep_local {
        None
    } else {
        Some(ctx.open_store(args.database.as_deref()).await?)
    };
    let options = PruneOptions {
        dry_run: args.dry_run,
        include_owner: args.include_owner,
    };

    let report = Pruner::new(&client, store.as_ref(), options).run().await?;
    output(&report, ctx.format)?;

    if !report.success {
        bail!("prune finished with {} error(s)", report.errors.len());
    }
    Ok(())
}
