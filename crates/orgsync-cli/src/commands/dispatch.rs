use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext) -> anyhow::Result<()> {
    match command {
        Commands::Sync(args) => commands::sync::handle(&args, ctx).await,
        Commands::Validate(args) => commands::validate::handle(&args, ctx),
        Commands::Pull(args) => commands::pull::handle(&args, ctx).await,
        Commands::Hierarchy { action } => commands::hierarchy::handle(&action, ctx).await,
        Commands::Prune(args) => commands::prune::handle(&args, ctx).await,
        Commands::Schema => commands::schema::handle(),
    }
}
