use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::HierarchyCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Push the desired-state document to the identity provider.
    Sync(SyncArgs),
    /// Parse and validate a desired-state document.
    Validate(ValidateArgs),
    /// Mirror remote organizations and users into the local store.
    Pull(PullArgs),
    /// Suspend, reactivate, or delete hierarchy entities.
    Hierarchy {
        #[command(subcommand)]
        action: HierarchyCommands,
    },
    /// Delete every organization and user on the provider and clear the
    /// local store.
    Prune(PruneArgs),
    /// Print the desired-state JSON schema.
    Schema,
}

#[derive(Clone, Debug, Args)]
pub struct SyncArgs {
    /// Desired-state YAML document.
    #[arg(short, long)]
    pub config: PathBuf,
    /// Report what would change without mutating anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Skip resources and their scopes.
    #[arg(long)]
    pub skip_resources: bool,
    /// Skip organization and user roles.
    #[arg(long)]
    pub skip_roles: bool,
    /// Skip organization scopes and role permission assignments.
    #[arg(long)]
    pub skip_permissions: bool,
    /// Delete remote entities absent from the document.
    #[arg(long)]
    pub cleanup: bool,
    /// Base URL for resource indicators (overrides `api.base_url`).
    #[arg(long)]
    pub api_base_url: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct ValidateArgs {
    /// Desired-state YAML document.
    #[arg(short, long)]
    pub config: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct PullArgs {
    /// Report what would change without writing to the store.
    #[arg(long)]
    pub dry_run: bool,
    /// Pull organizations only.
    #[arg(long, conflicts_with = "users_only")]
    pub organizations_only: bool,
    /// Pull users only.
    #[arg(long)]
    pub users_only: bool,
    /// Local database path (overrides `database.path`).
    #[arg(long)]
    pub database: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct PruneArgs {
    /// List what would be deleted without deleting anything.
    #[arg(long)]
    pub dry_run: bool,
    /// Confirm the deletion. Required unless `--dry-run` is given.
    #[arg(long)]
    pub force: bool,
    /// Delete the bootstrap `Owner` organization and `owner` user too.
    #[arg(long)]
    pub include_owner: bool,
    /// Leave the local store untouched.
    #[arg(long)]
    pub keep_local: bool,
    /// Local database path (overrides `database.path`).
    #[arg(long, conflicts_with = "keep_local")]
    pub database: Option<String>,
}

impl PruneArgs {
    /// Whether the run may proceed.
    #[must_use]
    pub const fn confirmed(&self) -> bool {
        self.dry_run || self.force
    }
}
