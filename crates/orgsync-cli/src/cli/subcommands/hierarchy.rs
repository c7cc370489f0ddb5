use clap::{Args, Subcommand};

use crate::cli::KindArg;

/// Hierarchy state commands.
#[derive(Clone, Debug, Subcommand)]
pub enum HierarchyCommands {
    /// Suspend an entity and, by default, everything below it.
    Suspend(HierarchyStateArgs),
    /// Reactivate an entity and what its cascade suspended.
    Reactivate(HierarchyStateArgs),
    /// Delete an entity (soft by default).
    Delete(HierarchyDeleteArgs),
}

#[derive(Clone, Debug, Args)]
pub struct HierarchyStateArgs {
    /// Hierarchy level of the entity.
    #[arg(long, value_enum)]
    pub kind: KindArg,
    /// Local entity id.
    pub id: String,
    /// Change only this entity.
    #[arg(long)]
    pub no_cascade: bool,
    /// Local database path (overrides `database.path`).
    #[arg(long)]
    pub database: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct HierarchyDeleteArgs {
    /// Hierarchy level of the entity.
    #[arg(long, value_enum)]
    pub kind: KindArg,
    /// Local entity id.
    pub id: String,
    /// Remove the row instead of marking it deleted.
    #[arg(long)]
    pub hard: bool,
    /// Local database path (overrides `database.path`).
    #[arg(long)]
    pub database: Option<String>,
}
