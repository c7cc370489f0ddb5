//! # orgsync-engine
//!
//! Reconciliation between a desired-state document, the identity provider,
//! and the local hierarchy store.
//!
//! - [`ReconciliationEngine`]: pushes a [`orgsync_config::DesiredState`] to the
//!   provider phase by phase (see [`phases::PHASES`]), with dry-run, skip
//!   flags, and cleanup of unconfigured entities
//! - [`PullReconciler`]: mirrors remote organizations and users into the
//!   store, classifying organizations by their type marker
//! - [`CascadeService`]: suspends, reactivates, and deletes hierarchy rows,
//!   walking the levels below an organization
//! - [`Pruner`]: deletes every organization and user on the provider except
//!   the bootstrap pair, and clears the local store
//!
//! Every run produces a report ([`SyncReport`], [`PullReport`],
//! [`CascadeReport`], [`PruneReport`]) that renders as text, JSON, or YAML.

pub mod cascade;
pub mod diff;
pub mod engine;
pub mod error;
pub mod identity;
pub mod phases;
pub mod protect;
pub mod prune;
pub mod pull;
pub mod report;

pub use cascade::CascadeService;
pub use diff::{PermissionDiff, calculate_permission_diff};
pub use engine::{ReconciliationEngine, SyncOptions};
pub use error::EngineError;
pub use identity::IdentityMapping;
pub use protect::{MarkerTable, is_protected};
pub use prune::{PruneOptions, Pruner};
pub use pull::{PullOptions, PullReconciler};
pub use report::{CascadeReport, OutputFormat, PruneReport, PullReport, Report, SyncReport};
