//! Run reports and their text, JSON, and YAML renderings.
//!
//! A report is created when a run starts, appended to while it runs, and
//! finalized once by `finish`. Renderers never mutate it.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orgsync_core::enums::{HierarchyKind, OperationAction, OperationKind};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// OutputFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(EngineError::Render(format!(
                "unknown output format '{other}' (expected text, json, or yaml)"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A serializable run report with a human-readable text form.
pub trait Report: Serialize {
    fn to_text(&self) -> String;

    /// Render in `format`. JSON is pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Render` if serialization fails.
    fn render(&self, format: OutputFormat) -> Result<String, EngineError> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)? + "\n"),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// One attempted mutation (or, in a dry run, one that would have been made).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Operation {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub action: OperationAction,
    pub resource: String,
    pub description: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set by the pull reconciler when the entity conflicts with local state.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub conflict: bool,
    pub timestamp: DateTime<Utc>,
}

impl Operation {
    pub fn new(
        kind: OperationKind,
        action: OperationAction,
        resource: impl Into<String>,
        description: impl Into<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            kind,
            action,
            resource: resource.into(),
            description: description.into(),
            success: error.is_none(),
            error,
            conflict: false,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub const fn with_conflict(mut self) -> Self {
        self.conflict = true;
        self
    }

    fn log(&self) {
        match &self.error {
            None => tracing::info!(
                kind = %self.kind,
                action = %self.action,
                resource = %self.resource,
                "{}",
                self.description
            ),
            Some(error) => tracing::error!(
                kind = %self.kind,
                action = %self.action,
                resource = %self.resource,
                error = %error,
                "{}",
                self.description
            ),
        }
    }

    fn text_line(&self) -> String {
        let mut status = if self.success { "✓" } else { "✗" }.to_string();
        if self.conflict {
            status.push_str(" ⚠");
        }
        format!(
            "  {status} {} {} {} - {}\n",
            self.kind, self.action, self.resource, self.description
        )
    }
}

// ---------------------------------------------------------------------------
// Shared text sections
// ---------------------------------------------------------------------------

/// `1.234s` for durations of a second or more, `57ms` otherwise.
#[must_use]
pub fn format_duration(ms: u64) -> String {
    if ms >= 1000 {
        format!("{}.{:03}s", ms / 1000, ms % 1000)
    } else {
        format!("{ms}ms")
    }
}

fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    u64::try_from((end - start).num_milliseconds()).unwrap_or(0)
}

fn write_header(out: &mut String, title: &str, success: bool, duration_ms: u64, dry_run: bool) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}\n", "=".repeat(title.chars().count()));
    let _ = writeln!(out, "Status: {}", if success { "SUCCESS" } else { "FAILED" });
    let _ = writeln!(out, "Duration: {}", format_duration(duration_ms));
    let _ = writeln!(out, "Dry Run: {dry_run}\n");
}

fn write_errors(out: &mut String, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    out.push_str("Errors:\n");
    for error in errors {
        let _ = writeln!(out, "  - {error}");
    }
    out.push('\n');
}

fn write_operations(out: &mut String, operations: &[Operation]) {
    if operations.is_empty() {
        return;
    }
    out.push_str("Operations:\n");
    for op in operations {
        out.push_str(&op.text_line());
    }
}

// ---------------------------------------------------------------------------
// SyncReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub resources_created: u32,
    pub resources_updated: u32,
    pub resources_deleted: u32,
    pub roles_created: u32,
    pub roles_updated: u32,
    pub roles_deleted: u32,
    pub permissions_created: u32,
    pub permissions_updated: u32,
    pub permissions_deleted: u32,
    pub scopes_created: u32,
    pub scopes_updated: u32,
    pub scopes_deleted: u32,
    pub applications_created: u32,
    pub applications_updated: u32,
    pub applications_deleted: u32,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub success: bool,
    pub summary: Summary,
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SyncReport {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            duration_ms: 0,
            dry_run,
            success: false,
            summary: Summary::default(),
            operations: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Append an operation and log it.
    pub fn record(&mut self, op: Operation) {
        op.log();
        self.operations.push(op);
    }

    /// Stamp the end time and derive `success` from the error list.
    pub fn finish(&mut self) {
        self.end_time = Utc::now();
        self.duration_ms = elapsed_ms(self.start_time, self.end_time);
        self.success = self.errors.is_empty();
    }

    /// Operations of one kind, in recording order.
    pub fn operations_of(&self, kind: OperationKind) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(move |op| op.kind == kind)
    }
}

impl Report for SyncReport {
    fn to_text(&self) -> String {
        let mut out = String::new();
        write_header(
            &mut out,
            "Synchronization Results",
            self.success,
            self.duration_ms,
            self.dry_run,
        );

        let s = &self.summary;
        out.push_str("Summary:\n");
        for (label, created, updated, deleted) in [
            ("Resources", s.resources_created, s.resources_updated, s.resources_deleted),
            ("Roles", s.roles_created, s.roles_updated, s.roles_deleted),
            ("Permissions", s.permissions_created, s.permissions_updated, s.permissions_deleted),
            ("Scopes", s.scopes_created, s.scopes_updated, s.scopes_deleted),
            (
                "Applications",
                s.applications_created,
                s.applications_updated,
                s.applications_deleted,
            ),
        ] {
            let _ = writeln!(
                out,
                "  {label}: {created} created, {updated} updated, {deleted} deleted"
            );
        }
        out.push('\n');

        write_errors(&mut out, &self.errors);
        write_operations(&mut out, &self.operations);
        out
    }
}

// ---------------------------------------------------------------------------
// PullReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullSummary {
    pub organizations_created: u32,
    pub organizations_updated: u32,
    pub organizations_skipped: u32,
    pub users_created: u32,
    pub users_updated: u32,
    pub users_skipped: u32,
    pub conflicts_detected: u32,
}

/// A remote entity that disagrees with what the local store already holds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub resource: String,
    pub description: String,
    pub local_value: serde_json::Value,
    pub remote_value: serde_json::Value,
    pub resolution: String,
    pub timestamp: DateTime<Utc>,
}

/// Outcome of a pull run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub success: bool,
    pub summary: PullSummary,
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl PullReport {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            duration_ms: 0,
            dry_run,
            success: false,
            summary: PullSummary::default(),
            operations: Vec::new(),
            conflicts: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, op: Operation) {
        op.log();
        self.operations.push(op);
    }

    pub fn finish(&mut self) {
        self.end_time = Utc::now();
        self.duration_ms = elapsed_ms(self.start_time, self.end_time);
        self.success = self.errors.is_empty();
    }
}

impl Report for PullReport {
    fn to_text(&self) -> String {
        let mut out = String::new();
        write_header(
            &mut out,
            "Pull Operation Results",
            self.success,
            self.duration_ms,
            self.dry_run,
        );

        let s = &self.summary;
        out.push_str("Summary:\n");
        let _ = writeln!(
            out,
            "  Organizations: {} created, {} updated, {} skipped",
            s.organizations_created, s.organizations_updated, s.organizations_skipped
        );
        let _ = writeln!(
            out,
            "  Users: {} created, {} updated, {} skipped",
            s.users_created, s.users_updated, s.users_skipped
        );
        let _ = writeln!(out, "  Conflicts: {} detected\n", s.conflicts_detected);

        if !self.conflicts.is_empty() {
            out.push_str("Conflicts:\n");
            for c in &self.conflicts {
                let _ = writeln!(
                    out,
                    "  ⚠ {} in {} - {} (Resolution: {})",
                    c.kind, c.resource, c.description, c.resolution
                );
            }
            out.push('\n');
        }

        write_errors(&mut out, &self.errors);
        write_operations(&mut out, &self.operations);
        out
    }
}

// ---------------------------------------------------------------------------
// CascadeReport
// ---------------------------------------------------------------------------

/// Rows touched per hierarchy level by one cascade command.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CascadeSummary {
    pub distributors: u32,
    pub resellers: u32,
    pub customers: u32,
    pub users: u32,
    /// User suspension flags pushed to the identity provider.
    pub mirrored: u32,
    pub mirror_failures: u32,
}

impl CascadeSummary {
    pub(crate) fn add(&mut self, kind: HierarchyKind, n: u32) {
        let slot = match kind {
            HierarchyKind::Distributor => &mut self.distributors,
            HierarchyKind::Reseller => &mut self.resellers,
            HierarchyKind::Customer => &mut self.customers,
            HierarchyKind::User => &mut self.users,
        };
        *slot += n;
    }
}

/// Outcome of a suspend, reactivate or delete on the local hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CascadeReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub action: OperationAction,
    pub kind: HierarchyKind,
    pub id: String,
    /// Remote id stamped on cascaded rows, `None` without a cascade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub success: bool,
    pub summary: CascadeSummary,
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CascadeReport {
    #[must_use]
    pub fn new(action: OperationAction, kind: HierarchyKind, id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            duration_ms: 0,
            action,
            kind,
            id: id.into(),
            origin: None,
            success: false,
            summary: CascadeSummary::default(),
            operations: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, op: Operation) {
        op.log();
        self.operations.push(op);
    }

    pub fn finish(&mut self) {
        self.end_time = Utc::now();
        self.duration_ms = elapsed_ms(self.start_time, self.end_time);
        self.success = self.errors.is_empty();
    }
}

impl Report for CascadeReport {
    fn to_text(&self) -> String {
        let mut out = String::new();
        let title = format!("Hierarchy {} Results", self.action);
        write_header(&mut out, &title, self.success, self.duration_ms, false);

        let _ = writeln!(out, "Target: {} {}", self.kind, self.id);
        if let Some(origin) = &self.origin {
            let _ = writeln!(out, "Cascade origin: {origin}");
        }
        out.push('\n');

        let s = &self.summary;
        out.push_str("Affected:\n");
        let _ = writeln!(out, "  Distributors: {}", s.distributors);
        let _ = writeln!(out, "  Resellers: {}", s.resellers);
        let _ = writeln!(out, "  Customers: {}", s.customers);
        let _ = writeln!(out, "  Users: {}", s.users);
        let _ = writeln!(
            out,
            "  Remote mirror: {} updated, {} failed\n",
            s.mirrored, s.mirror_failures
        );

        write_errors(&mut out, &self.errors);
        write_operations(&mut out, &self.operations);
        out
    }
}

// ---------------------------------------------------------------------------
// PruneReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PruneSummary {
    pub organizations_deleted: u32,
    pub organizations_skipped: u32,
    pub users_deleted: u32,
    pub users_skipped: u32,
    /// Local rows purged, or that would be in a dry run.
    pub local: LevelCounts,
}

/// Row counts per hierarchy level.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelCounts {
    pub distributors: u32,
    pub resellers: u32,
    pub customers: u32,
    pub users: u32,
}

impl PruneSummary {
    pub(crate) fn add_local(&mut self, kind: HierarchyKind, n: u32) {
        let slot = match kind {
            HierarchyKind::Distributor => &mut self.local.distributors,
            HierarchyKind::Reseller => &mut self.local.resellers,
            HierarchyKind::Customer => &mut self.local.customers,
            HierarchyKind::User => &mut self.local.users,
        };
        *slot += n;
    }
}

/// Outcome of a prune run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PruneReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub success: bool,
    /// Whether the local store was included.
    pub local_store: bool,
    pub summary: PruneSummary,
    pub operations: Vec<Operation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl PruneReport {
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            start_time: now,
            end_time: now,
            duration_ms: 0,
            dry_run,
            success: false,
            local_store: false,
            summary: PruneSummary::default(),
            operations: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&mut self, op: Operation) {
        op.log();
        self.operations.push(op);
    }

    pub fn finish(&mut self) {
        self.end_time = Utc::now();
        self.duration_ms = elapsed_ms(self.start_time, self.end_time);
        self.success = self.errors.is_empty();
    }
}

impl Report for PruneReport {
    fn to_text(&self) -> String {
        let mut out = String::new();
        write_header(
            &mut out,
            "Prune Results",
            self.success,
            self.duration_ms,
            self.dry_run,
        );

        let s = &self.summary;
        out.push_str("Summary:\n");
        let _ = writeln!(
            out,
            "  Organizations: {} deleted, {} skipped",
            s.organizations_deleted, s.organizations_skipped
        );
        let _ = writeln!(
            out,
            "  Users: {} deleted, {} skipped",
            s.users_deleted, s.users_skipped
        );
        if self.local_store {
            let l = &s.local;
            let _ = writeln!(
                out,
                "  Local store: {} distributors, {} resellers, {} customers, {} users purged",
                l.distributors, l.resellers, l.customers, l.users
            );
        } else {
            out.push_str("  Local store: untouched\n");
        }
        out.push('\n');

        write_errors(&mut out, &self.errors);
        write_operations(&mut out, &self.operations);
        out
    }
}
