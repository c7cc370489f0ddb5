use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, KindArg, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `orgsync` binary.
#[derive(Debug, Parser)]
#[command(
    name = "orgsync",
    version,
    about = "orgsync - reconcile RBAC configuration with the identity provider"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Report format: text, json, yaml
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Quiet mode (errors only on stderr)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Flags consumed after logging is set up.
    #[must_use]
    pub const fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use orgsync_core::enums::HierarchyKind;
    use rstest::rstest;

    use super::{Cli, Commands, KindArg, OutputFormat};
    use crate::cli::subcommands::HierarchyCommands;

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_before_subcommand() {
        let cli = Cli::try_parse_from(["orgsync", "--format", "json", "--verbose", "schema"])
            .expect("cli should parse");

        assert_eq!(cli.format, Some(OutputFormat::Json));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Schema));
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "orgsync", "validate", "--config", "rbac.yml", "--format", "yaml", "--quiet",
        ])
        .expect("cli should parse");

        assert_eq!(cli.format, Some(OutputFormat::Yaml));
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn format_defaults_to_settings() {
        let cli = Cli::try_parse_from(["orgsync", "schema"]).expect("cli should parse");
        assert_eq!(cli.global_flags().format, None);
    }

    #[test]
    fn output_format_rejects_invalid_value() {
        let parsed = Cli::try_parse_from(["orgsync", "--format", "table", "schema"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn sync_flags_map_to_args() {
        let cli = Cli::try_parse_from([
            "orgsync",
            "sync",
            "--config",
            "configs/rbac.yml",
            "--dry-run",
            "--skip-roles",
            "--cleanup",
            "--api-base-url",
            "https://api.example.com",
        ])
        .expect("cli should parse");

        let Commands::Sync(args) = cli.command else {
            panic!("expected sync");
        };
        assert_eq!(args.config.to_str(), Some("configs/rbac.yml"));
        assert!(args.dry_run);
        assert!(args.skip_roles);
        assert!(!args.skip_resources);
        assert!(!args.skip_permissions);
        assert!(args.cleanup);
        assert_eq!(args.api_base_url.as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn sync_requires_config() {
        assert!(Cli::try_parse_from(["orgsync", "sync"]).is_err());
    }

    #[test]
    fn pull_only_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "orgsync",
            "pull",
            "--organizations-only",
            "--users-only",
        ]);
        assert!(parsed.is_err());
    }

    #[rstest]
    #[case("distributor", HierarchyKind::Distributor)]
    #[case("reseller", HierarchyKind::Reseller)]
    #[case("customer", HierarchyKind::Customer)]
    #[case("user", HierarchyKind::User)]
    fn hierarchy_kind_values(#[case] value: &str, #[case] expected: HierarchyKind) {
        let cli = Cli::try_parse_from(["orgsync", "hierarchy", "suspend", "--kind", value, "x-1"])
            .expect("cli should parse");
        let Commands::Hierarchy {
            action: HierarchyCommands::Suspend(args),
        } = cli.command
        else {
            panic!("expected hierarchy suspend");
        };
        assert_eq!(HierarchyKind::from(args.kind), expected);
        assert_eq!(args.id, "x-1");
        assert!(!args.no_cascade);
    }

    #[test]
    fn hierarchy_reactivate_accepts_no_cascade_and_database() {
        let cli = Cli::try_parse_from([
            "orgsync",
            "hierarchy",
            "reactivate",
            "--kind",
            "reseller",
            "rsl-1",
            "--no-cascade",
            "--database",
            "/tmp/h.db",
        ])
        .expect("cli should parse");
        let Commands::Hierarchy {
            action: HierarchyCommands::Reactivate(args),
        } = cli.command
        else {
            panic!("expected hierarchy reactivate");
        };
        assert_eq!(args.kind, KindArg::Reseller);
        assert!(args.no_cascade);
        assert_eq!(args.database.as_deref(), Some("/tmp/h.db"));
    }

    #[test]
    fn hierarchy_delete_hard_flag() {
        let cli = Cli::try_parse_from([
            "orgsync", "hierarchy", "delete", "--kind", "user", "usr-1", "--hard",
        ])
        .expect("cli should parse");
        assert!(matches!(
            cli.command,
            Commands::Hierarchy {
                action: HierarchyCommands::Delete(ref args)
            } if args.hard && args.kind == KindArg::User
        ));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let parsed =
            Cli::try_parse_from(["orgsync", "hierarchy", "suspend", "--kind", "tenant", "x"]);
        assert!(parsed.is_err());
    }

    fn prune_args(extra: &[&str]) -> crate::cli::root_commands::PruneArgs {
        let cli = Cli::try_parse_from(["orgsync", "prune"].iter().chain(extra))
            .expect("cli should parse");
        let Commands::Prune(args) = cli.command else {
            panic!("expected prune");
        };
        args
    }

    #[rstest]
    #[case(&[], false)]
    #[case(&["--force"], true)]
    #[case(&["--dry-run"], true)]
    #[case(&["--include-owner"], false)]
    fn prune_needs_force_or_dry_run(#[case] extra: &[&str], #[case] confirmed: bool) {
        assert_eq!(prune_args(extra).confirmed(), confirmed);
    }

    #[test]
    fn prune_keep_local_conflicts_with_database() {
        let args = prune_args(&["--force", "--keep-local"]);
        assert!(args.keep_local && !args.include_owner);
        let parsed = Cli::try_parse_from([
            "orgsync",
            "prune",
            "--force",
            "--keep-local",
            "--database",
            "/tmp/h.db",
        ]);
        assert!(parsed.is_err());
    }
}
