use anyhow::{Context, bail};
use orgsync_config::DesiredState;
use orgsync_engine::{ReconciliationEngine, SyncOptions};

use crate::cli::root_commands::SyncArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `orgsync sync`.
pub async fn handle(args: &SyncArgs, ctx: &AppContext) -> anyhow::Result<()> {
    let document = DesiredState::from_path(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    document
        .validate()
        .with_context(|| format!("{} is not valid", args.config.display()))?;

    let client = ctx.management_client()?;
    let options = sync_options(args, ctx);
    tracing::info!(
        config = %args.config.display(),
        dry_run = options.dry_run,
        cleanup = options.cleanup,
        "starting sync"
    );

    let engine = ReconciliationEngine::new(&client, options);
    let report = engine.sync(&document).await?;
    output(&report, ctx.format)?;

    if !report.success {
        bail!("synchronization finished with {} error(s)", report.errors.len());
    }
    Ok(())
}

fn sync_options(args: &SyncArgs, ctx: &AppContext) -> SyncOptions {
    SyncOptions {
        dry_run: args.dry_run,
        skip_resources: args.skip_resources,
        skip_roles: args.skip_roles,
        skip_permissions: args.skip_permissions,
        cleanup: args.cleanup,
        api_base_url: args
            .api_base_url
            .as_deref()
            .map_or_else(|| ctx.config.api_base_url(), |url| url.trim_end_matches('/').to_string()),
        config_path: Some(args.config.clone()),
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use orgsync_config::{ApiConfig, OrgsyncConfig};
    use pretty_assertions::assert_eq;

    use super::sync_options;
    use crate::cli::{Cli, Commands};
    use crate::context::AppContext;

    fn ctx(base_url: &str) -> AppContext {
        let config = OrgsyncConfig {
            api: ApiConfig {
                base_url: base_url.to_string(),
            },
            ..OrgsyncConfig::default()
        };
        let cli = Cli::try_parse_from(["orgsync", "schema"]).unwrap();
        AppContext::init(config, &cli.global_flags())
    }

    fn parse(extra: &[&str]) -> crate::cli::root_commands::SyncArgs {
        let mut argv = vec!["orgsync", "sync", "--config", "configs/rbac.yml"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Sync(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flag_overrides_settings_base_url() {
        let options = sync_options(
            &parse(&["--api-base-url", "https://cli.example.com/"]),
            &ctx("https://settings.example.com"),
        );
        assert_eq!(options.api_base_url, "https://cli.example.com");
    }

    #[test]
    fn settings_base_url_used_by_default() {
        let options = sync_options(&parse(&["--dry-run"]), &ctx("https://settings.example.com"));
        assert_eq!(options.api_base_url, "https://settings.example.com");
        assert!(options.dry_run);
        assert!(!options.cleanup);
        assert_eq!(
            options.config_path.as_deref().and_then(|p| p.to_str()),
            Some("configs/rbac.yml")
        );
    }
}
