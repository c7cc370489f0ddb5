use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use orgsync_client::{Credentials, ManagementClient};
use orgsync_config::OrgsyncConfig;
use orgsync_db::HierarchyService;
use orgsync_engine::OutputFormat;

use crate::cli::GlobalFlags;

/// Settings plus the resolved report format, shared by command handlers.
pub struct AppContext {
    pub config: OrgsyncConfig,
    pub format: OutputFormat,
}

impl AppContext {
    pub fn init(config: OrgsyncConfig, flags: &GlobalFlags) -> Self {
        let format = resolve_format(flags, &config);
        Self { config, format }
    }

    /// Management client built from the `remote` section.
    pub fn management_client(&self) -> anyhow::Result<ManagementClient> {
        let remote = self
            .config
            .require_remote()
            .context("remote credentials are required (set ORGSYNC_REMOTE__CLIENT_ID and friends)")?;
        let base_url = remote
            .base_url()
            .context("remote endpoint is not configured")?;
        let credentials = Credentials {
            client_id: remote.client_id.clone(),
            client_secret: remote.client_secret.clone(),
        };
        ManagementClient::new(base_url, credentials, Duration::from_secs(remote.timeout_secs))
            .context("failed to build management client")
    }

    /// Management client when credentials are present, `None` otherwise.
    pub fn optional_management_client(&self) -> anyhow::Result<Option<ManagementClient>> {
        if self.config.remote.is_configured() {
            self.management_client().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Open the local hierarchy store, creating its directory if needed.
    pub async fn open_store(&self, path_override: Option<&str>) -> anyhow::Result<HierarchyService> {
        let path = path_override.unwrap_or(&self.config.database.path);
        if path != ":memory:"
            && let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tracing::debug!(path, "opening hierarchy store");
        HierarchyService::open_local(path)
            .await
            .with_context(|| format!("failed to open hierarchy store at {path}"))
    }
}

fn resolve_format(flags: &GlobalFlags, config: &OrgsyncConfig) -> OutputFormat {
    if let Some(format) = flags.format {
        return format.into();
    }
    config
        .general
        .default_format
        .parse()
        .unwrap_or_else(|error| {
            tracing::warn!(%error, "ignoring general.default_format");
            OutputFormat::Text
        })
}

#[cfg(test)]
mod tests {
    use orgsync_config::{GeneralConfig, OrgsyncConfig};
    use orgsync_engine::OutputFormat;

    use super::resolve_format;
    use crate::cli::{GlobalFlags, OutputFormat as FormatArg};

    fn flags(format: Option<FormatArg>) -> GlobalFlags {
        GlobalFlags { format }
    }

    fn config_with_format(value: &str) -> OrgsyncConfig {
        OrgsyncConfig {
            general: GeneralConfig {
                default_format: value.to_string(),
            },
            ..OrgsyncConfig::default()
        }
    }

    #[test]
    fn flag_wins_over_settings() {
        let config = config_with_format("yaml");
        assert_eq!(
            resolve_format(&flags(Some(FormatArg::Json)), &config),
            OutputFormat::Json
        );
    }

    #[test]
    fn settings_used_without_flag() {
        let config = config_with_format("yml");
        assert_eq!(resolve_format(&flags(None), &config), OutputFormat::Yaml);
    }

    #[test]
    fn unknown_setting_falls_back_to_text() {
        let config = config_with_format("table");
        assert_eq!(resolve_format(&flags(None), &config), OutputFormat::Text);
    }

    #[test]
    fn missing_credentials_are_reported() {
        let ctx = super::AppContext::init(OrgsyncConfig::default(), &flags(None));
        assert!(ctx.management_client().is_err());
        assert!(ctx.optional_management_client().unwrap().is_none());
    }

    #[tokio::test]
    async fn store_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("orgsync.db");
        let ctx = super::AppContext::init(OrgsyncConfig::default(), &flags(None));
        ctx.open_store(path.to_str()).await.unwrap();
        assert!(path.parent().unwrap().is_dir());
    }
}
