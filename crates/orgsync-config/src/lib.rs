//! # orgsync-config
//!
//! Layered application settings and the desired-state document for orgsync.
//!
//! Settings sources (in priority order, highest wins):
//! 1. Environment variables (`ORGSYNC_*` prefix, `__` as separator)
//! 2. Project-level `.orgsync/config.toml`
//! 3. User-level `~/.config/orgsync/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `ORGSYNC_REMOTE__TENANT_ID` -> `remote.tenant_id`,
//! `ORGSYNC_API__BASE_URL` -> `api.base_url`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use orgsync_config::{DesiredState, OrgsyncConfig};
//!
//! let config = OrgsyncConfig::load_with_dotenv().expect("config");
//! if config.remote.is_configured() {
//!     println!("Endpoint: {:?}", config.remote.base_url());
//! }
//!
//! let desired = DesiredState::from_path("configs/config.yml").expect("document");
//! desired.validate().expect("valid document");
//! ```

mod api;
mod database;
pub mod document;
mod error;
mod general;
mod remote;

pub use api::ApiConfig;
pub use database::DatabaseConfig;
pub use document::DesiredState;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use remote::RemoteConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OrgsyncConfig {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl OrgsyncConfig {
    /// Load settings from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env` support.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load settings after reading the nearest `.env` file into the process env.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".orgsync/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("ORGSYNC_").split("__"))
    }

    /// Remote settings, or `NotConfigured` when credentials are missing.
    pub fn require_remote(&self) -> Result<&RemoteConfig, ConfigError> {
        if self.remote.is_configured() {
            Ok(&self.remote)
        } else {
            Err(ConfigError::NotConfigured {
                section: "remote".to_string(),
            })
        }
    }

    /// Base URL used to build resource indicators.
    pub fn api_base_url(&self) -> String {
        self.api.resolved_base_url(&self.remote)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("orgsync").join("config.toml"))
    }

    /// Walk up from `CARGO_MANIFEST_DIR` looking for `.env`, then try the
    /// current directory. Missing files are ignored.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = OrgsyncConfig::default();
        assert!(!config.remote.is_configured());
        assert_eq!(config.database.path, ".orgsync/orgsync.db");
        assert_eq!(config.general.default_format, "text");
        assert_eq!(config.api_base_url(), "http://localhost:8080");
    }

    #[test]
    fn require_remote_reports_section() {
        let err = OrgsyncConfig::default().require_remote().unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured { ref section } if section == "remote"));
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: OrgsyncConfig = OrgsyncConfig::figment().extract()?;
            assert_eq!(config.remote.timeout_secs, 30);
            Ok(())
        });
    }
}
