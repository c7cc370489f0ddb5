//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_format() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Report format used when `--format` is not given (`text`, `json`, `yaml`).
    #[serde(default = "default_format")]
    pub default_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
        }
    }
}
