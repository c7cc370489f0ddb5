//! Identity-provider management API credentials.

use serde::{Deserialize, Serialize};

/// Default HTTP timeout in seconds.
const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Tenant identifier; the management endpoint is `https://{tenant_id}.logto.app`.
    #[serde(default)]
    pub tenant_id: String,

    /// Public tenant domain (e.g., `auth.example.com`), used to derive the API base URL.
    #[serde(default)]
    pub tenant_domain: String,

    /// Explicit management endpoint; overrides the tenant-derived one.
    #[serde(default)]
    pub endpoint: String,

    /// Machine-to-machine client id.
    #[serde(default)]
    pub client_id: String,

    /// Machine-to-machine client secret.
    #[serde(default)]
    pub client_secret: String,

    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            tenant_domain: String::new(),
            endpoint: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// Check that an endpoint and client credentials are available.
    pub fn is_configured(&self) -> bool {
        (!self.tenant_id.is_empty() || !self.endpoint.is_empty())
            && !self.client_id.is_empty()
            && !self.client_secret.is_empty()
    }

    /// Management API base URL, without trailing slash.
    pub fn base_url(&self) -> Option<String> {
        if !self.endpoint.is_empty() {
            return Some(self.endpoint.trim_end_matches('/').to_string());
        }
        if self.tenant_id.is_empty() {
            return None;
        }
        Some(format!("https://{}.logto.app", self.tenant_id))
    }
}
