//! Backend API settings. Resource indicators are derived from the base URL.

use serde::{Deserialize, Serialize};

use crate::RemoteConfig;

const FALLBACK_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of the backend API that resources protect.
    #[serde(default)]
    pub base_url: String,
}

impl ApiConfig {
    /// Explicit base URL, else `https://{tenant_domain}/api`, else a local fallback.
    pub fn resolved_base_url(&self, remote: &RemoteConfig) -> String {
        if !self.base_url.is_empty() {
            return self.base_url.trim_end_matches('/').to_string();
        }
        if !remote.tenant_domain.is_empty() {
            return format!("https://{}/api", remote.tenant_domain);
        }
        FALLBACK_BASE_URL.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_base_url_wins() {
        let api = ApiConfig {
            base_url: "https://api.example.com/".into(),
        };
        let remote = RemoteConfig {
            tenant_domain: "auth.example.com".into(),
            ..Default::default()
        };
        assert_eq!(api.resolved_base_url(&remote), "https://api.example.com");
    }

    #[test]
    fn derived_from_tenant_domain() {
        let remote = RemoteConfig {
            tenant_domain: "auth.example.com".into(),
            ..Default::default()
        };
        assert_eq!(
            ApiConfig::default().resolved_base_url(&remote),
            "https://auth.example.com/api"
        );
    }

    #[test]
    fn falls_back_to_localhost() {
        assert_eq!(
            ApiConfig::default().resolved_base_url(&RemoteConfig::default()),
            "http://localhost:8080"
        );
    }
}
