//! Provider-owned names and naming conventions.

/// Bootstrap organization created by the identity provider. Never pulled.
pub const BOOTSTRAP_ORGANIZATION_NAME: &str = "Owner";

/// Bootstrap user created alongside the tenant. Matched case-insensitively.
pub const BOOTSTRAP_USER_NAME: &str = "owner";

/// Name of the provider's built-in management API resource.
pub const MANAGEMENT_API_RESOURCE_NAME: &str = "Logto Management API";

/// Indicator of the provider's default management API resource.
pub const DEFAULT_MANAGEMENT_INDICATOR: &str = "https://default.logto.app/api";

/// Access token lifetime, in seconds, for resources created by a sync.
pub const DEFAULT_ACCESS_TOKEN_TTL: u64 = 3600;

/// Application type assigned to newly created third-party applications.
pub const DEFAULT_APPLICATION_TYPE: &str = "Traditional";

/// User consent scopes granted to third-party applications that declare none.
pub const DEFAULT_APP_SCOPES: [&str; 5] = [
    "profile",
    "email",
    "roles",
    "urn:logto:scope:organizations",
    "urn:logto:scope:organization_roles",
];

/// Display name used for users with no name, username, or email.
pub const UNKNOWN_USER_NAME: &str = "Unknown User";

/// Scope name for `action` on `resource`: `"{action}:{resource}"`.
#[must_use]
pub fn scope_name(action: &str, resource: &str) -> String {
    format!("{action}:{resource}")
}

/// Resource indicator expected for `resource` under `api_base_url`.
#[must_use]
pub fn resource_indicator(api_base_url: &str, resource: &str) -> String {
    format!("{}/api/{resource}", api_base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_name_joins_action_and_resource() {
        assert_eq!(scope_name("read", "systems"), "read:systems");
    }

    #[test]
    fn indicator_ignores_trailing_slash() {
        assert_eq!(
            resource_indicator("https://api.example.com/", "systems"),
            "https://api.example.com/api/systems"
        );
        assert_eq!(
            resource_indicator("http://localhost:8080", "users"),
            "http://localhost:8080/api/users"
        );
    }
}
