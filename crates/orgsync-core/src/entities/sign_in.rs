use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Partial update of the tenant sign-in experience. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignInExperienceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<SignInColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<SignInBranding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_info: Option<SignInLanguageInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in: Option<SignInMethods>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_up: Option<SignUpMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_sign_in: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInColor {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub primary_color: String,
    #[serde(default)]
    pub is_dark_mode_enabled: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dark_primary_color: String,
}

/// Branding assets as `data:` URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInBranding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_favicon: Option<String>,
}

impl SignInBranding {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.logo_url.is_none()
            && self.dark_logo_url.is_none()
            && self.favicon.is_none()
            && self.dark_favicon.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInLanguageInfo {
    #[serde(default)]
    pub auto_detect: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fallback_language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInMethods {
    pub methods: Vec<SignInMethod>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignInMethod {
    pub identifier: String,
    #[serde(default)]
    pub password: bool,
    #[serde(default)]
    pub verification_code: bool,
    #[serde(default)]
    pub is_password_primary: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignUpMethod {
    #[serde(default)]
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub password: bool,
    #[serde(default)]
    pub verify: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_identifiers: Vec<String>,
}
