use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sign-in experience block. File paths are relative to the document's directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SignInExperience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<SignInColors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<BrandingPaths>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_css_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<SignInLanguage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_in: Option<SignInMethods>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sign_up: Option<SignUpMethods>,
    /// Passed through to the provider unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_sign_in: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SignInColors {
    #[serde(default)]
    pub primary_color: String,
    #[serde(default)]
    pub primary_color_dark: String,
    #[serde(default)]
    pub dark_mode_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BrandingPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_dark_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_dark_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SignInLanguage {
    #[serde(default)]
    pub auto_detect: bool,
    #[serde(default)]
    pub fallback_language: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SignInMethods {
    #[serde(default)]
    pub methods: Vec<SignInMethodItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SignInMethodItem {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: bool,
    #[serde(default)]
    pub verification_code: bool,
    #[serde(default)]
    pub is_password_primary: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SignUpMethods {
    #[serde(default)]
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub password: bool,
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub secondary_identifiers: Vec<String>,
}
