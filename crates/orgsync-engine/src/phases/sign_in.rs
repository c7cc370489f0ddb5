//! Tenant sign-in experience: colors, branding assets, custom CSS, language
//! and sign-in/sign-up methods, sent as one partial update.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use orgsync_config::document::SignInExperience;
use orgsync_core::entities::{
    SignInBranding, SignInColor, SignInExperienceUpdate, SignInLanguageInfo, SignInMethod,
    SignInMethods, SignUpMethod,
};
use orgsync_core::enums::{OperationAction, OperationKind};

use super::RunContext;
use crate::error::EngineError;

const RESOURCE: &str = "configuration";
const FALLBACK_ASSET_DIR: &str = "configs";

pub(super) async fn sync_sign_in_experience(ctx: &mut RunContext<'_>) -> Result<(), EngineError> {
    let Some(experience) = ctx.document.sign_in_experience.as_ref() else {
        return Ok(());
    };
    tracing::info!(dry_run = ctx.dry_run(), "syncing sign-in experience");

    let base_dir = asset_dir(ctx.options.config_path.as_deref());
    let update = build_sign_in_update(experience, &base_dir);

    if ctx.dry_run() {
        ctx.record_ok(
            OperationKind::SignInExperience,
            OperationAction::Update,
            RESOURCE,
            "Would update sign-in experience configuration",
        );
        return Ok(());
    }

    let outcome = ctx.client.update_sign_in_experience(&update).await;
    let description = if outcome.is_ok() {
        "Updated sign-in experience configuration"
    } else {
        "Failed to update sign-in experience configuration"
    };
    ctx.record(
        OperationKind::SignInExperience,
        OperationAction::Update,
        RESOURCE,
        description,
        &outcome,
    );
    outcome.map_err(|e| EngineError::step("failed to update sign-in experience", e))
}

/// Directory asset paths are resolved against: the document's directory,
/// or `configs` when the document sits in the working directory.
fn asset_dir(config_path: Option<&Path>) -> PathBuf {
    match config_path.and_then(Path::parent) {
        Some(dir) if !dir.as_os_str().is_empty() && dir != Path::new(".") => dir.to_path_buf(),
        _ => PathBuf::from(FALLBACK_ASSET_DIR),
    }
}

/// Build the provider update for `experience`, reading asset files relative
/// to `base_dir`. Unreadable assets are left out of the update.
pub fn build_sign_in_update(experience: &SignInExperience, base_dir: &Path) -> SignInExperienceUpdate {
    let mut update = SignInExperienceUpdate::default();

    if let Some(colors) = &experience.colors {
        update.color = Some(SignInColor {
            primary_color: colors.primary_color.clone(),
            is_dark_mode_enabled: colors.dark_mode_enabled,
            dark_primary_color: colors.primary_color_dark.clone(),
        });
    }

    if let Some(paths) = &experience.branding {
        let load = |path: &Option<String>| path.as_deref().and_then(|p| data_url(&base_dir.join(p)));
        let branding = SignInBranding {
            logo_url: load(&paths.logo_path),
            dark_logo_url: load(&paths.logo_dark_path),
            favicon: load(&paths.favicon_path),
            dark_favicon: load(&paths.favicon_dark_path),
        };
        if !branding.is_empty() {
            update.branding = Some(branding);
        }
    }

    if let Some(css) = &experience.custom_css_path {
        let path = base_dir.join(css);
        match std::fs::read_to_string(&path) {
            Ok(text) => update.custom_css = Some(text),
            Err(e) => tracing::debug!(path = %path.display(), error = %e, "custom css not readable"),
        }
    }

    if let Some(language) = &experience.language {
        update.language_info = Some(SignInLanguageInfo {
            auto_detect: language.auto_detect,
            fallback_language: language.fallback_language.clone(),
        });
    }

    if let Some(sign_in) = experience.sign_in.as_ref().filter(|s| !s.methods.is_empty()) {
        update.sign_in = Some(SignInMethods {
            methods: sign_in
                .methods
                .iter()
                .map(|m| SignInMethod {
                    identifier: m.identifier.clone(),
                    password: m.password,
                    verification_code: m.verification_code,
                    is_password_primary: m.is_password_primary,
                })
                .collect(),
        });
    }

    if let Some(sign_up) = &experience.sign_up {
        update.sign_up = Some(SignUpMethod {
            identifiers: sign_up.identifiers.clone(),
            password: sign_up.password,
            verify: sign_up.verify,
            secondary_identifiers: sign_up.secondary_identifiers.clone(),
        });
    }

    update.social_sign_in.clone_from(&experience.social_sign_in);
    update
}

/// `data:<mime>;base64,<payload>` for the file at `path`.
fn data_url(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(format!("data:{};base64,{}", mime_for(path), STANDARD.encode(bytes))),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "branding asset not readable");
            None
        }
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => "application/octet-stream",
    }
}
