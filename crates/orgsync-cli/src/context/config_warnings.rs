use orgsync_config::OrgsyncConfig;

/// Emit warnings for likely mistyped env var keys that silently fell back to defaults.
pub fn warn_unconfigured(config: &OrgsyncConfig) {
    for warning in collect_unconfigured_warnings(config, std::env::vars()) {
        tracing::warn!("{warning}");
    }
}

fn collect_unconfigured_warnings<I>(config: &OrgsyncConfig, env: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env_keys = env.into_iter().map(|(key, _)| key).collect::<Vec<_>>();

    let mut warnings = Vec::new();

    if !config.remote.is_configured() && has_single_underscore_key(&env_keys, "ORGSYNC_REMOTE") {
        warnings.push(
            "Remote config appears incomplete while ORGSYNC_REMOTE* env vars exist. Use double underscores (example: ORGSYNC_REMOTE__CLIENT_ID)."
                .to_string(),
        );
    }

    if config.api.base_url.is_empty() && has_single_underscore_key(&env_keys, "ORGSYNC_API") {
        warnings.push(
            "api.base_url is empty while ORGSYNC_API* env vars exist. Use double underscores (example: ORGSYNC_API__BASE_URL)."
                .to_string(),
        );
    }

    warnings
}

fn has_single_underscore_key(keys: &[String], prefix: &str) -> bool {
    keys.iter().any(|key| {
        key.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('_') && !rest.starts_with("__"))
    })
}
