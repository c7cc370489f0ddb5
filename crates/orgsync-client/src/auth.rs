//! Client-credentials token acquisition and caching.

use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::ClientError;

/// Tokens are refreshed this long before they expire.
const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl CachedToken {
    /// Still usable at `now`, keeping the refresh margin.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }
}

/// Machine-to-machine credentials for the management API.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Request a management API token from `{base_url}/oidc/token`.
pub async fn request_token(
    http: &reqwest::Client,
    base_url: &str,
    credentials: &Credentials,
) -> Result<CachedToken, ClientError> {
    let resource = format!("{base_url}/api");
    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
        ("resource", resource.as_str()),
        ("scope", "all"),
    ];

    let resp = http
        .post(format!("{base_url}/oidc/token"))
        .form(&form)
        .send()
        .await?;

    if !resp.status().is_success() {
        return Err(ClientError::Auth(format!(
            "token request failed with status {}",
            resp.status().as_u16()
        )));
    }

    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| ClientError::Auth(format!("failed to decode token response: {e}")))?;

    tracing::debug!(expires_in = token.expires_in, "access token obtained");
    Ok(CachedToken {
        access_token: token.access_token,
        expires_at: Instant::now() + Duration::from_secs(token.expires_in),
    })
}
