use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Persisted OAuth credentials.
///
/// Mirrors the authorized-user token file written by the interactive login
/// flow. The file is re-used across runs and rewritten here after a refresh;
/// creating it in the first place is the login flow's job, not ours.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl StoredToken {
    fn is_expired(&self) -> bool {
        match self.expiry {
            // A minute of slack so a token does not expire mid-download.
            Some(expiry) => expiry <= Utc::now() + Duration::seconds(60),
            None => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Loads the token file, refreshing it against the token endpoint when
/// expired. Returns the access token to use as a bearer credential.
///
/// A missing or unreadable file is an `Auth` error: the interactive login
/// flow has to be run once to create it.
pub async fn access_token(http: &reqwest::Client, path: &Path) -> Result<String> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Auth(format!(
            "cannot read token file {}: {e}; run the login flow to create it",
            path.display()
        ))
    })?;
    let mut stored: StoredToken = serde_json::from_str(&raw)
        .map_err(|e| AppError::Auth(format!("malformed token file {}: {e}", path.display())))?;

    if !stored.is_expired() {
        return Ok(stored.token);
    }

    let refresh_token = stored.refresh_token.clone().ok_or_else(|| {
        AppError::Auth(String::from(
            "token expired and no refresh token present; run the login flow again",
        ))
    })?;

    info!("access token expired, refreshing");
    let response = http
        .post(&stored.token_uri)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", stored.client_id.as_str()),
            ("client_secret", stored.client_secret.as_str()),
        ])
        .send()
        .await?;
    if !response.status().is_success() {
        return Err(AppError::Auth(format!(
            "token refresh rejected with status {}",
            response.status()
        )));
    }
    let refreshed: RefreshResponse = response.json().await?;

    stored.token = refreshed.access_token;
    stored.expiry = refreshed
        .expires_in
        .map(|secs| Utc::now() + Duration::seconds(secs));
    tokio::fs::write(path, serde_json::to_string_pretty(&stored)?).await?;

    Ok(stored.token)
}
