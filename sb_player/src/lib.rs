//! ABOUTME: HTTP client for the local media player control API
//! ABOUTME: Password-grant token handling, playlist switch and screenshot capture

use bytes::Bytes;
use sb_core::{Error, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Image bytes captured from the player
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub bytes: Bytes,
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the player's local control API.
///
/// The player issues bearer tokens via a password grant. The token is
/// cached for the lifetime of the process; the device does not rotate it
/// and a restart clears the cache.
pub struct PlayerClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    token: Mutex<Option<String>>,
}

impl PlayerClient {
    /// Create a new player client for `base_url` (e.g. `http://10.0.0.5:8080`)
    pub fn new(base_url: String, username: String, password: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("signbridge/0.1")
            .build()
            .map_err(|e| Error::Player(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            username,
            password,
            token: Mutex::new(None),
        })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the cached access token, fetching one on first use
    pub async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }

        let url = format!("{}/v2/oauth2/token", self.base_url);
        debug!(url = %url, username = %self.username, "Requesting player access token");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "grant_type": "password",
                "username": self.username,
                "password": self.password,
            }))
            .send()
            .await
            .map_err(|e| Error::Player(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Player(format!(
                "Token request returned status: {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Player(format!("Failed to parse token response: {}", e)))?;

        info!("Player access token obtained");
        *guard = Some(token.access_token.clone());
        Ok(token.access_token)
    }

    /// Tell the player to restart its content playlist
    pub async fn switch_playlist(&self) -> Result<serde_json::Value> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/app/switch?access_token={}", self.base_url, token);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "mode": "start" }))
            .send()
            .await
            .map_err(|e| Error::Player(format!("Playlist switch request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Player(format!(
                "Playlist switch returned status {}: {}",
                status, body
            )));
        }

        let result = response
            .json()
            .await
            .map_err(|e| Error::Player(format!("Failed to parse switch response: {}", e)))?;

        info!("Playlist reloaded");
        Ok(result)
    }

    /// Ask the player for a screenshot of its current output
    pub async fn take_screenshot(&self) -> Result<CapturedImage> {
        let token = self.access_token().await?;
        let url = format!("{}/v2/task/screenshot?access_token={}", self.base_url, token);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::Player(format!("Screenshot request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Player(format!(
                "Screenshot returned status {}: {}",
                status, body
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Player(format!("Failed to read screenshot data: {}", e)))?;

        if bytes.is_empty() {
            warn!("Player returned an empty screenshot");
        }

        debug!(size = bytes.len(), content_type = %content_type, "Screenshot captured");

        Ok(CapturedImage {
            bytes,
            content_type,
        })
    }
}

impl std::fmt::Debug for PlayerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerClient")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
