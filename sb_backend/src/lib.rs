//! ABOUTME: Client for the adnova-be management backend
//! ABOUTME: Command queue polling, status updates and screenshot uploads

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

/// Errors that can occur talking to the management backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend returned status {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("Upload failed with status {status}")]
    UploadFailed {
        status: u16,
        details: serde_json::Value,
    },
    #[error("Non-JSON response (status {status}): {body}")]
    NonJson { status: u16, body: String },
    #[error("Upload URL not configured")]
    UploadNotConfigured,
}

impl From<BackendError> for sb_core::Error {
    fn from(err: BackendError) -> Self {
        sb_core::Error::Backend(err.to_string())
    }
}

/// Command type as delivered by the backend queue.
///
/// Unrecognized strings are preserved so dispatch failures can name them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandType {
    ReloadPlaylist,
    TakeScreenshot,
    Other(String),
}

impl From<String> for CommandType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "reload_playlist" => CommandType::ReloadPlaylist,
            "take_screenshot" => CommandType::TakeScreenshot,
            _ => CommandType::Other(s),
        }
    }
}

impl From<CommandType> for String {
    fn from(kind: CommandType) -> Self {
        match kind {
            CommandType::ReloadPlaylist => "reload_playlist".to_string(),
            CommandType::TakeScreenshot => "take_screenshot".to_string(),
            CommandType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for CommandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandType::ReloadPlaylist => write!(f, "reload_playlist"),
            CommandType::TakeScreenshot => write!(f, "take_screenshot"),
            CommandType::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Optional command payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
}

/// A pending command from the backend queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub id: i64,
    pub command_type: CommandType,
    #[serde(default)]
    pub payload: Option<CommandPayload>,
}

/// Remote-side command lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Default, Deserialize)]
struct PendingData {
    #[serde(default)]
    commands: Vec<Command>,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    #[serde(default)]
    data: Option<PendingData>,
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
///
/// The upload endpoint embeds the player id in stored object names, so the
/// id is normalized before it goes on the wire. Missing or empty ids become
/// `unknown`.
pub fn sanitize_player_id(player_id: Option<&str>) -> String {
    match player_id {
        Some(id) if !id.is_empty() => id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect(),
        _ => "unknown".to_string(),
    }
}

/// Client for the adnova-be command queue and upload API
pub struct BackendClient {
    client: reqwest::Client,
    api_base_url: String,
    upload_url: Option<String>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// `api_base_url` is the command queue root (e.g. `http://host/api/v1`);
    /// `upload_url` is the full screenshot upload endpoint, or `None` when
    /// uploads are not configured.
    pub fn new(api_base_url: String, upload_url: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("signbridge/0.1")
            .build()?;

        Ok(Self {
            client,
            api_base_url,
            upload_url,
        })
    }

    /// Whether a screenshot upload endpoint is configured
    pub fn can_upload(&self) -> bool {
        self.upload_url.is_some()
    }

    /// Fetch pending commands for a player
    pub async fn pending_commands(&self, player_id: &str) -> Result<Vec<Command>> {
        let url = format!(
            "{}/garlic/commands/pending?player_id={}",
            self.api_base_url, player_id
        );

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(BackendError::Api {
                status: response.status().as_u16(),
                detail: "Failed to fetch pending commands".to_string(),
            });
        }

        let parsed: PendingResponse = response.json().await?;
        let commands = parsed.data.unwrap_or_default().commands;

        debug!(player_id = %player_id, count = commands.len(), "Fetched pending commands");
        Ok(commands)
    }

    /// Report a command's status back to the queue
    pub async fn update_status(
        &self,
        command_id: i64,
        status: CommandStatus,
        result: Option<serde_json::Value>,
    ) -> Result<()> {
        let url = format!("{}/garlic/commands/{}/status", self.api_base_url, command_id);

        let mut body = serde_json::json!({ "status": status });
        if let Some(result) = result {
            body["result"] = result;
        }

        let response = self.client.put(&url).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(BackendError::Api {
                status: response.status().as_u16(),
                detail: format!("Status update for command {} rejected", command_id),
            });
        }

        debug!(command_id, ?status, "Command status reported");
        Ok(())
    }

    /// Upload a captured screenshot as multipart form data.
    ///
    /// Parts: `image` (bytes, jpeg), `player_id` (sanitized), `timestamp`.
    /// Returns the backend's JSON response body.
    pub async fn upload_screenshot(
        &self,
        image: Bytes,
        filename: &str,
        player_id: Option<&str>,
        timestamp: &str,
    ) -> Result<serde_json::Value> {
        let upload_url = self
            .upload_url
            .as_ref()
            .ok_or(BackendError::UploadNotConfigured)?;

        let sanitized = sanitize_player_id(player_id);

        let image_part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name(filename.to_string())
            .mime_str("image/jpeg")?;

        let form = reqwest::multipart::Form::new()
            .part("image", image_part)
            .text("player_id", sanitized.clone())
            .text("timestamp", timestamp.to_string());

        debug!(
            upload_url = %upload_url,
            player_id = %sanitized,
            filename = %filename,
            "Uploading screenshot"
        );

        let response = self.client.post(upload_url).multipart(form).send().await?;
        let status = response.status();

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if !is_json {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::NonJson {
                status: status.as_u16(),
                body,
            });
        }

        let details: serde_json::Value = response.json().await?;

        if !status.is_success() {
            return Err(BackendError::UploadFailed {
                status: status.as_u16(),
                details,
            });
        }

        info!(player_id = %sanitized, filename = %filename, "Screenshot uploaded");
        Ok(details)
    }
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("api_base_url", &self.api_base_url)
            .field("upload_url", &self.upload_url)
            .finish()
    }
}
