//! ABOUTME: Data models for the web API with OpenAPI schemas
//! ABOUTME: Request/response structures shared by the route handlers

use sb_identity::PlayerIdentity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for the relay endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProxyRequest {
    /// Downstream URL the request is forwarded to
    pub target_url: Option<String>,
    /// HTTP method, GET or POST; defaults to GET
    pub method: Option<String>,
    /// JSON body forwarded on POST
    pub body: Option<serde_json::Value>,
}

/// Request body for the screenshot capture endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScreenshotRequest {
    /// URL expected to return image bytes on an empty POST
    pub target_url: Option<String>,
}

/// Response for a persisted screenshot
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScreenshotResponse {
    pub success: bool,
    pub filename: String,
    pub filepath: String,
    pub size: usize,
    pub content_type: String,
    pub timestamp: String,
}

/// Request body for uploading a saved screenshot to the backend
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadRequest {
    /// Relative path returned by the screenshot endpoint
    pub filepath: Option<String>,
    pub player_id: Option<String>,
}

/// Response for a successful upload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub api_response: serde_json::Value,
}

/// Response for the identity callback
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallbackResponse {
    pub success: bool,
    pub message: String,
    pub player_id: String,
    pub filename: String,
}

/// Envelope for identity lookups
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdentityResponse {
    pub success: bool,
    pub data: PlayerIdentity,
}

/// Envelope for the identity listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IdentityListResponse {
    pub success: bool,
    pub count: usize,
    pub players: Vec<PlayerIdentity>,
}

/// Runtime configuration exposed to a front-end
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RuntimeConfig {
    pub poller_enabled: bool,
    pub poller_interval_seconds: u64,
    pub upload_url: String,
    pub player_host: String,
    pub player_username: String,
    /// Most recently received player id, or the configured default
    pub default_player_id: String,
}
