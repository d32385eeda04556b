//! ABOUTME: Screenshot capture and upload endpoints
//! ABOUTME: Captures image bytes from a target URL, persists and uploads them

use crate::{
    models::{ScreenshotRequest, ScreenshotResponse, UploadRequest, UploadResponse},
    AppState,
};
use actix_web::{http::StatusCode, post, web, HttpResponse, Result};
use sb_backend::BackendError;
use sb_core::{screenshot_timestamp, utc_now};
use serde_json::json;
use tracing::{error, info, warn};

/// Trigger a screenshot at the target URL and persist the result locally.
///
/// The target is expected to answer an empty JSON POST with image bytes -
/// in practice the player's screenshot task endpoint.
#[utoipa::path(
    post,
    path = "/api/screenshot",
    tag = "screenshot",
    request_body = ScreenshotRequest,
    responses(
        (status = 200, description = "Screenshot captured and saved", body = ScreenshotResponse),
        (status = 400, description = "Missing target_url"),
        (status = 502, description = "Downstream transport failure"),
    )
)]
#[post("/screenshot")]
pub async fn screenshot(
    state: web::Data<AppState>,
    request: web::Json<ScreenshotRequest>,
) -> Result<HttpResponse> {
    let target_url = match request.target_url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({ "error": "Missing target_url" })));
        }
    };

    let response = match state.http.post(&target_url).json(&json!({})).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(target_url = %target_url, error = %e, "Screenshot request failed");
            return Ok(HttpResponse::BadGateway().json(json!({
                "error": format!("Screenshot Error: {}", e),
                "target_url": target_url,
            })));
        }
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
        return Ok(HttpResponse::build(status).json(json!({
            "error": format!("HTTP Error: {}", status.as_u16()),
            "response": body,
        })));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            return Ok(HttpResponse::BadGateway().json(json!({
                "error": format!("Screenshot Error: {}", e),
                "target_url": target_url,
            })));
        }
    };

    let saved = match state.screenshots.save(bytes, &content_type).await {
        Ok(saved) => saved,
        Err(e) => {
            error!(error = %e, "Failed to persist screenshot");
            return Ok(HttpResponse::InternalServerError()
                .json(json!({ "error": format!("Screenshot Error: {}", e) })));
        }
    };

    state.metrics.inc_screenshots_captured();

    Ok(HttpResponse::Ok().json(ScreenshotResponse {
        success: true,
        filepath: saved.relative_path,
        filename: saved.filename,
        size: saved.size,
        content_type: saved.content_type,
        timestamp: saved.timestamp,
    }))
}

/// Upload a previously saved screenshot to the management backend
#[utoipa::path(
    post,
    path = "/api/upload-to-api",
    tag = "screenshot",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Screenshot uploaded", body = UploadResponse),
        (status = 400, description = "Missing filepath or invalid path"),
        (status = 404, description = "Saved screenshot not found"),
        (status = 500, description = "Upload endpoint not configured or read failure"),
    )
)]
#[post("/upload-to-api")]
pub async fn upload_to_api(
    state: web::Data<AppState>,
    request: web::Json<UploadRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();

    let filepath = match request.filepath.as_deref() {
        Some(path) if !path.is_empty() => path.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({ "error": "Missing filepath" })));
        }
    };

    if !state.backend.can_upload() {
        error!("Upload requested but no upload URL is configured");
        return Ok(HttpResponse::InternalServerError()
            .json(json!({ "error": "Upload URL not configured" })));
    }

    let image = match state.screenshots.read(&filepath).await {
        Ok(image) => image,
        Err(sb_core::Error::NotFound(msg)) => {
            return Ok(HttpResponse::NotFound().json(json!({ "error": msg })));
        }
        Err(sb_core::Error::Validation(msg)) => {
            return Ok(HttpResponse::BadRequest().json(json!({ "error": msg })));
        }
        Err(e) => {
            error!(filepath = %filepath, error = %e, "Failed to read screenshot");
            return Ok(HttpResponse::InternalServerError()
                .json(json!({ "error": format!("Upload to API Error: {}", e) })));
        }
    };

    let filename = filepath
        .rsplit('/')
        .next()
        .unwrap_or(filepath.as_str())
        .to_string();
    let timestamp = screenshot_timestamp(utc_now());

    match state
        .backend
        .upload_screenshot(image, &filename, request.player_id.as_deref(), &timestamp)
        .await
    {
        Ok(api_response) => {
            info!(filename = %filename, "Screenshot uploaded to backend");
            Ok(HttpResponse::Ok().json(UploadResponse {
                success: true,
                message: "Screenshot uploaded to API successfully".to_string(),
                api_response,
            }))
        }
        Err(BackendError::UploadFailed { status, details }) => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            Ok(HttpResponse::build(status).json(json!({
                "error": "Upload failed",
                "status": status.as_u16(),
                "details": details,
            })))
        }
        Err(BackendError::NonJson { status, body }) => Ok(HttpResponse::BadGateway().json(json!({
            "error": "Non-JSON response",
            "status": status,
            "response_text": body,
        }))),
        Err(e) => {
            error!(error = %e, "Upload to backend failed");
            Ok(HttpResponse::InternalServerError()
                .json(json!({ "error": format!("Upload to API Error: {}", e) })))
        }
    }
}
