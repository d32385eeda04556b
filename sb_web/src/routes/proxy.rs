//! ABOUTME: Request relay endpoint forwarding JSON calls to arbitrary URLs
//! ABOUTME: Mirrors the downstream status code and JSON body back to the caller

use crate::{models::ProxyRequest, AppState};
use actix_web::{http::StatusCode, post, web, HttpResponse, Result};
use serde_json::json;
use tracing::{debug, warn};

/// Relay a JSON request to a caller-specified URL.
///
/// Whatever status and JSON body the downstream returns is mirrored back,
/// including error statuses; only transport failures and non-JSON bodies
/// are translated into a gateway error.
#[utoipa::path(
    post,
    path = "/api/proxy",
    tag = "proxy",
    request_body = ProxyRequest,
    responses(
        (status = 200, description = "Downstream response, status mirrored"),
        (status = 400, description = "Missing target_url or unsupported method"),
        (status = 502, description = "Downstream transport failure or non-JSON body"),
    )
)]
#[post("/proxy")]
pub async fn proxy(
    state: web::Data<AppState>,
    request: web::Json<ProxyRequest>,
) -> Result<HttpResponse> {
    let request = request.into_inner();

    let target_url = match request.target_url.as_deref() {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => {
            return Ok(HttpResponse::BadRequest().json(json!({ "error": "Missing target_url" })));
        }
    };

    let method = request.method.as_deref().unwrap_or("GET").to_uppercase();

    state.metrics.inc_proxy_requests();
    debug!(target_url = %target_url, method = %method, "Relaying request");

    let builder = match method.as_str() {
        "GET" => state.http.get(&target_url),
        "POST" => {
            let builder = state.http.post(&target_url);
            match &request.body {
                Some(body) => builder.json(body),
                None => builder,
            }
        }
        other => {
            return Ok(HttpResponse::BadRequest()
                .json(json!({ "error": format!("Unsupported method: {}", other) })));
        }
    };

    let response = match builder.send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(target_url = %target_url, error = %e, "Proxy transport failure");
            return Ok(HttpResponse::BadGateway().json(json!({
                "error": format!("Proxy Error: {}", e),
                "target_url": target_url,
            })));
        }
    };

    let status = response.status().as_u16();
    let body: serde_json::Value = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            warn!(target_url = %target_url, error = %e, "Downstream returned non-JSON body");
            return Ok(HttpResponse::BadGateway().json(json!({
                "error": format!("Proxy Error: {}", e),
                "target_url": target_url,
            })));
        }
    };

    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok(HttpResponse::build(status).json(body))
}
