//! ABOUTME: Service metadata endpoints
//! ABOUTME: Runtime configuration for front-ends, health check, landing page

use crate::{models::RuntimeConfig, AppState};
use actix_web::{get, web, HttpResponse, Result};
use serde_json::json;

/// Runtime configuration for a front-end.
///
/// `default_player_id` always reflects the most recently received identity;
/// the configured default only applies while no callback has arrived yet.
#[utoipa::path(
    get,
    path = "/api/config",
    tag = "meta",
    responses(
        (status = 200, description = "Runtime configuration", body = RuntimeConfig),
    )
)]
#[get("/config")]
pub async fn config(state: web::Data<AppState>) -> Result<HttpResponse> {
    let default_player_id = match state.identity.current_player_id().await {
        Some(id) => id,
        None => state
            .runtime
            .default_player_id
            .clone()
            .unwrap_or_default(),
    };

    Ok(HttpResponse::Ok().json(RuntimeConfig {
        poller_enabled: state.runtime.poller_enabled,
        poller_interval_seconds: state.runtime.poller_interval_seconds,
        upload_url: state.runtime.upload_url.clone().unwrap_or_default(),
        player_host: state.runtime.player_host.clone(),
        player_username: state.runtime.player_username.clone(),
        default_player_id,
    }))
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "meta",
    responses((status = 200, description = "Service healthy")),
)]
#[get("/health")]
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// JSON service descriptor in place of a static landing page
#[get("/")]
pub async fn index() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({
        "service": "signbridge",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs/",
    })))
}

#[cfg(test)]
mod tests {
    use crate::{create_app, test_util::test_state};
    use actix_web::test;

    #[actix_web::test]
    async fn test_health() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_config_falls_back_to_configured_default() {
        let (_tmp, mut state) = test_state("http://127.0.0.1:1", None);
        state.runtime.default_player_id = Some("configured-default".to_string());
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::get().uri("/api/config").to_request();
        let resp = test::call_service(&app, req).await;

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["default_player_id"], "configured-default");
    }

    #[actix_web::test]
    async fn test_config_prefers_live_identity() {
        let (_tmp, mut state) = test_state("http://127.0.0.1:1", None);
        state.runtime.default_player_id = Some("configured-default".to_string());
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::put()
            .uri("/get-uuid-player/live-player/info.xml")
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/config").to_request();
        let resp = test::call_service(&app, req).await;

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["default_player_id"], "live-player");
    }

    #[actix_web::test]
    async fn test_config_empty_when_nothing_known() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::get().uri("/api/config").to_request();
        let resp = test::call_service(&app, req).await;

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["default_player_id"], "");
        assert_eq!(body["poller_enabled"], false);
        assert_eq!(body["poller_interval_seconds"], 5);
    }

    #[actix_web::test]
    async fn test_config_never_exposes_password() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::get().uri("/api/config").to_request();
        let resp = test::call_service(&app, req).await;

        let body = test::read_body(resp).await;
        let body_str = std::str::from_utf8(&body).unwrap();
        assert!(!body_str.contains("password"));
    }
}
