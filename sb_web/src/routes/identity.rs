//! ABOUTME: Device identity callback and lookup endpoints
//! ABOUTME: Tracks the most recent player id reported by the device

use crate::{
    models::{CallbackResponse, IdentityListResponse, IdentityResponse},
    AppState,
};
use actix_web::{get, put, web, HttpRequest, HttpResponse, Result};
use sb_core::time::now_iso8601;
use sb_identity::PlayerIdentity;
use serde_json::json;
use tracing::info;

/// Device-initiated callback reporting the player id.
///
/// The player PUTs its id and the name of the file it extracted it from;
/// the stored identity is replaced wholesale on every call.
#[utoipa::path(
    put,
    path = "/get-uuid-player/{player_id}/{filename}",
    tag = "identity",
    params(
        ("player_id" = String, Path, description = "Player-reported identifier"),
        ("filename" = String, Path, description = "File the id was extracted from"),
    ),
    responses(
        (status = 200, description = "Identity stored", body = CallbackResponse),
    )
)]
#[put("/get-uuid-player/{player_id}/{filename}")]
pub async fn callback(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let (player_id, filename) = path.into_inner();

    let ip_address = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);

    info!(
        player_id = %player_id,
        filename = %filename,
        ip = ip_address.as_deref().unwrap_or("unknown"),
        "Identity callback received"
    );

    state
        .identity
        .replace(PlayerIdentity {
            player_id: player_id.clone(),
            filename: filename.clone(),
            last_updated: now_iso8601(),
            ip_address,
        })
        .await;

    Ok(HttpResponse::Ok().json(CallbackResponse {
        success: true,
        message: "Player ID received and stored".to_string(),
        player_id,
        filename,
    }))
}

/// Look up the stored identity by player id
#[utoipa::path(
    get,
    path = "/api/get-player-id/{player_id}",
    tag = "identity",
    params(("player_id" = String, Path, description = "Player identifier")),
    responses(
        (status = 200, description = "Identity found", body = IdentityResponse),
        (status = 404, description = "No identity stored under this id"),
    )
)]
#[get("/get-player-id/{player_id}")]
pub async fn get_player_id(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let player_id = path.into_inner();

    match state.identity.find_by_id(&player_id).await {
        Some(data) => Ok(HttpResponse::Ok().json(IdentityResponse {
            success: true,
            data,
        })),
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "Player ID not found",
        }))),
    }
}

/// List all tracked identities - at most one entry
#[utoipa::path(
    get,
    path = "/api/list-player-ids",
    tag = "identity",
    responses(
        (status = 200, description = "Tracked identities", body = IdentityListResponse),
    )
)]
#[get("/list-player-ids")]
pub async fn list_player_ids(state: web::Data<AppState>) -> Result<HttpResponse> {
    let players = state.identity.list().await;

    Ok(HttpResponse::Ok().json(IdentityListResponse {
        success: true,
        count: players.len(),
        players,
    }))
}

/// Find the stored identity by IP fragment
#[utoipa::path(
    get,
    path = "/api/get-player-id-by-ip/{ip}",
    tag = "identity",
    params(("ip" = String, Path, description = "IP address or fragment")),
    responses(
        (status = 200, description = "Identity found", body = IdentityResponse),
        (status = 404, description = "No identity with a matching address"),
    )
)]
#[get("/get-player-id-by-ip/{ip}")]
pub async fn get_player_id_by_ip(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let ip = path.into_inner();

    match state.identity.find_by_ip(&ip).await {
        Some(data) => Ok(HttpResponse::Ok().json(IdentityResponse {
            success: true,
            data,
        })),
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": format!("No player_id found for IP: {}", ip),
        }))),
    }
}

/// The most recently received identity
#[utoipa::path(
    get,
    path = "/api/get-current-player-id",
    tag = "identity",
    responses(
        (status = 200, description = "Current identity", body = IdentityResponse),
        (status = 404, description = "No identity received yet"),
    )
)]
#[get("/get-current-player-id")]
pub async fn get_current_player_id(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.identity.current().await {
        Some(data) => Ok(HttpResponse::Ok().json(IdentityResponse {
            success: true,
            data,
        })),
        None => Ok(HttpResponse::NotFound().json(json!({
            "success": false,
            "message": "No player_id stored yet. Waiting for the player to send its UUID...",
        }))),
    }
}

#[cfg(test)]
mod tests {
    use crate::{create_app, test_util::test_state};
    use actix_web::test;

    #[actix_web::test]
    async fn test_callback_stores_identity() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::put()
            .uri("/get-uuid-player/dev-123/info.xml")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["player_id"], "dev-123");
        assert_eq!(body["filename"], "info.xml");
    }

    #[actix_web::test]
    async fn test_callback_replaces_previous_identity() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        for (id, file) in [("dev-1", "a.xml"), ("dev-2", "b.xml"), ("dev-3", "c.xml")] {
            let req = test::TestRequest::put()
                .uri(&format!("/get-uuid-player/{}/{}", id, file))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get()
            .uri("/api/list-player-ids")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;

        // Exactly one record, matching the latest call
        assert_eq!(body["count"], 1);
        assert_eq!(body["players"][0]["player_id"], "dev-3");
        assert_eq!(body["players"][0]["filename"], "c.xml");
    }

    #[actix_web::test]
    async fn test_get_player_id_found_and_missing() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::put()
            .uri("/get-uuid-player/dev-123/info.xml")
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/get-player-id/dev-123")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["player_id"], "dev-123");

        let req = test::TestRequest::get()
            .uri("/api/get-player-id/dev-999")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn test_list_empty_store() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::get()
            .uri("/api/list-player-ids")
            .to_request();
        let resp = test::call_service(&app, req).await;
        let body: serde_json::Value = test::read_body_json(resp).await;

        assert_eq!(body["count"], 0);
        assert!(body["players"].as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_current_identity_404_before_callback() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        let req = test::TestRequest::get()
            .uri("/api/get-current-player-id")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }

    #[actix_web::test]
    async fn test_lookup_by_ip_fragment() {
        let (_tmp, state) = test_state("http://127.0.0.1:1", None);
        let app = test::init_service(create_app(state)).await;

        // actix test requests arrive from a peer address the store records
        let req = test::TestRequest::put()
            .uri("/get-uuid-player/dev-123/info.xml")
            .peer_addr("192.168.1.50:40000".parse().unwrap())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/get-player-id-by-ip/192.168.1.50")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["player_id"], "dev-123");

        let req = test::TestRequest::get()
            .uri("/api/get-player-id-by-ip/10.9.9.9")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
