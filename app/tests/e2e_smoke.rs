//! ABOUTME: End-to-end smoke test for the signbridge relay
//! ABOUTME: Tests the callback-capture-upload-poll workflow against mock services

use actix_web::test;
use sb_backend::BackendClient;
use sb_identity::IdentityStore;
use sb_obs::BridgeMetrics;
use sb_player::PlayerClient;
use sb_poller::CommandPoller;
use sb_storage::ScreenshotStore;
use sb_web::{create_app, AppState, RuntimeSettings};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use test_support::fake_jpeg_bytes;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// E2E test setup wiring the full component graph against mock services
struct E2ETestSetup {
    #[allow(dead_code)]
    temp_dir: TempDir,
    player_server: MockServer,
    backend_server: MockServer,
    identity: IdentityStore,
    metrics: Arc<BridgeMetrics>,
    state: AppState,
    poller: CommandPoller,
}

impl E2ETestSetup {
    async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let player_server = MockServer::start().await;
        let backend_server = MockServer::start().await;

        let identity = IdentityStore::new();
        let screenshots = ScreenshotStore::new(temp_dir.path().join("screenshots"));
        let metrics = Arc::new(BridgeMetrics::new());

        let backend = Arc::new(
            BackendClient::new(
                backend_server.uri(),
                Some(format!("{}/upload", backend_server.uri())),
            )
            .unwrap(),
        );
        let player = Arc::new(
            PlayerClient::new(player_server.uri(), "admin".into(), "secret".into()).unwrap(),
        );

        let runtime = RuntimeSettings {
            poller_enabled: true,
            poller_interval_seconds: 5,
            upload_url: Some(format!("{}/upload", backend_server.uri())),
            player_host: "127.0.0.1".to_string(),
            player_username: "admin".to_string(),
            default_player_id: None,
        };

        let state = AppState::new(
            identity.clone(),
            screenshots.clone(),
            Arc::clone(&backend),
            Arc::clone(&metrics),
            runtime,
        )
        .unwrap();

        let poller = CommandPoller::new(
            backend,
            player,
            screenshots,
            identity.clone(),
            Arc::clone(&metrics),
        );

        Self {
            temp_dir,
            player_server,
            backend_server,
            identity,
            metrics,
            state,
            poller,
        }
    }

    async fn mount_player_mocks(&self) {
        Mock::given(method("POST"))
            .and(path("/v2/oauth2/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "access_token": "tok-e2e" })),
            )
            .mount(&self.player_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v2/task/screenshot"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .set_body_bytes(fake_jpeg_bytes()),
            )
            .mount(&self.player_server)
            .await;
    }
}

#[actix_web::test]
async fn smoke_identity_callback_config_and_capture_flow() {
    let setup = E2ETestSetup::new().await;
    setup.mount_player_mocks().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_json(json!({ "data": { "url": "http://backend/shots/e2e.jpg" } })),
        )
        .mount(&setup.backend_server)
        .await;

    let app = test::init_service(create_app(setup.state.clone())).await;

    // 1. Device reports its identity
    let req = test::TestRequest::put()
        .uri("/get-uuid-player/dev-123/info.xml")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    // 2. Current identity reflects the callback
    let req = test::TestRequest::get()
        .uri("/api/get-current-player-id")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["player_id"], "dev-123");
    assert_eq!(body["data"]["filename"], "info.xml");

    // 3. The config endpoint tracks the live identity
    let req = test::TestRequest::get().uri("/api/config").to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["default_player_id"], "dev-123");

    // 4. Capture a screenshot through the relay surface
    let req = test::TestRequest::post()
        .uri("/api/screenshot")
        .set_json(json!({
            "target_url": format!("{}/v2/task/screenshot", setup.player_server.uri())
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let shot: serde_json::Value = test::read_body_json(resp).await;
    let filepath = shot["filepath"].as_str().unwrap().to_string();

    // 5. Upload the saved screenshot to the backend
    let req = test::TestRequest::post()
        .uri("/api/upload-to-api")
        .set_json(json!({ "filepath": filepath, "player_id": "dev-123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["api_response"]["data"]["url"],
        "http://backend/shots/e2e.jpg"
    );

    // Captured once through the web surface
    let encoded = setup.metrics.encode().unwrap();
    assert!(encoded.contains("screenshots_captured_total 1"));
}

#[actix_web::test]
async fn smoke_poll_cycle_executes_queue_command() {
    let setup = E2ETestSetup::new().await;
    setup.mount_player_mocks().await;

    setup
        .identity
        .replace(sb_identity::PlayerIdentity {
            player_id: "dev-123".to_string(),
            filename: "info.xml".to_string(),
            last_updated: "2024-01-01T00:00:00Z".to_string(),
            ip_address: None,
        })
        .await;

    Mock::given(method("POST"))
        .and(path("/v2/app/switch"))
        .and(query_param("access_token", "tok-e2e"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mode": "start" })))
        .expect(1)
        .mount(&setup.player_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/garlic/commands/pending"))
        .and(query_param("player_id", "dev-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "commands": [ { "id": 21, "command_type": "reload_playlist" } ] }
        })))
        .mount(&setup.backend_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/garlic/commands/21/status"))
        .and(body_partial_json(json!({ "status": "processing" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&setup.backend_server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/garlic/commands/21/status"))
        .and(body_partial_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&setup.backend_server)
        .await;

    let report = setup.poller.poll_once().await;
    assert_eq!(report.commands_seen, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.status_report_failures, 0);

    let encoded = setup.metrics.encode().unwrap();
    assert!(encoded.contains("commands_completed_total 1"));
    assert!(encoded.contains("poll_cycles_total 1"));
}
