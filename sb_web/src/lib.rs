//! ABOUTME: Web API layer exposing the relay, screenshot and identity endpoints
//! ABOUTME: Actix-web services with OpenAPI documentation

use actix_web::{middleware::Logger, web, App, HttpServer};
use sb_backend::BackendClient;
use sb_core::Result;
use sb_identity::IdentityStore;
use sb_obs::BridgeMetrics;
use sb_storage::ScreenshotStore;
use std::sync::Arc;
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod models;
pub mod routes;

use routes::{identity, meta, proxy, screenshot};

/// Config-derived settings the web layer reports and falls back on
#[derive(Debug, Clone, Default)]
pub struct RuntimeSettings {
    pub poller_enabled: bool,
    pub poller_interval_seconds: u64,
    pub upload_url: Option<String>,
    pub player_host: String,
    pub player_username: String,
    pub default_player_id: Option<String>,
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub identity: IdentityStore,
    pub screenshots: ScreenshotStore,
    pub backend: Arc<BackendClient>,
    pub metrics: Arc<BridgeMetrics>,
    /// Client for caller-specified downstream URLs (relay and capture)
    pub http: reqwest::Client,
    pub runtime: RuntimeSettings,
}

impl AppState {
    pub fn new(
        identity: IdentityStore,
        screenshots: ScreenshotStore,
        backend: Arc<BackendClient>,
        metrics: Arc<BridgeMetrics>,
        runtime: RuntimeSettings,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("signbridge/0.1")
            .build()
            .map_err(|e| sb_core::Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            identity,
            screenshots,
            backend,
            metrics,
            http,
            runtime,
        })
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        proxy::proxy,
        screenshot::screenshot,
        screenshot::upload_to_api,
        identity::callback,
        identity::get_player_id,
        identity::list_player_ids,
        identity::get_player_id_by_ip,
        identity::get_current_player_id,
        meta::config,
        meta::health,
    ),
    components(
        schemas(
            models::ProxyRequest,
            models::ScreenshotRequest,
            models::ScreenshotResponse,
            models::UploadRequest,
            models::UploadResponse,
            models::CallbackResponse,
            models::IdentityResponse,
            models::IdentityListResponse,
            models::RuntimeConfig,
            sb_identity::PlayerIdentity,
        ),
    ),
    tags(
        (name = "proxy", description = "Request relay"),
        (name = "screenshot", description = "Screenshot capture and upload"),
        (name = "identity", description = "Device identity callback and queries"),
        (name = "meta", description = "Service metadata"),
    )
)]
pub struct ApiDoc;

/// Create the main web application service factory
pub fn create_app(
    state: AppState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(Logger::default())
        .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .service(
            web::scope("/api")
                .service(proxy::proxy)
                .service(screenshot::screenshot)
                .service(screenshot::upload_to_api)
                .service(identity::get_player_id)
                .service(identity::list_player_ids)
                .service(identity::get_player_id_by_ip)
                .service(identity::get_current_player_id)
                .service(meta::config)
                .service(meta::health),
        )
        .service(identity::callback)
        .service(meta::index)
}

/// Start the web server
pub async fn start_server(bind_addr: &str, state: AppState) -> Result<()> {
    tracing::info!("Starting web server on {}", bind_addr);

    HttpServer::new(move || create_app(state.clone()))
        .bind(bind_addr)
        .map_err(|e| sb_core::Error::Config(format!("Failed to bind web server: {}", e)))?
        .run()
        .await
        .map_err(|e| sb_core::Error::Config(format!("Web server error: {}", e)))?;

    Ok(())
}
