use sb_backend::BackendClient;
use sb_config::Config;
use sb_core::telemetry;
use sb_identity::IdentityStore;
use sb_obs::{BridgeMetrics, ObsState};
use sb_player::PlayerClient;
use sb_poller::CommandPoller;
use sb_storage::ScreenshotStore;
use sb_web::{AppState, RuntimeSettings};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    telemetry::init_tracing("development", "signbridge");
    tracing::info!("signbridge starting");

    // Load configuration - exit with non-zero if invalid
    let config = match Config::load() {
        Ok(config) => {
            tracing::debug!(?config, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        obs_port = %config.server.obs_port,
        player = %config.player.base_url(),
        backend = %config.backend.api_base_url,
        poller_enabled = config.poller.enabled,
        "Application configured and ready"
    );

    let identity = IdentityStore::new();
    let screenshots = ScreenshotStore::new(config.storage.screenshots_dir.clone());
    let metrics = Arc::new(BridgeMetrics::new());

    let backend = match BackendClient::new(
        config.backend.api_base_url.clone(),
        config.backend.upload_url.clone(),
    ) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            tracing::error!("Failed to create backend client: {}", e);
            process::exit(1);
        }
    };

    let player = match PlayerClient::new(
        config.player.base_url(),
        config.player.username.clone(),
        config.player.password.clone(),
    ) {
        Ok(player) => Arc::new(player),
        Err(e) => {
            tracing::error!("Failed to create player client: {}", e);
            process::exit(1);
        }
    };

    // Initialize web application state
    let runtime = RuntimeSettings {
        poller_enabled: config.poller.enabled,
        poller_interval_seconds: config.poller.interval_seconds,
        upload_url: config.backend.upload_url.clone(),
        player_host: config.player.host.clone(),
        player_username: config.player.username.clone(),
        default_player_id: config.identity.default_player_id.clone(),
    };

    let web_app_state = match AppState::new(
        identity.clone(),
        screenshots.clone(),
        Arc::clone(&backend),
        Arc::clone(&metrics),
        runtime,
    ) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create web state: {}", e);
            process::exit(1);
        }
    };

    // Initialize observability state around the shared metrics handle
    let obs_state = ObsState::with_metrics(Arc::clone(&metrics));

    // Start the background command poller when enabled
    if config.poller.enabled {
        let poller = CommandPoller::new(
            Arc::clone(&backend),
            Arc::clone(&player),
            screenshots.clone(),
            identity.clone(),
            Arc::clone(&metrics),
        )
        .with_default_player_id(config.identity.default_player_id.clone())
        .with_interval(Duration::from_secs(config.poller.interval_seconds));

        tokio::spawn(poller.run());
    } else {
        tracing::info!("Command polling disabled (set SIGNBRIDGE_POLLER_ENABLED=true to enable)");
    }

    let obs_bind_addr = format!("0.0.0.0:{}", config.server.obs_port);
    let web_bind_addr = format!("{}:{}", config.server.host, config.server.port);

    // Run both servers concurrently - either exiting ends the process
    let obs_future = sb_obs::start_server(&obs_bind_addr, obs_state);
    let web_future = sb_web::start_server(&web_bind_addr, web_app_state);

    let result = tokio::select! {
        obs_result = obs_future => {
            tracing::error!("Observability server exited");
            obs_result
        }
        web_result = web_future => {
            tracing::error!("Web server exited");
            web_result
        }
    };

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        process::exit(1);
    }
}
