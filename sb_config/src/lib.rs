//! ABOUTME: Configuration management with validation and environment loading
//! ABOUTME: Handles all bridge settings from environment variables and files

use config::{Config as ConfigBuilder, Environment, File};
use sb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Main configuration struct
#[derive(Debug, Clone, Deserialize, Serialize, Validate, Default)]
#[serde(default)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    #[validate(nested)]
    pub player: PlayerConfig,
    #[validate(nested)]
    pub backend: BackendConfig,
    #[validate(nested)]
    pub poller: PollerConfig,
    #[validate(nested)]
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ServerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    #[validate(range(min = 1, max = 65535))]
    pub obs_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3005,
            obs_port: 9000,
        }
    }
}

/// Media player connection settings with secret redaction
#[derive(Clone, Deserialize, Serialize, Validate)]
pub struct PlayerConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    #[validate(length(min = 1))]
    pub username: String,
    pub password: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            username: "admin".to_string(),
            password: String::new(),
        }
    }
}

impl PlayerConfig {
    /// Base URL of the player's control API
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Management backend (adnova-be) endpoints
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct BackendConfig {
    /// Base URL for the command queue API
    #[validate(url)]
    pub api_base_url: String,
    /// Screenshot upload endpoint; uploads are skipped when unset
    #[validate(url)]
    pub upload_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api/v1".to_string(),
            upload_url: None,
        }
    }
}

/// Command poller configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct PollerConfig {
    pub enabled: bool,
    #[validate(range(min = 1, max = 3600))]
    pub interval_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: 5,
        }
    }
}

/// Screenshot storage configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StorageConfig {
    #[validate(length(min = 1))]
    pub screenshots_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            screenshots_dir: "./data/screenshots".to_string(),
        }
    }
}

/// Device identity fallback
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct IdentityConfig {
    /// Player id to use before any device callback has been received
    pub default_player_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables and optional .env file
    pub fn load() -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        // Set defaults first
        builder = builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3005)?
            .set_default("server.obs_port", 9000)?
            .set_default("player.host", "127.0.0.1")?
            .set_default("player.port", 8080)?
            .set_default("player.username", "admin")?
            .set_default("player.password", "")?
            .set_default("backend.api_base_url", "http://127.0.0.1:8000/api/v1")?
            .set_default("poller.enabled", false)?
            .set_default("poller.interval_seconds", 5)?
            .set_default("storage.screenshots_dir", "./data/screenshots")?;

        // Handle nested environment variables whose keys contain underscores;
        // those don't survive the standard separator parsing.
        if let Ok(obs_port) = std::env::var("SIGNBRIDGE_SERVER_OBS_PORT") {
            builder = builder.set_override("server.obs_port", obs_port)?;
        }
        if let Ok(api_base_url) = std::env::var("SIGNBRIDGE_BACKEND_API_BASE_URL") {
            builder = builder.set_override("backend.api_base_url", api_base_url)?;
        }
        if let Ok(upload_url) = std::env::var("SIGNBRIDGE_BACKEND_UPLOAD_URL") {
            builder = builder.set_override("backend.upload_url", upload_url)?;
        }
        if let Ok(interval) = std::env::var("SIGNBRIDGE_POLLER_INTERVAL_SECONDS") {
            builder = builder.set_override("poller.interval_seconds", interval)?;
        }
        if let Ok(dir) = std::env::var("SIGNBRIDGE_STORAGE_SCREENSHOTS_DIR") {
            builder = builder.set_override("storage.screenshots_dir", dir)?;
        }
        if let Ok(player_id) = std::env::var("SIGNBRIDGE_IDENTITY_DEFAULT_PLAYER_ID") {
            builder = builder.set_override("identity.default_player_id", player_id)?;
        }

        // Try to load from .env file if it exists (optional)
        if std::path::Path::new(".env").exists() {
            builder = builder.add_source(File::with_name(".env").required(false));
        }

        // Load from environment variables with SIGNBRIDGE_ prefix (highest priority)
        builder = builder.add_source(
            Environment::with_prefix("SIGNBRIDGE")
                .try_parsing(true)
                .separator("_"),
        );

        let config = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

        let parsed: Config = config
            .try_deserialize()
            .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))?;

        let validation_result = parsed.validate();
        validation_result.map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        Ok(parsed)
    }
}
