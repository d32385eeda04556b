//! ABOUTME: Background command poller for the adnova-be queue
//! ABOUTME: Fetches pending commands and executes them against the player

use sb_backend::{BackendClient, Command, CommandStatus, CommandType};
use sb_core::{time::now_iso8601, Id};
use sb_identity::IdentityStore;
use sb_obs::BridgeMetrics;
use sb_player::PlayerClient;
use sb_storage::ScreenshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Outcome counters for a single poll cycle.
///
/// Command failures and status-report failures are tracked separately; a
/// command that executed fine but whose completion report was lost shows up
/// in `status_report_failures`, not `failed`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// No player id was known; the cycle did nothing
    pub skipped: bool,
    /// The pending-commands fetch itself failed
    pub fetch_failed: bool,
    pub commands_seen: usize,
    pub completed: usize,
    pub failed: usize,
    pub status_report_failures: usize,
}

/// Polls the backend queue on a fixed interval and dispatches commands
pub struct CommandPoller {
    backend: Arc<BackendClient>,
    player: Arc<PlayerClient>,
    screenshots: ScreenshotStore,
    identity: IdentityStore,
    metrics: Arc<BridgeMetrics>,
    default_player_id: Option<String>,
    interval: Duration,
}

impl CommandPoller {
    pub fn new(
        backend: Arc<BackendClient>,
        player: Arc<PlayerClient>,
        screenshots: ScreenshotStore,
        identity: IdentityStore,
        metrics: Arc<BridgeMetrics>,
    ) -> Self {
        Self {
            backend,
            player,
            screenshots,
            identity,
            metrics,
            default_player_id: None,
            interval: Duration::from_secs(5),
        }
    }

    /// Player id to fall back on before any device callback arrives
    pub fn with_default_player_id(mut self, player_id: Option<String>) -> Self {
        self.default_player_id = player_id;
        self
    }

    /// Polling interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the poll loop until the task is dropped
    pub async fn run(self) {
        info!(
            interval_seconds = self.interval.as_secs(),
            "Command polling started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let cycle = Id::new();
            let report = self.poll_once().await;

            if report.skipped {
                debug!(cycle = %cycle, "Poll cycle skipped, no player id known yet");
            } else if report.commands_seen > 0 || report.fetch_failed {
                info!(
                    cycle = %cycle,
                    commands = report.commands_seen,
                    completed = report.completed,
                    failed = report.failed,
                    status_report_failures = report.status_report_failures,
                    fetch_failed = report.fetch_failed,
                    "Poll cycle finished"
                );
            } else {
                debug!(cycle = %cycle, "Poll cycle finished, queue empty");
            }
        }
    }

    /// Execute one poll cycle: fetch pending commands and dispatch each
    pub async fn poll_once(&self) -> CycleReport {
        let mut report = CycleReport::default();

        let player_id = match self.identity.current_player_id().await {
            Some(id) => id,
            None => match self.default_player_id.clone() {
                Some(id) => id,
                None => {
                    report.skipped = true;
                    return report;
                }
            },
        };

        self.metrics.inc_poll_cycles();

        let commands = match self.backend.pending_commands(&player_id).await {
            Ok(commands) => commands,
            Err(e) => {
                // Transient by assumption; the next tick retries
                warn!(player_id = %player_id, error = %e, "Failed to fetch pending commands");
                report.fetch_failed = true;
                return report;
            }
        };

        report.commands_seen = commands.len();
        if commands.is_empty() {
            return report;
        }

        info!(player_id = %player_id, count = commands.len(), "Received pending commands");

        for command in &commands {
            self.handle_command(command, &player_id, &mut report).await;
        }

        report
    }

    async fn handle_command(&self, command: &Command, player_id: &str, report: &mut CycleReport) {
        // Mark processing first; a lost report is logged but does not stop
        // the command from running.
        if let Err(e) = self
            .backend
            .update_status(command.id, CommandStatus::Processing, None)
            .await
        {
            warn!(
                command_id = command.id,
                error = %e,
                "Failed to report processing status"
            );
            report.status_report_failures += 1;
            self.metrics.inc_status_report_failures();
        }

        let (status, result) = match self.execute(command, player_id).await {
            Ok(result) => {
                info!(
                    command_id = command.id,
                    command_type = %command.command_type,
                    "Command completed"
                );
                report.completed += 1;
                self.metrics.inc_commands_completed();
                (CommandStatus::Completed, result)
            }
            Err(e) => {
                error!(
                    command_id = command.id,
                    command_type = %command.command_type,
                    error = %e,
                    "Command failed"
                );
                report.failed += 1;
                self.metrics.inc_commands_failed();
                (
                    CommandStatus::Failed,
                    serde_json::json!({ "error": e.to_string() }),
                )
            }
        };

        if let Err(e) = self
            .backend
            .update_status(command.id, status, Some(result))
            .await
        {
            error!(
                command_id = command.id,
                ?status,
                error = %e,
                "Failed to report final command status"
            );
            report.status_report_failures += 1;
            self.metrics.inc_status_report_failures();
        }
    }

    /// Dispatch a command to the matching handler
    async fn execute(
        &self,
        command: &Command,
        player_id: &str,
    ) -> sb_core::Result<serde_json::Value> {
        match &command.command_type {
            CommandType::ReloadPlaylist => self.reload_playlist(command).await,
            CommandType::TakeScreenshot => self.take_screenshot(player_id).await,
            CommandType::Other(other) => Err(sb_core::Error::Validation(format!(
                "Unknown command type: {}",
                other
            ))),
        }
    }

    async fn reload_playlist(&self, command: &Command) -> sb_core::Result<serde_json::Value> {
        if let Some(content_url) = command
            .payload
            .as_ref()
            .and_then(|p| p.content_url.as_deref())
        {
            debug!(command_id = command.id, content_url = %content_url, "Reloading playlist");
        }

        let result = self.player.switch_playlist().await?;

        Ok(serde_json::json!({
            "success": true,
            "result": result,
            "executed_at": now_iso8601(),
        }))
    }

    async fn take_screenshot(&self, player_id: &str) -> sb_core::Result<serde_json::Value> {
        let captured = self.player.take_screenshot().await?;
        let saved = self
            .screenshots
            .save(captured.bytes.clone(), &captured.content_type)
            .await?;
        self.metrics.inc_screenshots_captured();

        let mut result = serde_json::json!({
            "success": true,
            "local_path": saved.relative_path,
            "executed_at": now_iso8601(),
        });

        // Upload is best effort: a saved-but-not-uploaded screenshot is
        // still a successful command.
        if self.backend.can_upload() {
            match self
                .backend
                .upload_screenshot(
                    captured.bytes,
                    &saved.filename,
                    Some(player_id),
                    &saved.timestamp,
                )
                .await
            {
                Ok(response) => {
                    if let Some(url) = response
                        .get("data")
                        .and_then(|d| d.get("url"))
                        .and_then(|u| u.as_str())
                    {
                        result["screenshot_url"] = serde_json::json!(url);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Screenshot saved locally but upload failed");
                }
            }
        }

        Ok(result)
    }
}
