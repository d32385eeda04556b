//! ABOUTME: Device identity tracking for the most recent player callback
//! ABOUTME: Single-record store shared between the web layer and the poller

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

/// Identity record reported by the player device.
///
/// The device PUTs its id and the name of the file it parsed it from; the
/// bridge stamps the receive time and the caller's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PlayerIdentity {
    pub player_id: String,
    pub filename: String,
    /// RFC3339 receive time
    pub last_updated: String,
    /// Address the callback arrived from, when known
    pub ip_address: Option<String>,
}

/// Store holding the single most recent device identity.
///
/// The original service modeled this as a map that was cleared before every
/// insert, so at most one record ever existed; the optional record makes
/// that singleton explicit. Replacement is one assignment under the write
/// lock, so readers observe either the previous record or the new one,
/// never a torn value.
#[derive(Debug, Clone, Default)]
pub struct IdentityStore {
    current: Arc<RwLock<Option<PlayerIdentity>>>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored identity with a new record
    pub async fn replace(&self, identity: PlayerIdentity) {
        tracing::info!(
            player_id = %identity.player_id,
            filename = %identity.filename,
            "Device identity updated"
        );
        *self.current.write().await = Some(identity);
    }

    /// The most recent identity, if any callback has been received
    pub async fn current(&self) -> Option<PlayerIdentity> {
        self.current.read().await.clone()
    }

    /// The most recent player id, if any
    pub async fn current_player_id(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|identity| identity.player_id.clone())
    }

    /// Look up the stored identity by exact player id
    pub async fn find_by_id(&self, player_id: &str) -> Option<PlayerIdentity> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|identity| identity.player_id == player_id)
            .cloned()
    }

    /// Look up the stored identity by IP fragment (substring match)
    pub async fn find_by_ip(&self, fragment: &str) -> Option<PlayerIdentity> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|identity| {
                identity
                    .ip_address
                    .as_ref()
                    .is_some_and(|ip| ip.contains(fragment))
            })
            .cloned()
    }

    /// All tracked identities - zero or one entries
    pub async fn list(&self) -> Vec<PlayerIdentity> {
        self.current.read().await.iter().cloned().collect()
    }

    /// Number of tracked identities (0 or 1)
    pub async fn count(&self) -> usize {
        usize::from(self.current.read().await.is_some())
    }
}
