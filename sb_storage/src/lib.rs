//! ABOUTME: Local screenshot persistence with timestamped names
//! ABOUTME: Lazily-created screenshots directory, save and read-back

use bytes::Bytes;
use sb_core::{screenshot_timestamp, utc_now, Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Result of persisting a screenshot to disk
#[derive(Debug, Clone, serde::Serialize)]
pub struct SavedScreenshot {
    /// Bare filename, e.g. `screenshot_2024-01-01T00-00-00.jpg`
    pub filename: String,
    /// Path relative to the public root, e.g. `screenshots/<filename>`
    pub relative_path: String,
    /// Size in bytes as written
    pub size: usize,
    /// Content type reported by the capture source
    pub content_type: String,
    /// Timestamp embedded in the filename
    pub timestamp: String,
}

/// Store for captured screenshots on the local filesystem
#[derive(Debug, Clone)]
pub struct ScreenshotStore {
    dir: PathBuf,
}

impl ScreenshotStore {
    /// Create a store rooted at `dir`. The directory itself is created
    /// lazily on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory screenshots are written to
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist image bytes under a timestamped name
    pub async fn save(&self, data: Bytes, content_type: &str) -> Result<SavedScreenshot> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let timestamp = screenshot_timestamp(utc_now());
        let filename = format!("screenshot_{}.jpg", timestamp);
        let path = self.dir.join(&filename);

        debug!(path = %path.display(), size = data.len(), "Writing screenshot");
        tokio::fs::write(&path, &data).await?;

        info!(filename = %filename, size = data.len(), "Screenshot saved");

        Ok(SavedScreenshot {
            relative_path: format!("screenshots/{}", filename),
            filename,
            size: data.len(),
            content_type: content_type.to_string(),
            timestamp,
        })
    }

    /// Read back a previously saved screenshot by its relative path
    ///
    /// Accepts the `screenshots/<filename>` form returned by [`save`] as
    /// well as a bare filename. Paths that try to walk out of the
    /// screenshots directory are rejected.
    pub async fn read(&self, relative_path: &str) -> Result<Bytes> {
        let filename = Self::validated_filename(relative_path)?;
        let path = self.dir.join(filename);

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(format!("Screenshot not found: {}", relative_path))
            } else {
                Error::Io(e)
            }
        })?;

        Ok(Bytes::from(data))
    }

    /// Strip the `screenshots/` prefix and reject traversal components
    fn validated_filename(relative_path: &str) -> Result<&str> {
        let trimmed = relative_path
            .strip_prefix("screenshots/")
            .unwrap_or(relative_path);

        let path = Path::new(trimmed);
        let is_plain_file = path
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
            && path.components().count() == 1;

        if trimmed.is_empty() || !is_plain_file {
            return Err(Error::Validation(format!(
                "Invalid screenshot path: {}",
                relative_path
            )));
        }

        Ok(trimmed)
    }
}
