//! Append-only notification outcome log
//!
//! One timestamped line per delivery attempt, appended to
//! `<log_dir>/whatsapp.log`. The file is never rotated or size-bounded.
//! Logging is best-effort: a failed append must never take the notification
//! path down with it, so write errors are reported as warnings and dropped.

use chrono::{SecondsFormat, Utc};
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;

const LOG_FILE_NAME: &str = "whatsapp.log";

/// Appends timestamped outcome lines under a configured log directory
#[derive(Debug, Clone)]
pub struct OutcomeLog {
    log_dir: PathBuf,
}

impl OutcomeLog {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Path of the log file lines are appended to
    pub fn path(&self) -> PathBuf {
        self.log_dir.join(LOG_FILE_NAME)
    }

    /// Append one outcome line, prefixed with an RFC 3339 timestamp.
    pub async fn append(&self, line: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let entry = format!("[{}] {}\n", timestamp, line);

        if let Err(e) = self.try_append(&entry).await {
            warn!("Failed to append to {}: {}", self.path().display(), e);
        }
    }

    async fn try_append(&self, entry: &str) -> std::io::Result<()> {
        fs::create_dir_all(&self.log_dir).await?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())
            .await?;
        file.write_all(entry.as_bytes()).await?;

        Ok(())
    }
}
