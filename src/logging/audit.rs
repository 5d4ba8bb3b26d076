//! Append-only audit log for gate decisions.
//!
//! Records each evaluation outcome and operator override change as a JSON
//! line. Enforces per-file size limits and rotates old files to prevent
//! unbounded log growth.

use crate::config::settings::AuditSettings;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("failed to open audit log: {0}")]
    Open(#[from] std::io::Error),

    #[error("failed to serialize audit entry: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Rotation limits for the audit log.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Maximum size of a single log file in bytes before rotation.
    pub max_file_bytes: u64,
    /// Maximum number of rotated files to keep (audit.log.1, audit.log.2, ...).
    pub max_rotated_files: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024, // 10 MB
            max_rotated_files: 5,
        }
    }
}

/// Append-only audit log with automatic rotation.
pub struct AuditLog {
    path: PathBuf,
    config: AuditConfig,
}

impl AuditLog {
    /// Open (or create) an audit log at the given path.
    pub fn open(path: &Path, config: AuditConfig) -> Result<Self, AuditError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Create the file if it doesn't exist
        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            config,
        })
    }

    /// Record one gate event.
    pub fn record(&self, event: &str, artifact: &str, detail: &str) -> Result<(), AuditError> {
        // Check if rotation is needed before writing
        self.rotate_if_needed()?;

        let entry = serde_json::json!({
            "timestamp_secs": unix_now_secs(),
            "event": event,
            "artifact": artifact,
            "detail": detail,
        });

        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    /// Rotate log files if the current file exceeds the size limit.
    fn rotate_if_needed(&self) -> Result<(), AuditError> {
        let size = match fs::metadata(&self.path) {
            Ok(m) => m.len(),
            Err(_) => return Ok(()), // File doesn't exist yet
        };

        if size < self.config.max_file_bytes {
            return Ok(());
        }

        // Shift rotated files: .3 -> .4, .2 -> .3, .1 -> .2, dropping the
        // oldest beyond max_rotated_files
        for i in (1..=self.config.max_rotated_files).rev() {
            let src = self.rotated_path(i);
            if !src.exists() {
                continue;
            }
            if i == self.config.max_rotated_files {
                let _ = fs::remove_file(&src);
            } else {
                let _ = fs::rename(&src, self.rotated_path(i + 1));
            }
        }

        // Move current to .1 and start fresh
        let _ = fs::rename(&self.path, self.rotated_path(1));
        File::create(&self.path)?;

        Ok(())
    }

    fn rotated_path(&self, n: u32) -> PathBuf {
        let name = self.path.file_name().unwrap_or_default().to_string_lossy();
        self.path.with_file_name(format!("{}.{}", name, n))
    }
}

/// Record one event using the configured audit settings. Audit failures are
/// logged and swallowed; they never affect the gate decision.
pub fn record_event(settings: &AuditSettings, event: &str, artifact: &str, detail: &str) {
    if !settings.enabled {
        return;
    }
    let config = AuditConfig {
        max_file_bytes: settings.max_file_bytes,
        max_rotated_files: settings.max_rotated_files,
    };
    let log = match AuditLog::open(&settings.resolved_path(), config) {
        Ok(log) => log,
        Err(e) => {
            warn!(error = %e, "audit log unavailable");
            return;
        }
    };
    if let Err(e) = log.record(event, artifact, detail) {
        warn!(error = %e, "failed to record audit entry");
    }
}

/// Seconds since the Unix epoch.
fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
