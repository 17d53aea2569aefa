//! File-based audit trail

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use crate::application::commands::{AuditEntry, AuditSink};

/// Appends one line per audit record to a file
pub struct FileAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Open `path` for appending, creating it and its parent directory
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, entry: &AuditEntry) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{}", entry) {
            tracing::warn!("Failed to write audit record to {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::commands::AuditOutcome;
    use chrono::{TimeZone, Utc};

    fn entry(raw: &str, outcome: AuditOutcome) -> AuditEntry {
        AuditEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            actor_id: "42".to_string(),
            actor_name: "jo".to_string(),
            command: "plugins".to_string(),
            raw: raw.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("audit.log");
        let sink = FileAuditSink::open(&path).unwrap();

        sink.record(&entry("!plugins list", AuditOutcome::Executed));
        sink.record(&entry("!plugins unload x", AuditOutcome::PermissionDenied));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            [
                "[2024-05-01 12:30:00] jo(42) used !plugins list",
                "[2024-05-01 12:30:00] jo(42) was denied !plugins unload x",
            ]
        );
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");

        FileAuditSink::open(&path).unwrap().record(&entry("!a", AuditOutcome::Executed));
        FileAuditSink::open(&path).unwrap().record(&entry("!b", AuditOutcome::Executed));

        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
