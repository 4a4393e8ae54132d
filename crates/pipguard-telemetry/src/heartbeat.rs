//! Heartbeat file for external liveness monitoring.
//!
//! Each account's monitor loop rewrites its heartbeat file every
//! cycle; an external watchdog restarts the process when the file
//! goes stale. Liveness is observed from the outside, not enforced
//! in-process.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::TelemetryResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Heartbeat file writer for one account.
pub struct Heartbeat {
    path: PathBuf,
}

impl Heartbeat {
    /// Heartbeat file lives at `<dir>/<account>_heartbeat.txt`.
    pub fn new(dir: impl AsRef<Path>, account: &str) -> TelemetryResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(format!("{account}_heartbeat.txt")),
        })
    }

    /// Rewrite the heartbeat file with the current time.
    pub fn beat(&self) -> TelemetryResult<()> {
        let now = Utc::now().format(TIMESTAMP_FORMAT);
        fs::write(&self.path, format!("Last active: {now}\n"))?;
        Ok(())
    }

    /// Timestamp of the last beat, if the file exists and parses.
    pub fn last_beat(&self) -> Option<DateTime<Utc>> {
        let content = fs::read_to_string(&self.path).ok()?;
        let stamp = content.trim().strip_prefix("Last active: ")?;
        let naive = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some(naive.and_utc())
    }

    /// True when the last beat is older than `max_age` (or missing).
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.last_beat() {
            Some(last) => {
                let age = Utc::now().signed_duration_since(last);
                age.num_seconds() > max_age.as_secs() as i64
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let hb = Heartbeat::new(dir.path(), "main").unwrap();

        hb.beat().unwrap();
        let last = hb.last_beat().unwrap();
        let age = Utc::now().signed_duration_since(last);
        assert!(age.num_seconds() < 5);
        assert!(!hb.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_missing_file_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let hb = Heartbeat::new(dir.path(), "main").unwrap();
        assert!(hb.last_beat().is_none());
        assert!(hb.is_stale(Duration::from_secs(60)));
    }

    #[test]
    fn test_garbage_file_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let hb = Heartbeat::new(dir.path(), "main").unwrap();
        fs::write(dir.path().join("main_heartbeat.txt"), "not a heartbeat").unwrap();
        assert!(hb.is_stale(Duration::from_secs(60)));
    }
}
