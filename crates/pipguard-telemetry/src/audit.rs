//! Append-only audit trail of key position-management events.
//!
//! Only terminal outcomes are recorded, never retry attempts. The
//! format is intentionally grep-friendly:
//! `[2024-01-15 09:30:00] [main] [TP1_SECURED] ticket 12345 ...`

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Local;
use parking_lot::Mutex;

use crate::error::TelemetryResult;

/// Kind of audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditKind {
    Tp1Secured,
    Tp1SecureFailed,
    PendingDeleted,
    PendingDeleteFailed,
    SecondPriceSecured,
    SecondPriceSecureFailed,
}

impl AuditKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Tp1Secured => "TP1_SECURED",
            AuditKind::Tp1SecureFailed => "TP1_SECURE_FAILED",
            AuditKind::PendingDeleted => "PENDING_DELETED",
            AuditKind::PendingDeleteFailed => "PENDING_DELETE_FAILED",
            AuditKind::SecondPriceSecured => "SECOND_PRICE_SECURED",
            AuditKind::SecondPriceSecureFailed => "SECOND_PRICE_SECURE_FAILED",
        }
    }
}

/// Append-only audit log for one account.
pub struct AuditLog {
    account: String,
    writer: Mutex<BufWriter<File>>,
}

impl AuditLog {
    /// Open (create if missing) the audit file in append mode.
    pub fn open(path: impl AsRef<Path>, account: impl Into<String>) -> TelemetryResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            account: account.into(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Record a terminal event. Flushed immediately so lines survive
    /// a crash.
    pub fn record(&self, kind: AuditKind, payload: impl Display) -> TelemetryResult<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut writer = self.writer.lock();
        writeln!(
            writer,
            "[{}] [{}] [{}] {}",
            timestamp,
            self.account,
            kind.as_str(),
            payload
        )?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key_events.log");

        let log = AuditLog::open(&path, "main").unwrap();
        log.record(AuditKind::Tp1Secured, "ticket 12345 SL -> 1.1000")
            .unwrap();
        log.record(AuditKind::PendingDeleted, "ticket 777").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[main] [TP1_SECURED] ticket 12345 SL -> 1.1000"));
        assert!(lines[1].contains("[main] [PENDING_DELETED] ticket 777"));
    }

    #[test]
    fn test_reopen_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key_events.log");

        {
            let log = AuditLog::open(&path, "main").unwrap();
            log.record(AuditKind::SecondPriceSecured, "ticket 1").unwrap();
        }
        {
            let log = AuditLog::open(&path, "main").unwrap();
            log.record(AuditKind::SecondPriceSecureFailed, "ticket 2")
                .unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/logs/key_events.log");
        let log = AuditLog::open(&path, "acct").unwrap();
        log.record(AuditKind::Tp1SecureFailed, "ticket 3").unwrap();
        assert!(path.exists());
    }
}
