//! Append-only store of triggered group keys.
//!
//! Keys are opaque strings here; the engine owns their structure.
//! Append-only keeps crash semantics trivial: a torn final line is
//! simply skipped on reload by the caller's parser.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::PersistenceResult;

/// Durable set of already-triggered group keys.
pub trait HitGroupStore {
    /// All persisted keys, in insertion order.
    fn load(&self) -> PersistenceResult<Vec<String>>;

    /// Append one key. Durable once this returns.
    fn append(&mut self, key: &str) -> PersistenceResult<()>;
}

/// Flat-file implementation, one key per line.
pub struct FileHitGroupStore {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileHitGroupStore {
    /// Open (create if missing) the store file in append mode.
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }
}

impl HitGroupStore for FileHitGroupStore {
    fn load(&self) -> PersistenceResult<Vec<String>> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn append(&mut self, key: &str) -> PersistenceResult<()> {
        writeln!(self.writer, "{key}")?;
        self.writer.flush()?;
        Ok(())
    }
}
