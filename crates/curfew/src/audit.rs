//! Append-only audit trail.
//!
//! Records are observational: nothing here feeds back into evaluation.
//! Each record gets a sequence number that increases by one per append,
//! starting at zero.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use curfew_types::{AuditAction, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("I/O error on audit log {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("audit record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("audit log {path} line {line} is malformed: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, AuditError>;

/// One entry in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub recorded_at: Timestamp,
    pub action: AuditAction,
}

/// Sink for audit records.
pub trait AuditLog: Send + Sync {
    /// Appends `action`, returning the stored record.
    fn append(&mut self, action: AuditAction, recorded_at: Timestamp) -> Result<AuditRecord>;

    /// All records in append order.
    fn records(&self) -> Result<Vec<AuditRecord>>;
}

#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: Vec<AuditRecord>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLog for MemoryAuditLog {
    fn append(&mut self, action: AuditAction, recorded_at: Timestamp) -> Result<AuditRecord> {
        let record = AuditRecord {
            sequence: self.records.len() as u64,
            recorded_at,
            action,
        };
        self.records.push(record.clone());
        Ok(record)
    }

    fn records(&self) -> Result<Vec<AuditRecord>> {
        Ok(self.records.clone())
    }
}

/// One JSON record per line, appended and synced on every write.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    file: File,
    next_sequence: u64,
}

impl JsonlAuditLog {
    /// Opens `path` for appending, creating it and its parent directory.
    ///
    /// Existing records are scanned so sequence numbers continue.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| AuditError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        truncate_torn_tail(&path)?;
        let existing = read_records(&path)?;
        let next_sequence = existing.last().map_or(0, |r| r.sequence + 1);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Io {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            file,
            next_sequence,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditLog for JsonlAuditLog {
    fn append(&mut self, action: AuditAction, recorded_at: Timestamp) -> Result<AuditRecord> {
        let record = AuditRecord {
            sequence: self.next_sequence,
            recorded_at,
            action,
        };
        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let io_err = |source| AuditError::Io {
            path: self.path.clone(),
            source,
        };
        let len = self.file.metadata().map_err(io_err)?.len();
        if let Err(source) = self
            .file
            .write_all(&line)
            .and_then(|()| self.file.sync_data())
        {
            // Cut off a partial line so the next append starts clean
            if let Err(e) = self.file.set_len(len) {
                tracing::warn!(path = %self.path.display(), error = %e, "audit log truncate failed");
            }
            return Err(io_err(source));
        }

        self.next_sequence += 1;
        Ok(record)
    }

    fn records(&self) -> Result<Vec<AuditRecord>> {
        read_records(&self.path)
    }
}

/// Drops bytes after the last newline, left by an append that never
/// completed.
fn truncate_torn_tail(path: &Path) -> Result<()> {
    let io_err = |source| AuditError::Io {
        path: path.to_path_buf(),
        source,
    };
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(source) => return Err(io_err(source)),
    };
    if bytes.last().is_none_or(|&b| b == b'\n') {
        return Ok(());
    }

    let keep = bytes.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    tracing::warn!(
        path = %path.display(),
        dropped = bytes.len() - keep,
        "truncating incomplete audit record"
    );
    let file = OpenOptions::new().write(true).open(path).map_err(io_err)?;
    file.set_len(keep as u64).map_err(io_err)?;
    file.sync_all().map_err(io_err)
}

fn read_records(path: &Path) -> Result<Vec<AuditRecord>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AuditError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| AuditError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| AuditError::Malformed {
            path: path.to_path_buf(),
            line: index + 1,
            reason: e.to_string(),
        })?;
        records.push(record);
    }
    Ok(records)
}
