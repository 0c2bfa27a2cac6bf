//! Snapshot error types
//!
//! Error codes:
//! - CAMPUS_SNAPSHOT_IO
//! - CAMPUS_SNAPSHOT_CORRUPT
//! - CAMPUS_SNAPSHOT_INCONSISTENT

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing a snapshot file failed
    #[error("snapshot I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Files are unreadable, fail their checksum, or have an unknown format
    #[error("snapshot corrupt: {0}")]
    Corrupt(String),

    /// Files are intact but the records break a relational rule
    #[error("snapshot inconsistent: {0}")]
    Inconsistent(String),
}

impl SnapshotError {
    pub fn io_at(path: &Path, source: io::Error) -> Self {
        SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            SnapshotError::Io { .. } => "CAMPUS_SNAPSHOT_IO",
            SnapshotError::Corrupt(_) => "CAMPUS_SNAPSHOT_CORRUPT",
            SnapshotError::Inconsistent(_) => "CAMPUS_SNAPSHOT_INCONSISTENT",
        }
    }

    /// Corrupt or inconsistent images must not be served
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SnapshotError::Io { .. })
    }
}

/// Result type for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
