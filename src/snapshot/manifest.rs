//! Snapshot manifest
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "created_at": "2026-10-18T09:30:00Z",
//!   "tables_checksum": "crc32:deadbeef"
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::errors::{SnapshotError, SnapshotResult};

/// Layout version this build reads and writes
pub const FORMAT_VERSION: u8 = 1;

/// The authoritative descriptor of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapshotManifest {
    pub format_version: u8,

    /// RFC3339, UTC
    pub created_at: String,

    /// Checksum of tables.json
    pub tables_checksum: String,
}

impl SnapshotManifest {
    /// A manifest stamped with the current time
    pub fn new(tables_checksum: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            created_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            tables_checksum: tables_checksum.into(),
        }
    }

    pub fn to_json(&self) -> SnapshotResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::Corrupt(format!("failed to serialize manifest: {}", e)))
    }

    /// Parses a manifest and rejects unknown format versions.
    pub fn from_json(json: &str) -> SnapshotResult<Self> {
        let manifest: SnapshotManifest = serde_json::from_str(json)
            .map_err(|e| SnapshotError::Corrupt(format!("failed to parse manifest: {}", e)))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(SnapshotError::Corrupt(format!(
                "unsupported format version {}",
                manifest.format_version
            )));
        }
        Ok(manifest)
    }
}
