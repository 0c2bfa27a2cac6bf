//! Snapshot subsystem for campusdb
//!
//! A snapshot is a durable image of every table.
//!
//! # Design Principles
//!
//! - Files are replaced atomically (temporary file, fsync, rename)
//! - The manifest is written last and is authoritative
//! - Indexes are NOT stored; they are rebuilt on load
//! - A load that fails any check yields nothing
//!
//! # Snapshot Contents
//!
//! - tables.json (rows and identifier sequences)
//! - manifest.json (format version, timestamp, checksum)

mod checksum;
mod errors;
mod manifest;

pub use checksum::{compute_checksum, format_checksum, parse_checksum};
pub use errors::{SnapshotError, SnapshotResult};
pub use manifest::{SnapshotManifest, FORMAT_VERSION};

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::observability::Event;
use crate::storage::Tables;

pub const TABLES_FILE: &str = "tables.json";
pub const MANIFEST_FILE: &str = "manifest.json";

pub fn tables_path(dir: &Path) -> PathBuf {
    dir.join(TABLES_FILE)
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_FILE)
}

/// Whether `dir` holds a snapshot manifest
pub fn exists(dir: &Path) -> bool {
    manifest_path(dir).is_file()
}

/// Writes `tables` to `dir`, replacing any previous snapshot.
pub fn save(dir: &Path, tables: &Tables) -> SnapshotResult<SnapshotManifest> {
    let body = serde_json::to_vec_pretty(tables)
        .map_err(|e| SnapshotError::Corrupt(format!("failed to serialize tables: {}", e)))?;
    let manifest = SnapshotManifest::new(format_checksum(compute_checksum(&body)));

    write_atomic(&tables_path(dir), &body)?;
    write_atomic(&manifest_path(dir), manifest.to_json()?.as_bytes())?;

    info!(
        event = %Event::SnapshotSaved,
        dir = %dir.display(),
        checksum = %manifest.tables_checksum
    );
    Ok(manifest)
}

/// Reads and verifies the snapshot in `dir`.
///
/// Verification covers the checksum, the format version, the uniqueness
/// constraints (by rebuilding the index) and every foreign key.
pub fn load(dir: &Path) -> SnapshotResult<Tables> {
    match read_verified(dir) {
        Ok(tables) => {
            let total: usize = tables.counts().iter().map(|(_, n)| n).sum();
            info!(event = %Event::SnapshotLoaded, dir = %dir.display(), records = total);
            Ok(tables)
        }
        Err(err) => {
            if err.is_fatal() {
                error!(event = %Event::SnapshotCorrupt, dir = %dir.display(), error = %err);
            }
            Err(err)
        }
    }
}

fn read_verified(dir: &Path) -> SnapshotResult<Tables> {
    let manifest_file = manifest_path(dir);
    let manifest_json =
        fs::read_to_string(&manifest_file).map_err(|e| SnapshotError::io_at(&manifest_file, e))?;
    let manifest = SnapshotManifest::from_json(&manifest_json)?;

    let expected = parse_checksum(&manifest.tables_checksum).ok_or_else(|| {
        SnapshotError::Corrupt(format!("malformed checksum '{}'", manifest.tables_checksum))
    })?;

    let tables_file = tables_path(dir);
    let body = fs::read(&tables_file).map_err(|e| SnapshotError::io_at(&tables_file, e))?;
    let actual = compute_checksum(&body);
    if actual != expected {
        return Err(SnapshotError::Corrupt(format!(
            "checksum mismatch on {}: expected {}, found {}",
            TABLES_FILE,
            format_checksum(expected),
            format_checksum(actual)
        )));
    }

    let mut tables: Tables = serde_json::from_slice(&body)
        .map_err(|e| SnapshotError::Corrupt(format!("failed to parse {}: {}", TABLES_FILE, e)))?;

    tables
        .rebuild_indexes()
        .map_err(|v| SnapshotError::Inconsistent(v.to_string()))?;

    if let Some((holder, reference)) = tables.dangling_references().into_iter().next() {
        return Err(SnapshotError::Inconsistent(format!(
            "{} references missing {} through {}",
            holder, reference.target, reference.field
        )));
    }

    Ok(tables)
}

/// Writes to a sibling temporary file, syncs, then renames over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> SnapshotResult<()> {
    let tmp = path.with_extension("json.tmp");

    let mut file = File::create(&tmp).map_err(|e| SnapshotError::io_at(&tmp, e))?;
    file.write_all(bytes)
        .map_err(|e| SnapshotError::io_at(&tmp, e))?;
    file.sync_all().map_err(|e| SnapshotError::io_at(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| SnapshotError::io_at(path, e))
}
