//! Lifecycle events
//!
//! Every observable point in campusdb has a name here. Events are emitted
//! through `tracing` as the `event` field.

use std::fmt;

/// Observable events in campusdb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Binary startup begins
    BootStart,
    /// Configuration loaded
    ConfigLoaded,
    /// Shutdown complete
    ShutdownComplete,

    // Writes
    /// Record created
    WriteCommit,
    /// Record updated
    UpdateCommit,
    /// Write refused by validation or a constraint
    WriteRejected,

    // Deletes
    /// Delete and its cascades applied
    DeleteCommit,
    /// Delete refused by a restrict policy
    DeleteRestricted,

    // Snapshot
    /// Snapshot written to disk
    SnapshotSaved,
    /// Snapshot loaded and verified
    SnapshotLoaded,
    /// Snapshot failed verification (FATAL)
    SnapshotCorrupt,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "CAMPUS_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",

            Event::WriteCommit => "WRITE_COMMIT",
            Event::UpdateCommit => "UPDATE_COMMIT",
            Event::WriteRejected => "WRITE_REJECTED",

            Event::DeleteCommit => "DELETE_COMMIT",
            Event::DeleteRestricted => "DELETE_RESTRICTED",

            Event::SnapshotSaved => "SNAPSHOT_SAVED",
            Event::SnapshotLoaded => "SNAPSHOT_LOADED",
            Event::SnapshotCorrupt => "SNAPSHOT_CORRUPT",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SnapshotCorrupt)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
