//! campusdb - A strict, deterministic integrity engine for academic records
//!
//! Schools, terms, courses, instructors, students, assignments, lessons and
//! readings, with the relational rules that keep them consistent:
//!
//! - Validation before every write, all rules evaluated
//! - Scoped and global uniqueness enforced at the storage boundary
//! - Restrict / cascade / nullify delete policies, applied atomically
//! - Deterministic ordering of related collections

pub mod cli;
pub mod engine;
pub mod index;
pub mod integrity;
pub mod model;
pub mod observability;
pub mod ordering;
pub mod snapshot;
pub mod storage;
pub mod validation;

pub use engine::{CampusError, CampusErrorCode, CampusResult, Database, DeleteReport, Relation};
pub use model::{Entity, EntityKind, EntityRef, Model, Record, RecordId};
