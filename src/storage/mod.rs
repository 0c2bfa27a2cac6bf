//! Storage subsystem for campusdb
//!
//! An arena of tables, one per entity kind, keyed by [`RecordId`].
//!
//! # Design Principles
//!
//! - Identifiers are allocated monotonically and never reused
//! - Iteration is always in ascending identifier order
//! - Uniqueness constraints are enforced here, at the write boundary
//! - Multi-record mutations are verified in full before any is applied
//!
//! [`RecordId`]: crate::model::RecordId

mod batch;
mod errors;
mod table;
mod tables;

pub use batch::{BatchOp, WriteBatch};
pub use errors::{StorageError, StorageResult};
pub use table::Table;
pub use tables::Tables;

pub(crate) use tables::with_model;
