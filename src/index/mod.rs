//! Uniqueness index subsystem for campusdb
//!
//! Uniqueness rules are declared constraints, enforced by the storage
//! layer under its write lock rather than by process-local caches.
//!
//! # Design Principles
//!
//! - Derived state: rebuilt from table rows on load
//! - Deterministic: BTreeMap keyed by (constraint, scope, value)
//! - One holder per key; a record never conflicts with itself

mod errors;
mod unique;

pub use errors::{ConstraintViolation, IndexResult};
pub use unique::{UniqueConstraint, UniqueIndex, UniqueKey};
