//! Referential-integrity subsystem for campusdb
//!
//! Decides what a delete does to the records that depend on its target.
//!
//! # Design Principles
//!
//! - Policies are declared per (parent, dependent, field), never inferred
//! - Restrict checks complete before any mutation
//! - Cascades recurse and are ordered children before parents
//! - The resulting plan is applied as one atomic batch

mod errors;
mod planner;
mod policy;

pub use errors::{IntegrityError, IntegrityResult};
pub use planner::{plan_delete, DeletePlan};
pub use policy::{dependencies_of, DeletePolicy, Dependency, DEPENDENCIES};
