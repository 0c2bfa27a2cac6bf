//! Validation subsystem for campusdb
//!
//! Every write is validated before it reaches storage.
//!
//! # Design Principles
//!
//! - All rules are evaluated; errors accumulate rather than short-circuit
//! - Errors are field-scoped with human-readable messages
//! - Validation never mutates the candidate
//! - A non-empty error set aborts the write with nothing persisted

mod errors;
mod rules;
mod validator;

pub use errors::{humanize, FieldError, ValidationErrors};
pub use rules::{
    is_blank, BLANK, DUE_BEFORE_ACTIVE, INVALID, MUST_EXIST, TAKEN,
};
pub use validator::{RecordLookup, Validate, ValidationContext};
