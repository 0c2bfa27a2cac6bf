//! Index error types
//!
//! Error codes:
//! - CAMPUS_CONSTRAINT_VIOLATION

use thiserror::Error;

use super::unique::UniqueConstraint;
use crate::model::RecordId;

/// A write would give a unique key a second holder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "unique constraint '{}' violated: {value:?} is held by {}#{holder}",
    .constraint.name(),
    .constraint.kind()
)]
pub struct ConstraintViolation {
    pub constraint: UniqueConstraint,
    pub scope: Option<RecordId>,
    pub value: String,
    pub holder: RecordId,
}

impl ConstraintViolation {
    pub fn code(&self) -> &'static str {
        "CAMPUS_CONSTRAINT_VIOLATION"
    }

    /// Field the violated constraint is declared on
    pub fn field(&self) -> &'static str {
        self.constraint.field()
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, ConstraintViolation>;
