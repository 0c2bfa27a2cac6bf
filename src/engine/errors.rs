//! Engine error types
//!
//! Error codes:
//! - CAMPUS_VALIDATION_FAILED
//! - CAMPUS_DELETE_RESTRICTED
//! - CAMPUS_NOT_FOUND
//! - CAMPUS_INVALID_RELATION
//! - CAMPUS_CONSTRAINT_VIOLATION
//! - CAMPUS_NOT_NULLABLE

use std::fmt;

use thiserror::Error;

use crate::index::ConstraintViolation;
use crate::integrity::IntegrityError;
use crate::model::{EntityKind, EntityRef};
use crate::storage::StorageError;
use crate::validation::{humanize, ValidationErrors, TAKEN};

/// Machine-checkable failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampusErrorCode {
    /// One or more field rules failed
    ValidationFailed,
    /// A restrict policy refused a delete
    DeleteRestricted,
    /// The referenced record does not exist
    NotFound,
    /// The kind does not declare the requested relation
    InvalidRelation,
    /// The storage-level uniqueness index refused a write
    ConstraintViolation,
    /// A delete tried to clear a required foreign key
    NotNullable,
}

impl CampusErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            CampusErrorCode::ValidationFailed => "CAMPUS_VALIDATION_FAILED",
            CampusErrorCode::DeleteRestricted => "CAMPUS_DELETE_RESTRICTED",
            CampusErrorCode::NotFound => "CAMPUS_NOT_FOUND",
            CampusErrorCode::InvalidRelation => "CAMPUS_INVALID_RELATION",
            CampusErrorCode::ConstraintViolation => "CAMPUS_CONSTRAINT_VIOLATION",
            CampusErrorCode::NotNullable => "CAMPUS_NOT_NULLABLE",
        }
    }

    /// Whether the caller can fix the input and retry
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, CampusErrorCode::NotNullable)
    }
}

impl fmt::Display for CampusErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Every failure a [`Database`](super::Database) operation can report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CampusError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("record not found: {0}")]
    NotFound(EntityRef),

    #[error("{kind} has no relation '{relation}'")]
    InvalidRelation { kind: EntityKind, relation: String },

    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),

    #[error("field '{field}' of {target} cannot be cleared")]
    NotNullable {
        target: EntityRef,
        field: &'static str,
    },
}

impl CampusError {
    pub fn error_code(&self) -> CampusErrorCode {
        match self {
            CampusError::Validation(_) => CampusErrorCode::ValidationFailed,
            CampusError::Integrity(_) => CampusErrorCode::DeleteRestricted,
            CampusError::NotFound(_) => CampusErrorCode::NotFound,
            CampusError::InvalidRelation { .. } => CampusErrorCode::InvalidRelation,
            CampusError::Constraint(_) => CampusErrorCode::ConstraintViolation,
            CampusError::NotNullable { .. } => CampusErrorCode::NotNullable,
        }
    }

    pub fn code(&self) -> &'static str {
        self.error_code().code()
    }

    /// Human-readable messages, one per failed rule
    pub fn messages(&self) -> Vec<String> {
        match self {
            CampusError::Validation(errors) => errors.full_messages(),
            CampusError::Integrity(e) => vec![e.message()],
            CampusError::NotFound(target) => vec![format!(
                "Couldn't find {} with id {}",
                humanize(target.kind.name()),
                target.id
            )],
            CampusError::Constraint(v) => vec![format!("{} {}", humanize(v.field()), TAKEN)],
            CampusError::InvalidRelation { .. } | CampusError::NotNullable { .. } => {
                vec![self.to_string()]
            }
        }
    }

    /// The validation errors, if this is a validation failure
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            CampusError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<StorageError> for CampusError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(target) => CampusError::NotFound(target),
            StorageError::NotNullable { target, field } => {
                CampusError::NotNullable { target, field }
            }
            StorageError::Constraint(v) => CampusError::Constraint(v),
        }
    }
}

/// Result type for engine operations
pub type CampusResult<T> = Result<T, CampusError>;
