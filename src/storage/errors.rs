//! Storage error types
//!
//! Error codes:
//! - CAMPUS_NOT_FOUND
//! - CAMPUS_NOT_NULLABLE
//! - CAMPUS_CONSTRAINT_VIOLATION

use thiserror::Error;

use crate::index::ConstraintViolation;
use crate::model::EntityRef;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("record not found: {0}")]
    NotFound(EntityRef),

    #[error("field '{field}' of {target} cannot be cleared")]
    NotNullable {
        target: EntityRef,
        field: &'static str,
    },

    #[error(transparent)]
    Constraint(#[from] ConstraintViolation),
}

impl StorageError {
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "CAMPUS_NOT_FOUND",
            StorageError::NotNullable { .. } => "CAMPUS_NOT_NULLABLE",
            StorageError::Constraint(e) => e.code(),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
