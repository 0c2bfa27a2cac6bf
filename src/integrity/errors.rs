//! Integrity error types
//!
//! Error codes:
//! - CAMPUS_DELETE_RESTRICTED

use thiserror::Error;

use crate::model::{EntityKind, EntityRef};

/// A delete refused because dependents exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot delete {target}: {}", self.message())]
pub struct IntegrityError {
    /// Record the caller asked to delete
    pub target: EntityRef,
    /// Record whose dependents block the delete (the target, or a cascaded child)
    pub blocked: EntityRef,
    /// Kind of the blocking dependents
    pub dependent: EntityKind,
    /// How many blocking dependents exist
    pub count: usize,
}

impl IntegrityError {
    pub fn restricted(
        target: EntityRef,
        blocked: EntityRef,
        dependent: EntityKind,
        count: usize,
    ) -> Self {
        Self {
            target,
            blocked,
            dependent,
            count,
        }
    }

    pub fn code(&self) -> &'static str {
        "CAMPUS_DELETE_RESTRICTED"
    }

    /// e.g. "Cannot delete record because dependent courses exist"
    pub fn message(&self) -> String {
        format!(
            "Cannot delete record because dependent {} exist",
            self.dependent.plural_label()
        )
    }
}

/// Result type for integrity operations
pub type IntegrityResult<T> = Result<T, IntegrityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restrict_message() {
        let term = EntityRef::new(EntityKind::Term, 1);
        let err = IntegrityError::restricted(term, term, EntityKind::Course, 2);
        assert_eq!(
            err.message(),
            "Cannot delete record because dependent courses exist"
        );
        assert_eq!(err.code(), "CAMPUS_DELETE_RESTRICTED");
        assert!(err.to_string().starts_with("cannot delete term#1"));
    }

    #[test]
    fn test_course_student_label() {
        let course = EntityRef::new(EntityKind::Course, 1);
        let err = IntegrityError::restricted(course, course, EntityKind::CourseStudent, 1);
        assert_eq!(
            err.message(),
            "Cannot delete record because dependent course students exist"
        );
    }
}
