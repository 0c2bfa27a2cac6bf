//! Per-entity rule sets
//!
//! Rules run in declaration order: presence, format, cross-field,
//! references, uniqueness. Lookups against existing records go through
//! [`RecordLookup`] so validation stays independent of storage layout.

use super::errors::ValidationErrors;
use super::rules::{
    check_format, check_not_before, check_references, check_unique, course_code_pattern,
    email_pattern, http_url_pattern, require, require_text, DUE_BEFORE_ACTIVE,
};
use crate::index::UniqueKey;
use crate::model::{
    Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, EntityRef, Lesson,
    Model, Reading, RecordId, School, Term, User,
};

/// Read access to committed state needed by validation.
pub trait RecordLookup {
    fn exists(&self, target: EntityRef) -> bool;

    fn unique_holder(&self, key: &UniqueKey) -> Option<RecordId>;
}

/// What a rule set may consult while validating one candidate.
pub struct ValidationContext<'a> {
    lookup: &'a dyn RecordLookup,
    record_id: Option<RecordId>,
}

impl<'a> ValidationContext<'a> {
    /// Context for a record that does not exist yet
    pub fn for_create(lookup: &'a dyn RecordLookup) -> Self {
        Self {
            lookup,
            record_id: None,
        }
    }

    /// Context for replacing the data of an existing record
    pub fn for_update(lookup: &'a dyn RecordLookup, id: RecordId) -> Self {
        Self {
            lookup,
            record_id: Some(id),
        }
    }

    /// Identifier of the record being validated, if persisted
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn exists(&self, target: EntityRef) -> bool {
        self.lookup.exists(target)
    }

    pub fn unique_holder(&self, key: &UniqueKey) -> Option<RecordId> {
        self.lookup.unique_holder(key)
    }
}

/// A candidate record's rule set.
pub trait Validate {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors;
}

impl Validate for School {
    fn validate(&self, _ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        errors
    }
}

impl Validate for Term {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        require(&mut errors, "starts_on", &self.starts_on);
        require(&mut errors, "ends_on", &self.ends_on);
        require(&mut errors, "school_id", &self.school_id);
        check_references(&mut errors, ctx, &self.references());
        errors
    }
}

impl Validate for Course {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        check_format(&mut errors, "course_code", &self.course_code, course_code_pattern());
        check_references(&mut errors, ctx, &self.references());
        check_unique(&mut errors, ctx, &self.unique_keys());
        errors
    }
}

impl Validate for CourseStudent {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_references(&mut errors, ctx, &self.references());
        errors
    }
}

impl Validate for CourseInstructor {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_references(&mut errors, ctx, &self.references());
        errors
    }
}

impl Validate for Assignment {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        require(&mut errors, "course_id", &self.course_id);
        require(&mut errors, "percent_of_grade", &self.percent_of_grade);
        check_not_before(
            &mut errors,
            "due_at",
            &self.due_at,
            &self.active_at,
            DUE_BEFORE_ACTIVE,
        );
        check_references(&mut errors, ctx, &self.references());
        check_unique(&mut errors, ctx, &self.unique_keys());
        errors
    }
}

impl Validate for AssignmentGrade {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        check_references(&mut errors, ctx, &self.references());
        errors
    }
}

impl Validate for Lesson {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "name", &self.name);
        // Parent cycles are not prevented; only existence is checked.
        check_references(&mut errors, ctx, &self.references());
        errors
    }
}

impl Validate for Reading {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require(&mut errors, "order_number", &self.order_number);
        require(&mut errors, "lesson_id", &self.lesson_id);
        require_text(&mut errors, "url", &self.url);
        check_format(&mut errors, "url", &self.url, http_url_pattern());
        check_references(&mut errors, ctx, &self.references());
        errors
    }
}

impl Validate for User {
    fn validate(&self, ctx: &ValidationContext<'_>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        require_text(&mut errors, "first_name", &self.first_name);
        require_text(&mut errors, "last_name", &self.last_name);
        require_text(&mut errors, "email", &self.email);
        require_text(&mut errors, "photo_url", &self.photo_url);
        check_format(&mut errors, "email", &self.email, email_pattern());
        check_format(&mut errors, "photo_url", &self.photo_url, http_url_pattern());
        check_unique(&mut errors, ctx, &self.unique_keys());
        errors
    }
}
