//! Delete-policy table

use crate::model::EntityKind;

/// What happens to dependents when their parent is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Refuse the delete while any dependent exists
    Restrict,
    /// Delete the dependents first
    Cascade,
    /// Clear the dependents' foreign key
    Nullify,
}

/// One declared parent/dependent relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub parent: EntityKind,
    pub dependent: EntityKind,
    /// Foreign-key field on the dependent
    pub field: &'static str,
    pub policy: DeletePolicy,
}

const fn dep(
    parent: EntityKind,
    dependent: EntityKind,
    field: &'static str,
    policy: DeletePolicy,
) -> Dependency {
    Dependency {
        parent,
        dependent,
        field,
        policy,
    }
}

/// Every relationship with a delete consequence.
///
/// Within one parent, restrict rows are listed first so refusals are
/// reported before any cascade is planned.
pub const DEPENDENCIES: &[Dependency] = &[
    dep(EntityKind::School, EntityKind::Term, "school_id", DeletePolicy::Restrict),
    dep(EntityKind::Term, EntityKind::Course, "term_id", DeletePolicy::Restrict),
    dep(EntityKind::Course, EntityKind::CourseStudent, "course_id", DeletePolicy::Restrict),
    dep(EntityKind::Course, EntityKind::CourseInstructor, "course_id", DeletePolicy::Restrict),
    dep(EntityKind::Course, EntityKind::Assignment, "course_id", DeletePolicy::Cascade),
    dep(EntityKind::Course, EntityKind::Lesson, "course_id", DeletePolicy::Cascade),
    dep(
        EntityKind::Assignment,
        EntityKind::AssignmentGrade,
        "assignment_id",
        DeletePolicy::Restrict,
    ),
    dep(
        EntityKind::Assignment,
        EntityKind::Lesson,
        "pre_class_assignment_id",
        DeletePolicy::Nullify,
    ),
    dep(
        EntityKind::Assignment,
        EntityKind::Lesson,
        "in_class_assignment_id",
        DeletePolicy::Nullify,
    ),
    dep(EntityKind::Lesson, EntityKind::Reading, "lesson_id", DeletePolicy::Cascade),
    dep(EntityKind::Lesson, EntityKind::Lesson, "parent_lesson_id", DeletePolicy::Nullify),
    dep(
        EntityKind::CourseStudent,
        EntityKind::AssignmentGrade,
        "course_student_id",
        DeletePolicy::Restrict,
    ),
    dep(EntityKind::User, EntityKind::CourseStudent, "student_id", DeletePolicy::Restrict),
    dep(
        EntityKind::User,
        EntityKind::CourseInstructor,
        "instructor_id",
        DeletePolicy::Restrict,
    ),
];

/// Relationships in which `parent` is the parent, in declaration order
pub fn dependencies_of(parent: EntityKind) -> impl Iterator<Item = &'static Dependency> {
    DEPENDENCIES.iter().filter(move |d| d.parent == parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, Lesson, Model,
        Reading, RecordId, Term,
    };

    #[test]
    fn test_restrict_rows_precede_others_per_parent() {
        for kind in EntityKind::ALL {
            let policies: Vec<DeletePolicy> = dependencies_of(kind).map(|d| d.policy).collect();
            if let Some(first_other) = policies.iter().position(|p| *p != DeletePolicy::Restrict) {
                assert!(
                    policies[first_other..]
                        .iter()
                        .all(|p| *p != DeletePolicy::Restrict),
                    "restrict rows for {} must come first",
                    kind
                );
            }
        }
    }

    #[test]
    fn test_course_policies() {
        let course: Vec<(EntityKind, DeletePolicy)> = dependencies_of(EntityKind::Course)
            .map(|d| (d.dependent, d.policy))
            .collect();
        assert_eq!(
            course,
            vec![
                (EntityKind::CourseStudent, DeletePolicy::Restrict),
                (EntityKind::CourseInstructor, DeletePolicy::Restrict),
                (EntityKind::Assignment, DeletePolicy::Cascade),
                (EntityKind::Lesson, DeletePolicy::Cascade),
            ]
        );
    }

    #[test]
    fn test_declared_fields_are_real_references() {
        // Every declared field must appear among the dependent's references
        let id = Some(RecordId::new(1));
        let samples: Vec<(EntityKind, Vec<&'static str>)> = vec![
            (
                EntityKind::Term,
                Term { school_id: id, ..Term::default() }
                    .references()
                    .iter()
                    .map(|r| r.field)
                    .collect(),
            ),
            (
                EntityKind::Course,
                Course { term_id: id, ..Course::default() }
                    .references()
                    .iter()
                    .map(|r| r.field)
                    .collect(),
            ),
            (
                EntityKind::CourseStudent,
                CourseStudent { course_id: id, student_id: id }
                    .references()
                    .iter()
                    .map(|r| r.field)
                    .collect(),
            ),
            (
                EntityKind::CourseInstructor,
                CourseInstructor { course_id: id, instructor_id: id, primary: false }
                    .references()
                    .iter()
                    .map(|r| r.field)
                    .collect(),
            ),
            (
                EntityKind::Assignment,
                Assignment { course_id: id, ..Assignment::default() }
                    .references()
                    .iter()
                    .map(|r| r.field)
                    .collect(),
            ),
            (
                EntityKind::AssignmentGrade,
                AssignmentGrade { assignment_id: id, course_student_id: id }
                    .references()
                    .iter()
                    .map(|r| r.field)
                    .collect(),
            ),
            (
                EntityKind::Lesson,
                Lesson {
                    course_id: id,
                    parent_lesson_id: id,
                    name: None,
                    pre_class_assignment_id: id,
                    in_class_assignment_id: id,
                }
                .references()
                .iter()
                .map(|r| r.field)
                .collect(),
            ),
            (
                EntityKind::Reading,
                Reading { lesson_id: id, ..Reading::default() }
                    .references()
                    .iter()
                    .map(|r| r.field)
                    .collect(),
            ),
        ];

        for d in DEPENDENCIES {
            let fields = samples
                .iter()
                .find(|(kind, _)| *kind == d.dependent)
                .map(|(_, fields)| fields)
                .unwrap();
            assert!(fields.contains(&d.field), "{} has no field {}", d.dependent, d.field);
        }
    }
}
