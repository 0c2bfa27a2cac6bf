//! Entity data types
//!
//! Each type is the writable state of one record. Identifiers live on
//! [`Record`], never inside the data.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Entity, EntityKind, Model, Record, RecordId, Reference};
use crate::index::{UniqueConstraint, UniqueKey};
use crate::storage::{Table, Tables};
use crate::validation::is_blank;

macro_rules! table_binding {
    ($variant:ident, $table:ident) => {
        fn table(tables: &Tables) -> &Table<Self> {
            &tables.$table
        }

        fn table_mut(tables: &mut Tables) -> &mut Table<Self> {
            &mut tables.$table
        }

        fn into_entity(record: Record<Self>) -> Entity {
            Entity::$variant(record)
        }

        fn from_entity(entity: Entity) -> Option<Record<Self>> {
            match entity {
                Entity::$variant(record) => Some(record),
                _ => None,
            }
        }
    };
}

fn push_ref(
    refs: &mut Vec<Reference>,
    field: &'static str,
    kind: EntityKind,
    id: Option<RecordId>,
) {
    if let Some(id) = id {
        refs.push(Reference::new(field, kind, id));
    }
}

/// Top of the hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct School {
    pub name: Option<String>,
}

impl School {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

impl Model for School {
    const KIND: EntityKind = EntityKind::School;

    table_binding!(School, schools);

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// An academic term within a school.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Term {
    pub school_id: Option<RecordId>,
    pub name: Option<String>,
    pub starts_on: Option<NaiveDate>,
    pub ends_on: Option<NaiveDate>,
}

impl Model for Term {
    const KIND: EntityKind = EntityKind::Term;

    table_binding!(Term, terms);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "school_id", EntityKind::School, self.school_id);
        refs
    }
}

/// A course offered in a term.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Course {
    pub term_id: Option<RecordId>,
    pub name: Option<String>,
    pub course_code: Option<String>,
}

impl Model for Course {
    const KIND: EntityKind = EntityKind::Course;

    table_binding!(Course, courses);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "term_id", EntityKind::Term, self.term_id);
        refs
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        match &self.course_code {
            Some(code) if !is_blank(code) => vec![UniqueKey::new(
                UniqueConstraint::CourseCodePerTerm,
                self.term_id,
                code.as_str(),
            )],
            _ => Vec::new(),
        }
    }
}

/// Enrolment of a student (user) in a course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CourseStudent {
    pub course_id: Option<RecordId>,
    pub student_id: Option<RecordId>,
}

impl Model for CourseStudent {
    const KIND: EntityKind = EntityKind::CourseStudent;

    table_binding!(CourseStudent, course_students);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "course_id", EntityKind::Course, self.course_id);
        push_ref(&mut refs, "student_id", EntityKind::User, self.student_id);
        refs
    }
}

/// Assignment of an instructor (user) to a course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CourseInstructor {
    pub course_id: Option<RecordId>,
    pub instructor_id: Option<RecordId>,
    pub primary: bool,
}

impl Model for CourseInstructor {
    const KIND: EntityKind = EntityKind::CourseInstructor;

    table_binding!(CourseInstructor, course_instructors);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "course_id", EntityKind::Course, self.course_id);
        push_ref(&mut refs, "instructor_id", EntityKind::User, self.instructor_id);
        refs
    }
}

/// Graded work within a course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Assignment {
    pub course_id: Option<RecordId>,
    pub name: Option<String>,
    pub percent_of_grade: Option<f64>,
    pub active_at: Option<NaiveDateTime>,
    pub due_at: Option<NaiveDateTime>,
}

impl Model for Assignment {
    const KIND: EntityKind = EntityKind::Assignment;

    table_binding!(Assignment, assignments);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "course_id", EntityKind::Course, self.course_id);
        refs
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        match &self.name {
            Some(name) if !is_blank(name) => vec![UniqueKey::new(
                UniqueConstraint::AssignmentNamePerCourse,
                self.course_id,
                name.as_str(),
            )],
            _ => Vec::new(),
        }
    }
}

/// A grade slot linking an assignment to an enrolment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssignmentGrade {
    pub assignment_id: Option<RecordId>,
    pub course_student_id: Option<RecordId>,
}

impl Model for AssignmentGrade {
    const KIND: EntityKind = EntityKind::AssignmentGrade;

    table_binding!(AssignmentGrade, assignment_grades);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "assignment_id", EntityKind::Assignment, self.assignment_id);
        push_ref(
            &mut refs,
            "course_student_id",
            EntityKind::CourseStudent,
            self.course_student_id,
        );
        refs
    }
}

/// A lesson; lessons form a tree through `parent_lesson_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Lesson {
    pub course_id: Option<RecordId>,
    pub parent_lesson_id: Option<RecordId>,
    pub name: Option<String>,
    pub pre_class_assignment_id: Option<RecordId>,
    pub in_class_assignment_id: Option<RecordId>,
}

impl Lesson {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl Model for Lesson {
    const KIND: EntityKind = EntityKind::Lesson;

    table_binding!(Lesson, lessons);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "course_id", EntityKind::Course, self.course_id);
        push_ref(&mut refs, "parent_lesson_id", EntityKind::Lesson, self.parent_lesson_id);
        push_ref(
            &mut refs,
            "pre_class_assignment_id",
            EntityKind::Assignment,
            self.pre_class_assignment_id,
        );
        push_ref(
            &mut refs,
            "in_class_assignment_id",
            EntityKind::Assignment,
            self.in_class_assignment_id,
        );
        refs
    }

    fn clear_reference(&mut self, field: &str) -> bool {
        let slot = match field {
            "parent_lesson_id" => &mut self.parent_lesson_id,
            "pre_class_assignment_id" => &mut self.pre_class_assignment_id,
            "in_class_assignment_id" => &mut self.in_class_assignment_id,
            _ => return false,
        };
        *slot = None;
        true
    }
}

/// Reading material attached to a lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Reading {
    pub lesson_id: Option<RecordId>,
    pub caption: Option<String>,
    pub order_number: Option<i64>,
    pub url: Option<String>,
}

impl Model for Reading {
    const KIND: EntityKind = EntityKind::Reading;

    table_binding!(Reading, readings);

    fn references(&self) -> Vec<Reference> {
        let mut refs = Vec::new();
        push_ref(&mut refs, "lesson_id", EntityKind::Lesson, self.lesson_id);
        refs
    }
}

/// A person; students and instructors are users linked through join records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct User {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl User {
    /// A user with every required field set.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        photo_url: impl Into<String>,
    ) -> Self {
        Self {
            first_name: Some(first_name.into()),
            middle_name: None,
            last_name: Some(last_name.into()),
            email: Some(email.into()),
            photo_url: Some(photo_url.into()),
        }
    }
}

impl Model for User {
    const KIND: EntityKind = EntityKind::User;

    table_binding!(User, users);

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        match &self.email {
            Some(email) if !is_blank(email) => {
                vec![UniqueKey::new(UniqueConstraint::UserEmail, None, email.as_str())]
            }
            _ => Vec::new(),
        }
    }
}
