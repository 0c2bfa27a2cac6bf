//! Entity model for campusdb
//!
//! Ten fixed entity types, each persisted as a [`Record`] in its own table.
//!
//! # Design Principles
//!
//! - Identifiers are per-table, monotonic, never reused
//! - A record stores exactly the data it was created with
//! - Relationships are foreign-key fields, never owning pointers
//! - Presence is a validation rule, so candidate fields may be absent

mod entities;

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::UniqueKey;
use crate::storage::{Table, Tables};
use crate::validation::Validate;

pub use entities::{
    Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, Lesson, Reading,
    School, Term, User,
};

/// Record identifier, unique within one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// The fixed set of entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    School,
    Term,
    Course,
    CourseStudent,
    CourseInstructor,
    Assignment,
    AssignmentGrade,
    Lesson,
    Reading,
    User,
}

impl EntityKind {
    /// Every kind, in declaration order
    pub const ALL: [EntityKind; 10] = [
        EntityKind::School,
        EntityKind::Term,
        EntityKind::Course,
        EntityKind::CourseStudent,
        EntityKind::CourseInstructor,
        EntityKind::Assignment,
        EntityKind::AssignmentGrade,
        EntityKind::Lesson,
        EntityKind::Reading,
        EntityKind::User,
    ];

    /// Stable snake_case name
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::School => "school",
            EntityKind::Term => "term",
            EntityKind::Course => "course",
            EntityKind::CourseStudent => "course_student",
            EntityKind::CourseInstructor => "course_instructor",
            EntityKind::Assignment => "assignment",
            EntityKind::AssignmentGrade => "assignment_grade",
            EntityKind::Lesson => "lesson",
            EntityKind::Reading => "reading",
            EntityKind::User => "user",
        }
    }

    /// Human-readable plural, as used in delete-restriction messages
    pub fn plural_label(&self) -> &'static str {
        match self {
            EntityKind::School => "schools",
            EntityKind::Term => "terms",
            EntityKind::Course => "courses",
            EntityKind::CourseStudent => "course students",
            EntityKind::CourseInstructor => "course instructors",
            EntityKind::Assignment => "assignments",
            EntityKind::AssignmentGrade => "assignment grades",
            EntityKind::Lesson => "lessons",
            EntityKind::Reading => "readings",
            EntityKind::User => "users",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Unrecognised entity kind name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown entity kind: '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A typed pointer to one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: RecordId,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<RecordId>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

/// A foreign-key value held by a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Field holding the key (e.g. "course_id")
    pub field: &'static str,
    /// Record the key points at
    pub target: EntityRef,
}

impl Reference {
    pub fn new(field: &'static str, kind: EntityKind, id: RecordId) -> Self {
        Self {
            field,
            target: EntityRef::new(kind, id),
        }
    }
}

/// A persisted record: identifier plus the data it was written with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    pub id: RecordId,
    pub data: T,
}

impl<T: Model> Record<T> {
    pub fn new(id: RecordId, data: T) -> Self {
        Self { id, data }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(T::KIND, self.id)
    }
}

/// Binds an entity data type to its table, rules and relationships.
pub trait Model:
    Validate + Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    const KIND: EntityKind;

    fn table(tables: &Tables) -> &Table<Self>;

    fn table_mut(tables: &mut Tables) -> &mut Table<Self>;

    /// Foreign keys currently set on this record
    fn references(&self) -> Vec<Reference>;

    /// Keys this record occupies in the uniqueness indexes
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Clears an optional foreign key. Returns false if the field is not nullable.
    fn clear_reference(&mut self, _field: &str) -> bool {
        false
    }

    fn into_entity(record: Record<Self>) -> Entity;

    fn from_entity(entity: Entity) -> Option<Record<Self>>;
}

/// Any persisted record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    School(Record<School>),
    Term(Record<Term>),
    Course(Record<Course>),
    CourseStudent(Record<CourseStudent>),
    CourseInstructor(Record<CourseInstructor>),
    Assignment(Record<Assignment>),
    AssignmentGrade(Record<AssignmentGrade>),
    Lesson(Record<Lesson>),
    Reading(Record<Reading>),
    User(Record<User>),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::School(_) => EntityKind::School,
            Entity::Term(_) => EntityKind::Term,
            Entity::Course(_) => EntityKind::Course,
            Entity::CourseStudent(_) => EntityKind::CourseStudent,
            Entity::CourseInstructor(_) => EntityKind::CourseInstructor,
            Entity::Assignment(_) => EntityKind::Assignment,
            Entity::AssignmentGrade(_) => EntityKind::AssignmentGrade,
            Entity::Lesson(_) => EntityKind::Lesson,
            Entity::Reading(_) => EntityKind::Reading,
            Entity::User(_) => EntityKind::User,
        }
    }

    pub fn id(&self) -> RecordId {
        match self {
            Entity::School(r) => r.id,
            Entity::Term(r) => r.id,
            Entity::Course(r) => r.id,
            Entity::CourseStudent(r) => r.id,
            Entity::CourseInstructor(r) => r.id,
            Entity::Assignment(r) => r.id,
            Entity::AssignmentGrade(r) => r.id,
            Entity::Lesson(r) => r.id,
            Entity::Reading(r) => r.id,
            Entity::User(r) => r.id,
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.kind(), self.id())
    }
}
