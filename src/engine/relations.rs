//! Named relations between records
//!
//! A relation is resolved with flat queries over the tables: belongs-to
//! relations follow a foreign key, collections scan for records whose
//! foreign key points back. Collections are ordered by `crate::ordering`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::model::{
    Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, Entity, EntityKind,
    EntityRef, Lesson, Model, Reading, Record, RecordId, School, Term, User,
};
use crate::ordering::{sort_assignments, sort_by_id, sort_students};
use crate::storage::Tables;

/// Every relation name any kind declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    School,
    Term,
    Course,
    Terms,
    Courses,
    CourseStudents,
    Students,
    CourseInstructors,
    Instructors,
    Assignments,
    Lessons,
    Readings,
    Student,
    AssignmentGrades,
    Instructor,
    PreClassLessons,
    InClassLessons,
    Assignment,
    CourseStudent,
    ParentLesson,
    ChildLessons,
    PreClassAssignment,
    InClassAssignment,
    Lesson,
    EnrolledCourses,
    TaughtCourses,
}

impl Relation {
    pub const ALL: [Relation; 26] = [
        Relation::School,
        Relation::Term,
        Relation::Course,
        Relation::Terms,
        Relation::Courses,
        Relation::CourseStudents,
        Relation::Students,
        Relation::CourseInstructors,
        Relation::Instructors,
        Relation::Assignments,
        Relation::Lessons,
        Relation::Readings,
        Relation::Student,
        Relation::AssignmentGrades,
        Relation::Instructor,
        Relation::PreClassLessons,
        Relation::InClassLessons,
        Relation::Assignment,
        Relation::CourseStudent,
        Relation::ParentLesson,
        Relation::ChildLessons,
        Relation::PreClassAssignment,
        Relation::InClassAssignment,
        Relation::Lesson,
        Relation::EnrolledCourses,
        Relation::TaughtCourses,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Relation::School => "school",
            Relation::Term => "term",
            Relation::Course => "course",
            Relation::Terms => "terms",
            Relation::Courses => "courses",
            Relation::CourseStudents => "course_students",
            Relation::Students => "students",
            Relation::CourseInstructors => "course_instructors",
            Relation::Instructors => "instructors",
            Relation::Assignments => "assignments",
            Relation::Lessons => "lessons",
            Relation::Readings => "readings",
            Relation::Student => "student",
            Relation::AssignmentGrades => "assignment_grades",
            Relation::Instructor => "instructor",
            Relation::PreClassLessons => "pre_class_lessons",
            Relation::InClassLessons => "in_class_lessons",
            Relation::Assignment => "assignment",
            Relation::CourseStudent => "course_student",
            Relation::ParentLesson => "parent_lesson",
            Relation::ChildLessons => "child_lessons",
            Relation::PreClassAssignment => "pre_class_assignment",
            Relation::InClassAssignment => "in_class_assignment",
            Relation::Lesson => "lesson",
            Relation::EnrolledCourses => "enrolled_courses",
            Relation::TaughtCourses => "taught_courses",
        }
    }

    /// Relations declared by `kind`
    pub fn declared_for(kind: EntityKind) -> &'static [Relation] {
        match kind {
            EntityKind::School => &[Relation::Terms, Relation::Courses],
            EntityKind::Term => &[Relation::School, Relation::Courses],
            EntityKind::Course => &[
                Relation::Term,
                Relation::CourseStudents,
                Relation::Students,
                Relation::CourseInstructors,
                Relation::Instructors,
                Relation::Assignments,
                Relation::Lessons,
                Relation::Readings,
            ],
            EntityKind::CourseStudent => &[
                Relation::Course,
                Relation::Student,
                Relation::AssignmentGrades,
            ],
            EntityKind::CourseInstructor => &[Relation::Course, Relation::Instructor],
            EntityKind::Assignment => &[
                Relation::Course,
                Relation::AssignmentGrades,
                Relation::PreClassLessons,
                Relation::InClassLessons,
            ],
            EntityKind::AssignmentGrade => &[Relation::Assignment, Relation::CourseStudent],
            EntityKind::Lesson => &[
                Relation::Course,
                Relation::ParentLesson,
                Relation::ChildLessons,
                Relation::Readings,
                Relation::PreClassAssignment,
                Relation::InClassAssignment,
            ],
            EntityKind::Reading => &[Relation::Lesson],
            EntityKind::User => &[Relation::EnrolledCourses, Relation::TaughtCourses],
        }
    }

    pub fn is_declared_for(&self, kind: EntityKind) -> bool {
        Relation::declared_for(kind).contains(self)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Relation::ALL
            .iter()
            .copied()
            .find(|r| r.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Resolves `relation` from an existing `target`.
///
/// Returns None when the kind does not declare the relation or the target
/// is missing.
pub(crate) fn resolve(
    tables: &Tables,
    target: EntityRef,
    relation: Relation,
) -> Option<Vec<Entity>> {
    if !relation.is_declared_for(target.kind) || !tables.contains(target) {
        return None;
    }
    let id = target.id;

    let related = match (target.kind, relation) {
        (EntityKind::School, Relation::Terms) => {
            entities(children::<Term>(tables, "school_id", target))
        }
        (EntityKind::School, Relation::Courses) => {
            let terms = children::<Term>(tables, "school_id", target);
            entities(distinct::<Course>(
                tables,
                terms.iter().flat_map(|t| {
                    tables.referencing(EntityKind::Course, "term_id", t.entity_ref())
                }),
            ))
        }

        (EntityKind::Term, Relation::School) => {
            parent::<School>(tables, field(tables, id, |t: &Term| t.school_id))
        }
        (EntityKind::Term, Relation::Courses) => {
            entities(children::<Course>(tables, "term_id", target))
        }

        (EntityKind::Course, Relation::Term) => {
            parent::<Term>(tables, field(tables, id, |c: &Course| c.term_id))
        }
        (EntityKind::Course, Relation::CourseStudents) => {
            entities(children::<CourseStudent>(tables, "course_id", target))
        }
        (EntityKind::Course, Relation::Students) => {
            let enrolments = children::<CourseStudent>(tables, "course_id", target);
            let mut students = first_seen::<User>(
                tables,
                enrolments.iter().filter_map(|e| e.data.student_id),
            );
            sort_students(&mut students);
            entities(students)
        }
        (EntityKind::Course, Relation::CourseInstructors) => {
            entities(children::<CourseInstructor>(tables, "course_id", target))
        }
        (EntityKind::Course, Relation::Instructors) => {
            let assigned = children::<CourseInstructor>(tables, "course_id", target);
            entities(distinct::<User>(
                tables,
                assigned.iter().filter_map(|a| a.data.instructor_id),
            ))
        }
        (EntityKind::Course, Relation::Assignments) => {
            let mut assignments = children::<Assignment>(tables, "course_id", target);
            sort_assignments(&mut assignments);
            entities(assignments)
        }
        (EntityKind::Course, Relation::Lessons) => {
            entities(children::<Lesson>(tables, "course_id", target))
        }
        (EntityKind::Course, Relation::Readings) => {
            let lessons = children::<Lesson>(tables, "course_id", target);
            entities(distinct::<Reading>(
                tables,
                lessons.iter().flat_map(|l| {
                    tables.referencing(EntityKind::Reading, "lesson_id", l.entity_ref())
                }),
            ))
        }

        (EntityKind::CourseStudent, Relation::Course) => {
            parent::<Course>(tables, field(tables, id, |e: &CourseStudent| e.course_id))
        }
        (EntityKind::CourseStudent, Relation::Student) => {
            parent::<User>(tables, field(tables, id, |e: &CourseStudent| e.student_id))
        }
        (EntityKind::CourseStudent, Relation::AssignmentGrades) => {
            entities(children::<AssignmentGrade>(tables, "course_student_id", target))
        }

        (EntityKind::CourseInstructor, Relation::Course) => {
            parent::<Course>(tables, field(tables, id, |a: &CourseInstructor| a.course_id))
        }
        (EntityKind::CourseInstructor, Relation::Instructor) => {
            parent::<User>(tables, field(tables, id, |a: &CourseInstructor| a.instructor_id))
        }

        (EntityKind::Assignment, Relation::Course) => {
            parent::<Course>(tables, field(tables, id, |a: &Assignment| a.course_id))
        }
        (EntityKind::Assignment, Relation::AssignmentGrades) => {
            entities(children::<AssignmentGrade>(tables, "assignment_id", target))
        }
        (EntityKind::Assignment, Relation::PreClassLessons) => {
            entities(children::<Lesson>(tables, "pre_class_assignment_id", target))
        }
        (EntityKind::Assignment, Relation::InClassLessons) => {
            entities(children::<Lesson>(tables, "in_class_assignment_id", target))
        }

        (EntityKind::AssignmentGrade, Relation::Assignment) => parent::<Assignment>(
            tables,
            field(tables, id, |g: &AssignmentGrade| g.assignment_id),
        ),
        (EntityKind::AssignmentGrade, Relation::CourseStudent) => parent::<CourseStudent>(
            tables,
            field(tables, id, |g: &AssignmentGrade| g.course_student_id),
        ),

        (EntityKind::Lesson, Relation::Course) => {
            parent::<Course>(tables, field(tables, id, |l: &Lesson| l.course_id))
        }
        (EntityKind::Lesson, Relation::ParentLesson) => {
            parent::<Lesson>(tables, field(tables, id, |l: &Lesson| l.parent_lesson_id))
        }
        (EntityKind::Lesson, Relation::ChildLessons) => {
            let mut lessons = children::<Lesson>(tables, "parent_lesson_id", target);
            sort_by_id(&mut lessons);
            entities(lessons)
        }
        (EntityKind::Lesson, Relation::Readings) => {
            entities(children::<Reading>(tables, "lesson_id", target))
        }
        (EntityKind::Lesson, Relation::PreClassAssignment) => parent::<Assignment>(
            tables,
            field(tables, id, |l: &Lesson| l.pre_class_assignment_id),
        ),
        (EntityKind::Lesson, Relation::InClassAssignment) => parent::<Assignment>(
            tables,
            field(tables, id, |l: &Lesson| l.in_class_assignment_id),
        ),

        (EntityKind::Reading, Relation::Lesson) => {
            parent::<Lesson>(tables, field(tables, id, |r: &Reading| r.lesson_id))
        }

        (EntityKind::User, Relation::EnrolledCourses) => {
            let enrolments = children::<CourseStudent>(tables, "student_id", target);
            entities(distinct::<Course>(
                tables,
                enrolments.iter().filter_map(|e| e.data.course_id),
            ))
        }
        (EntityKind::User, Relation::TaughtCourses) => {
            let assigned = children::<CourseInstructor>(tables, "instructor_id", target);
            entities(distinct::<Course>(
                tables,
                assigned.iter().filter_map(|a| a.data.course_id),
            ))
        }

        _ => return None,
    };
    Some(related)
}

/// Records of `M` whose `field` points at `target`, ascending by id
fn children<M: Model>(tables: &Tables, field: &str, target: EntityRef) -> Vec<Record<M>> {
    tables
        .referencing(M::KIND, field, target)
        .into_iter()
        .filter_map(|id| tables.record::<M>(id))
        .collect()
}

/// Existing records of `M` for each id, once each, ascending by id
fn distinct<M: Model>(tables: &Tables, ids: impl Iterator<Item = RecordId>) -> Vec<Record<M>> {
    ids.collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|id| tables.record::<M>(id))
        .collect()
}

/// Existing records of `M` for each id, once each, in order of first appearance
fn first_seen<M: Model>(tables: &Tables, ids: impl Iterator<Item = RecordId>) -> Vec<Record<M>> {
    let mut seen = BTreeSet::new();
    ids.filter(|id| seen.insert(*id))
        .filter_map(|id| tables.record::<M>(id))
        .collect()
}

/// Reads one foreign key off the record `id` of `M`
fn field<M: Model>(
    tables: &Tables,
    id: RecordId,
    key: impl Fn(&M) -> Option<RecordId>,
) -> Option<RecordId> {
    tables.get::<M>(id).and_then(key)
}

fn parent<M: Model>(tables: &Tables, id: Option<RecordId>) -> Vec<Entity> {
    id.and_then(|id| tables.record::<M>(id))
        .map(M::into_entity)
        .into_iter()
        .collect()
}

fn entities<M: Model>(records: Vec<Record<M>>) -> Vec<Entity> {
    records.into_iter().map(M::into_entity).collect()
}
