//! Delete Policy Invariant Tests
//!
//! Deleting a record applies every policy that reaches it, as one unit:
//! - Restrict refuses the delete and leaves every record in place
//! - Cascade removes dependents, depth first, before their parent
//! - Nullify clears the dependent's foreign key and keeps the dependent
//! - No delete ever leaves a dangling reference behind

use campusdb::model::{
    Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, Lesson, Reading,
    School, Term, User,
};
use campusdb::{CampusError, Database, EntityKind, EntityRef, Record, RecordId};
use chrono::NaiveDate;

// =============================================================================
// Helper Functions
// =============================================================================

fn school(db: &Database) -> Record<School> {
    db.create(School::named("Starfleet Academy")).unwrap()
}

fn term(db: &Database, school: RecordId) -> Record<Term> {
    db.create(Term {
        school_id: Some(school),
        name: Some("Fall Term".into()),
        starts_on: NaiveDate::from_ymd_opt(2004, 5, 26),
        ends_on: NaiveDate::from_ymd_opt(2017, 5, 1),
    })
    .unwrap()
}

fn course(db: &Database, term: RecordId, code: &str) -> Record<Course> {
    db.create(Course {
        term_id: Some(term),
        name: Some("Advanced Subspace Geometry".into()),
        course_code: Some(code.into()),
    })
    .unwrap()
}

fn assignment(db: &Database, course: RecordId, name: &str) -> Record<Assignment> {
    db.create(Assignment {
        course_id: Some(course),
        name: Some(name.into()),
        percent_of_grade: Some(0.25),
        ..Assignment::default()
    })
    .unwrap()
}

fn lesson(db: &Database, data: Lesson) -> Record<Lesson> {
    db.create(data).unwrap()
}

fn reading(db: &Database, lesson: RecordId) -> Record<Reading> {
    db.create(Reading {
        lesson_id: Some(lesson),
        caption: Some("Industry Methods and Standards".into()),
        order_number: Some(1),
        url: Some("http://destroythelesson.com".into()),
    })
    .unwrap()
}

fn user(db: &Database, email: &str) -> Record<User> {
    db.create(User::new(
        "Tuvok",
        "Vulcan",
        email,
        "https://www.voyager.com/personnel/tuvok.png",
    ))
    .unwrap()
}

fn course_fixture() -> (Database, Record<Term>, Record<Course>) {
    let db = Database::new();
    let s = school(&db);
    let t = term(&db, s.id);
    let c = course(&db, t.id, "ncc1701");
    (db, t, c)
}

fn assert_no_dangling(db: &Database) {
    assert!(db.tables().dangling_references().is_empty());
}

fn restricted(err: CampusError) -> Vec<String> {
    assert_eq!(err.code(), "CAMPUS_DELETE_RESTRICTED");
    err.messages()
}

// =============================================================================
// Restrict
// =============================================================================

/// A school with terms cannot be deleted.
#[test]
fn test_school_with_terms_is_restricted() {
    let db = Database::new();
    let s = school(&db);
    term(&db, s.id);

    let err = db.delete(s.entity_ref()).unwrap_err();
    assert_eq!(
        restricted(err),
        vec!["Cannot delete record because dependent terms exist"]
    );
    assert!(db.find::<School>(s.id).is_ok());
}

/// A term with courses cannot be deleted.
#[test]
fn test_term_with_courses_is_restricted() {
    let (db, t, _) = course_fixture();
    let err = db.delete(t.entity_ref()).unwrap_err();
    assert_eq!(
        restricted(err),
        vec!["Cannot delete record because dependent courses exist"]
    );
    assert!(db.find::<Term>(t.id).is_ok());
}

/// A term without courses is deleted.
#[test]
fn test_empty_term_is_deleted() {
    let db = Database::new();
    let s = school(&db);
    let t = term(&db, s.id);

    let report = db.delete(t.entity_ref()).unwrap();
    assert_eq!(report.removed, vec![t.entity_ref()]);
    assert!(db.find::<Term>(t.id).is_err());
}

#[test]
fn test_course_with_students_is_restricted() {
    let (db, _, c) = course_fixture();
    let u = user(&db, "tuvok@voyager.com");
    db.enroll_student(c.id, u.id).unwrap();

    let err = db.delete(c.entity_ref()).unwrap_err();
    assert_eq!(
        restricted(err),
        vec!["Cannot delete record because dependent course students exist"]
    );
}

#[test]
fn test_course_with_instructors_is_restricted() {
    let (db, _, c) = course_fixture();
    let u = user(&db, "tuvok@voyager.com");
    db.add_instructor(c.id, u.id, true).unwrap();

    let err = db.delete(c.entity_ref()).unwrap_err();
    assert_eq!(
        restricted(err),
        vec!["Cannot delete record because dependent course instructors exist"]
    );
}

#[test]
fn test_assignment_with_grades_is_restricted() {
    let (db, _, c) = course_fixture();
    let a = assignment(&db, c.id, "Cochrane Theory for Dummies");
    db.create(AssignmentGrade {
        assignment_id: Some(a.id),
        course_student_id: None,
    })
    .unwrap();

    let err = db.delete(a.entity_ref()).unwrap_err();
    assert_eq!(
        restricted(err),
        vec!["Cannot delete record because dependent assignment grades exist"]
    );
}

#[test]
fn test_user_enrolled_or_teaching_is_restricted() {
    let (db, _, c) = course_fixture();
    let student = user(&db, "kim@voyager.com");
    let instructor = user(&db, "janeway@voyager.com");
    db.enroll_student(c.id, student.id).unwrap();
    db.add_instructor(c.id, instructor.id, false).unwrap();

    assert!(db.delete(student.entity_ref()).is_err());
    assert!(db.delete(instructor.entity_ref()).is_err());
    assert_eq!(db.all::<User>().len(), 2);
}

/// A restriction found deep inside a cascade refuses the whole delete.
#[test]
fn test_restriction_inside_cascade_aborts_everything() {
    let (db, _, c) = course_fixture();
    let a = assignment(&db, c.id, "Cochrane Theory for Dummies");
    let l = lesson(
        &db,
        Lesson {
            course_id: Some(c.id),
            ..Lesson::named("First Lesson")
        },
    );
    let r = reading(&db, l.id);
    db.create(AssignmentGrade {
        assignment_id: Some(a.id),
        course_student_id: None,
    })
    .unwrap();
    let before = db.counts();

    let err = db.delete(c.entity_ref()).unwrap_err();
    match &err {
        CampusError::Integrity(e) => {
            assert_eq!(e.target, c.entity_ref());
            assert_eq!(e.blocked, a.entity_ref());
            assert_eq!(e.dependent, EntityKind::AssignmentGrade);
        }
        other => panic!("expected restriction, got {other:?}"),
    }

    assert_eq!(db.counts(), before);
    assert!(db.find::<Lesson>(l.id).is_ok());
    assert!(db.find::<Reading>(r.id).is_ok());
    assert_eq!(db.metrics().snapshot().deletes_restricted, 1);
}

// =============================================================================
// Cascade
// =============================================================================

/// Course deletion removes its assignments, lessons and their readings.
#[test]
fn test_course_cascades_to_assignments_lessons_and_readings() {
    let (db, _, c) = course_fixture();
    let a = assignment(&db, c.id, "Cochrane Theory for Dummies");
    let l = lesson(
        &db,
        Lesson {
            course_id: Some(c.id),
            ..Lesson::named("First Lesson")
        },
    );
    let r = reading(&db, l.id);

    let report = db.delete(c.entity_ref()).unwrap();
    assert_eq!(
        report.removed,
        vec![a.entity_ref(), r.entity_ref(), l.entity_ref(), c.entity_ref()]
    );
    assert!(report.nullified.is_empty());
    assert!(db.all::<Assignment>().is_empty());
    assert!(db.all::<Lesson>().is_empty());
    assert!(db.all::<Reading>().is_empty());
    assert_no_dangling(&db);
}

#[test]
fn test_lesson_cascades_to_readings() {
    let db = Database::new();
    let l = lesson(&db, Lesson::named("Lesson Destroying Best Practices"));
    let r1 = reading(&db, l.id);
    let r2 = reading(&db, l.id);

    let report = db.delete(l.entity_ref()).unwrap();
    assert_eq!(
        report.removed,
        vec![r1.entity_ref(), r2.entity_ref(), l.entity_ref()]
    );
    assert!(db.all::<Reading>().is_empty());
}

/// Only the dependents of the deleted record are touched.
#[test]
fn test_cascade_leaves_sibling_course_alone() {
    let (db, t, c) = course_fixture();
    let other = course(&db, t.id, "ncc74210");
    let kept = assignment(&db, other.id, "Transwarp Initiatives");
    assignment(&db, c.id, "Cochrane Theory for Dummies");

    db.delete(c.entity_ref()).unwrap();
    assert_eq!(
        db.all::<Assignment>().into_iter().map(|a| a.id).collect::<Vec<_>>(),
        vec![kept.id]
    );
    assert!(db.find::<Course>(other.id).is_ok());
}

// =============================================================================
// Nullify
// =============================================================================

/// Assignments deleted out from under lessons leave the lessons in place.
#[test]
fn test_assignment_delete_nullifies_lesson_links() {
    let (db, _, c) = course_fixture();
    let a = assignment(&db, c.id, "Cochrane Theory for Dummies");
    let pre = lesson(
        &db,
        Lesson {
            pre_class_assignment_id: Some(a.id),
            ..Lesson::named("Pre Class Lesson")
        },
    );
    let during = lesson(
        &db,
        Lesson {
            in_class_assignment_id: Some(a.id),
            ..Lesson::named("In Class Lesson")
        },
    );

    let report = db.delete(a.entity_ref()).unwrap();
    assert_eq!(report.removed, vec![a.entity_ref()]);
    assert_eq!(report.nullified, vec![pre.entity_ref(), during.entity_ref()]);

    let pre = db.find::<Lesson>(pre.id).unwrap();
    let during = db.find::<Lesson>(during.id).unwrap();
    assert_eq!(pre.data.pre_class_assignment_id, None);
    assert_eq!(during.data.in_class_assignment_id, None);
    assert_no_dangling(&db);
}

/// Child lessons outlive their parent and become roots.
#[test]
fn test_parent_lesson_delete_nullifies_children() {
    let db = Database::new();
    let parent = lesson(&db, Lesson::named("Parent Lesson"));
    let child = lesson(
        &db,
        Lesson {
            parent_lesson_id: Some(parent.id),
            ..Lesson::named("Child Lesson")
        },
    );

    let report = db.delete(parent.entity_ref()).unwrap();
    assert_eq!(report.removed, vec![parent.entity_ref()]);
    assert_eq!(report.nullified, vec![child.entity_ref()]);
    assert_eq!(db.find::<Lesson>(child.id).unwrap().data.parent_lesson_id, None);
}

/// A lesson removed by the same cascade is not also nullified.
#[test]
fn test_cascaded_child_lesson_is_removed_not_cleared() {
    let (db, _, c) = course_fixture();
    let parent = lesson(
        &db,
        Lesson {
            course_id: Some(c.id),
            ..Lesson::named("Parent Lesson")
        },
    );
    let child = lesson(
        &db,
        Lesson {
            course_id: Some(c.id),
            parent_lesson_id: Some(parent.id),
            ..Lesson::named("Child Lesson")
        },
    );

    let report = db.delete(c.entity_ref()).unwrap();
    assert!(report.removed.contains(&child.entity_ref()));
    assert!(report.nullified.is_empty());
    assert!(db.all::<Lesson>().is_empty());
}

/// A lesson may be its own parent; deleting it terminates.
#[test]
fn test_self_parented_lesson_is_deleted() {
    let db = Database::new();
    let l = lesson(&db, Lesson::named("Recursion"));
    db.attach_child_lesson(l.id, l.id).unwrap();

    let report = db.delete(l.entity_ref()).unwrap();
    assert_eq!(report.removed, vec![l.entity_ref()]);
    assert!(report.nullified.is_empty());
}

// =============================================================================
// Missing Records
// =============================================================================

#[test]
fn test_delete_missing_record_is_not_found() {
    let db = Database::new();
    let missing = EntityRef::new(EntityKind::Reading, 3);
    assert_eq!(db.delete(missing).unwrap_err(), CampusError::NotFound(missing));
}

#[test]
fn test_second_delete_is_not_found() {
    let db = Database::new();
    let s = school(&db);
    db.delete(s.entity_ref()).unwrap();
    assert_eq!(
        db.delete(s.entity_ref()).unwrap_err(),
        CampusError::NotFound(s.entity_ref())
    );
}

#[test]
fn test_grades_and_enrolment_unwind_in_order() {
    let (db, _, c) = course_fixture();
    let u = user(&db, "paris@voyager.com");
    let enrolment = db.enroll_student(c.id, u.id).unwrap();
    let a = assignment(&db, c.id, "Warp Ten Theory");
    let grade = db
        .create(AssignmentGrade {
            assignment_id: Some(a.id),
            course_student_id: Some(enrolment.id),
        })
        .unwrap();

    assert!(db.delete(enrolment.entity_ref()).is_err());
    db.delete(grade.entity_ref()).unwrap();
    db.delete(enrolment.entity_ref()).unwrap();
    db.delete(u.entity_ref()).unwrap();
    db.delete(c.entity_ref()).unwrap();

    assert!(db.all::<CourseStudent>().is_empty());
    assert!(db.all::<CourseInstructor>().is_empty());
    assert!(db.all::<Assignment>().is_empty());
    assert_no_dangling(&db);
}
