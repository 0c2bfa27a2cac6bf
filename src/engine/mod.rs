//! Engine for campusdb
//!
//! [`Database`] is the single entry point for reads and writes. Every
//! operation takes the table lock once and runs to completion under it:
//! validation, uniqueness enforcement and commit for a write; planning
//! and batch application for a delete.
//!
//! # Design Principles
//!
//! - Validation evaluates every rule before rejecting
//! - A rejected write leaves no trace
//! - A delete and all of its cascades commit together or not at all
//! - Related collections are returned in their declared order

mod errors;
mod relations;

use std::collections::BTreeSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::integrity::plan_delete;
use crate::model::{
    Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, Entity, EntityKind,
    EntityRef, Lesson, Model, Reading, Record, RecordId, School, Term, User,
};
use crate::observability::{Event, MetricsRegistry};
use crate::storage::{with_model, Tables};
use crate::validation::ValidationContext;

pub use errors::{CampusError, CampusErrorCode, CampusResult};
pub use relations::Relation;

/// Outcome of a committed delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteReport {
    /// Removed records, children before parents; the target is last
    pub removed: Vec<EntityRef>,
    /// Surviving records that had a foreign key cleared
    pub nullified: Vec<EntityRef>,
}

/// An in-memory campus database.
///
/// Safe to share across threads; writes are serialised by one lock.
#[derive(Debug, Default)]
pub struct Database {
    tables: RwLock<Tables>,
    metrics: MetricsRegistry,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already-verified tables, e.g. from a snapshot.
    pub fn from_tables(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
            metrics: MetricsRegistry::new(),
        }
    }

    /// A consistent copy of every table
    pub fn tables(&self) -> Tables {
        self.read().clone()
    }

    /// Takes the tables out once no more requests will be served.
    pub fn into_tables(self) -> Tables {
        self.tables
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Row counts per kind
    pub fn counts(&self) -> Vec<(EntityKind, usize)> {
        self.read().counts()
    }

    // Writes are verified in full before they are applied, so a panic
    // under the lock cannot leave partial state behind.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates and inserts a new record.
    pub fn create<M: Model>(&self, data: M) -> CampusResult<Record<M>> {
        let mut tables = self.write();

        let errors = data.validate(&ValidationContext::for_create(&*tables));
        if !errors.is_empty() {
            return Err(self.rejected(M::KIND, None, errors.into()));
        }

        let id = tables
            .insert(data.clone())
            .map_err(|e| self.rejected(M::KIND, None, e.into()))?;

        self.metrics.increment_created();
        debug!(event = %Event::WriteCommit, kind = %M::KIND, id = %id);
        Ok(Record::new(id, data))
    }

    /// Validates and replaces the data of an existing record.
    pub fn update<M: Model>(&self, id: RecordId, data: M) -> CampusResult<Record<M>> {
        let mut tables = self.write();
        if tables.get::<M>(id).is_none() {
            return Err(CampusError::NotFound(EntityRef::new(M::KIND, id)));
        }
        self.commit_update(&mut tables, id, data)
    }

    /// Applies `change` to the current data of a record, then validates
    /// and commits the result.
    pub fn update_with<M: Model>(
        &self,
        id: RecordId,
        change: impl FnOnce(&mut M),
    ) -> CampusResult<Record<M>> {
        let mut tables = self.write();
        let mut data = tables
            .get::<M>(id)
            .cloned()
            .ok_or(CampusError::NotFound(EntityRef::new(M::KIND, id)))?;
        change(&mut data);
        self.commit_update(&mut tables, id, data)
    }

    fn commit_update<M: Model>(
        &self,
        tables: &mut Tables,
        id: RecordId,
        data: M,
    ) -> CampusResult<Record<M>> {
        let errors = data.validate(&ValidationContext::for_update(&*tables, id));
        if !errors.is_empty() {
            return Err(self.rejected(M::KIND, Some(id), errors.into()));
        }

        tables
            .replace(id, data.clone())
            .map_err(|e| self.rejected(M::KIND, Some(id), e.into()))?;

        self.metrics.add_updated(1);
        debug!(event = %Event::UpdateCommit, kind = %M::KIND, id = %id);
        Ok(Record::new(id, data))
    }

    fn rejected(&self, kind: EntityKind, id: Option<RecordId>, err: CampusError) -> CampusError {
        self.metrics.increment_rejected();
        warn!(
            event = %Event::WriteRejected,
            kind = %kind,
            id = ?id.map(|id| id.get()),
            code = err.code(),
            messages = ?err.messages()
        );
        err
    }

    /// Deletes a record, applying every restrict, cascade and nullify
    /// policy that reaches it.
    pub fn delete(&self, target: EntityRef) -> CampusResult<DeleteReport> {
        let mut tables = self.write();
        if !tables.contains(target) {
            return Err(CampusError::NotFound(target));
        }

        let plan = match plan_delete(&tables, target) {
            Ok(plan) => plan,
            Err(err) => {
                self.metrics.increment_restricted();
                warn!(
                    event = %Event::DeleteRestricted,
                    target = %target,
                    blocked = %err.blocked,
                    dependent = %err.dependent,
                    count = err.count
                );
                return Err(err.into());
            }
        };

        tables.apply(plan.to_batch())?;

        let nullified: BTreeSet<EntityRef> = plan.clears().iter().map(|(r, _)| *r).collect();
        let report = DeleteReport {
            removed: plan.removals().to_vec(),
            nullified: nullified.into_iter().collect(),
        };
        self.metrics.add_deleted(report.removed.len() as u64);
        self.metrics.add_updated(report.nullified.len() as u64);
        info!(
            event = %Event::DeleteCommit,
            target = %plan.target(),
            removed = report.removed.len(),
            nullified = report.nullified.len()
        );
        Ok(report)
    }

    /// The record `id` of `M`.
    pub fn find<M: Model>(&self, id: RecordId) -> CampusResult<Record<M>> {
        self.read()
            .record::<M>(id)
            .ok_or(CampusError::NotFound(EntityRef::new(M::KIND, id)))
    }

    /// Any record, type-erased
    pub fn fetch(&self, target: EntityRef) -> CampusResult<Entity> {
        self.read()
            .entity(target)
            .ok_or(CampusError::NotFound(target))
    }

    /// The lowest-id record of `M` matching `predicate`
    pub fn find_unique<M: Model>(&self, predicate: impl Fn(&M) -> bool) -> Option<Record<M>> {
        let tables = self.read();
        let found = M::table(&tables)
            .iter()
            .find(|(_, data)| predicate(data))
            .map(|(id, data)| Record::new(id, data.clone()));
        found
    }

    /// Every record of `M`, ascending by id
    pub fn all<M: Model>(&self) -> Vec<Record<M>> {
        M::table(&self.read()).records()
    }

    /// Records of `kind` whose serialized `field` equals `value`,
    /// ascending by id. The field `id` matches the record identifier.
    pub fn find_by_field(&self, kind: EntityKind, field: &str, value: &Value) -> Vec<Entity> {
        let tables = self.read();
        with_model!(kind, M => M::table(&tables)
            .records()
            .into_iter()
            .filter(|record| field_matches(record, field, value))
            .map(M::into_entity)
            .collect())
    }

    /// Resolves a named relation from `target`, in the relation's order.
    pub fn fetch_related(
        &self,
        target: EntityRef,
        relation: Relation,
    ) -> CampusResult<Vec<Entity>> {
        if !relation.is_declared_for(target.kind) {
            return Err(CampusError::InvalidRelation {
                kind: target.kind,
                relation: relation.name().to_string(),
            });
        }
        let tables = self.read();
        relations::resolve(&tables, target, relation).ok_or(CampusError::NotFound(target))
    }

    /// [`fetch_related`](Self::fetch_related) narrowed to one record type.
    ///
    /// Records of other kinds are skipped, so asking for the wrong type
    /// yields an empty list.
    pub fn fetch_related_as<M: Model>(
        &self,
        target: EntityRef,
        relation: Relation,
    ) -> CampusResult<Vec<Record<M>>> {
        Ok(self
            .fetch_related(target, relation)?
            .into_iter()
            .filter_map(M::from_entity)
            .collect())
    }

    /// The instructor of the lowest-id primary assignment on `course`.
    ///
    /// Primary assignments without an existing instructor are skipped.
    pub fn primary_instructor(&self, course: RecordId) -> CampusResult<Option<Record<User>>> {
        let tables = self.read();
        let course_ref = EntityRef::new(EntityKind::Course, course);
        if !tables.contains(course_ref) {
            return Err(CampusError::NotFound(course_ref));
        }

        let instructor = tables
            .referencing(EntityKind::CourseInstructor, "course_id", course_ref)
            .into_iter()
            .filter_map(|id| tables.get::<CourseInstructor>(id))
            .filter(|assigned| assigned.primary)
            .find_map(|assigned| {
                assigned
                    .instructor_id
                    .and_then(|user| tables.record::<User>(user))
            });
        Ok(instructor)
    }

    /// Enrols `student` in `course`.
    pub fn enroll_student(
        &self,
        course: RecordId,
        student: RecordId,
    ) -> CampusResult<Record<CourseStudent>> {
        self.create(CourseStudent {
            course_id: Some(course),
            student_id: Some(student),
        })
    }

    /// Assigns `instructor` to `course`.
    pub fn add_instructor(
        &self,
        course: RecordId,
        instructor: RecordId,
        primary: bool,
    ) -> CampusResult<Record<CourseInstructor>> {
        self.create(CourseInstructor {
            course_id: Some(course),
            instructor_id: Some(instructor),
            primary,
        })
    }

    /// Makes `child` a child lesson of `parent`.
    pub fn attach_child_lesson(
        &self,
        parent: RecordId,
        child: RecordId,
    ) -> CampusResult<Record<Lesson>> {
        self.update_with::<Lesson>(child, |lesson| lesson.parent_lesson_id = Some(parent))
    }
}

fn field_matches<M: Model>(record: &Record<M>, field: &str, value: &Value) -> bool {
    if field == "id" {
        return value.as_u64() == Some(record.id.get());
    }
    match serde_json::to_value(&record.data) {
        Ok(Value::Object(fields)) => fields.get(field) == Some(value),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn seed_term(db: &Database) -> Record<Term> {
        let school = db.create(School::named("Starfleet Academy")).unwrap();
        db.create(Term {
            school_id: Some(school.id),
            name: Some("Fall Term".into()),
            starts_on: NaiveDate::from_ymd_opt(2004, 5, 26),
            ends_on: NaiveDate::from_ymd_opt(2005, 5, 26),
        })
        .unwrap()
    }

    fn course(term: RecordId, code: &str) -> Course {
        Course {
            term_id: Some(term),
            name: Some("Warp Theory".into()),
            course_code: Some(code.into()),
        }
    }

    #[test]
    fn test_create_returns_supplied_data() {
        let db = Database::new();
        let term = seed_term(&db);
        let created = db.create(course(term.id, "ncc1701")).unwrap();

        assert_eq!(db.find::<Course>(created.id).unwrap(), created);
        assert_eq!(db.metrics().snapshot().records_created, 3);
    }

    #[test]
    fn test_rejected_create_consumes_nothing() {
        let db = Database::new();
        let err = db.create(School::default()).unwrap_err();

        assert_eq!(err.messages(), vec!["Name can't be blank"]);
        assert!(db.all::<School>().is_empty());
        assert_eq!(db.metrics().snapshot().writes_rejected, 1);

        let school = db.create(School::named("Starfleet Academy")).unwrap();
        assert_eq!(school.id, RecordId::new(1));
    }

    #[test]
    fn test_update_keeps_own_unique_key() {
        let db = Database::new();
        let term = seed_term(&db);
        let created = db.create(course(term.id, "ncc1701")).unwrap();

        let renamed = db
            .update_with::<Course>(created.id, |c| c.name = Some("Warp Theory II".into()))
            .unwrap();
        assert_eq!(renamed.data.course_code.as_deref(), Some("ncc1701"));
    }

    #[test]
    fn test_update_missing_record() {
        let db = Database::new();
        let err = db.update(RecordId::new(3), School::named("x")).unwrap_err();
        assert_eq!(err, CampusError::NotFound(EntityRef::new(EntityKind::School, 3)));
    }

    #[test]
    fn test_delete_missing_record() {
        let db = Database::new();
        let err = db.delete(EntityRef::new(EntityKind::Lesson, 1)).unwrap_err();
        assert_eq!(err.code(), "CAMPUS_NOT_FOUND");
    }

    #[test]
    fn test_fetch_related_rejects_undeclared_relation() {
        let db = Database::new();
        let term = seed_term(&db);
        let err = db
            .fetch_related(term.entity_ref(), Relation::ChildLessons)
            .unwrap_err();
        assert_eq!(err.code(), "CAMPUS_INVALID_RELATION");
        assert_eq!(err.messages(), vec!["term has no relation 'child_lessons'"]);
    }

    #[test]
    fn test_find_by_field() {
        let db = Database::new();
        let term = seed_term(&db);
        db.create(course(term.id, "ncc1701")).unwrap();
        let wanted = db.create(course(term.id, "ncc74656")).unwrap();

        let found = db.find_by_field(EntityKind::Course, "course_code", &json!("ncc74656"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), wanted.id);

        let by_id = db.find_by_field(EntityKind::Course, "id", &json!(wanted.id.get()));
        assert_eq!(by_id.len(), 1);
        assert!(db
            .find_by_field(EntityKind::Course, "warp_factor", &json!(9))
            .is_empty());
    }

    #[test]
    fn test_find_unique() {
        let db = Database::new();
        seed_term(&db);
        let found = db.find_unique::<Term>(|t| t.name.as_deref() == Some("Fall Term"));
        assert_eq!(found.map(|r| r.id), Some(RecordId::new(1)));
        assert!(db.find_unique::<Term>(|t| t.name.is_none()).is_none());
    }

    #[test]
    fn test_primary_instructor_none_marked() {
        let db = Database::new();
        let term = seed_term(&db);
        let course = db.create(course(term.id, "ncc1701")).unwrap();
        let picard = db
            .create(User::new("Jean-Luc", "Picard", "picard@starfleet.org", "http://borg.com"))
            .unwrap();
        db.add_instructor(course.id, picard.id, false).unwrap();

        assert_eq!(db.primary_instructor(course.id).unwrap(), None);
    }

    #[test]
    fn test_into_tables_keeps_committed_rows() {
        let db = Database::new();
        seed_term(&db);
        let counts = db.counts();

        let tables = db.into_tables();
        assert_eq!(tables.counts(), counts);
        assert_eq!(tables.table::<Term>().len(), 1);
    }
}
