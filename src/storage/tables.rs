//! The full set of tables and the uniqueness index over them

use serde::{Deserialize, Serialize};

use super::errors::{StorageError, StorageResult};
use super::table::Table;
use crate::index::{IndexResult, UniqueIndex, UniqueKey};
use crate::model::{
    Assignment, AssignmentGrade, Course, CourseInstructor, CourseStudent, Entity, EntityKind,
    EntityRef, Lesson, Model, Reading, Record, RecordId, Reference, School, Term, User,
};
use crate::validation::RecordLookup;

/// Runs `$body` with `$M` bound to the model type of `$kind`.
macro_rules! with_model {
    ($kind:expr, $M:ident => $body:expr) => {
        match $kind {
            EntityKind::School => {
                type $M = School;
                $body
            }
            EntityKind::Term => {
                type $M = Term;
                $body
            }
            EntityKind::Course => {
                type $M = Course;
                $body
            }
            EntityKind::CourseStudent => {
                type $M = CourseStudent;
                $body
            }
            EntityKind::CourseInstructor => {
                type $M = CourseInstructor;
                $body
            }
            EntityKind::Assignment => {
                type $M = Assignment;
                $body
            }
            EntityKind::AssignmentGrade => {
                type $M = AssignmentGrade;
                $body
            }
            EntityKind::Lesson => {
                type $M = Lesson;
                $body
            }
            EntityKind::Reading => {
                type $M = Reading;
                $body
            }
            EntityKind::User => {
                type $M = User;
                $body
            }
        }
    };
}

pub(crate) use with_model;

/// Every table, plus the uniqueness index derived from their rows.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Tables {
    pub(crate) schools: Table<School>,
    pub(crate) terms: Table<Term>,
    pub(crate) courses: Table<Course>,
    pub(crate) course_students: Table<CourseStudent>,
    pub(crate) course_instructors: Table<CourseInstructor>,
    pub(crate) assignments: Table<Assignment>,
    pub(crate) assignment_grades: Table<AssignmentGrade>,
    pub(crate) lessons: Table<Lesson>,
    pub(crate) readings: Table<Reading>,
    pub(crate) users: Table<User>,
    #[serde(skip)]
    unique: UniqueIndex,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table<M: Model>(&self) -> &Table<M> {
        M::table(self)
    }

    pub fn get<M: Model>(&self, id: RecordId) -> Option<&M> {
        M::table(self).get(id)
    }

    pub fn record<M: Model>(&self, id: RecordId) -> Option<Record<M>> {
        M::table(self).record(id)
    }

    pub fn contains(&self, target: EntityRef) -> bool {
        with_model!(target.kind, M => M::table(self).contains(target.id))
    }

    /// The record behind a reference, type-erased
    pub fn entity(&self, target: EntityRef) -> Option<Entity> {
        with_model!(target.kind, M => M::table(self).record(target.id).map(M::into_entity))
    }

    /// Records of `kind` whose `field` points at `target`, ascending
    pub fn referencing(&self, kind: EntityKind, field: &str, target: EntityRef) -> Vec<RecordId> {
        with_model!(kind, M => M::table(self).ids_where(|data| {
            data.references()
                .iter()
                .any(|r| r.field == field && r.target == target)
        }))
    }

    /// Row counts per kind, in declaration order
    pub fn counts(&self) -> Vec<(EntityKind, usize)> {
        EntityKind::ALL
            .iter()
            .map(|&kind| (kind, with_model!(kind, M => M::table(self).len())))
            .collect()
    }

    /// Inserts a new row, claiming its unique keys.
    ///
    /// Nothing is written (and no identifier consumed) on a violation.
    pub fn insert<M: Model>(&mut self, data: M) -> StorageResult<RecordId> {
        let keys = data.unique_keys();
        for key in &keys {
            self.unique.check(key, None)?;
        }

        let id = M::table_mut(self).allocate_id();
        for key in keys {
            self.unique.insert(key, id)?;
        }
        M::table_mut(self).put(id, data);
        Ok(id)
    }

    /// Replaces the data of an existing row, returning the previous data.
    pub fn replace<M: Model>(&mut self, id: RecordId, data: M) -> StorageResult<M> {
        let old_keys = match self.get::<M>(id) {
            Some(old) => old.unique_keys(),
            None => return Err(StorageError::NotFound(EntityRef::new(M::KIND, id))),
        };
        let new_keys = data.unique_keys();
        for key in &new_keys {
            self.unique.check(key, Some(id))?;
        }

        for key in &old_keys {
            self.unique.remove(key, id);
        }
        for key in new_keys {
            self.unique.insert(key, id)?;
        }
        M::table_mut(self)
            .put(id, data)
            .ok_or(StorageError::NotFound(EntityRef::new(M::KIND, id)))
    }

    /// Removes a row and releases its unique keys.
    pub fn remove(&mut self, target: EntityRef) -> Option<Entity> {
        with_model!(target.kind, M => self.remove_as::<M>(target.id).map(M::into_entity))
    }

    fn remove_as<M: Model>(&mut self, id: RecordId) -> Option<Record<M>> {
        let data = M::table_mut(self).remove(id)?;
        for key in data.unique_keys() {
            self.unique.remove(&key, id);
        }
        Some(Record { id, data })
    }

    /// Whether `field` on `target` exists and may be cleared
    pub(crate) fn can_clear(&self, target: EntityRef, field: &str) -> bool {
        with_model!(target.kind, M => self
            .get::<M>(target.id)
            .map(|data| data.clone().clear_reference(field))
            .unwrap_or(false))
    }

    /// Clears a nullable foreign key in place.
    pub(crate) fn clear_reference(
        &mut self,
        target: EntityRef,
        field: &'static str,
    ) -> StorageResult<()> {
        with_model!(target.kind, M => {
            let mut data = self
                .get::<M>(target.id)
                .cloned()
                .ok_or(StorageError::NotFound(target))?;
            if !data.clear_reference(field) {
                return Err(StorageError::NotNullable { target, field });
            }
            self.replace::<M>(target.id, data).map(|_| ())
        })
    }

    /// Rebuilds the uniqueness index from the rows.
    ///
    /// Fails on the first key with two holders.
    pub fn rebuild_indexes(&mut self) -> IndexResult<()> {
        self.unique.clear();
        for kind in EntityKind::ALL {
            let keyed: Vec<(RecordId, Vec<UniqueKey>)> = with_model!(kind, M => M::table(self)
                .iter()
                .map(|(id, data)| (id, data.unique_keys()))
                .collect());
            for (id, keys) in keyed {
                for key in keys {
                    self.unique.insert(key, id)?;
                }
            }
        }
        Ok(())
    }

    /// Every foreign key that does not resolve, as (holder, reference)
    pub fn dangling_references(&self) -> Vec<(EntityRef, Reference)> {
        let mut dangling = Vec::new();
        for kind in EntityKind::ALL {
            let holders: Vec<(RecordId, Vec<Reference>)> = with_model!(kind, M => M::table(self)
                .iter()
                .map(|(id, data)| (id, data.references()))
                .collect());
            for (id, references) in holders {
                for reference in references {
                    if !self.contains(reference.target) {
                        dangling.push((EntityRef::new(kind, id), reference));
                    }
                }
            }
        }
        dangling
    }
}

impl RecordLookup for Tables {
    fn exists(&self, target: EntityRef) -> bool {
        self.contains(target)
    }

    fn unique_holder(&self, key: &UniqueKey) -> Option<RecordId> {
        self.unique.holder(key)
    }
}
