//! Declared uniqueness constraints and their index
//!
//! | Constraint | Kind | Field | Scope |
//! |---|---|---|---|
//! | course_code_per_term | course | course_code | term_id |
//! | assignment_name_per_course | assignment | name | course_id |
//! | user_email | user | email | global |

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{ConstraintViolation, IndexResult};
use crate::model::{EntityKind, RecordId};

/// Every uniqueness rule the model declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueConstraint {
    CourseCodePerTerm,
    AssignmentNamePerCourse,
    UserEmail,
}

impl UniqueConstraint {
    pub fn name(&self) -> &'static str {
        match self {
            UniqueConstraint::CourseCodePerTerm => "course_code_per_term",
            UniqueConstraint::AssignmentNamePerCourse => "assignment_name_per_course",
            UniqueConstraint::UserEmail => "user_email",
        }
    }

    /// Entity kind the constraint belongs to
    pub fn kind(&self) -> EntityKind {
        match self {
            UniqueConstraint::CourseCodePerTerm => EntityKind::Course,
            UniqueConstraint::AssignmentNamePerCourse => EntityKind::Assignment,
            UniqueConstraint::UserEmail => EntityKind::User,
        }
    }

    /// Constrained field
    pub fn field(&self) -> &'static str {
        match self {
            UniqueConstraint::CourseCodePerTerm => "course_code",
            UniqueConstraint::AssignmentNamePerCourse => "name",
            UniqueConstraint::UserEmail => "email",
        }
    }
}

impl fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One occupied slot: constraint, owning scope (None = global or unscoped), value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UniqueKey {
    pub constraint: UniqueConstraint,
    pub scope: Option<RecordId>,
    pub value: String,
}

impl UniqueKey {
    pub fn new(
        constraint: UniqueConstraint,
        scope: Option<RecordId>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            constraint,
            scope,
            value: value.into(),
        }
    }
}

/// Holder lookup for every declared constraint.
#[derive(Debug, Default, Clone)]
pub struct UniqueIndex {
    keys: BTreeMap<UniqueKey, RecordId>,
}

impl UniqueIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current holder of a key
    pub fn holder(&self, key: &UniqueKey) -> Option<RecordId> {
        self.keys.get(key).copied()
    }

    /// Checks that `candidate` may hold `key`.
    ///
    /// A key already held by the candidate itself is not a conflict.
    pub fn check(&self, key: &UniqueKey, candidate: Option<RecordId>) -> IndexResult<()> {
        match self.holder(key) {
            Some(holder) if Some(holder) != candidate => Err(ConstraintViolation {
                constraint: key.constraint,
                scope: key.scope,
                value: key.value.clone(),
                holder,
            }),
            _ => Ok(()),
        }
    }

    /// Claims a key for `holder`.
    pub fn insert(&mut self, key: UniqueKey, holder: RecordId) -> IndexResult<()> {
        self.check(&key, Some(holder))?;
        self.keys.insert(key, holder);
        Ok(())
    }

    /// Releases a key, but only if `holder` owns it.
    pub fn remove(&mut self, key: &UniqueKey, holder: RecordId) {
        if self.holder(key) == Some(holder) {
            self.keys.remove(key);
        }
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code_key(term: u64, code: &str) -> UniqueKey {
        UniqueKey::new(
            UniqueConstraint::CourseCodePerTerm,
            Some(RecordId::new(term)),
            code,
        )
    }

    #[test]
    fn test_insert_and_holder() {
        let mut index = UniqueIndex::new();
        index.insert(code_key(1, "ncc1701"), RecordId::new(1)).unwrap();
        assert_eq!(index.holder(&code_key(1, "ncc1701")), Some(RecordId::new(1)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_second_holder_rejected() {
        let mut index = UniqueIndex::new();
        index.insert(code_key(1, "ncc1371"), RecordId::new(1)).unwrap();

        let err = index.insert(code_key(1, "ncc1371"), RecordId::new(2)).unwrap_err();
        assert_eq!(err.holder, RecordId::new(1));
        assert_eq!(err.field(), "course_code");
    }

    #[test]
    fn test_same_value_in_other_scope_allowed() {
        let mut index = UniqueIndex::new();
        index.insert(code_key(1, "ncc1371"), RecordId::new(1)).unwrap();
        assert!(index.insert(code_key(2, "ncc1371"), RecordId::new(2)).is_ok());
    }

    #[test]
    fn test_holder_does_not_conflict_with_itself() {
        let mut index = UniqueIndex::new();
        index.insert(code_key(1, "ncc1701"), RecordId::new(5)).unwrap();
        assert!(index.check(&code_key(1, "ncc1701"), Some(RecordId::new(5))).is_ok());
        assert!(index.check(&code_key(1, "ncc1701"), None).is_err());
    }

    #[test]
    fn test_remove_only_by_holder() {
        let mut index = UniqueIndex::new();
        index.insert(code_key(1, "ncc1701"), RecordId::new(5)).unwrap();

        index.remove(&code_key(1, "ncc1701"), RecordId::new(6));
        assert_eq!(index.len(), 1);

        index.remove(&code_key(1, "ncc1701"), RecordId::new(5));
        assert!(index.is_empty());
    }

    #[test]
    fn test_constraints_do_not_collide() {
        let mut index = UniqueIndex::new();
        index
            .insert(UniqueKey::new(UniqueConstraint::UserEmail, None, "x"), RecordId::new(1))
            .unwrap();
        assert!(index
            .insert(
                UniqueKey::new(UniqueConstraint::AssignmentNamePerCourse, None, "x"),
                RecordId::new(1)
            )
            .is_ok());
    }
}
