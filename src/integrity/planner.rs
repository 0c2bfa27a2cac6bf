//! Delete planning
//!
//! Walks the policy table from the target down, producing the ordered set
//! of removals and foreign-key clears a delete implies, or the first
//! restriction that forbids it.

use std::collections::BTreeSet;

use super::errors::{IntegrityError, IntegrityResult};
use super::policy::{dependencies_of, DeletePolicy};
use crate::model::EntityRef;
use crate::storage::{Tables, WriteBatch};

/// Everything one delete will do, children before parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePlan {
    target: EntityRef,
    removals: Vec<EntityRef>,
    clears: Vec<(EntityRef, &'static str)>,
}

impl DeletePlan {
    pub fn target(&self) -> EntityRef {
        self.target
    }

    /// Records to remove; the target is always last
    pub fn removals(&self) -> &[EntityRef] {
        &self.removals
    }

    /// Surviving records whose foreign key will be cleared
    pub fn clears(&self) -> &[(EntityRef, &'static str)] {
        &self.clears
    }

    /// Clears first, then removals in plan order
    pub fn to_batch(&self) -> WriteBatch {
        let mut batch = WriteBatch::new();
        for (target, field) in &self.clears {
            batch.clear_reference(*target, field);
        }
        for target in &self.removals {
            batch.remove(*target);
        }
        batch
    }
}

/// Plans the delete of `target` against the current tables.
///
/// The target must exist; the caller reports missing records.
pub fn plan_delete(tables: &Tables, target: EntityRef) -> IntegrityResult<DeletePlan> {
    let mut planner = Planner {
        tables,
        root: target,
        scheduled: BTreeSet::new(),
        removals: Vec::new(),
        clears: Vec::new(),
    };
    planner.visit(target)?;

    let Planner {
        scheduled,
        removals,
        clears,
        ..
    } = planner;
    let clears = clears
        .into_iter()
        .filter(|(r, _)| !scheduled.contains(r))
        .collect();

    Ok(DeletePlan {
        target,
        removals,
        clears,
    })
}

struct Planner<'a> {
    tables: &'a Tables,
    root: EntityRef,
    scheduled: BTreeSet<EntityRef>,
    removals: Vec<EntityRef>,
    clears: Vec<(EntityRef, &'static str)>,
}

impl Planner<'_> {
    fn visit(&mut self, target: EntityRef) -> IntegrityResult<()> {
        if !self.scheduled.insert(target) {
            return Ok(());
        }

        for dependency in dependencies_of(target.kind) {
            let dependents: Vec<EntityRef> = self
                .tables
                .referencing(dependency.dependent, dependency.field, target)
                .into_iter()
                .map(|id| EntityRef::new(dependency.dependent, id))
                .filter(|r| !self.scheduled.contains(r))
                .collect();
            if dependents.is_empty() {
                continue;
            }

            match dependency.policy {
                DeletePolicy::Restrict => {
                    return Err(IntegrityError::restricted(
                        self.root,
                        target,
                        dependency.dependent,
                        dependents.len(),
                    ));
                }
                DeletePolicy::Cascade => {
                    for dependent in dependents {
                        self.visit(dependent)?;
                    }
                }
                DeletePolicy::Nullify => {
                    for dependent in dependents {
                        self.clears.push((dependent, dependency.field));
                    }
                }
            }
        }

        self.removals.push(target);
        Ok(())
    }
}
