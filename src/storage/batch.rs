//! Atomic multi-record mutation
//!
//! A batch is verified in full against the current tables before the
//! first operation is applied, so a failed batch leaves nothing behind.

use std::collections::BTreeSet;

use super::errors::{StorageError, StorageResult};
use super::tables::Tables;
use crate::model::{Entity, EntityRef};

/// One staged mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Remove a record
    Remove(EntityRef),
    /// Clear a nullable foreign key on a surviving record
    ClearReference {
        target: EntityRef,
        field: &'static str,
    },
}

/// Ordered list of mutations applied as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, target: EntityRef) {
        self.ops.push(BatchOp::Remove(target));
    }

    pub fn clear_reference(&mut self, target: EntityRef, field: &'static str) {
        self.ops.push(BatchOp::ClearReference { target, field });
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

impl Tables {
    /// Applies a batch atomically, returning the removed records in op order.
    ///
    /// Clears on records that the same batch removes are skipped.
    pub fn apply(&mut self, batch: WriteBatch) -> StorageResult<Vec<Entity>> {
        let removing: BTreeSet<EntityRef> = batch
            .ops
            .iter()
            .filter_map(|op| match op {
                BatchOp::Remove(target) => Some(*target),
                BatchOp::ClearReference { .. } => None,
            })
            .collect();

        // Verify
        for op in &batch.ops {
            match op {
                BatchOp::Remove(target) => {
                    if !self.contains(*target) {
                        return Err(StorageError::NotFound(*target));
                    }
                }
                BatchOp::ClearReference { target, field } => {
                    if removing.contains(target) {
                        continue;
                    }
                    if !self.contains(*target) {
                        return Err(StorageError::NotFound(*target));
                    }
                    if !self.can_clear(*target, field) {
                        return Err(StorageError::NotNullable {
                            target: *target,
                            field,
                        });
                    }
                }
            }
        }

        // Apply
        let mut removed = Vec::new();
        for op in batch.ops {
            match op {
                BatchOp::Remove(target) => {
                    if let Some(entity) = self.remove(target) {
                        removed.push(entity);
                    }
                }
                BatchOp::ClearReference { target, field } => {
                    if !removing.contains(&target) {
                        self.clear_reference(target, field)?;
                    }
                }
            }
        }
        Ok(removed)
    }
}
