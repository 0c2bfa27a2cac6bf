//! Ordering for related collections
//!
//! Collections are sorted by a fixed comparator when materialized, never
//! returned in storage order by accident.
//!
//! # Design Principles
//!
//! - Comparators are pure functions of the records
//! - Every sort is stable; equal keys keep ascending identifier order
//! - Absent sort keys order before present ones

use std::cmp::Ordering;

use crate::model::{Assignment, Model, Record, User};

/// Assignments: ascending `due_at`, then ascending `active_at`.
pub fn compare_assignments(a: &Record<Assignment>, b: &Record<Assignment>) -> Ordering {
    a.data
        .due_at
        .cmp(&b.data.due_at)
        .then_with(|| a.data.active_at.cmp(&b.data.active_at))
}

/// Students: ascending `last_name`, then ascending `first_name`.
pub fn compare_students(a: &Record<User>, b: &Record<User>) -> Ordering {
    a.data
        .last_name
        .cmp(&b.data.last_name)
        .then_with(|| a.data.first_name.cmp(&b.data.first_name))
}

/// Creation order
pub fn compare_ids<T: Model>(a: &Record<T>, b: &Record<T>) -> Ordering {
    a.id.cmp(&b.id)
}

pub fn sort_assignments(records: &mut [Record<Assignment>]) {
    records.sort_by(compare_assignments);
}

pub fn sort_students(records: &mut [Record<User>]) {
    records.sort_by(compare_students);
}

pub fn sort_by_id<T: Model>(records: &mut [Record<T>]) {
    records.sort_by(compare_ids);
}
