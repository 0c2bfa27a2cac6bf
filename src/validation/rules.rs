//! Rule helpers shared by the per-entity rule sets
//!
//! Each helper records at most one error per call and never stops
//! evaluation of the remaining rules.

use std::sync::OnceLock;

use regex::Regex;

use super::errors::ValidationErrors;
use super::validator::ValidationContext;
use crate::index::UniqueKey;
use crate::model::Reference;

pub const BLANK: &str = "can't be blank";
pub const INVALID: &str = "is invalid";
pub const TAKEN: &str = "has already been taken";
pub const MUST_EXIST: &str = "must exist";
pub const DUE_BEFORE_ACTIVE: &str = "date cannot be before active at date.";

static COURSE_CODE: OnceLock<Regex> = OnceLock::new();
static EMAIL: OnceLock<Regex> = OnceLock::new();
static HTTP_URL: OnceLock<Regex> = OnceLock::new();

/// Three letters followed by at least three digits, e.g. "ncc1701"
pub(crate) fn course_code_pattern() -> &'static Regex {
    COURSE_CODE.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{3}[0-9]{3,}$").expect("course code pattern compiles")
    })
}

/// local@domain.tld
pub(crate) fn email_pattern() -> &'static Regex {
    EMAIL.get_or_init(|| {
        Regex::new(r"(?i)^[\w+\-.]+@[a-z\d\-]+(\.[a-z\d\-]+)*\.[a-z]+$")
            .expect("email pattern compiles")
    })
}

/// Absolute http:// or https:// URL
pub(crate) fn http_url_pattern() -> &'static Regex {
    HTTP_URL.get_or_init(|| Regex::new(r"^https?://\S+$").expect("url pattern compiles"))
}

/// Empty or whitespace-only
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Presence of a text field.
pub(crate) fn require_text(errors: &mut ValidationErrors, field: &str, value: &Option<String>) {
    match value {
        Some(text) if !is_blank(text) => {}
        _ => errors.add(field, BLANK),
    }
}

/// Presence of any other field.
pub(crate) fn require<T>(errors: &mut ValidationErrors, field: &str, value: &Option<T>) {
    if value.is_none() {
        errors.add(field, BLANK);
    }
}

/// Format of a text field; blank values are left to the presence rule.
pub(crate) fn check_format(
    errors: &mut ValidationErrors,
    field: &str,
    value: &Option<String>,
    pattern: &Regex,
) {
    if let Some(text) = value {
        if !is_blank(text) && !pattern.is_match(text) {
            errors.add(field, INVALID);
        }
    }
}

/// Every supplied foreign key must point at an existing record.
pub(crate) fn check_references(
    errors: &mut ValidationErrors,
    ctx: &ValidationContext<'_>,
    references: &[Reference],
) {
    for reference in references {
        if !ctx.exists(reference.target) {
            errors.add(reference.field, MUST_EXIST);
        }
    }
}

/// Unique keys must be free or already held by the record being validated.
pub(crate) fn check_unique(
    errors: &mut ValidationErrors,
    ctx: &ValidationContext<'_>,
    keys: &[UniqueKey],
) {
    for key in keys {
        if let Some(holder) = ctx.unique_holder(key) {
            if Some(holder) != ctx.record_id() {
                errors.add(key.constraint.field(), TAKEN);
            }
        }
    }
}

/// `later` must not precede `earlier` when both are set.
pub(crate) fn check_not_before<T: PartialOrd>(
    errors: &mut ValidationErrors,
    field: &str,
    later: &Option<T>,
    earlier: &Option<T>,
    message: &str,
) {
    if let (Some(later), Some(earlier)) = (later, earlier) {
        if later < earlier {
            errors.add(field, message);
        }
    }
}
