//! Field-level validation shared by every draft type.
//!
//! Drafts implement [`Validate`] and report each violated constraint as a
//! [`Violation`] carrying a translation key. Any non-empty list is a hard
//! stop before persistence.

use crate::errors::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A single violated field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Name of the offending field
    pub field: &'static str,
    /// Translation key describing the constraint
    pub message_key: &'static str,
}

impl Violation {
    /// Creates a violation for `field`.
    #[must_use]
    pub const fn new(field: &'static str, message_key: &'static str) -> Self {
        Self { field, message_key }
    }

    /// Renders a list as `field: key; field: key`.
    #[must_use]
    pub fn join(violations: &[Self]) -> String {
        violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message_key)
    }
}

/// Types that can check their own field constraints.
pub trait Validate {
    /// Returns every violated constraint; empty when valid.
    fn violations(&self) -> Vec<Violation>;
}

/// Fails with [`Error::Validation`] if `value` has any violation.
pub fn ensure_valid<T: Validate + ?Sized>(value: &T) -> Result<()> {
    let violations = value.violations();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation { violations })
    }
}

/// Collects violations while checking the fields of one draft.
#[derive(Debug, Default)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Starts an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records a violation when `failed` is true.
    pub fn check(&mut self, failed: bool, field: &'static str, message_key: &'static str) {
        if failed {
            self.0.push(Violation::new(field, message_key));
        }
    }

    /// Checks a required text field against a character-count window.
    ///
    /// Blank values only report `not_blank_key`, never the length keys.
    pub fn text(
        &mut self,
        value: &str,
        field: &'static str,
        bounds: (usize, usize),
        keys: TextKeys,
    ) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.0.push(Violation::new(field, keys.not_blank));
            return;
        }
        let length = trimmed.chars().count();
        self.check(length < bounds.0, field, keys.min_length);
        self.check(length > bounds.1, field, keys.max_length);
    }

    /// Checks an optional text field against a maximum length.
    pub fn optional_text(
        &mut self,
        value: Option<&str>,
        field: &'static str,
        max: usize,
        max_key: &'static str,
    ) {
        if let Some(value) = value {
            self.check(value.trim().chars().count() > max, field, max_key);
        }
    }

    /// Consumes the collection.
    #[must_use]
    pub fn into_vec(self) -> Vec<Violation> {
        self.0
    }
}

/// Translation keys for a required text field.
#[derive(Debug, Clone, Copy)]
pub struct TextKeys {
    /// Value was empty or whitespace
    pub not_blank: &'static str,
    /// Value shorter than the lower bound
    pub min_length: &'static str,
    /// Value longer than the upper bound
    pub max_length: &'static str,
}

/// Trims optional free text, mapping blank input to `None`.
#[must_use]
pub fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
