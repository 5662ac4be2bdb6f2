//! Entity name policy.
//!
//! # Responsibility
//! - Validate workspace/project/prompt/resource names before persistence.
//!
//! # Invariants
//! - Accepted names match `[A-Za-z0-9._-]{1,255}`.
//! - Validation is pure: no I/O, no normalization, case is preserved.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum accepted name length in characters.
pub const MAX_NAME_LENGTH: usize = 255;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("valid name regex"));

/// Why a name was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameErrorKind {
    Empty,
    TooLong { length: usize },
    /// Distinct offending characters in first-seen order.
    InvalidCharacters(Vec<char>),
}

/// Name validation failure, labelled with the entity kind (`Project`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameError {
    pub label: String,
    pub name: String,
    pub kind: NameErrorKind,
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NameErrorKind::Empty => write!(f, "{} name cannot be empty", self.label),
            NameErrorKind::TooLong { length } => write!(
                f,
                "{} name exceeds maximum length of {MAX_NAME_LENGTH} characters (got {length})",
                self.label
            ),
            NameErrorKind::InvalidCharacters(chars) => {
                let listed = chars
                    .iter()
                    .map(|c| format!("'{c}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(
                    f,
                    "{} name '{}' contains invalid characters {listed}. Allowed: a-z, A-Z, 0-9, -, _, .",
                    self.label, self.name
                )
            }
        }
    }
}

impl Error for NameError {}

/// Validates `name` for the entity kind described by `label`.
///
/// # Errors
/// - `NameErrorKind::Empty` for an empty string.
/// - `NameErrorKind::TooLong` above [`MAX_NAME_LENGTH`] characters.
/// - `NameErrorKind::InvalidCharacters` for anything outside `[A-Za-z0-9._-]`.
pub fn validate_name(name: &str, label: &str) -> Result<(), NameError> {
    let fail = |kind| NameError {
        label: label.to_string(),
        name: name.to_string(),
        kind,
    };

    if name.is_empty() {
        return Err(fail(NameErrorKind::Empty));
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(fail(NameErrorKind::TooLong { length }));
    }

    if !NAME_PATTERN.is_match(name) {
        return Err(fail(NameErrorKind::InvalidCharacters(offending_chars(name))));
    }

    Ok(())
}

fn offending_chars(name: &str) -> Vec<char> {
    let mut seen = BTreeSet::new();
    name.chars()
        .filter(|c| !is_allowed(*c))
        .filter(|c| seen.insert(*c))
        .collect()
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}
