//! Repository layer over one workspace store.
//!
//! # Responsibility
//! - Define CRUD contracts for projects, prompts and resources.
//! - Isolate SQLite query details from CLI/catalog callers.
//!
//! # Invariants
//! - Write paths validate names before any SQL mutation.
//! - Scoped uniqueness is enforced by UNIQUE constraints; pre-checks only
//!   exist to produce precise `Duplicate` errors.
//! - Repository APIs return semantic errors (`NotFound`, `Duplicate`) in
//!   addition to store errors wrapped with workspace/project/entity context.

use crate::db::DbError;
use crate::model::name::NameError;
use crate::model::EntityKind;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod project_repo;
pub mod prompt_repo;
pub mod resource_repo;
mod update;

pub type RepoResult<T> = Result<T, RepoError>;

/// Where an operation happened, attached to wrapped store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub workspace: String,
    pub project: Option<String>,
    pub entity: Option<(EntityKind, String)>,
}

impl ErrorContext {
    pub(crate) fn workspace(workspace: &str) -> Self {
        Self {
            workspace: workspace.to_string(),
            project: None,
            entity: None,
        }
    }

    pub(crate) fn project(workspace: &str, project: &str) -> Self {
        Self {
            project: Some(project.to_string()),
            ..Self::workspace(workspace)
        }
    }

    pub(crate) fn with_entity(mut self, kind: EntityKind, name: &str) -> Self {
        self.entity = Some((kind, name.to_string()));
        self
    }

    /// Human-readable scope without the entity, e.g. `project 'p1' in workspace 'w1'`.
    pub fn scope(&self) -> String {
        match &self.project {
            Some(project) => format!("project '{project}' in workspace '{}'", self.workspace),
            None => format!("workspace '{}'", self.workspace),
        }
    }
}

impl Display for ErrorContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.entity {
            Some((kind, name)) => write!(
                f,
                "{} '{name}' in {}",
                kind.label().to_ascii_lowercase(),
                self.scope()
            ),
            None => f.write_str(&self.scope()),
        }
    }
}

/// Repository error for entity persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    InvalidName(NameError),
    /// Scoped-unique key already taken (`field` is `name` or `uri`).
    Duplicate {
        entity: EntityKind,
        field: &'static str,
        value: String,
        scope: String,
    },
    NotFound {
        entity: EntityKind,
        name: String,
        scope: String,
    },
    /// Partial update referenced a field outside the entity's allowed set.
    UnknownField { entity: EntityKind, field: String },
    /// Connection schema lacks a table the repository needs.
    MissingRequiredTable(&'static str),
    Db {
        context: ErrorContext,
        source: DbError,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::Duplicate {
                entity,
                field,
                value,
                scope,
            } => {
                if *field == "name" {
                    write!(f, "{entity} '{value}' already exists in {scope}")
                } else {
                    write!(f, "{entity} with {field} '{value}' already exists in {scope}")
                }
            }
            Self::NotFound {
                entity,
                name,
                scope,
            } => write!(f, "{entity} '{name}' does not exist in {scope}"),
            Self::UnknownField { entity, field } => {
                write!(f, "{entity} has no updatable field `{field}`")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`; run migrations first")
            }
            Self::Db { context, source } => write!(f, "{context}: {source}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Db { source, .. } => Some(source),
            Self::Duplicate { .. }
            | Self::NotFound { .. }
            | Self::UnknownField { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<NameError> for RepoError {
    fn from(value: NameError) -> Self {
        Self::InvalidName(value)
    }
}

/// Attaches an [`ErrorContext`] to store-level failures.
pub(crate) trait ResultExt<T> {
    fn context(self, context: &ErrorContext) -> RepoResult<T>;
}

impl<T, E: Into<DbError>> ResultExt<T> for Result<T, E> {
    fn context(self, context: &ErrorContext) -> RepoResult<T> {
        self.map_err(|err| RepoError::Db {
            context: context.clone(),
            source: err.into(),
        })
    }
}

/// Returns the constraint message when `err` is a UNIQUE violation.
pub(crate) fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(failure, message)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Some(message.as_deref().unwrap_or_default())
        }
        _ => None,
    }
}

/// Whether `err` is a FOREIGN KEY violation, i.e. the owning row is gone.
pub(crate) fn foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

/// `NotFound` for a project that vanished under a caller's `&Project`.
pub(crate) fn missing_project(workspace: &str, project: &str) -> RepoError {
    RepoError::NotFound {
        entity: EntityKind::Project,
        name: project.to_string(),
        scope: ErrorContext::workspace(workspace).scope(),
    }
}

pub(crate) fn ensure_tables(
    conn: &Connection,
    tables: &[&'static str],
    context: &ErrorContext,
) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn
            .query_row(
                "SELECT EXISTS(
                    SELECT 1
                    FROM sqlite_master
                    WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )
            .context(context)?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}
