//! CLI error type and exit-code mapping.

use mcpkg_core::{CatalogError, DbError, LoggingError, RepoError, WorkspaceError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INVALID_INPUT: i32 = 2;
pub const EXIT_NOT_FOUND: i32 = 3;
pub const EXIT_ALREADY_EXISTS: i32 = 4;
pub const EXIT_MIGRATION: i32 = 5;

#[derive(Debug)]
pub enum CliError {
    InvalidInput(String),
    Workspace(WorkspaceError),
    Repo(RepoError),
    Catalog(CatalogError),
    Logging(LoggingError),
    /// Reading an input file or the current directory failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Writing to stdout or reading the confirmation failed.
    Terminal(std::io::Error),
    Json(serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidInput(_) => EXIT_INVALID_INPUT,
            Self::Workspace(err) => match err {
                WorkspaceError::InvalidName(_) => EXIT_INVALID_INPUT,
                WorkspaceError::NotFound(_) => EXIT_NOT_FOUND,
                WorkspaceError::AlreadyExists(_) => EXIT_ALREADY_EXISTS,
                WorkspaceError::Db { source, .. } => db_exit_code(source),
                WorkspaceError::NoDataDir | WorkspaceError::Io { .. } => EXIT_FAILURE,
            },
            Self::Repo(err) => repo_exit_code(err),
            Self::Catalog(err) => match err {
                CatalogError::InvalidQualifiedName(_) => EXIT_INVALID_INPUT,
                CatalogError::Repo(err) => repo_exit_code(err),
            },
            Self::Logging(LoggingError::UnsupportedLevel(_)) => EXIT_INVALID_INPUT,
            Self::Logging(_) | Self::Io { .. } | Self::Terminal(_) | Self::Json(_) => EXIT_FAILURE,
        }
    }
}

fn repo_exit_code(err: &RepoError) -> i32 {
    match err {
        RepoError::InvalidName(_) | RepoError::UnknownField { .. } => EXIT_INVALID_INPUT,
        RepoError::NotFound { .. } => EXIT_NOT_FOUND,
        RepoError::Duplicate { .. } => EXIT_ALREADY_EXISTS,
        RepoError::Db { source, .. } => db_exit_code(source),
        RepoError::MissingRequiredTable(_) => EXIT_MIGRATION,
        RepoError::InvalidData(_) => EXIT_FAILURE,
    }
}

fn db_exit_code(err: &DbError) -> i32 {
    if err.is_migration_failure() {
        EXIT_MIGRATION
    } else {
        EXIT_FAILURE
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::Workspace(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Terminal(err) => write!(f, "terminal i/o failed: {err}"),
            Self::Json(err) => write!(f, "failed to encode JSON: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidInput(_) => None,
            Self::Workspace(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Catalog(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Terminal(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<WorkspaceError> for CliError {
    fn from(value: WorkspaceError) -> Self {
        Self::Workspace(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CatalogError> for CliError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Terminal(value)
    }
}
