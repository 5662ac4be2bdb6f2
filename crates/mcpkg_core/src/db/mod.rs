//! SQLite storage bootstrap and schema migration entry points.
//!
//! # Responsibility
//! - Open and configure one workspace store file per `Store`.
//! - Apply versioned schema scripts in deterministic order.
//!
//! # Invariants
//! - Applied versions are tracked in the `schema_migrations` ledger.
//! - Repositories must not touch application tables before migrations succeed.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::Store;

/// SQL expression evaluating to the current store time in epoch milliseconds.
pub(crate) const NOW_MS_SQL: &str =
    "CAST((julianday('now') - 2440587.5) * 86400000.0 AS INTEGER)";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    /// Engine-level failure reported by SQLite.
    Sqlite(rusqlite::Error),
    /// Filesystem failure around the store file or script directory.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Operation attempted after `Store::close`.
    Closed,
    /// A migration script failed; earlier scripts stay recorded.
    Migration {
        version: u32,
        name: String,
        source: rusqlite::Error,
    },
    /// Script discovery rejected a file before anything was applied.
    InvalidMigrationScript { path: PathBuf, reason: String },
    /// Ledger references a version newer than every known script.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Whether this error belongs to the fatal-migration family.
    pub fn is_migration_failure(&self) -> bool {
        matches!(
            self,
            Self::Migration { .. }
                | Self::InvalidMigrationScript { .. }
                | Self::UnsupportedSchemaVersion { .. }
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Closed => write!(f, "store is closed"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(
                f,
                "migration {version} ({name}) failed: {source}; earlier migrations remain applied"
            ),
            Self::InvalidMigrationScript { path, reason } => {
                write!(f, "invalid migration script {}: {reason}", path.display())
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Migration { source, .. } => Some(source),
            Self::Closed
            | Self::InvalidMigrationScript { .. }
            | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
