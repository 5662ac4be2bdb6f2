//! Workspace store lifecycle.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for one workspace.
//! - Configure connection pragmas required by core behavior.
//! - Release the connection on `close` and reject later use.
//!
//! # Invariants
//! - Open stores have `foreign_keys=ON`.
//! - File-backed stores run in `journal_mode=WAL`.
//! - After `close`, every accessor fails with `DbError::Closed`.

use super::migrations::{apply_migrations, MigrationScript};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const MEMORY_LABEL: &str = ":memory:";

/// Owned connection to one workspace store file.
#[derive(Debug)]
pub struct Store {
    conn: Option<Connection>,
    path: Option<PathBuf>,
    label: String,
}

impl Store {
    /// Opens (or creates) a store file and configures its connection.
    ///
    /// Does not run migrations; see [`Store::initialize`].
    ///
    /// # Errors
    /// - `DbError::Io` when the parent directory does not exist.
    /// - `DbError::Sqlite` when SQLite cannot open or configure the file.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode=file");

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                error!(
                    "event=db_open module=db status=error mode=file error_code=parent_missing"
                );
                return Err(DbError::Io {
                    path: parent.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "store directory does not exist",
                    ),
                });
            }
        }

        let result = Connection::open(path)
            .map_err(DbError::from)
            .and_then(|conn| {
                configure_connection(&conn, true)?;
                Ok(conn)
            });

        match result {
            Ok(conn) => {
                info!(
                    "event=db_open module=db status=ok mode=file duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Some(conn),
                    path: Some(path.to_path_buf()),
                    label: store_label(path),
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Opens a private in-memory store. Used by tests and throwaway callers.
    pub fn open_in_memory() -> DbResult<Self> {
        info!("event=db_open module=db status=start mode=memory");
        let conn = Connection::open_in_memory()?;
        configure_connection(&conn, false)?;
        info!("event=db_open module=db status=ok mode=memory");
        Ok(Self {
            conn: Some(conn),
            path: None,
            label: MEMORY_LABEL.to_string(),
        })
    }

    /// Opens the store and brings its schema to the latest script version.
    pub fn initialize(path: impl AsRef<Path>, scripts: &[MigrationScript]) -> DbResult<Self> {
        let mut store = Self::open(path)?;
        apply_migrations(&mut store, scripts)?;
        Ok(store)
    }

    /// Borrows the live connection.
    ///
    /// # Errors
    /// - `DbError::Closed` after [`Store::close`].
    pub fn connection(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::Closed)
    }

    pub(crate) fn connection_mut(&mut self) -> DbResult<&mut Connection> {
        self.conn.as_mut().ok_or(DbError::Closed)
    }

    /// Workspace name derived from the file stem, or `:memory:`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Backing file path; `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Releases the connection. Closing twice is an error.
    pub fn close(&mut self) -> DbResult<()> {
        let conn = self.conn.take().ok_or(DbError::Closed)?;
        conn.close().map_err(|(conn, err)| {
            // A failed close leaves the store open.
            self.conn = Some(conn);
            DbError::Sqlite(err)
        })?;
        info!("event=db_close module=db status=ok");
        Ok(())
    }

    /// Current `journal_mode` pragma, lowercased.
    pub fn journal_mode(&self) -> DbResult<String> {
        let mode: String =
            self.connection()?
                .query_row("PRAGMA journal_mode;", [], |row| row.get(0))?;
        Ok(mode.to_ascii_lowercase())
    }

    pub fn foreign_keys_enabled(&self) -> DbResult<bool> {
        let enabled: i64 =
            self.connection()?
                .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))?;
        Ok(enabled == 1)
    }
}

fn configure_connection(conn: &Connection, wal: bool) -> DbResult<()> {
    if wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            log::warn!("event=db_open module=db status=degraded journal_mode={mode}");
        }
    }
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn store_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map_or_else(|| path.display().to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::Store;
    use crate::db::DbError;

    #[test]
    fn label_is_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("team-a.mcpkg")).unwrap();
        assert_eq!(store.label(), "team-a");
    }

    #[test]
    fn open_fails_with_io_error_when_parent_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = Store::open(dir.path().join("missing").join("w.mcpkg")).unwrap_err();
        assert!(matches!(err, DbError::Io { .. }));
    }

    #[test]
    fn close_twice_reports_closed() {
        let mut store = Store::open_in_memory().unwrap();
        store.close().unwrap();
        assert!(matches!(store.close(), Err(DbError::Closed)));
    }
}
