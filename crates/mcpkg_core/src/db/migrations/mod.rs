//! Versioned schema migration runner.
//!
//! # Responsibility
//! - Discover schema scripts (embedded or from a directory).
//! - Apply pending scripts in ascending ordinal order, one transaction each.
//! - Record every applied ordinal in the `schema_migrations` ledger.
//!
//! # Invariants
//! - Ordinals are unique; application order is strictly ascending.
//! - The ledger only grows; there is no downgrade path.
//! - A failing script is not recorded, while earlier scripts stay recorded.

use crate::db::{DbError, DbResult, Store, NOW_MS_SQL};
use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;

/// Name of the ledger table.
pub const LEDGER_TABLE: &str = "schema_migrations";
/// File extension of directory-based scripts.
pub const SCRIPT_EXTENSION: &str = "sql";

const BUNDLED: &[(u32, &str, &str)] = &[(
    1,
    "0001_initial_schema.sql",
    include_str!("0001_initial_schema.sql"),
)];

/// One schema-change script tagged with its ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationScript {
    pub version: u32,
    pub name: String,
    pub sql: Cow<'static, str>,
}

impl MigrationScript {
    pub fn new(version: u32, name: impl Into<String>, sql: impl Into<Cow<'static, str>>) -> Self {
        Self {
            version,
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: u32,
    /// Epoch ms.
    pub applied_at: i64,
}

/// Outcome of one `apply_migrations` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub from_version: u32,
    pub to_version: u32,
    pub applied: Vec<u32>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Schema scripts compiled into this binary.
pub fn bundled_scripts() -> Vec<MigrationScript> {
    BUNDLED
        .iter()
        .map(|(version, name, sql)| MigrationScript::new(*version, *name, *sql))
        .collect()
}

/// Latest ordinal among `scripts`, or 0.
pub fn latest_version(scripts: &[MigrationScript]) -> u32 {
    scripts.iter().map(|s| s.version).max().unwrap_or(0)
}

/// Reads `<ordinal>_<description>.sql` scripts from `dir`, sorted by ordinal.
///
/// Entries that are not `.sql` files are ignored.
///
/// # Errors
/// - `DbError::Io` when the directory or a script cannot be read.
/// - `DbError::InvalidMigrationScript` for an unparsable or duplicate ordinal.
pub fn load_scripts(dir: &Path) -> DbResult<Vec<MigrationScript>> {
    let mut scripts = Vec::new();
    let mut seen = BTreeSet::new();
    for entry in std::fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if !path.is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some(SCRIPT_EXTENSION)
        {
            continue;
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| DbError::InvalidMigrationScript {
                path: path.clone(),
                reason: "file name is not valid UTF-8".to_string(),
            })?;
        let version = parse_ordinal(&file_name).ok_or_else(|| DbError::InvalidMigrationScript {
            path: path.clone(),
            reason: "expected `<ordinal>_<description>.sql`".to_string(),
        })?;
        if !seen.insert(version) {
            return Err(DbError::InvalidMigrationScript {
                path,
                reason: format!("duplicate ordinal {version}"),
            });
        }

        let sql = std::fs::read_to_string(&path).map_err(io_error(&path))?;
        scripts.push(MigrationScript::new(version, file_name, sql));
    }

    scripts.sort_by_key(|s| s.version);
    Ok(scripts)
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DbError {
    let path = path.to_path_buf();
    move |source| DbError::Io { path, source }
}

fn parse_ordinal(file_name: &str) -> Option<u32> {
    let (ordinal, _) = file_name.split_once('_')?;
    if ordinal.is_empty() || !ordinal.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    ordinal.parse().ok()
}

/// Highest applied version, creating the ledger when it is missing.
pub fn current_version(conn: &Connection) -> DbResult<u32> {
    ensure_ledger(conn)?;
    let version: u32 = conn.query_row(
        &format!("SELECT COALESCE(MAX(version), 0) FROM {LEDGER_TABLE};"),
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

/// Ledger rows in ascending version order.
pub fn applied_migrations(conn: &Connection) -> DbResult<Vec<AppliedMigration>> {
    ensure_ledger(conn)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT version, applied_at FROM {LEDGER_TABLE} ORDER BY version ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut applied = Vec::new();
    while let Some(row) = rows.next()? {
        applied.push(AppliedMigration {
            version: row.get(0)?,
            applied_at: row.get(1)?,
        });
    }
    Ok(applied)
}

/// Applies every script whose ordinal exceeds the ledger's current version.
///
/// # Errors
/// - `DbError::Closed` on a closed store.
/// - `DbError::InvalidMigrationScript` when two scripts share an ordinal.
/// - `DbError::UnsupportedSchemaVersion` when the ledger is ahead of `scripts`.
/// - `DbError::Migration` for the first failing script; it is not recorded.
pub fn apply_migrations(store: &mut Store, scripts: &[MigrationScript]) -> DbResult<MigrationReport> {
    let mut ordered: Vec<&MigrationScript> = scripts.iter().collect();
    ordered.sort_by_key(|s| s.version);
    if let Some(pair) = ordered.windows(2).find(|w| w[0].version == w[1].version) {
        return Err(DbError::InvalidMigrationScript {
            path: pair[1].name.clone().into(),
            reason: format!("duplicate ordinal {}", pair[1].version),
        });
    }

    let conn = store.connection_mut()?;
    let from_version = current_version(conn)?;
    let latest = ordered.last().map_or(0, |s| s.version);
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }

    let mut report = MigrationReport {
        from_version,
        to_version: from_version,
        applied: Vec::new(),
    };

    for script in ordered.into_iter().filter(|s| s.version > from_version) {
        info!(
            "event=migration_apply module=db status=start version={}",
            script.version
        );
        if let Err(source) = apply_one(conn, script) {
            error!(
                "event=migration_apply module=db status=error version={} error={}",
                script.version, source
            );
            return Err(DbError::Migration {
                version: script.version,
                name: script.name.clone(),
                source,
            });
        }
        info!(
            "event=migration_apply module=db status=ok version={}",
            script.version
        );
        report.applied.push(script.version);
        report.to_version = script.version;
    }

    Ok(report)
}

/// Convenience wrapper: [`load_scripts`] then [`apply_migrations`].
pub fn apply_migrations_from_dir(store: &mut Store, dir: &Path) -> DbResult<MigrationReport> {
    let scripts = load_scripts(dir)?;
    apply_migrations(store, &scripts)
}

fn apply_one(conn: &mut Connection, script: &MigrationScript) -> Result<(), rusqlite::Error> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute_batch(&script.sql)?;
    tx.execute(
        &format!("INSERT INTO {LEDGER_TABLE} (version) VALUES (?1);"),
        [script.version],
    )?;
    tx.commit()
}

fn ensure_ledger(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {LEDGER_TABLE} (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT ({NOW_MS_SQL})
        );"
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{bundled_scripts, latest_version, parse_ordinal};

    #[test]
    fn parse_ordinal_reads_leading_digits() {
        assert_eq!(parse_ordinal("0001_initial_schema.sql"), Some(1));
        assert_eq!(parse_ordinal("42_add_index.sql"), Some(42));
        assert_eq!(parse_ordinal("_missing.sql"), None);
        assert_eq!(parse_ordinal("v1_init.sql"), None);
        assert_eq!(parse_ordinal("0001.sql"), None);
        assert_eq!(parse_ordinal("-1_negative.sql"), None);
    }

    #[test]
    fn bundled_scripts_are_strictly_increasing() {
        let scripts = bundled_scripts();
        assert!(!scripts.is_empty());
        assert!(scripts.windows(2).all(|w| w[0].version < w[1].version));
        assert_eq!(latest_version(&scripts), scripts.last().unwrap().version);
    }
}
