//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide workspace-scoped CRUD over `projects`.
//!
//! # Invariants
//! - Project names are unique (case-sensitive) within one workspace.
//! - Deleting a project cascades to its prompts and resources through
//!   `ON DELETE CASCADE` foreign keys.
//! - Listing order is `created_at ASC, id ASC`.

use crate::db::Store;
use crate::model::name::validate_name;
use crate::model::project::{Project, ProjectId};
use crate::model::EntityKind;
use crate::repo::update::UpdateBuilder;
use crate::repo::{ensure_tables, unique_violation, ErrorContext, RepoError, RepoResult, ResultExt};
use rusqlite::types::Value;
use rusqlite::{params, OptionalExtension, Row};

const PROJECT_SELECT_SQL: &str = "SELECT id, name, created_at FROM projects";
const PROJECT_UPDATABLE_FIELDS: &[&str] = &["name"];

/// Repository interface for project operations.
pub trait ProjectRepository {
    fn create_project(&self, name: &str) -> RepoResult<Project>;
    fn list_projects(&self) -> RepoResult<Vec<Project>>;
    fn get_project(&self, name: &str) -> RepoResult<Option<Project>>;
    fn get_project_by_id(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn rename_project(&self, old_name: &str, new_name: &str) -> RepoResult<Project>;
    fn delete_project(&self, name: &str) -> RepoResult<()>;
}

/// SQLite-backed project repository bound to one open store.
pub struct SqliteProjectRepository<'s> {
    store: &'s Store,
}

impl<'s> SqliteProjectRepository<'s> {
    /// Creates repository from a migrated store.
    ///
    /// # Errors
    /// - `RepoError::Db` wrapping `DbError::Closed` on a closed store.
    /// - `RepoError::MissingRequiredTable` when migrations have not run.
    pub fn try_new(store: &'s Store) -> RepoResult<Self> {
        let ctx = ErrorContext::workspace(store.label());
        let conn = store.connection().context(&ctx)?;
        ensure_tables(conn, &["projects"], &ctx)?;
        Ok(Self { store })
    }

    fn ctx(&self) -> ErrorContext {
        ErrorContext::workspace(self.store.label())
    }

    fn duplicate(&self, name: &str) -> RepoError {
        RepoError::Duplicate {
            entity: EntityKind::Project,
            field: "name",
            value: name.to_string(),
            scope: self.ctx().scope(),
        }
    }

    fn not_found(&self, name: &str) -> RepoError {
        RepoError::NotFound {
            entity: EntityKind::Project,
            name: name.to_string(),
            scope: self.ctx().scope(),
        }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, name: &str) -> RepoResult<Project> {
        validate_name(name, EntityKind::Project.label())?;
        if self.get_project(name)?.is_some() {
            return Err(self.duplicate(name));
        }

        let ctx = self.ctx().with_entity(EntityKind::Project, name);
        let conn = self.store.connection().context(&ctx)?;
        match conn.execute("INSERT INTO projects (name) VALUES (?1);", [name]) {
            Ok(_) => {}
            Err(err) if unique_violation(&err).is_some() => return Err(self.duplicate(name)),
            Err(err) => return Err(err).context(&ctx),
        }

        let id = conn.last_insert_rowid();
        self.get_project_by_id(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("project row {id} vanished after insert")))
    }

    fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let ctx = self.ctx();
        let conn = self.store.connection().context(&ctx)?;
        let mut stmt = conn
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))
            .context(&ctx)?;
        let rows = stmt.query_map([], parse_project_row).context(&ctx)?;
        rows.collect::<Result<Vec<_>, _>>().context(&ctx)
    }

    fn get_project(&self, name: &str) -> RepoResult<Option<Project>> {
        let ctx = self.ctx().with_entity(EntityKind::Project, name);
        let conn = self.store.connection().context(&ctx)?;
        conn.query_row(
            &format!("{PROJECT_SELECT_SQL} WHERE name = ?1;"),
            [name],
            parse_project_row,
        )
        .optional()
        .context(&ctx)
    }

    fn get_project_by_id(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let ctx = self.ctx();
        let conn = self.store.connection().context(&ctx)?;
        conn.query_row(
            &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
            params![id],
            parse_project_row,
        )
        .optional()
        .context(&ctx)
    }

    fn rename_project(&self, old_name: &str, new_name: &str) -> RepoResult<Project> {
        validate_name(new_name, EntityKind::Project.label())?;
        let existing = self
            .get_project(old_name)?
            .ok_or_else(|| self.not_found(old_name))?;
        if old_name == new_name {
            return Ok(existing);
        }
        if self.get_project(new_name)?.is_some() {
            return Err(self.duplicate(new_name));
        }

        let mut builder =
            UpdateBuilder::new(EntityKind::Project, "projects", PROJECT_UPDATABLE_FIELDS);
        builder.set("name", new_name.to_string())?;
        let (sql, values) = builder.build(&[("id", Value::Integer(existing.id))]);

        let ctx = self.ctx().with_entity(EntityKind::Project, old_name);
        let conn = self.store.connection().context(&ctx)?;
        let changed = match conn.execute(&sql, rusqlite::params_from_iter(values)) {
            Ok(changed) => changed,
            Err(err) if unique_violation(&err).is_some() => return Err(self.duplicate(new_name)),
            Err(err) => return Err(err).context(&ctx),
        };
        if changed == 0 {
            return Err(self.not_found(old_name));
        }

        Ok(Project {
            name: new_name.to_string(),
            ..existing
        })
    }

    fn delete_project(&self, name: &str) -> RepoResult<()> {
        let ctx = self.ctx().with_entity(EntityKind::Project, name);
        let conn = self.store.connection().context(&ctx)?;
        let changed = conn
            .execute("DELETE FROM projects WHERE name = ?1;", [name])
            .context(&ctx)?;
        if changed == 0 {
            return Err(self.not_found(name));
        }
        log::debug!("event=project_delete module=repo status=ok");
        Ok(())
    }
}

fn parse_project_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
    })
}
