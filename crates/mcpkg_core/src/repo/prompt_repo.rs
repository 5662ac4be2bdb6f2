//! Prompt repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide project-scoped CRUD over `prompts`.
//!
//! # Invariants
//! - Prompt names are unique within one project.
//! - `updated_at` strictly advances on every update; `created_at` never changes.
//! - Listing order is `created_at ASC, id ASC`.

use crate::db::Store;
use crate::model::name::validate_name;
use crate::model::project::Project;
use crate::model::prompt::{Prompt, PromptId, PromptPatch};
use crate::model::EntityKind;
use crate::repo::update::UpdateBuilder;
use crate::repo::{
    ensure_tables, foreign_key_violation, missing_project, unique_violation, ErrorContext,
    RepoError, RepoResult, ResultExt,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const PROMPT_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    name,
    content,
    description,
    created_at,
    updated_at
FROM prompts";
const PROMPT_UPDATABLE_FIELDS: &[&str] = &["content", "description"];

/// Repository interface for prompt operations.
pub trait PromptRepository {
    fn create_prompt(
        &self,
        project: &Project,
        name: &str,
        content: &str,
        description: Option<&str>,
    ) -> RepoResult<Prompt>;
    fn list_prompts(&self, project: &Project) -> RepoResult<Vec<Prompt>>;
    fn get_prompt(&self, project: &Project, name: &str) -> RepoResult<Option<Prompt>>;
    /// Applies only the fields present in `patch` and returns the updated row.
    fn update_prompt(&self, project: &Project, name: &str, patch: &PromptPatch)
        -> RepoResult<Prompt>;
    fn delete_prompt(&self, project: &Project, name: &str) -> RepoResult<()>;
}

/// SQLite-backed prompt repository bound to one open store.
pub struct SqlitePromptRepository<'s> {
    store: &'s Store,
}

impl<'s> SqlitePromptRepository<'s> {
    /// Creates repository from a migrated store.
    pub fn try_new(store: &'s Store) -> RepoResult<Self> {
        let ctx = ErrorContext::workspace(store.label());
        let conn = store.connection().context(&ctx)?;
        ensure_tables(conn, &["projects", "prompts"], &ctx)?;
        Ok(Self { store })
    }

    fn ctx(&self, project: &Project) -> ErrorContext {
        ErrorContext::project(self.store.label(), &project.name)
    }

    fn duplicate(&self, project: &Project, name: &str) -> RepoError {
        RepoError::Duplicate {
            entity: EntityKind::Prompt,
            field: "name",
            value: name.to_string(),
            scope: self.ctx(project).scope(),
        }
    }

    fn not_found(&self, project: &Project, name: &str) -> RepoError {
        RepoError::NotFound {
            entity: EntityKind::Prompt,
            name: name.to_string(),
            scope: self.ctx(project).scope(),
        }
    }

    fn get_prompt_by_id(&self, project: &Project, id: PromptId) -> RepoResult<Option<Prompt>> {
        let ctx = self.ctx(project);
        let conn = self.store.connection().context(&ctx)?;
        conn.query_row(
            &format!("{PROMPT_SELECT_SQL} WHERE id = ?1;"),
            params![id],
            parse_prompt_row,
        )
        .optional()
        .context(&ctx)
    }
}

impl PromptRepository for SqlitePromptRepository<'_> {
    fn create_prompt(
        &self,
        project: &Project,
        name: &str,
        content: &str,
        description: Option<&str>,
    ) -> RepoResult<Prompt> {
        validate_name(name, EntityKind::Prompt.label())?;
        if self.get_prompt(project, name)?.is_some() {
            return Err(self.duplicate(project, name));
        }

        let ctx = self.ctx(project).with_entity(EntityKind::Prompt, name);
        let conn = self.store.connection().context(&ctx)?;
        let inserted = conn.execute(
            "INSERT INTO prompts (project_id, name, content, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![project.id, name, content, description],
        );
        match inserted {
            Ok(_) => {}
            Err(err) if unique_violation(&err).is_some() => {
                return Err(self.duplicate(project, name))
            }
            Err(err) if foreign_key_violation(&err) => {
                return Err(missing_project(self.store.label(), &project.name))
            }
            Err(err) => return Err(err).context(&ctx),
        }

        let id = conn.last_insert_rowid();
        self.get_prompt_by_id(project, id)?
            .ok_or_else(|| RepoError::InvalidData(format!("prompt row {id} vanished after insert")))
    }

    fn list_prompts(&self, project: &Project) -> RepoResult<Vec<Prompt>> {
        let ctx = self.ctx(project);
        let conn = self.store.connection().context(&ctx)?;
        let mut stmt = conn
            .prepare(&format!(
                "{PROMPT_SELECT_SQL}
                 WHERE project_id = ?1
                 ORDER BY created_at ASC, id ASC;"
            ))
            .context(&ctx)?;
        let rows = stmt
            .query_map(params![project.id], parse_prompt_row)
            .context(&ctx)?;
        rows.collect::<Result<Vec<_>, _>>().context(&ctx)
    }

    fn get_prompt(&self, project: &Project, name: &str) -> RepoResult<Option<Prompt>> {
        let ctx = self.ctx(project).with_entity(EntityKind::Prompt, name);
        let conn = self.store.connection().context(&ctx)?;
        conn.query_row(
            &format!("{PROMPT_SELECT_SQL} WHERE project_id = ?1 AND name = ?2;"),
            params![project.id, name],
            parse_prompt_row,
        )
        .optional()
        .context(&ctx)
    }

    fn update_prompt(
        &self,
        project: &Project,
        name: &str,
        patch: &PromptPatch,
    ) -> RepoResult<Prompt> {
        let mut builder =
            UpdateBuilder::new(EntityKind::Prompt, "prompts", PROMPT_UPDATABLE_FIELDS)
                .touch("updated_at");
        builder.set_opt("content", patch.content.clone())?;
        builder.set_opt("description", patch.description.clone())?;
        let (sql, values) = builder.build(&[
            ("project_id", Value::Integer(project.id)),
            ("name", Value::Text(name.to_string())),
        ]);

        let ctx = self.ctx(project).with_entity(EntityKind::Prompt, name);
        let conn = self.store.connection().context(&ctx)?;
        let changed = conn.execute(&sql, params_from_iter(values)).context(&ctx)?;
        if changed == 0 {
            return Err(self.not_found(project, name));
        }

        self.get_prompt(project, name)?
            .ok_or_else(|| self.not_found(project, name))
    }

    fn delete_prompt(&self, project: &Project, name: &str) -> RepoResult<()> {
        let ctx = self.ctx(project).with_entity(EntityKind::Prompt, name);
        let conn = self.store.connection().context(&ctx)?;
        let changed = conn
            .execute(
                "DELETE FROM prompts WHERE project_id = ?1 AND name = ?2;",
                params![project.id, name],
            )
            .context(&ctx)?;
        if changed == 0 {
            return Err(self.not_found(project, name));
        }
        Ok(())
    }
}

fn parse_prompt_row(row: &Row<'_>) -> rusqlite::Result<Prompt> {
    Ok(Prompt {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        content: row.get("content")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
