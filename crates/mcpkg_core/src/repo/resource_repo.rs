//! Resource repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide project-scoped CRUD over `resources`, including URI lookup.
//!
//! # Invariants
//! - `name` and `uri` are each unique within one project.
//! - `content` is stored as an opaque BLOB; no decoding happens here.

use crate::db::Store;
use crate::model::name::validate_name;
use crate::model::project::Project;
use crate::model::resource::{NewResource, Resource, ResourceId, ResourcePatch};
use crate::model::EntityKind;
use crate::repo::update::UpdateBuilder;
use crate::repo::{
    ensure_tables, foreign_key_violation, missing_project, unique_violation, ErrorContext,
    RepoError, RepoResult, ResultExt,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const RESOURCE_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    name,
    uri,
    content,
    mime_type,
    description,
    created_at,
    updated_at
FROM resources";
const RESOURCE_UPDATABLE_FIELDS: &[&str] = &["content", "mime_type", "description"];

/// Repository interface for resource operations.
pub trait ResourceRepository {
    fn create_resource(&self, project: &Project, resource: &NewResource) -> RepoResult<Resource>;
    fn list_resources(&self, project: &Project) -> RepoResult<Vec<Resource>>;
    fn get_resource(&self, project: &Project, name: &str) -> RepoResult<Option<Resource>>;
    fn get_resource_by_uri(&self, project: &Project, uri: &str) -> RepoResult<Option<Resource>>;
    /// Applies only the fields present in `patch` and returns the updated row.
    fn update_resource(
        &self,
        project: &Project,
        name: &str,
        patch: &ResourcePatch,
    ) -> RepoResult<Resource>;
    fn delete_resource(&self, project: &Project, name: &str) -> RepoResult<()>;
}

/// SQLite-backed resource repository bound to one open store.
pub struct SqliteResourceRepository<'s> {
    store: &'s Store,
}

impl<'s> SqliteResourceRepository<'s> {
    /// Creates repository from a migrated store.
    pub fn try_new(store: &'s Store) -> RepoResult<Self> {
        let ctx = ErrorContext::workspace(store.label());
        let conn = store.connection().context(&ctx)?;
        ensure_tables(conn, &["projects", "resources"], &ctx)?;
        Ok(Self { store })
    }

    fn ctx(&self, project: &Project) -> ErrorContext {
        ErrorContext::project(self.store.label(), &project.name)
    }

    fn duplicate(&self, project: &Project, field: &'static str, value: &str) -> RepoError {
        RepoError::Duplicate {
            entity: EntityKind::Resource,
            field,
            value: value.to_string(),
            scope: self.ctx(project).scope(),
        }
    }

    fn not_found(&self, project: &Project, name: &str) -> RepoError {
        RepoError::NotFound {
            entity: EntityKind::Resource,
            name: name.to_string(),
            scope: self.ctx(project).scope(),
        }
    }

    fn get_resource_by_id(
        &self,
        project: &Project,
        id: ResourceId,
    ) -> RepoResult<Option<Resource>> {
        self.query_one(project, "id = ?1", Value::Integer(id), None)
    }

    fn query_one(
        &self,
        project: &Project,
        predicate: &'static str,
        value: Value,
        entity_name: Option<&str>,
    ) -> RepoResult<Option<Resource>> {
        let mut ctx = self.ctx(project);
        if let Some(name) = entity_name {
            ctx = ctx.with_entity(EntityKind::Resource, name);
        }
        let conn = self.store.connection().context(&ctx)?;
        conn.query_row(
            &format!("{RESOURCE_SELECT_SQL} WHERE project_id = ?2 AND {predicate};"),
            params![value, project.id],
            parse_resource_row,
        )
        .optional()
        .context(&ctx)
    }
}

impl ResourceRepository for SqliteResourceRepository<'_> {
    fn create_resource(&self, project: &Project, resource: &NewResource) -> RepoResult<Resource> {
        validate_name(&resource.name, EntityKind::Resource.label())?;
        if self.get_resource(project, &resource.name)?.is_some() {
            return Err(self.duplicate(project, "name", &resource.name));
        }
        if self.get_resource_by_uri(project, &resource.uri)?.is_some() {
            return Err(self.duplicate(project, "uri", &resource.uri));
        }

        let ctx = self
            .ctx(project)
            .with_entity(EntityKind::Resource, &resource.name);
        let conn = self.store.connection().context(&ctx)?;
        let inserted = conn.execute(
            "INSERT INTO resources (project_id, name, uri, content, mime_type, description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                project.id,
                resource.name,
                resource.uri,
                resource.content,
                resource.mime_type,
                resource.description,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(err) => {
                if let Some(message) = unique_violation(&err) {
                    return Err(if message.contains("resources.uri") {
                        self.duplicate(project, "uri", &resource.uri)
                    } else {
                        self.duplicate(project, "name", &resource.name)
                    });
                }
                if foreign_key_violation(&err) {
                    return Err(missing_project(self.store.label(), &project.name));
                }
                return Err(err).context(&ctx);
            }
        }

        let id = conn.last_insert_rowid();
        self.get_resource_by_id(project, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("resource row {id} vanished after insert"))
        })
    }

    fn list_resources(&self, project: &Project) -> RepoResult<Vec<Resource>> {
        let ctx = self.ctx(project);
        let conn = self.store.connection().context(&ctx)?;
        let mut stmt = conn
            .prepare(&format!(
                "{RESOURCE_SELECT_SQL}
                 WHERE project_id = ?1
                 ORDER BY created_at ASC, id ASC;"
            ))
            .context(&ctx)?;
        let rows = stmt
            .query_map(params![project.id], parse_resource_row)
            .context(&ctx)?;
        rows.collect::<Result<Vec<_>, _>>().context(&ctx)
    }

    fn get_resource(&self, project: &Project, name: &str) -> RepoResult<Option<Resource>> {
        self.query_one(project, "name = ?1", Value::Text(name.to_string()), Some(name))
    }

    fn get_resource_by_uri(&self, project: &Project, uri: &str) -> RepoResult<Option<Resource>> {
        self.query_one(project, "uri = ?1", Value::Text(uri.to_string()), None)
    }

    fn update_resource(
        &self,
        project: &Project,
        name: &str,
        patch: &ResourcePatch,
    ) -> RepoResult<Resource> {
        let mut builder =
            UpdateBuilder::new(EntityKind::Resource, "resources", RESOURCE_UPDATABLE_FIELDS)
                .touch("updated_at");
        builder.set_opt("content", patch.content.clone())?;
        builder.set_opt("mime_type", patch.mime_type.clone())?;
        builder.set_opt("description", patch.description.clone())?;
        let (sql, values) = builder.build(&[
            ("project_id", Value::Integer(project.id)),
            ("name", Value::Text(name.to_string())),
        ]);

        let ctx = self.ctx(project).with_entity(EntityKind::Resource, name);
        let conn = self.store.connection().context(&ctx)?;
        let changed = conn.execute(&sql, params_from_iter(values)).context(&ctx)?;
        if changed == 0 {
            return Err(self.not_found(project, name));
        }

        self.get_resource(project, name)?
            .ok_or_else(|| self.not_found(project, name))
    }

    fn delete_resource(&self, project: &Project, name: &str) -> RepoResult<()> {
        let ctx = self.ctx(project).with_entity(EntityKind::Resource, name);
        let conn = self.store.connection().context(&ctx)?;
        let changed = conn
            .execute(
                "DELETE FROM resources WHERE project_id = ?1 AND name = ?2;",
                params![project.id, name],
            )
            .context(&ctx)?;
        if changed == 0 {
            return Err(self.not_found(project, name));
        }
        Ok(())
    }
}

fn parse_resource_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get("id")?,
        project_id: row.get("project_id")?,
        name: row.get("name")?,
        uri: row.get("uri")?,
        content: row.get("content")?,
        mime_type: row.get("mime_type")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
