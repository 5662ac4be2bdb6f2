//! Core storage layer for mcpkg.
//! This crate owns workspace stores, schema migrations and entity invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod workspace;

pub use db::migrations::{
    applied_migrations, apply_migrations, apply_migrations_from_dir, bundled_scripts,
    current_version, latest_version, load_scripts, AppliedMigration, MigrationReport,
    MigrationScript,
};
pub use db::{DbError, DbResult, Store};
pub use logging::{
    default_log_level, init_logging, logging_status, resolve_log_level, LoggingError,
};
pub use model::name::{validate_name, NameError, NameErrorKind, MAX_NAME_LENGTH};
pub use model::project::{Project, ProjectId};
pub use model::prompt::{Prompt, PromptId, PromptPatch};
pub use model::resource::{NewResource, Resource, ResourceId, ResourcePatch};
pub use model::EntityKind;
pub use repo::project_repo::{ProjectRepository, SqliteProjectRepository};
pub use repo::prompt_repo::{PromptRepository, SqlitePromptRepository};
pub use repo::resource_repo::{ResourceRepository, SqliteResourceRepository};
pub use repo::{ErrorContext, RepoError, RepoResult};
pub use service::catalog_service::{
    CatalogError, CatalogPrompt, CatalogResource, CatalogResult, CatalogService,
};
pub use workspace::{
    default_data_dir, WorkspaceError, WorkspaceLocator, WorkspaceResult, DEFAULT_WORKSPACE,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
