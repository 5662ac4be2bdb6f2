//! Command execution against workspace stores.
//!
//! # Responsibility
//! - Map parsed commands onto core repository and workspace calls.
//! - Render results as text lines or JSON.
//!
//! # Invariants
//! - Destructive deletes ask for confirmation unless `--force` is given.
//! - The `default` workspace is created on first use; others must exist.

use crate::cli::{
    CatalogCommand, Cli, Command, ContentSource, ProjectCommand, PromptCommand, ResourceCommand,
    WorkspaceCommand,
};
use crate::error::CliError;
use log::info;
use mcpkg_core::{
    bundled_scripts, validate_name, CatalogService, EntityKind, NewResource, Project,
    ProjectRepository, PromptPatch, PromptRepository, RepoError, Resource, ResourcePatch,
    ResourceRepository, SqliteProjectRepository, SqlitePromptRepository,
    SqliteResourceRepository, Store, WorkspaceError, WorkspaceLocator, DEFAULT_WORKSPACE,
};
use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Terminal endpoints plus the output mode.
pub struct Console<R, W> {
    input: R,
    out: W,
    as_json: bool,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W, as_json: bool) -> Self {
        Self {
            input,
            out,
            as_json,
        }
    }

    fn line(&mut self, text: impl std::fmt::Display) -> Result<(), CliError> {
        writeln!(self.out, "{text}")?;
        Ok(())
    }

    fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CliError> {
        serde_json::to_writer_pretty(&mut self.out, value)?;
        writeln!(self.out)?;
        Ok(())
    }

    /// Prints `value` as JSON in JSON mode, otherwise the text `message`.
    fn report<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
        message: impl std::fmt::Display,
    ) -> Result<(), CliError> {
        if self.as_json {
            self.json(value)
        } else {
            self.line(message)
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool, CliError> {
        write!(self.out, "{question} [y/N]: ")?;
        self.out.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        let answer = answer.trim();
        Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
    }

    /// `true` when the delete may proceed; prints `Aborted.` otherwise.
    fn allow_delete(&mut self, force: bool, question: &str) -> Result<bool, CliError> {
        if force || self.confirm(question)? {
            return Ok(true);
        }
        self.line("Aborted.")?;
        Ok(false)
    }
}

pub fn run<R: BufRead, W: Write>(
    cli: Cli,
    locator: &WorkspaceLocator,
    console: &mut Console<R, W>,
) -> Result<(), CliError> {
    match cli.command {
        Command::Workspace { command } => run_workspace(command, locator, console),
        Command::Project { target, command } => {
            let store = open_store(locator, &target.workspace)?;
            run_project(command, &store, console)
        }
        Command::Prompt { target, command } => {
            let store = open_store(locator, &target.workspace)?;
            run_prompt(command, &store, console)
        }
        Command::Resource { target, command } => {
            let store = open_store(locator, &target.workspace)?;
            run_resource(command, &store, console)
        }
        Command::Catalog { target, command } => {
            let store = open_store(locator, &target.workspace)?;
            run_catalog(command, &store, console)
        }
    }
}

fn open_store(locator: &WorkspaceLocator, workspace: &str) -> Result<Store, CliError> {
    validate_name(workspace, "Workspace").map_err(WorkspaceError::from)?;
    let scripts = bundled_scripts();
    if workspace == DEFAULT_WORKSPACE && locator.ensure_default_workspace(&scripts)? {
        info!("event=workspace_default_created module=cli status=ok");
    }
    Ok(locator.open_workspace(workspace, &scripts)?)
}

fn run_workspace<R: BufRead, W: Write>(
    command: WorkspaceCommand,
    locator: &WorkspaceLocator,
    console: &mut Console<R, W>,
) -> Result<(), CliError> {
    match command {
        WorkspaceCommand::List => {
            locator.ensure_default_workspace(&bundled_scripts())?;
            let names = locator.list_workspaces()?;
            if console.as_json {
                return console.json(&names);
            }
            if names.is_empty() {
                return console.line("No workspaces.");
            }
            for name in names {
                console.line(name)?;
            }
            Ok(())
        }
        WorkspaceCommand::Create { name } => {
            let mut store = locator.create_workspace(&name, &bundled_scripts())?;
            store.close().map_err(|source| WorkspaceError::Db {
                workspace: name.clone(),
                source,
            })?;
            console.report(&name, format!("Created workspace '{name}'"))
        }
        WorkspaceCommand::Delete { name, force } => {
            validate_name(&name, "Workspace").map_err(WorkspaceError::from)?;
            if !locator.workspace_exists(&name) {
                return Err(WorkspaceError::NotFound(name).into());
            }
            let question = format!(
                "Delete workspace '{name}' and everything in it? This cannot be undone."
            );
            if !console.allow_delete(force, &question)? {
                return Ok(());
            }
            locator.delete_workspace(&name)?;
            console.report(&name, format!("Deleted workspace '{name}'"))
        }
    }
}

fn run_project<R: BufRead, W: Write>(
    command: ProjectCommand,
    store: &Store,
    console: &mut Console<R, W>,
) -> Result<(), CliError> {
    let projects = SqliteProjectRepository::try_new(store)?;
    match command {
        ProjectCommand::List => {
            let listed = projects.list_projects()?;
            if console.as_json {
                return console.json(&listed);
            }
            if listed.is_empty() {
                return console.line(format!("No projects in workspace '{}'.", store.label()));
            }
            for project in listed {
                console.line(project.name)?;
            }
            Ok(())
        }
        ProjectCommand::Create { name } => {
            let project = projects.create_project(&name)?;
            console.report(&project, format!("Created project '{name}'"))
        }
        ProjectCommand::Rename { old_name, new_name } => {
            let project = projects.rename_project(&old_name, &new_name)?;
            console.report(
                &project,
                format!("Renamed project '{old_name}' to '{new_name}'"),
            )
        }
        ProjectCommand::Delete { name, force } => {
            require_project(&projects, store, &name)?;
            let question =
                format!("Delete project '{name}' with all of its prompts and resources?");
            if !console.allow_delete(force, &question)? {
                return Ok(());
            }
            projects.delete_project(&name)?;
            console.report(&name, format!("Deleted project '{name}'"))
        }
    }
}

fn run_prompt<R: BufRead, W: Write>(
    command: PromptCommand,
    store: &Store,
    console: &mut Console<R, W>,
) -> Result<(), CliError> {
    let projects = SqliteProjectRepository::try_new(store)?;
    let prompts = SqlitePromptRepository::try_new(store)?;
    match command {
        PromptCommand::List { project } => {
            let project = require_project(&projects, store, &project)?;
            let listed = prompts.list_prompts(&project)?;
            if console.as_json {
                return console.json(&listed);
            }
            for prompt in listed {
                match prompt.description {
                    Some(description) => console.line(format!("{}\t{description}", prompt.name))?,
                    None => console.line(prompt.name)?,
                }
            }
            Ok(())
        }
        PromptCommand::Add {
            project,
            name,
            source,
            description,
        } => {
            let project = require_project(&projects, store, &project)?;
            let content = read_text(&source)?;
            let prompt =
                prompts.create_prompt(&project, &name, &content, description.as_deref())?;
            console.report(&prompt, format!("Added prompt '{name}' to '{}'", project.name))
        }
        PromptCommand::Show { project, name } => {
            let project = require_project(&projects, store, &project)?;
            let prompt = prompts
                .get_prompt(&project, &name)?
                .ok_or_else(|| not_found(EntityKind::Prompt, &name, store, Some(&project)))?;
            console.report(&prompt, &prompt.content)
        }
        PromptCommand::Update {
            project,
            name,
            content,
            file,
            description,
            clear_description,
        } => {
            let project = require_project(&projects, store, &project)?;
            let mut patch = PromptPatch::default();
            if let Some(content) = optional_text(content, file)? {
                patch = patch.content(content);
            }
            if clear_description {
                patch = patch.description(None);
            } else if let Some(description) = description {
                patch = patch.description(Some(description));
            }
            let prompt = prompts.update_prompt(&project, &name, &patch)?;
            console.report(&prompt, format!("Updated prompt '{name}'"))
        }
        PromptCommand::Delete {
            project,
            name,
            force,
        } => {
            let project = require_project(&projects, store, &project)?;
            if !console.allow_delete(force, &format!("Delete prompt '{name}'?"))? {
                return Ok(());
            }
            prompts.delete_prompt(&project, &name)?;
            console.report(&name, format!("Deleted prompt '{name}'"))
        }
    }
}

/// Resource metadata without the content bytes.
#[derive(Debug, Serialize)]
struct ResourceInfo<'a> {
    name: &'a str,
    uri: &'a str,
    mime_type: Option<&'a str>,
    description: Option<&'a str>,
    size: usize,
    created_at: i64,
    updated_at: i64,
}

impl<'a> From<&'a Resource> for ResourceInfo<'a> {
    fn from(resource: &'a Resource) -> Self {
        Self {
            name: &resource.name,
            uri: &resource.uri,
            mime_type: resource.mime_type.as_deref(),
            description: resource.description.as_deref(),
            size: resource.content.len(),
            created_at: resource.created_at,
            updated_at: resource.updated_at,
        }
    }
}

fn run_resource<R: BufRead, W: Write>(
    command: ResourceCommand,
    store: &Store,
    console: &mut Console<R, W>,
) -> Result<(), CliError> {
    let projects = SqliteProjectRepository::try_new(store)?;
    let resources = SqliteResourceRepository::try_new(store)?;
    match command {
        ResourceCommand::List { project } => {
            let project = require_project(&projects, store, &project)?;
            let listed = resources.list_resources(&project)?;
            if console.as_json {
                let infos: Vec<ResourceInfo<'_>> = listed.iter().map(ResourceInfo::from).collect();
                return console.json(&infos);
            }
            for resource in &listed {
                console.line(format!("{}\t{}", resource.name, resource.uri))?;
            }
            Ok(())
        }
        ResourceCommand::Add {
            project,
            name,
            uri,
            source,
            mime_type,
            description,
        } => {
            let project = require_project(&projects, store, &project)?;
            let mut new_resource = NewResource::new(&name, uri, read_bytes(&source)?);
            if let Some(mime_type) = mime_type {
                new_resource = new_resource.mime_type(mime_type);
            }
            if let Some(description) = description {
                new_resource = new_resource.description(description);
            }
            let resource = resources.create_resource(&project, &new_resource)?;
            console.report(
                &ResourceInfo::from(&resource),
                format!("Added resource '{name}' to '{}'", project.name),
            )
        }
        ResourceCommand::Show { project, name } => {
            let project = require_project(&projects, store, &project)?;
            let resource = resources
                .get_resource(&project, &name)?
                .ok_or_else(|| not_found(EntityKind::Resource, &name, store, Some(&project)))?;
            if console.as_json {
                return console.json(&ResourceInfo::from(&resource));
            }
            console.out.write_all(&resource.content)?;
            console.out.flush()?;
            Ok(())
        }
        ResourceCommand::Update {
            project,
            name,
            content,
            file,
            mime_type,
            description,
            clear_description,
        } => {
            let project = require_project(&projects, store, &project)?;
            let mut patch = ResourcePatch::default();
            if let Some(content) = optional_bytes(content, file)? {
                patch = patch.content(content);
            }
            if let Some(mime_type) = mime_type {
                patch = patch.mime_type(Some(mime_type));
            }
            if clear_description {
                patch = patch.description(None);
            } else if let Some(description) = description {
                patch = patch.description(Some(description));
            }
            let resource = resources.update_resource(&project, &name, &patch)?;
            console.report(
                &ResourceInfo::from(&resource),
                format!("Updated resource '{name}'"),
            )
        }
        ResourceCommand::Delete {
            project,
            name,
            force,
        } => {
            let project = require_project(&projects, store, &project)?;
            if !console.allow_delete(force, &format!("Delete resource '{name}'?"))? {
                return Ok(());
            }
            resources.delete_resource(&project, &name)?;
            console.report(&name, format!("Deleted resource '{name}'"))
        }
    }
}

fn run_catalog<R: BufRead, W: Write>(
    command: CatalogCommand,
    store: &Store,
    console: &mut Console<R, W>,
) -> Result<(), CliError> {
    let catalog = CatalogService::new(
        SqliteProjectRepository::try_new(store)?,
        SqlitePromptRepository::try_new(store)?,
        SqliteResourceRepository::try_new(store)?,
    );
    match command {
        CatalogCommand::Prompts => {
            let listed = catalog.list_prompts()?;
            if console.as_json {
                return console.json(&listed);
            }
            for prompt in listed {
                console.line(prompt.qualified_name)?;
            }
            Ok(())
        }
        CatalogCommand::Resources => {
            let listed = catalog.list_resources()?;
            if console.as_json {
                return console.json(&listed);
            }
            for resource in listed {
                console.line(format!("{}\t{}/{}", resource.uri, resource.project, resource.name))?;
            }
            Ok(())
        }
    }
}

fn require_project(
    projects: &SqliteProjectRepository<'_>,
    store: &Store,
    name: &str,
) -> Result<Project, CliError> {
    projects
        .get_project(name)?
        .ok_or_else(|| not_found(EntityKind::Project, name, store, None))
}

fn not_found(entity: EntityKind, name: &str, store: &Store, project: Option<&Project>) -> CliError {
    let scope = match project {
        Some(project) => format!(
            "project '{}' in workspace '{}'",
            project.name,
            store.label()
        ),
        None => format!("workspace '{}'", store.label()),
    };
    CliError::Repo(RepoError::NotFound {
        entity,
        name: name.to_string(),
        scope,
    })
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_bytes(source: &ContentSource) -> Result<Vec<u8>, CliError> {
    match (&source.content, &source.file) {
        (Some(content), _) => Ok(content.clone().into_bytes()),
        (None, Some(path)) => read_file(path),
        (None, None) => Err(CliError::InvalidInput(
            "either --content or --file is required".to_string(),
        )),
    }
}

fn read_text(source: &ContentSource) -> Result<String, CliError> {
    into_text(read_bytes(source)?, source.file.as_deref())
}

fn optional_bytes(
    content: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<Vec<u8>>, CliError> {
    match (content, file) {
        (Some(content), _) => Ok(Some(content.into_bytes())),
        (None, Some(path)) => read_file(&path).map(Some),
        (None, None) => Ok(None),
    }
}

fn optional_text(
    content: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<String>, CliError> {
    let origin = file.clone();
    match optional_bytes(content, file)? {
        Some(bytes) => into_text(bytes, origin.as_deref()).map(Some),
        None => Ok(None),
    }
}

fn into_text(bytes: Vec<u8>, origin: Option<&Path>) -> Result<String, CliError> {
    String::from_utf8(bytes).map_err(|_| {
        let origin = origin
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "--content".to_string());
        CliError::InvalidInput(format!("prompt content from {origin} is not valid UTF-8"))
    })
}

#[cfg(test)]
mod tests {
    use super::{run, Console};
    use crate::cli::Cli;
    use crate::error::{CliError, EXIT_ALREADY_EXISTS, EXIT_INVALID_INPUT, EXIT_NOT_FOUND};
    use clap::Parser;
    use mcpkg_core::WorkspaceLocator;
    use std::io::Cursor;

    fn exec(locator: &WorkspaceLocator, args: &[&str], stdin: &str) -> Result<String, CliError> {
        let cli = Cli::try_parse_from(std::iter::once("mcpkg").chain(args.iter().copied()))
            .unwrap();
        let mut out = Vec::new();
        let json = cli.json;
        {
            let mut console = Console::new(Cursor::new(stdin.as_bytes()), &mut out, json);
            run(cli, locator, &mut console)?;
        }
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn default_workspace_is_created_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let locator = WorkspaceLocator::new(dir.path());

        exec(&locator, &["project", "create", "p1"], "").unwrap();

        assert_eq!(locator.list_workspaces().unwrap(), vec!["default"]);
        let listed = exec(&locator, &["project", "list"], "").unwrap();
        assert_eq!(listed, "p1\n");
    }

    #[test]
    fn workspace_list_creates_default_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let locator = WorkspaceLocator::new(dir.path());

        let listed = exec(&locator, &["workspace", "list"], "").unwrap();

        assert_eq!(listed, "default\n");
        assert!(locator.workspace_store_path("default").is_file());
    }

    #[test]
    fn workspace_names_cannot_escape_data_dir() {
        let root = tempfile::tempdir().unwrap();
        let locator = WorkspaceLocator::new(root.path().join("data"));
        let outside = root.path().join("victim.mcpkg");
        std::fs::write(&outside, b"keep").unwrap();

        let err = exec(&locator, &["workspace", "delete", "../victim", "--force"], "")
            .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INVALID_INPUT);
        assert!(outside.is_file());

        let err = exec(&locator, &["project", "-w", "../outside", "create", "p1"], "")
            .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INVALID_INPUT);
        assert!(!root.path().join("outside.mcpkg").exists());
    }

    #[test]
    fn named_workspace_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let locator = WorkspaceLocator::new(dir.path());

        let err = exec(&locator, &["project", "-w", "w1", "list"], "").unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NOT_FOUND);
    }

    #[test]
    fn prompt_lifecycle_through_commands() {
        let dir = tempfile::tempdir().unwrap();
        let locator = WorkspaceLocator::new(dir.path());
        exec(&locator, &["workspace", "create", "w1"], "").unwrap();
        exec(&locator, &["project", "-w", "w1", "create", "p1"], "").unwrap();
        exec(
            &locator,
            &["prompt", "-w", "w1", "add", "p1", "greet", "--content", "Hello"],
            "",
        )
        .unwrap();

        let err = exec(
            &locator,
            &["prompt", "-w", "w1", "add", "p1", "greet", "--content", "again"],
            "",
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_ALREADY_EXISTS);

        exec(
            &locator,
            &["prompt", "-w", "w1", "update", "p1", "greet", "--content", "Hi"],
            "",
        )
        .unwrap();
        let shown = exec(&locator, &["prompt", "-w", "w1", "show", "p1", "greet"], "").unwrap();
        assert_eq!(shown, "Hi\n");

        let catalog = exec(&locator, &["catalog", "-w", "w1", "prompts", "--json"], "").unwrap();
        let value: serde_json::Value = serde_json::from_str(&catalog).unwrap();
        assert_eq!(value[0]["qualified_name"], "p1/greet");
    }

    #[test]
    fn declined_confirmation_keeps_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let locator = WorkspaceLocator::new(dir.path());
        exec(&locator, &["workspace", "create", "w1"], "").unwrap();

        let output = exec(&locator, &["workspace", "delete", "w1"], "n\n").unwrap();
        assert!(output.ends_with("Aborted.\n"));
        assert!(locator.workspace_exists("w1"));

        exec(&locator, &["workspace", "delete", "w1"], "yes\n").unwrap();
        assert!(!locator.workspace_exists("w1"));
    }

    #[test]
    fn resource_show_writes_raw_content() {
        let dir = tempfile::tempdir().unwrap();
        let locator = WorkspaceLocator::new(dir.path());
        exec(&locator, &["project", "create", "p1"], "").unwrap();
        exec(
            &locator,
            &[
                "resource",
                "add",
                "p1",
                "style",
                "--uri",
                "docs://style",
                "--content",
                "be terse",
                "--mime-type",
                "text/plain",
            ],
            "",
        )
        .unwrap();

        let shown = exec(&locator, &["resource", "show", "p1", "style"], "").unwrap();
        assert_eq!(shown, "be terse");

        let info = exec(&locator, &["resource", "show", "p1", "style", "--json"], "").unwrap();
        let value: serde_json::Value = serde_json::from_str(&info).unwrap();
        assert_eq!(value["size"], 8);
        assert_eq!(value["mime_type"], "text/plain");
    }
}
