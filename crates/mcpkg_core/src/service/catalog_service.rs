//! Read-only prompt/resource catalog for protocol adapters.
//!
//! # Responsibility
//! - Flatten a workspace's projects into the prompt and resource listings a
//!   protocol client sees.
//! - Resolve `<project>/<prompt>` names and resource URIs back to records.
//!
//! # Invariants
//! - The catalog never mutates the store.
//! - Listing order follows project creation order, then entity creation order.

use crate::model::name::validate_name;
use crate::model::prompt::Prompt;
use crate::model::resource::Resource;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::prompt_repo::PromptRepository;
use crate::repo::resource_repo::ResourceRepository;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const QUALIFIED_NAME_SEPARATOR: char = '/';

#[derive(Debug)]
pub enum CatalogError {
    /// Prompt reference is not `<project>/<prompt>` with valid names.
    InvalidQualifiedName(String),
    Repo(RepoError),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQualifiedName(value) => write!(
                f,
                "invalid prompt reference `{value}`; expected `<project>/<prompt>`"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQualifiedName(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// One prompt as advertised to protocol clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogPrompt {
    pub project: String,
    pub name: String,
    /// `<project>/<prompt>`; unique across the workspace.
    pub qualified_name: String,
    pub description: Option<String>,
}

/// One resource as advertised to protocol clients. Content is not included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogResource {
    pub project: String,
    pub name: String,
    pub uri: String,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

/// Joins a project and prompt name into a catalog reference.
pub fn qualified_name(project: &str, prompt: &str) -> String {
    format!("{project}{QUALIFIED_NAME_SEPARATOR}{prompt}")
}

/// Splits `<project>/<prompt>`, validating both halves.
pub fn split_qualified_name(value: &str) -> CatalogResult<(&str, &str)> {
    let invalid = || CatalogError::InvalidQualifiedName(value.to_string());
    let (project, prompt) = value.split_once(QUALIFIED_NAME_SEPARATOR).ok_or_else(invalid)?;
    validate_name(project, "Project").map_err(|_| invalid())?;
    validate_name(prompt, "Prompt").map_err(|_| invalid())?;
    Ok((project, prompt))
}

/// Catalog service over the three repositories of one workspace.
pub struct CatalogService<P, Q, R>
where
    P: ProjectRepository,
    Q: PromptRepository,
    R: ResourceRepository,
{
    projects: P,
    prompts: Q,
    resources: R,
}

impl<P, Q, R> CatalogService<P, Q, R>
where
    P: ProjectRepository,
    Q: PromptRepository,
    R: ResourceRepository,
{
    pub fn new(projects: P, prompts: Q, resources: R) -> Self {
        Self {
            projects,
            prompts,
            resources,
        }
    }

    pub fn list_prompts(&self) -> CatalogResult<Vec<CatalogPrompt>> {
        let mut listed = Vec::new();
        for project in self.projects.list_projects()? {
            for prompt in self.prompts.list_prompts(&project)? {
                listed.push(CatalogPrompt {
                    qualified_name: qualified_name(&project.name, &prompt.name),
                    project: project.name.clone(),
                    name: prompt.name,
                    description: prompt.description,
                });
            }
        }
        Ok(listed)
    }

    /// Resolves `<project>/<prompt>`; `None` when either part is missing.
    pub fn get_prompt(&self, reference: &str) -> CatalogResult<Option<Prompt>> {
        let (project_name, prompt_name) = split_qualified_name(reference)?;
        let Some(project) = self.projects.get_project(project_name)? else {
            return Ok(None);
        };
        Ok(self.prompts.get_prompt(&project, prompt_name)?)
    }

    pub fn list_resources(&self) -> CatalogResult<Vec<CatalogResource>> {
        let mut listed = Vec::new();
        for project in self.projects.list_projects()? {
            for resource in self.resources.list_resources(&project)? {
                listed.push(CatalogResource {
                    project: project.name.clone(),
                    name: resource.name,
                    uri: resource.uri,
                    mime_type: resource.mime_type,
                    description: resource.description,
                });
            }
        }
        Ok(listed)
    }

    /// First resource with `uri`, searching projects in creation order.
    pub fn read_resource(&self, uri: &str) -> CatalogResult<Option<Resource>> {
        for project in self.projects.list_projects()? {
            if let Some(resource) = self.resources.get_resource_by_uri(&project, uri)? {
                return Ok(Some(resource));
            }
        }
        Ok(None)
    }
}
