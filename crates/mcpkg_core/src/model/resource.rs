//! Resource record and partial-update patch.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};

/// Store-assigned resource row id.
pub type ResourceId = i64;

/// Named, URI-addressed binary artifact owned by one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub project_id: ProjectId,
    /// Unique within `project_id`.
    pub name: String,
    /// Unique within `project_id`.
    pub uri: String,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResource {
    pub name: String,
    pub uri: String,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
    pub description: Option<String>,
}

impl NewResource {
    pub fn new(name: impl Into<String>, uri: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
            content: content.into(),
            mime_type: None,
            description: None,
        }
    }

    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Fields to change on an existing resource. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourcePatch {
    pub content: Option<Vec<u8>>,
    pub mime_type: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

impl ResourcePatch {
    pub fn content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = Some(mime_type);
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }
}
