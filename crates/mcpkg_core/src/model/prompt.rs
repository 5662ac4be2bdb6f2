//! Prompt record and partial-update patch.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};

/// Store-assigned prompt row id.
pub type PromptId = i64;

/// Named text artifact owned by one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub project_id: ProjectId,
    /// Unique within `project_id`.
    pub name: String,
    pub content: String,
    pub description: Option<String>,
    /// Epoch ms; never changes after insert.
    pub created_at: i64,
    /// Epoch ms; strictly advances on every update.
    pub updated_at: i64,
}

/// Fields to change on an existing prompt. `None` leaves a field untouched.
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptPatch {
    pub content: Option<String>,
    pub description: Option<Option<String>>,
}

impl PromptPatch {
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }
}
