//! Project record.

use serde::{Deserialize, Serialize};

/// Store-assigned project row id.
pub type ProjectId = i64;

/// Named container of prompts and resources within one workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Unique (case-sensitive) within the workspace.
    pub name: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}
