//! Domain records for workspace-scoped entities.
//!
//! # Responsibility
//! - Define typed records decoded at the repository boundary.
//! - Define the entity name policy shared by every write path.
//!
//! # Invariants
//! - Ids and timestamps are store-assigned; callers never invent them.
//! - A project exclusively owns its prompts and resources.

pub mod name;
pub mod project;
pub mod prompt;
pub mod resource;

use std::fmt::{Display, Formatter};

/// Entity kinds handled by the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Prompt,
    Resource,
}

impl EntityKind {
    /// Capitalized label used in validation and error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Project => "Project",
            Self::Prompt => "Prompt",
            Self::Resource => "Resource",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
