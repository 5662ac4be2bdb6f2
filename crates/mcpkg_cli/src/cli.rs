//! Command-line surface definitions.

use clap::{Args, Parser, Subcommand};
use mcpkg_core::DEFAULT_WORKSPACE;
use std::path::PathBuf;

/// Manage per-workspace collections of prompts and resources.
#[derive(Debug, Parser)]
#[command(name = "mcpkg", version, about, long_about = None)]
pub struct Cli {
    /// Directory holding workspace stores (overrides MCPKG_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error (overrides MCPKG_LOG)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Print listings and records as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, list and delete workspaces
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommand,
    },
    /// Manage projects inside a workspace
    Project {
        #[command(flatten)]
        target: WorkspaceTarget,
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Manage prompts inside a project
    Prompt {
        #[command(flatten)]
        target: WorkspaceTarget,
        #[command(subcommand)]
        command: PromptCommand,
    },
    /// Manage resources inside a project
    Resource {
        #[command(flatten)]
        target: WorkspaceTarget,
        #[command(subcommand)]
        command: ResourceCommand,
    },
    /// Show the workspace as a protocol client sees it
    Catalog {
        #[command(flatten)]
        target: WorkspaceTarget,
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Debug, Args)]
pub struct WorkspaceTarget {
    /// Workspace to operate on
    #[arg(short, long, global = true, default_value = DEFAULT_WORKSPACE)]
    pub workspace: String,
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceCommand {
    List,
    Create {
        name: String,
    },
    Delete {
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    List,
    Create {
        name: String,
    },
    Rename {
        old_name: String,
        new_name: String,
    },
    Delete {
        name: String,
        #[arg(long)]
        force: bool,
    },
}

/// Text supplied inline or read from a file.
#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct ContentSource {
    #[arg(long)]
    pub content: Option<String>,
    /// Read content from FILE
    #[arg(long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum PromptCommand {
    List {
        project: String,
    },
    Add {
        project: String,
        name: String,
        #[command(flatten)]
        source: ContentSource,
        #[arg(long)]
        description: Option<String>,
    },
    Show {
        project: String,
        name: String,
    },
    Update {
        project: String,
        name: String,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
    },
    Delete {
        project: String,
        name: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    List {
        project: String,
    },
    Add {
        project: String,
        name: String,
        #[arg(long)]
        uri: String,
        #[command(flatten)]
        source: ContentSource,
        #[arg(long)]
        mime_type: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Write the resource content to stdout (metadata with --json)
    Show {
        project: String,
        name: String,
    },
    Update {
        project: String,
        name: String,
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        #[arg(long)]
        mime_type: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
    },
    Delete {
        project: String,
        name: String,
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum CatalogCommand {
    /// Every prompt as `<project>/<prompt>`
    Prompts,
    /// Every resource URI
    Resources,
}
