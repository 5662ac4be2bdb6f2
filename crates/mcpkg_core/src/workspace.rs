//! Workspace location and lifecycle.
//!
//! # Responsibility
//! - Resolve the data directory and map workspace names to store files.
//! - Create, open, list and delete workspace stores.
//!
//! # Invariants
//! - One workspace owns exactly one `<data_dir>/<name>.mcpkg` file.
//! - File existence is the only signal for "workspace exists".
//! - The data directory is explicit configuration, never a global.

use crate::db::migrations::{apply_migrations, MigrationScript};
use crate::db::{DbError, Store};
use crate::model::name::{validate_name, NameError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Store file extension for workspaces.
pub const WORKSPACE_FILE_EXTENSION: &str = "mcpkg";
/// Workspace used when callers do not name one.
pub const DEFAULT_WORKSPACE: &str = "default";
/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MCPKG_DATA_DIR";

const APP_DIR_NAME: &str = "mcpkg";
const SIDECAR_SUFFIXES: &[&str] = &["-wal", "-shm"];

pub type WorkspaceResult<T> = Result<T, WorkspaceError>;

#[derive(Debug)]
pub enum WorkspaceError {
    InvalidName(NameError),
    NotFound(String),
    AlreadyExists(String),
    /// No data directory was configured and the platform offers none.
    NoDataDir,
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Db {
        workspace: String,
        source: DbError,
    },
}

impl Display for WorkspaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::NotFound(name) => write!(f, "Workspace '{name}' does not exist"),
            Self::AlreadyExists(name) => write!(f, "Workspace '{name}' already exists"),
            Self::NoDataDir => write!(
                f,
                "unable to determine a data directory; set {DATA_DIR_ENV}"
            ),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
            Self::Db { workspace, source } => write!(f, "workspace '{workspace}': {source}"),
        }
    }
}

impl Error for WorkspaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidName(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Db { source, .. } => Some(source),
            Self::NotFound(_) | Self::AlreadyExists(_) | Self::NoDataDir => None,
        }
    }
}

impl From<NameError> for WorkspaceError {
    fn from(value: NameError) -> Self {
        Self::InvalidName(value)
    }
}

/// Resolves the default data directory: `MCPKG_DATA_DIR`, else the platform
/// data directory joined with `mcpkg`.
pub fn default_data_dir() -> WorkspaceResult<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or(WorkspaceError::NoDataDir)
}

/// Maps workspace names to store files under one base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLocator {
    base_dir: PathBuf,
}

impl WorkspaceLocator {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Locator rooted at [`default_data_dir`].
    pub fn from_env() -> WorkspaceResult<Self> {
        default_data_dir().map(Self::new)
    }

    /// Returns the base directory, creating it and its parents if missing.
    pub fn data_dir(&self) -> WorkspaceResult<&Path> {
        std::fs::create_dir_all(&self.base_dir).map_err(|source| WorkspaceError::Io {
            path: self.base_dir.clone(),
            source,
        })?;
        Ok(&self.base_dir)
    }

    /// `<data_dir>/<name>.mcpkg`. Performs no validation and no I/O.
    pub fn workspace_store_path(&self, name: &str) -> PathBuf {
        self.base_dir
            .join(format!("{name}.{WORKSPACE_FILE_EXTENSION}"))
    }

    pub fn workspace_exists(&self, name: &str) -> bool {
        self.workspace_store_path(name).is_file()
    }

    /// Creates a new workspace store and migrates it to the latest version.
    ///
    /// # Errors
    /// - `InvalidName` before touching the filesystem.
    /// - `AlreadyExists` when the store file is present.
    /// - `Db` when the store cannot be opened or migrated.
    pub fn create_workspace(
        &self,
        name: &str,
        scripts: &[MigrationScript],
    ) -> WorkspaceResult<Store> {
        validate_name(name, "Workspace")?;
        self.data_dir()?;
        if self.workspace_exists(name) {
            return Err(WorkspaceError::AlreadyExists(name.to_string()));
        }

        let path = self.workspace_store_path(name);
        let store = Store::initialize(&path, scripts).map_err(|source| WorkspaceError::Db {
            workspace: name.to_string(),
            source,
        })?;
        info!("event=workspace_create module=workspace status=ok");
        Ok(store)
    }

    /// Opens an existing workspace and applies any pending migrations.
    ///
    /// # Errors
    /// - `InvalidName` before touching the filesystem.
    /// - `NotFound` when the store file is absent.
    pub fn open_workspace(
        &self,
        name: &str,
        scripts: &[MigrationScript],
    ) -> WorkspaceResult<Store> {
        validate_name(name, "Workspace")?;
        if !self.workspace_exists(name) {
            return Err(WorkspaceError::NotFound(name.to_string()));
        }

        let db_err = |source| WorkspaceError::Db {
            workspace: name.to_string(),
            source,
        };
        let mut store = Store::open(self.workspace_store_path(name)).map_err(db_err)?;
        apply_migrations(&mut store, scripts).map_err(db_err)?;
        Ok(store)
    }

    /// Creates the default workspace when it is missing. Returns whether it was created.
    pub fn ensure_default_workspace(&self, scripts: &[MigrationScript]) -> WorkspaceResult<bool> {
        if self.workspace_exists(DEFAULT_WORKSPACE) {
            return Ok(false);
        }
        let mut store = self.create_workspace(DEFAULT_WORKSPACE, scripts)?;
        store.close().map_err(|source| WorkspaceError::Db {
            workspace: DEFAULT_WORKSPACE.to_string(),
            source,
        })?;
        Ok(true)
    }

    /// Sorted names of every workspace store in the data directory.
    pub fn list_workspaces(&self) -> WorkspaceResult<Vec<String>> {
        let dir = self.data_dir()?;
        let io_err = |source| WorkspaceError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(WORKSPACE_FILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Deletes the workspace store file and its WAL sidecars.
    pub fn delete_workspace(&self, name: &str) -> WorkspaceResult<()> {
        validate_name(name, "Workspace")?;
        let path = self.workspace_store_path(name);
        if !path.is_file() {
            return Err(WorkspaceError::NotFound(name.to_string()));
        }

        std::fs::remove_file(&path).map_err(|source| WorkspaceError::Io {
            path: path.clone(),
            source,
        })?;
        for suffix in SIDECAR_SUFFIXES {
            let mut sidecar = path.clone().into_os_string();
            sidecar.push(suffix);
            let sidecar = PathBuf::from(sidecar);
            match std::fs::remove_file(&sidecar) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(WorkspaceError::Io {
                        path: sidecar,
                        source,
                    })
                }
            }
        }
        info!("event=workspace_delete module=workspace status=ok");
        Ok(())
    }
}
