//! Disposable per-request workspaces.
//!
//! Every mutation clones into its own temporary directory. The directory is
//! owned by a [`Workspace`] handle and removed when the handle is dropped,
//! on success, on error and when the request future is cancelled.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::core::constants;
use crate::error::{Result, WorkspaceError};

/// Creates workspaces, optionally under a fixed root directory.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceManager {
    root: Option<PathBuf>,
}

impl WorkspaceManager {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// Create a uniquely named, empty workspace.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::Create` if the directory can't be created.
    pub fn acquire(&self) -> Result<Workspace> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(constants::WORKSPACE_PREFIX);

        let dir = match &self.root {
            Some(root) => {
                std::fs::create_dir_all(root).map_err(WorkspaceError::Create)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(WorkspaceError::Create)?;

        debug!(path = %dir.path().display(), "workspace acquired");
        Ok(Workspace { dir: Some(dir) })
    }
}

/// A temporary directory that is deleted when dropped.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
}

impl Workspace {
    /// Root of the workspace.
    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    /// Where the repository is checked out inside the workspace.
    pub fn checkout_dir(&self) -> PathBuf {
        self.path().join(constants::CHECKOUT_DIR)
    }

    /// Delete the workspace now, reporting failures instead of ignoring them.
    pub fn close(mut self) -> Result<()> {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().display().to_string();
            dir.close()
                .map_err(|source| WorkspaceError::Remove { path: path.clone(), source })?;
            debug!(path = %path, "workspace released");
        }
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().display().to_string();
            match dir.close() {
                Ok(()) => debug!(path = %path, "workspace released"),
                Err(e) => warn!(path = %path, error = %e, "failed to remove workspace"),
            }
        }
    }
}
