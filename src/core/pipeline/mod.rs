//! The state-mutation pipeline.
//!
//! Every mutation follows the same path: clone into a fresh workspace, edit
//! the cluster specification, stop if the document is unchanged, otherwise
//! commit and push. The workspace is deleted when the mutation returns or
//! its future is dropped.
//!
//! ```text
//! Cloned -> Edited -> Unchanged
//!                  -> Committed -> Pushed
//! ```
//!
//! Pushes are guarded: the remote branch must still point at the commit
//! that was cloned, otherwise the mutation fails with `Conflict`.

mod profiles;
mod state;
mod template;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

pub use template::TemplateClone;

use crate::core::config::Config;
use crate::core::constants;
use crate::core::document::{DocumentEditor, Edit};
use crate::core::domain::{Credentials, MutationOutcome, RepoRef};
use crate::core::types::CommitId;
use crate::core::vcs::{RemoteUrl, VersionControl};
use crate::core::workspace::{Workspace, WorkspaceManager};
use crate::error::{Error, Result};

/// Settings the pipeline reads from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Base URL repositories are cloned from.
    pub git_url: String,
    /// Specification file, relative to the repository root.
    pub spec_file: String,
    /// Topic that marks managed repositories.
    pub topic: String,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            git_url: config.github.git_url.clone(),
            spec_file: config.cluster.spec_file.clone(),
            topic: config.cluster.topic.clone(),
        }
    }
}

/// Runs mutations against desired-state repositories.
///
/// Holds only immutable settings and shared capabilities, so one instance
/// serves concurrent requests.
pub struct Pipeline {
    pub(super) settings: PipelineSettings,
    pub(super) vcs: Arc<dyn VersionControl>,
    pub(super) editor: Arc<dyn DocumentEditor>,
    pub(super) workspaces: WorkspaceManager,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .field("workspaces", &self.workspaces)
            .finish()
    }
}

/// A cloned repository inside its workspace.
pub(super) struct Checkout {
    /// Deleted when the checkout is dropped.
    _workspace: Workspace,
    pub(super) dir: PathBuf,
    pub(super) branch: String,
    /// Commit the checkout started from.
    pub(super) base: Option<CommitId>,
}

impl Pipeline {
    pub fn new(
        settings: PipelineSettings,
        vcs: Arc<dyn VersionControl>,
        editor: Arc<dyn DocumentEditor>,
        workspaces: WorkspaceManager,
    ) -> Self {
        Self {
            settings,
            vcs,
            editor,
            workspaces,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Credentialed clone URL of a repository on the configured host.
    pub(super) fn repo_url(&self, repo: &RepoRef, credentials: &Credentials) -> Result<RemoteUrl> {
        Ok(RemoteUrl::for_repo(&self.settings.git_url, repo)?.with_credentials(credentials))
    }

    /// Acquire a workspace and clone `url` into it.
    pub(super) async fn checkout(&self, url: &RemoteUrl) -> Result<Checkout> {
        let workspace = self.workspaces.acquire()?;
        let dir = workspace.checkout_dir();

        self.vcs.clone_repo(url, &dir).await?;
        let branch = self.vcs.current_branch(&dir).await?;
        let base = self.vcs.head(&dir).await?;
        debug!(url = %url, branch = %branch, base = ?base, "cloned");

        Ok(Checkout {
            _workspace: workspace,
            dir,
            branch,
            base,
        })
    }

    /// Apply edits to the specification file; returns whether it changed.
    pub(super) fn edit(&self, checkout: &Checkout, edits: &[Edit]) -> Result<bool> {
        let file = checkout.dir.join(&self.settings.spec_file);
        self.editor.edit(&file, edits)
    }

    /// Push the checkout's branch after confirming the remote head is `expected`.
    pub(super) async fn push_guarded(
        &self,
        checkout: &Checkout,
        remote: &str,
        expected: Option<&str>,
    ) -> Result<()> {
        let current = self
            .vcs
            .remote_head(&checkout.dir, remote, &checkout.branch)
            .await?;
        if current.as_deref() != expected {
            return Err(Error::conflict(
                "push",
                format!(
                    "{}/{} is at {}, expected {}",
                    remote,
                    checkout.branch,
                    current.as_deref().unwrap_or("nothing"),
                    expected.unwrap_or("nothing"),
                ),
            ));
        }
        self.vcs.push(&checkout.dir, remote, &checkout.branch).await
    }

    /// Clone a managed repository, apply `edits`, and push if anything changed.
    pub(super) async fn mutate(
        &self,
        credentials: &Credentials,
        target: &RepoRef,
        edits: &[Edit],
        message: &str,
    ) -> Result<MutationOutcome> {
        let url = self.repo_url(target, credentials)?;
        let checkout = self.checkout(&url).await?;

        if !self.edit(&checkout, edits)? {
            info!(repo = %target, "no change, nothing to push");
            return Ok(MutationOutcome::Unchanged);
        }

        let commit = self.vcs.commit_all(&checkout.dir, message).await?;
        self.push_guarded(&checkout, constants::ORIGIN_REMOTE, checkout.base.as_deref())
            .await?;
        info!(repo = %target, commit = %commit, "pushed");
        Ok(MutationOutcome::Pushed { commit })
    }
}
