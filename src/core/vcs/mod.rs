//! Version control operations used by the mutation pipeline.
//!
//! The pipeline depends on the [`VersionControl`] trait only. [`GitCli`]
//! drives the `git` executable; an in-process implementation can be
//! substituted without touching the pipeline.

mod git;
mod remote_url;

use std::path::Path;

use async_trait::async_trait;

pub use git::GitCli;
pub use remote_url::RemoteUrl;

use crate::core::types::CommitId;
use crate::error::Result;

/// Git operations needed to clone, commit and push one repository.
///
/// Network operations are bounded by a timeout and fail with
/// `RemoteUnavailable` when it elapses. Dropping a pending call aborts it.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Clone `url` into `dest`, which must not exist yet.
    async fn clone_repo(&self, url: &RemoteUrl, dest: &Path) -> Result<()>;

    /// Register an additional remote on a checkout.
    async fn add_remote(&self, repo: &Path, name: &str, url: &RemoteUrl) -> Result<()>;

    /// Commit checked out in `repo`, `None` for an unborn branch.
    async fn head(&self, repo: &Path) -> Result<Option<CommitId>>;

    /// Name of the checked out branch.
    async fn current_branch(&self, repo: &Path) -> Result<String>;

    /// Commit all tracked modifications and return the new commit id.
    async fn commit_all(&self, repo: &Path, message: &str) -> Result<CommitId>;

    /// Current head of `branch` on `remote`, `None` if the branch doesn't exist.
    async fn remote_head(&self, repo: &Path, remote: &str, branch: &str) -> Result<Option<CommitId>>;

    /// Push `HEAD` to `branch` on `remote` without forcing.
    ///
    /// A non-fast-forward rejection fails with `Conflict`.
    async fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<()>;
}
