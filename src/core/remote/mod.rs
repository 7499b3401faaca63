//! Remote repository host.
//!
//! A [`RemoteHost`] is bound to one caller's credentials and lives for one
//! request. The [`Connector`] is the long-lived part: it holds the host
//! configuration and builds a fresh client for every request.

mod github;

use async_trait::async_trait;
use serde::Deserialize;

pub use github::{GitHubClient, GitHubConnector};

use crate::core::cipher::RecipientKey;
use crate::core::domain::{Credentials, RepoRef, RepositoryOwner, SealedSecret};
use crate::error::Result;

/// Settings for a repository to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRepository {
    pub name: String,
    pub private: bool,
    pub description: String,
}

/// A repository as returned by the host after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHandle {
    pub repo: RepoRef,
    /// HTTPS clone URL, without credentials.
    pub clone_url: String,
}

/// A repository search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySummary {
    pub repo: RepoRef,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowJob {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
}

/// Operations against the repository host, scoped to one identity.
///
/// Every call is bounded by a timeout (`RemoteUnavailable`). Rejected
/// credentials fail with `Authorization`, missing resources with `NotFound`.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Create a repository; a name collision fails with `Conflict`.
    async fn create_repository(
        &self,
        owner: &RepositoryOwner,
        settings: &NewRepository,
    ) -> Result<RepositoryHandle>;

    /// Replace the full topic set of a repository.
    async fn set_topics(&self, repo: &RepoRef, topics: &[String]) -> Result<()>;

    /// The repository's current secret encryption key. Never cached.
    async fn public_key(&self, repo: &RepoRef) -> Result<RecipientKey>;

    /// Create or replace a repository secret.
    async fn upload_secret(&self, repo: &RepoRef, secret: &SealedSecret) -> Result<()>;

    /// Repositories matching a topic, most recently pushed first.
    async fn search_by_topic(&self, topic: &str) -> Result<Vec<RepositorySummary>>;

    /// The most recent workflow run, if any.
    async fn latest_workflow_run(&self, repo: &RepoRef) -> Result<Option<WorkflowRun>>;

    async fn workflow_jobs(&self, repo: &RepoRef, run_id: u64) -> Result<Vec<WorkflowJob>>;
}

/// Builds request-scoped [`RemoteHost`] clients.
pub trait Connector: Send + Sync {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn RemoteHost>>;
}
