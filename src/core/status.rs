//! Workflow run status of managed clusters.

use tracing::debug;

use crate::core::domain::{ClusterStatus, RepoRef, RunReport, StepStatus};
use crate::core::remote::RemoteHost;
use crate::error::{Error, ErrorKind, Result};

const NO_WORKFLOW_DATA: &str = "no workflow data";

/// Reads CI run status through a request-scoped host client.
pub struct StatusReporter<'a> {
    host: &'a dyn RemoteHost,
    topic: &'a str,
}

impl<'a> StatusReporter<'a> {
    pub fn new(host: &'a dyn RemoteHost, topic: &'a str) -> Self {
        Self { host, topic }
    }

    /// Status of the first job of the latest workflow run.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the repository has no run, or the run has no job.
    pub async fn run_status(&self, repo: &RepoRef) -> Result<RunReport> {
        let operation = "run status";
        let run = self
            .host
            .latest_workflow_run(repo)
            .await?
            .ok_or_else(|| Error::not_found(operation, NO_WORKFLOW_DATA))?;

        let job = self
            .host
            .workflow_jobs(repo, run.id)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(operation, NO_WORKFLOW_DATA))?;

        Ok(RunReport {
            link: run.html_url,
            status: job.status,
            conclusion: job.conclusion,
            steps: job
                .steps
                .into_iter()
                .map(|step| StepStatus {
                    status: step.status,
                    message: Some(step.name),
                    conclusion: step.conclusion,
                })
                .collect(),
        })
    }

    /// Every repository carrying the marker topic, with its latest run.
    ///
    /// Search results are filtered on the topic again because the host's
    /// search is fuzzy. Repositories without runs are listed as pending.
    pub async fn list_clusters(&self) -> Result<Vec<ClusterStatus>> {
        let found = self.host.search_by_topic(self.topic).await?;

        let mut clusters = Vec::new();
        for summary in found
            .into_iter()
            .filter(|s| s.topics.iter().any(|t| t == self.topic))
        {
            let name = summary.repo.to_string();
            match self.run_status(&summary.repo).await {
                Ok(report) => clusters.push(ClusterStatus::with_report(name, report)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(repo = %name, "no workflow runs yet");
                    clusters.push(ClusterStatus::pending(name));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(clusters)
    }
}
