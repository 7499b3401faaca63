//! Cluster state changes.

use tracing::instrument;

use super::Pipeline;
use crate::core::constants;
use crate::core::document::Edit;
use crate::core::domain::{ClusterState, Credentials, MutationOutcome, RepoRef};
use crate::error::Result;

impl Pipeline {
    /// Set `spec.state` of a managed cluster and push the change.
    ///
    /// Requesting the state the cluster already has returns
    /// [`MutationOutcome::Unchanged`] without committing.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the branch moved since the clone, and the
    /// remote and document errors of the underlying steps.
    #[instrument(skip(self, credentials), fields(repo = %target))]
    pub async fn change_state(
        &self,
        credentials: &Credentials,
        target: &RepoRef,
        state: ClusterState,
    ) -> Result<MutationOutcome> {
        let edits = [Edit::set(constants::STATE_PATH, state.as_str())];
        let message = format!("Changed cluster state to {}", state);
        self.mutate(credentials, target, &edits, &message).await
    }
}
