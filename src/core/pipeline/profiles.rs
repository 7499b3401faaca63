//! Profile set changes.

use tracing::instrument;

use super::Pipeline;
use crate::core::constants;
use crate::core::document::Edit;
use crate::core::domain::{Credentials, MutationOutcome, RepoRef};
use crate::core::types::Profile;
use crate::error::{Result, ValidationError};

impl Pipeline {
    /// Replace `spec.profiles` with `profiles`, in order, and push the change.
    #[instrument(skip(self, credentials, profiles), fields(repo = %target, count = profiles.len()))]
    pub async fn apply_profiles(
        &self,
        credentials: &Credentials,
        target: &RepoRef,
        profiles: &[Profile],
    ) -> Result<MutationOutcome> {
        let edits = profile_edits(profiles)?;
        self.mutate(credentials, target, &edits, "Changed profiles").await
    }
}

/// Clear the sequence, then append each profile.
fn profile_edits(profiles: &[Profile]) -> Result<Vec<Edit>> {
    if profiles.iter().any(|p| p.trim().is_empty()) {
        return Err(ValidationError::InvalidField {
            field: "profiles",
            reason: "profile entries must not be empty".to_string(),
        }
        .into());
    }

    let mut edits = Vec::with_capacity(profiles.len() + 1);
    edits.push(Edit::clear(constants::PROFILES_PATH));
    edits.extend(
        profiles
            .iter()
            .map(|p| Edit::append(constants::PROFILES_PATH, p.as_str())),
    );
    Ok(edits)
}
