//! Result of a successful mutation.

use crate::core::types::CommitId;

/// How a mutation ended when it did not fail.
///
/// A retried mutation that was already applied reports `Unchanged`, never
/// `Pushed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The edit produced a document identical to the committed one.
    Unchanged,
    /// A commit was created and pushed.
    Pushed { commit: CommitId },
}

impl MutationOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Pushed { .. })
    }

    pub fn commit(&self) -> Option<&str> {
        match self {
            Self::Unchanged => None,
            Self::Pushed { commit } => Some(commit),
        }
    }
}
