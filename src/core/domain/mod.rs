//! Domain types.

mod cluster;
mod credentials;
mod outcome;
mod run_status;
mod secret;

pub use cluster::{ClusterState, RepoRef};
pub use credentials::{Credentials, RepositoryOwner, Token};
pub use outcome::MutationOutcome;
pub use run_status::{ClusterStatus, RunReport, StepStatus};
pub use secret::{SealedSecret, Secret};
