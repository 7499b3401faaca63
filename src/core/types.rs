//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// An organization or user login (e.g., `acme`).
pub type Owner = String;

/// A repository name without its owner (e.g., `acme-prod`).
pub type RepoName = String;

/// A git commit id as printed by `git rev-parse`.
pub type CommitId = String;

/// Identifier of a recipient public key on the secret store.
pub type KeyId = String;

/// Name of a repository secret (e.g., `awsAccessKeyId`).
pub type SecretName = String;

/// An opaque profile descriptor appended to `spec.profiles`.
pub type Profile = String;
