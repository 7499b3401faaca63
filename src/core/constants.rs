//! Constants used throughout gitops-api.
//!
//! Centralizes magic strings and configuration values.

/// Configuration file name (gitops-api.toml).
pub const CONFIG_FILE: &str = "gitops-api.toml";

/// Cluster specification file at the root of every managed repository.
pub const SPEC_FILE: &str = "cluster.yaml";

/// Topic applied to every repository this service provisions.
pub const MANAGED_CLUSTER_TOPIC: &str = "gitops-managed-cluster";

/// Prefix of every per-request workspace directory.
pub const WORKSPACE_PREFIX: &str = "gitops-";

/// Directory inside a workspace that holds the checkout.
pub const CHECKOUT_DIR: &str = "template";

/// Remote name for the destination of a template clone.
pub const FORK_REMOTE: &str = "fork";

/// Remote name of a plain clone.
pub const ORIGIN_REMOTE: &str = "origin";

/// Cloud access key secret consumed by the reconciliation workflow.
pub const SECRET_ACCESS_KEY_ID: &str = "awsAccessKeyId";

/// Cloud secret key consumed by the reconciliation workflow.
pub const SECRET_SECRET_ACCESS_KEY: &str = "awsSecretAccessKey";

/// Source-control token consumed by the reconciliation workflow.
pub const SECRET_SCM_TOKEN: &str = "githubToken";

/// Paths into the cluster specification.
pub const STATE_PATH: &str = "spec.state";
pub const NAME_PATH: &str = "spec.template.metadata.name";
pub const PROFILES_PATH: &str = "spec.profiles";

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GITOPS_API_LOG";
