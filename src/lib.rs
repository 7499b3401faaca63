//! gitops-api - control plane for GitOps-managed clusters.
//!
//! Each cluster's desired state lives in a YAML specification inside its own
//! git repository. The API mutates that file, commits only real changes and
//! pushes, which triggers the CI pipeline that reconciles the cluster.
//! Credentials for that pipeline are delivered as sealed repository secrets.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── serve         # Run the HTTP API
//! │   └── seal          # Seal a value by hand
//! ├── server/           # HTTP routes, bodies and error responses
//! └── core/             # Core library components
//!     ├── config        # gitops-api.toml
//!     ├── cipher/       # Sealed-box encryption
//!     ├── document/     # Path-addressed YAML editing
//!     ├── workspace     # Disposable per-request directories
//!     ├── vcs/          # VersionControl trait, git CLI backend
//!     ├── remote/       # RemoteHost trait, GitHub backend
//!     ├── pipeline/     # Clone-from-template, state and profile mutations
//!     └── status        # Workflow run reporting
//! ```

pub mod cli;
pub mod core;
pub mod error;
pub mod server;
