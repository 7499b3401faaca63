//! Core library components.
//!
//! This module contains the business logic of the control plane: secret
//! sealing, document editing, workspaces, git and host access, and the
//! mutation pipeline that ties them together.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod document;
pub mod domain;
pub mod pipeline;
pub mod remote;
pub mod status;
pub mod types;
pub mod vcs;
pub mod workspace;
