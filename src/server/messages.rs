//! JSON request and response bodies.
//!
//! Field names follow the public API (`camelCase`). Absent request fields
//! default to empty and are rejected during validation, so a missing field
//! is reported by name instead of as a generic decoding error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::domain::{ClusterStatus, Credentials, RepoRef, StepStatus, Token};
use crate::error::{ErrorKind, ValidationError};

/// Fields shared by every authenticated request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default)]
    pub git_hub_user: String,
    #[serde(default)]
    pub git_hub_token: Token,
}

impl Identity {
    pub fn credentials(&self) -> Result<Credentials, ValidationError> {
        Credentials::new(&self.git_hub_user, self.git_hub_token.clone())
    }
}

/// Fields naming a managed repository.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    #[serde(default)]
    pub target_org: String,
    #[serde(default)]
    pub target_repo: String,
}

impl Target {
    pub fn repo(&self) -> Result<RepoRef, ValidationError> {
        if self.target_org.is_empty() {
            return Err(ValidationError::MissingField("targetOrg"));
        }
        if self.target_repo.is_empty() {
            return Err(ValidationError::MissingField("targetRepo"));
        }
        RepoRef::new(&self.target_org, &self.target_repo)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRequest {
    #[serde(default)]
    pub template_repository: String,
    #[serde(default)]
    pub secrets: HashMap<String, String>,
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub identity: Identity,
}

impl CloneRequest {
    pub fn template(&self) -> Result<RepoRef, ValidationError> {
        if self.template_repository.is_empty() {
            return Err(ValidationError::MissingField("templateRepository"));
        }
        RepoRef::parse(&self.template_repository)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRequest {
    #[serde(default)]
    pub cluster_state: String,
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub identity: Identity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesRequest {
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub identity: Identity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    #[serde(flatten)]
    pub target: Target,
    #[serde(flatten)]
    pub identity: Identity,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(flatten)]
    pub identity: Identity,
}

#[derive(Debug, Serialize)]
pub struct CloneResponse {
    pub result: String,
    pub commit: String,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub result: String,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunStatusResponse {
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub result: Vec<StepStatus>,
    pub link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClustersResponse {
    pub result: Vec<ClusterStatus>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}
