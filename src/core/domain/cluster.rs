//! Cluster and repository identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::types::{Owner, RepoName};
use crate::error::ValidationError;

/// Desired lifecycle state written to `spec.state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterState {
    Present,
    Absent,
}

impl ClusterState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

impl fmt::Display for ClusterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClusterState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(ValidationError::InvalidState(other.to_string())),
        }
    }
}

/// A repository on the remote host, addressed as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    owner: Owner,
    name: RepoName,
}

impl RepoRef {
    /// Create a repository reference, validating both components.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if either component is empty or contains
    /// characters that cannot appear in a repository slug.
    pub fn new(owner: &str, name: &str) -> Result<Self, ValidationError> {
        validate_component("owner", owner)?;
        validate_component("repository", name)?;
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Parse an `owner/name` slug.
    pub fn parse(slug: &str) -> Result<Self, ValidationError> {
        let (owner, name) = slug
            .trim_end_matches(".git")
            .split_once('/')
            .ok_or_else(|| ValidationError::InvalidField {
                field: "repository",
                reason: format!("expected owner/name, got {:?}", slug),
            })?;
        Self::new(owner, name)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

fn validate_component(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::InvalidField {
            field,
            reason: "cannot be empty".to_string(),
        });
    }
    if value == "." || value == ".." {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("{:?} is reserved", value),
        });
    }
    if let Some(ch) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(ValidationError::InvalidField {
            field,
            reason: format!("invalid character {:?} in {:?}", ch, value),
        });
    }
    Ok(())
}
