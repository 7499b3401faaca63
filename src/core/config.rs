//! Configuration file management.
//!
//! Handles reading and validating `gitops-api.toml`. Every field has a
//! default, so the service also runs without a file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Service configuration stored in `gitops-api.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub git: GitConfig,
    pub cluster: ClusterConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:8080`
    pub bind: String,
}

/// Remote hosting API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// REST API base URL
    pub api_url: String,
    /// Base URL repositories are cloned from (`<git_url>/<owner>/<repo>`)
    pub git_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Local git settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    pub committer_name: String,
    pub committer_email: String,
    /// Timeout for each git network command in seconds
    pub timeout_secs: u64,
    /// Directory workspaces are created in (system temp dir when unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
}

/// Layout of managed cluster repositories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Specification file relative to the repository root
    pub spec_file: String,
    /// Marker topic applied to every managed repository
    pub topic: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            git_url: "https://github.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            committer_name: "gitops-api".to_string(),
            committer_email: "gitops-api@users.noreply.github.com".to_string(),
            timeout_secs: 120,
            workspace_root: None,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            spec_file: constants::SPEC_FILE.to_string(),
            topic: constants::MANAGED_CLUSTER_TOPIC.to_string(),
        }
    }
}

impl Config {
    /// Default configuration file location: `./gitops-api.toml` if present,
    /// otherwise `<config dir>/gitops-api/gitops-api.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(constants::CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("gitops-api").join(constants::CONFIG_FILE))
            .filter(|path| path.exists())
    }

    /// Load configuration from `path`, or defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file can't be read,
    /// `ConfigError::Parse` if the TOML is malformed, or
    /// `ConfigError::InvalidValue` if validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading config");
                let contents =
                    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
                        path: path.display().to_string(),
                        source,
                    })?;
                Self::from_toml(&contents)?
            }
            None => {
                debug!("no config file, using defaults");
                Self::default()
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string without validating it.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents).map_err(ConfigError::Parse)?)
    }

    /// Validate the configuration structure and contents
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` on validation failure.
    pub fn validate(&self) -> Result<()> {
        debug!("validating config");

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(invalid("server.bind", format!("not a socket address: {}", self.server.bind)));
        }

        for (field, value) in [
            ("github.api_url", &self.github.api_url),
            ("github.git_url", &self.github.git_url),
        ] {
            if let Err(e) = Url::parse(value) {
                return Err(invalid(field, format!("{}: {}", value, e)));
            }
        }

        if self.github.timeout_secs == 0 {
            return Err(invalid("github.timeout_secs", "must be greater than zero".into()));
        }
        if self.git.timeout_secs == 0 {
            return Err(invalid("git.timeout_secs", "must be greater than zero".into()));
        }
        if self.git.committer_name.trim().is_empty() {
            return Err(invalid("git.committer_name", "cannot be empty".into()));
        }
        if self.git.committer_email.trim().is_empty() {
            return Err(invalid("git.committer_email", "cannot be empty".into()));
        }

        let spec_file = Path::new(&self.cluster.spec_file);
        if self.cluster.spec_file.is_empty()
            || spec_file.is_absolute()
            || spec_file
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(invalid(
                "cluster.spec_file",
                format!("must be a relative path inside the repository: {:?}", self.cluster.spec_file),
            ));
        }
        if self.cluster.topic.trim().is_empty() {
            return Err(invalid("cluster.topic", "cannot be empty".into()));
        }

        Ok(())
    }

    pub fn github_timeout(&self) -> Duration {
        Duration::from_secs(self.github.timeout_secs)
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git.timeout_secs)
    }
}

fn invalid(field: &'static str, reason: String) -> crate::error::Error {
    ConfigError::InvalidValue { field, reason }.into()
}
