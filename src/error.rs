use serde::Serialize;
use thiserror::Error;

/// Every failure the service can report.
///
/// Remote failures carry the name of the operation that failed so a caller
/// can tell a rejected clone from a rejected secret upload.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error("{operation}: remote unavailable: {reason}")]
    RemoteUnavailable { operation: String, reason: String },

    #[error("{operation}: authorization rejected: {reason}")]
    Authorization { operation: String, reason: String },

    #[error("No code change. Nothing to do.")]
    NoChange,

    #[error("{operation}: conflict: {reason}")]
    Conflict { operation: String, reason: String },

    #[error("{operation}: not found: {reason}")]
    NotFound { operation: String, reason: String },

    #[error(transparent)]
    Sealing(#[from] SealingError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn remote_unavailable(operation: &str, reason: impl ToString) -> Self {
        Self::RemoteUnavailable {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn authorization(operation: &str, reason: impl ToString) -> Self {
        Self::Authorization {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn conflict(operation: &str, reason: impl ToString) -> Self {
        Self::Conflict {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn not_found(operation: &str, reason: impl ToString) -> Self {
        Self::NotFound {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable classification reported to API callers.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Workspace(_) | Self::Io(_) => ErrorKind::Workspace,
            Self::RemoteUnavailable { .. } => ErrorKind::RemoteUnavailable,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::NoChange => ErrorKind::NoChange,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Sealing(_) => ErrorKind::Sealing,
            Self::Document(_) => ErrorKind::Document,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Error classification with stable wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Workspace,
    RemoteUnavailable,
    Authorization,
    NoChange,
    Conflict,
    NotFound,
    Sealing,
    Document,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Workspace => "workspace",
            Self::RemoteUnavailable => "remote_unavailable",
            Self::Authorization => "authorization",
            Self::NoChange => "no_change",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Sealing => "sealing",
            Self::Document => "document",
            Self::Config => "config",
        }
    }
}

/// Malformed request input.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("invalid cluster state {0:?}: expected \"present\" or \"absent\"")]
    InvalidState(String),

    #[error("missing required secret: {0}")]
    MissingSecret(&'static str),
}

/// Local filesystem and local git failures.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("failed to create workspace: {0}")]
    Create(#[source] std::io::Error),

    #[error("failed to remove workspace {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git executable not found: {0}")]
    GitNotFound(String),

    #[error("`git {command}` failed: {stderr}")]
    Git { command: String, stderr: String },
}

/// Cryptographic preconditions of the sealed box.
#[derive(Error, Debug)]
pub enum SealingError {
    #[error("recipient public key must be {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("recipient public key is not valid base64: {0}")]
    InvalidKeyEncoding(String),

    #[error("random source failure: {0}")]
    RandomSource(String),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("sealed value is malformed: {0}")]
    Malformed(String),

    #[error("decryption failed")]
    DecryptionFailed,
}

/// Failures of the structured document editor.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("invalid path expression {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("path {path:?} does not resolve: {reason}")]
    PathNotResolvable { path: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Service configuration failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
