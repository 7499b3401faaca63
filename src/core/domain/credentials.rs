//! Caller credentials.
//!
//! Credentials arrive with every request and are threaded explicitly through
//! the call chain. They are never stored and never logged.

use std::fmt;

use serde::Deserialize;
use zeroize::Zeroize;

use crate::error::ValidationError;

/// An access token for the remote host.
///
/// `Debug` is redacted and the buffer is wiped on drop.
#[derive(Clone, Deserialize, Default)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building request headers and remote URLs.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

impl Drop for Token {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// The invoking identity: a user login and its token.
#[derive(Debug, Clone)]
pub struct Credentials {
    user: String,
    token: Token,
}

impl Credentials {
    /// Create credentials, rejecting empty components.
    pub fn new(user: &str, token: Token) -> Result<Self, ValidationError> {
        if user.is_empty() {
            return Err(ValidationError::MissingField("gitHubUser"));
        }
        if token.is_empty() {
            return Err(ValidationError::MissingField("gitHubToken"));
        }
        Ok(Self {
            user: user.to_string(),
            token,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

/// Account that will own a newly created repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOwner {
    /// The authenticated user's own account.
    User,
    /// An organization the user belongs to.
    Organization(String),
}

impl RepositoryOwner {
    /// The organization when it differs from the invoking user, otherwise the
    /// user's own account.
    pub fn for_target(user: &str, target_owner: &str) -> Self {
        if user == target_owner {
            Self::User
        } else {
            Self::Organization(target_owner.to_string())
        }
    }
}
