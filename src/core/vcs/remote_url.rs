//! Remote repository URLs that may embed credentials.

use std::fmt;

use url::Url;

use crate::core::domain::{Credentials, RepoRef};
use crate::error::{Result, ValidationError};

/// A clone/push URL.
///
/// HTTP(S) URLs can carry the caller's credentials as userinfo. `Display`
/// and `Debug` never show them; only [`RemoteUrl::expose`] does, for
/// handing the URL to git.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    url: Url,
}

impl RemoteUrl {
    /// Parse an absolute URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).map_err(|e| ValidationError::InvalidField {
            field: "url",
            reason: format!("{}: {}", scrub_userinfo(raw), e),
        })?;
        Ok(Self { url })
    }

    /// `<base>/<owner>/<name>` for a repository on the configured host.
    pub fn for_repo(base: &str, repo: &RepoRef) -> Result<Self> {
        Self::parse(&format!(
            "{}/{}/{}",
            base.trim_end_matches('/'),
            repo.owner(),
            repo.name()
        ))
    }

    /// Embed `user:token` for HTTP(S) remotes; other schemes are returned as is.
    pub fn with_credentials(mut self, credentials: &Credentials) -> Self {
        if matches!(self.url.scheme(), "http" | "https") {
            // Both setters only fail for URLs without a host, which http(s) always has.
            let _ = self.url.set_username(credentials.user());
            let _ = self.url.set_password(Some(credentials.token().expose()));
        }
        self
    }

    /// The full URL, credentials included.
    pub fn expose(&self) -> &str {
        self.url.as_str()
    }

    /// Whether credentials are embedded.
    pub fn has_credentials(&self) -> bool {
        self.url.password().is_some() || !self.url.username().is_empty()
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_credentials() {
            let mut url = self.url.clone();
            let _ = url.set_username("");
            let _ = url.set_password(None);
            f.write_str(url.as_str())
        } else {
            f.write_str(self.url.as_str())
        }
    }
}

impl fmt::Debug for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RemoteUrl({})", self)
    }
}

/// Replace `user:password@` in any URL inside `text` with `***@`.
pub(crate) fn scrub_userinfo(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("://") {
        let (head, tail) = rest.split_at(idx + 3);
        out.push_str(head);
        let authority_end = tail
            .find(|c: char| c == '/' || c == '\'' || c == '"' || c.is_whitespace())
            .unwrap_or(tail.len());
        match tail[..authority_end].rfind('@') {
            Some(at) => {
                out.push_str("***");
                rest = &tail[at..];
            }
            None => rest = tail,
        }
    }
    out.push_str(rest);
    out
}
