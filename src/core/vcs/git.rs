//! [`VersionControl`] backed by the `git` executable.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use super::remote_url::scrub_userinfo;
use super::{RemoteUrl, VersionControl};
use crate::core::config::Config;
use crate::core::types::CommitId;
use crate::error::{Error, Result, WorkspaceError};

/// Whether a git invocation talks to a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    Local,
    Network,
}

/// Runs git as a child process, one invocation per operation.
///
/// Interactive credential prompts are disabled, so a missing or rejected
/// token fails fast instead of hanging. Children are killed when the
/// calling future is dropped or the timeout elapses.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: PathBuf,
    committer_name: String,
    committer_email: String,
    timeout: Duration,
}

impl GitCli {
    /// Locate `git` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `WorkspaceError::GitNotFound` if no executable is found.
    pub fn new(committer_name: &str, committer_email: &str, timeout: Duration) -> Result<Self> {
        let program =
            which::which("git").map_err(|e| WorkspaceError::GitNotFound(e.to_string()))?;
        debug!(program = %program.display(), "using git executable");
        Ok(Self {
            program,
            committer_name: committer_name.to_string(),
            committer_email: committer_email.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.git.committer_name,
            &config.git.committer_email,
            config.git_timeout(),
        )
    }

    /// Spawn git and wait for it, bounded by the timeout.
    async fn exec(&self, dir: &Path, args: &[&str], reach: Reach) -> Result<Output> {
        let operation = describe(args);
        trace!(operation = %operation, dir = %dir.display(), "running git");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(WorkspaceError::Git {
                command: operation,
                stderr: e.to_string(),
            }
            .into()),
            Err(_) => {
                let reason = format!("timed out after {:?}", self.timeout);
                Err(match reach {
                    Reach::Network => Error::remote_unavailable(&operation, reason),
                    Reach::Local => WorkspaceError::Git {
                        command: operation,
                        stderr: reason,
                    }
                    .into(),
                })
            }
        }
    }

    /// Run git and return trimmed stdout, classifying failures.
    async fn run(&self, dir: &Path, args: &[&str], reach: Reach) -> Result<String> {
        let output = self.exec(dir, args, reach).await?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = scrub_userinfo(&format!("{}\n{}", stderr.trim(), stdout.trim()));
        Err(classify(&describe(args), reach, combined.trim()))
    }

    fn identity_args(&self) -> [String; 6] {
        [
            "-c".to_string(),
            format!("user.name={}", self.committer_name),
            "-c".to_string(),
            format!("user.email={}", self.committer_email),
            "-c".to_string(),
            "commit.gpgsign=false".to_string(),
        ]
    }
}

#[async_trait]
impl VersionControl for GitCli {
    async fn clone_repo(&self, url: &RemoteUrl, dest: &Path) -> Result<()> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        let dest = dest.to_string_lossy();
        debug!(url = %url, "cloning");
        self.run(
            parent,
            &["clone", "--quiet", url.expose(), dest.as_ref()],
            Reach::Network,
        )
        .await?;
        Ok(())
    }

    async fn add_remote(&self, repo: &Path, name: &str, url: &RemoteUrl) -> Result<()> {
        debug!(remote = name, url = %url, "adding remote");
        self.run(repo, &["remote", "add", name, url.expose()], Reach::Local)
            .await?;
        Ok(())
    }

    async fn head(&self, repo: &Path) -> Result<Option<CommitId>> {
        let output = self
            .exec(repo, &["rev-parse", "--verify", "--quiet", "HEAD"], Reach::Local)
            .await?;
        if !output.status.success() {
            return Ok(None);
        }
        let head = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!head.is_empty()).then_some(head))
    }

    async fn current_branch(&self, repo: &Path) -> Result<String> {
        self.run(repo, &["symbolic-ref", "--short", "HEAD"], Reach::Local)
            .await
    }

    async fn commit_all(&self, repo: &Path, message: &str) -> Result<CommitId> {
        let identity = self.identity_args();
        let mut args: Vec<&str> = identity.iter().map(String::as_str).collect();
        args.extend(["commit", "--all", "--quiet", "--message", message]);
        self.run(repo, &args, Reach::Local).await?;

        let commit = self.run(repo, &["rev-parse", "HEAD"], Reach::Local).await?;
        debug!(commit = %commit, "committed");
        Ok(commit)
    }

    async fn remote_head(&self, repo: &Path, remote: &str, branch: &str) -> Result<Option<CommitId>> {
        let refname = format!("refs/heads/{}", branch);
        let listing = self
            .run(repo, &["ls-remote", remote, &refname], Reach::Network)
            .await?;
        Ok(parse_ls_remote(&listing, &refname))
    }

    async fn push(&self, repo: &Path, remote: &str, branch: &str) -> Result<()> {
        let refspec = format!("HEAD:refs/heads/{}", branch);
        debug!(remote, branch, "pushing");
        self.run(repo, &["push", "--porcelain", remote, &refspec], Reach::Network)
            .await?;
        Ok(())
    }
}

/// `git <subcommand>` without arguments that may carry URLs or messages.
fn describe(args: &[&str]) -> String {
    let mut iter = args.iter().peekable();
    while iter.peek() == Some(&&"-c") {
        iter.next();
        iter.next();
    }
    match iter.next() {
        Some(sub) => format!("git {}", sub),
        None => "git".to_string(),
    }
}

fn parse_ls_remote(listing: &str, refname: &str) -> Option<CommitId> {
    listing.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let commit = parts.next()?;
        (parts.next()? == refname).then(|| commit.to_string())
    })
}

const CONFLICT_MARKERS: &[&str] = &["[rejected]", "non-fast-forward", "fetch first", "stale info"];

const AUTH_MARKERS: &[&str] = &[
    "authentication failed",
    "could not read username",
    "could not read password",
    "invalid username or password",
    "permission denied",
    "[remote rejected]",
    "403",
    "401",
];

const NOT_FOUND_MARKERS: &[&str] = &["repository not found", "does not appear to be a git repository"];

/// Map a failed invocation to the error taxonomy.
fn classify(operation: &str, reach: Reach, output: &str) -> Error {
    if reach == Reach::Local {
        return WorkspaceError::Git {
            command: operation.to_string(),
            stderr: output.to_string(),
        }
        .into();
    }

    let lower = output.to_lowercase();
    let has = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));
    let reason = summary(output);

    if has(CONFLICT_MARKERS) {
        Error::conflict(operation, reason)
    } else if has(AUTH_MARKERS) {
        Error::authorization(operation, reason)
    } else if has(NOT_FOUND_MARKERS) {
        Error::not_found(operation, reason)
    } else {
        Error::remote_unavailable(operation, reason)
    }
}

/// The most specific line of git's output.
fn summary(output: &str) -> String {
    output
        .lines()
        .map(str::trim)
        .rfind(|l| l.starts_with("fatal:") || l.starts_with("error:") || l.starts_with('!'))
        .or_else(|| output.lines().map(str::trim).rfind(|l| !l.is_empty()))
        .unwrap_or("git failed without output")
        .to_string()
}
