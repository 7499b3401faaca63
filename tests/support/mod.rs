//! Test support utilities for gitops-api integration tests.
//!
//! Provides local bare repositories standing in for the hosted ones, an
//! in-memory repository host, and helpers to inspect what was pushed.

#![allow(dead_code)]

pub mod assertions;
pub mod fake_host;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fake_host::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use assert_cmd::cargo::CommandCargoExt;
use gitops_api::core::constants;
use gitops_api::core::document::YamlEditor;
use gitops_api::core::pipeline::{Pipeline, PipelineSettings};
use gitops_api::core::vcs::{GitCli, VersionControl};
use gitops_api::core::workspace::WorkspaceManager;
use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// `remotes/<owner>/<name>` hold bare repositories reachable through a
/// `file://` base URL; `workspaces/` is the pipeline's workspace root so
/// tests can check nothing is left behind.
pub struct Test {
    pub dir: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("remotes")).unwrap();
        std::fs::create_dir_all(dir.path().join("workspaces")).unwrap();
        Self { dir }
    }

    pub fn remotes(&self) -> PathBuf {
        self.dir.path().join("remotes")
    }

    pub fn workspaces(&self) -> PathBuf {
        self.dir.path().join("workspaces")
    }

    /// `file://` URL of the remotes root.
    pub fn git_url(&self) -> String {
        format!("file://{}", self.remotes().display())
    }

    pub fn bare_repo(&self, owner: &str, name: &str) -> PathBuf {
        self.remotes().join(owner).join(name)
    }

    /// Create `owner/name` with one commit containing `cluster.yaml`.
    pub fn seed(&self, owner: &str, name: &str, spec: &str) {
        let work = self.dir.path().join(format!("seed-{}-{}", owner, name));
        std::fs::create_dir_all(&work).unwrap();
        git(&work, &["init", "-q"]);
        git(&work, &["checkout", "-q", "-b", "main"]);
        std::fs::write(work.join(constants::SPEC_FILE), spec).unwrap();
        git(&work, &["add", "."]);
        git(&work, &["commit", "-q", "-m", "initial"]);

        let bare = self.bare_repo(owner, name);
        std::fs::create_dir_all(bare.parent().unwrap()).unwrap();
        git(
            self.dir.path(),
            &["clone", "-q", "--bare", work.to_str().unwrap(), bare.to_str().unwrap()],
        );
        std::fs::remove_dir_all(&work).unwrap();
    }

    /// Push a commit to `owner/name` from outside the pipeline.
    pub fn push_external_commit(&self, owner: &str, name: &str) {
        let work = TempDir::new().unwrap();
        let checkout = work.path().join("c");
        git(
            work.path(),
            &["clone", "-q", self.bare_repo(owner, name).to_str().unwrap(), "c"],
        );
        std::fs::write(checkout.join("NOTES"), "someone else was here\n").unwrap();
        git(&checkout, &["add", "."]);
        git(&checkout, &["commit", "-q", "-m", "concurrent change"]);
        git(&checkout, &["push", "-q", "origin", "HEAD"]);
    }

    /// Contents of `cluster.yaml` on `main`.
    pub fn remote_spec(&self, owner: &str, name: &str) -> serde_yaml::Value {
        let out = git_dir(
            &self.bare_repo(owner, name),
            &["show", &format!("main:{}", constants::SPEC_FILE)],
        );
        serde_yaml::from_slice(&out.stdout).unwrap()
    }

    /// Number of commits on `main`, 0 if the branch doesn't exist.
    pub fn commit_count(&self, owner: &str, name: &str) -> usize {
        let out = Command::new("git")
            .arg("--git-dir")
            .arg(self.bare_repo(owner, name))
            .args(["rev-list", "--count", "refs/heads/main"])
            .output()
            .unwrap();
        if !out.status.success() {
            return 0;
        }
        String::from_utf8_lossy(&out.stdout).trim().parse().unwrap()
    }

    pub fn head(&self, owner: &str, name: &str) -> String {
        let out = git_dir(&self.bare_repo(owner, name), &["rev-parse", "refs/heads/main"]);
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    pub fn last_message(&self, owner: &str, name: &str) -> String {
        let out = git_dir(
            &self.bare_repo(owner, name),
            &["log", "-1", "--format=%s", "refs/heads/main"],
        );
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    /// Entries left in the workspace root.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.workspaces()).unwrap().count()
    }

    pub fn settings(&self) -> PipelineSettings {
        PipelineSettings {
            git_url: self.git_url(),
            spec_file: constants::SPEC_FILE.to_string(),
            topic: constants::MANAGED_CLUSTER_TOPIC.to_string(),
        }
    }

    pub fn git_cli() -> GitCli {
        GitCli::new("gitops-test", "gitops-test@example.com", Duration::from_secs(60))
            .expect("git not found")
    }

    /// A pipeline over the local remotes using the real git backend.
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline_with(Arc::new(Self::git_cli()))
    }

    pub fn pipeline_with(&self, vcs: Arc<dyn VersionControl>) -> Pipeline {
        Pipeline::new(
            self.settings(),
            vcs,
            Arc::new(YamlEditor),
            WorkspaceManager::new(Some(self.workspaces())),
        )
    }

    /// Create a command for the binary, isolated from any local config.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitops-api").unwrap();
        cmd.current_dir(self.dir.path())
            .env_remove("GITOPS_API_CONFIG")
            .env_remove("GITOPS_API_BIND")
            .env_remove("GITOPS_API_LOG")
            .env("NO_COLOR", "1");
        cmd
    }
}

/// Run git in a working tree with a fixed identity, asserting success.
pub fn git(dir: &Path, args: &[&str]) -> Output {
    let out = Command::new("git")
        .args([
            "-c",
            "user.name=seed",
            "-c",
            "user.email=seed@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert_success(&out);
    out
}

/// Run git against a bare repository, asserting success.
pub fn git_dir(repo: &Path, args: &[&str]) -> Output {
    let out = Command::new("git")
        .arg("--git-dir")
        .arg(repo)
        .args(args)
        .output()
        .expect("failed to run git");
    assert_success(&out);
    out
}
