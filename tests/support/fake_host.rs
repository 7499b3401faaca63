//! In-memory repository host.
//!
//! Created repositories become empty bare repositories under the test's
//! remotes directory, so the pipeline can push to them with real git.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gitops_api::core::cipher::{RecipientKey, SecretKey};
use gitops_api::core::domain::{Credentials, RepoRef, RepositoryOwner, SealedSecret};
use gitops_api::core::remote::{
    Connector, NewRepository, RemoteHost, RepositoryHandle, RepositorySummary, WorkflowJob,
    WorkflowRun,
};
use gitops_api::error::{Error, Result};

/// Shared state behind every clone of a [`FakeHost`].
#[derive(Default)]
struct State {
    existing: HashSet<String>,
    created: Vec<(RepositoryOwner, NewRepository)>,
    topics: HashMap<String, Vec<String>>,
    secrets: Vec<SealedSecret>,
    search_results: Vec<RepositorySummary>,
    runs: HashMap<String, (WorkflowRun, Vec<WorkflowJob>)>,
    calls: Vec<String>,
}

/// A host that records every call.
#[derive(Clone)]
pub struct FakeHost {
    user: String,
    remotes: PathBuf,
    secret_key: Arc<SecretKey>,
    key_fetches: Arc<AtomicUsize>,
    state: Arc<Mutex<State>>,
}

impl FakeHost {
    pub fn new(user: &str, remotes: PathBuf) -> Self {
        Self {
            user: user.to_string(),
            remotes,
            secret_key: Arc::new(SecretKey::from([7u8; 32])),
            key_fetches: Arc::new(AtomicUsize::new(0)),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Private half of the repository secret key.
    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    /// Pretend `owner/name` already exists.
    pub fn add_existing(&self, owner: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .existing
            .insert(format!("{}/{}", owner, name));
    }

    pub fn add_search_result(&self, full_name: &str, topics: &[&str]) {
        self.state.lock().unwrap().search_results.push(RepositorySummary {
            repo: RepoRef::parse(full_name).unwrap(),
            topics: topics.iter().map(|t| t.to_string()).collect(),
        });
    }

    pub fn add_run(&self, full_name: &str, run: WorkflowRun, jobs: Vec<WorkflowJob>) {
        self.state
            .lock()
            .unwrap()
            .runs
            .insert(full_name.to_string(), (run, jobs));
    }

    pub fn created(&self) -> Vec<(RepositoryOwner, NewRepository)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn topics(&self, full_name: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().topics.get(full_name).cloned()
    }

    pub fn secrets(&self) -> Vec<SealedSecret> {
        self.state.lock().unwrap().secrets.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }
}

#[async_trait]
impl RemoteHost for FakeHost {
    async fn create_repository(
        &self,
        owner: &RepositoryOwner,
        settings: &NewRepository,
    ) -> Result<RepositoryHandle> {
        self.record("create_repository");
        let owner_name = match owner {
            RepositoryOwner::User => self.user.clone(),
            RepositoryOwner::Organization(org) => org.clone(),
        };
        let full_name = format!("{}/{}", owner_name, settings.name);

        {
            let mut state = self.state.lock().unwrap();
            if !state.existing.insert(full_name.clone()) {
                return Err(Error::Conflict {
                    operation: "create repository".to_string(),
                    reason: "name already exists on this account".to_string(),
                });
            }
            state.created.push((owner.clone(), settings.clone()));
        }

        let bare = self.remotes.join(&owner_name).join(&settings.name);
        std::fs::create_dir_all(&bare).unwrap();
        let status = Command::new("git")
            .args(["init", "-q", "--bare"])
            .arg(&bare)
            .status()
            .unwrap();
        assert!(status.success());

        Ok(RepositoryHandle {
            repo: RepoRef::parse(&full_name).unwrap(),
            clone_url: format!("file://{}", bare.display()),
        })
    }

    async fn set_topics(&self, repo: &RepoRef, topics: &[String]) -> Result<()> {
        self.record("set_topics");
        self.state
            .lock()
            .unwrap()
            .topics
            .insert(repo.to_string(), topics.to_vec());
        Ok(())
    }

    async fn public_key(&self, _repo: &RepoRef) -> Result<RecipientKey> {
        self.record("public_key");
        let n = self.key_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(RecipientKey::from_bytes(
            format!("key-{}", n),
            self.secret_key.public_key().as_bytes(),
        )?)
    }

    async fn upload_secret(&self, _repo: &RepoRef, secret: &SealedSecret) -> Result<()> {
        self.record(format!("upload_secret:{}", secret.name()));
        self.state.lock().unwrap().secrets.push(secret.clone());
        Ok(())
    }

    async fn search_by_topic(&self, _topic: &str) -> Result<Vec<RepositorySummary>> {
        self.record("search_by_topic");
        Ok(self.state.lock().unwrap().search_results.clone())
    }

    async fn latest_workflow_run(&self, repo: &RepoRef) -> Result<Option<WorkflowRun>> {
        self.record("latest_workflow_run");
        Ok(self
            .state
            .lock()
            .unwrap()
            .runs
            .get(&repo.to_string())
            .map(|(run, _)| run.clone()))
    }

    async fn workflow_jobs(&self, repo: &RepoRef, _run_id: u64) -> Result<Vec<WorkflowJob>> {
        self.record("workflow_jobs");
        Ok(self
            .state
            .lock()
            .unwrap()
            .runs
            .get(&repo.to_string())
            .map(|(_, jobs)| jobs.clone())
            .unwrap_or_default())
    }
}

/// Hands out clones of one [`FakeHost`].
pub struct FakeConnector(pub FakeHost);

impl Connector for FakeConnector {
    fn connect(&self, _credentials: &Credentials) -> Result<Box<dyn RemoteHost>> {
        Ok(Box::new(self.0.clone()))
    }
}
