//! GitHub REST v3 implementation of [`RemoteHost`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{
    Connector, NewRepository, RemoteHost, RepositoryHandle, RepositorySummary, WorkflowJob,
    WorkflowRun,
};
use crate::core::cipher::RecipientKey;
use crate::core::config::Config;
use crate::core::domain::{Credentials, RepoRef, RepositoryOwner, SealedSecret, Token};
use crate::error::{Error, Result, ValidationError};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const SEARCH_PAGE_SIZE: &str = "50";

/// Shares one connection pool across requests; credentials stay per client.
#[derive(Debug, Clone)]
pub struct GitHubConnector {
    http: Client,
    api_url: String,
}

impl GitHubConnector {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gitops-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::remote_unavailable("connect", e))?;
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.github.api_url, config.github_timeout())
    }
}

impl Connector for GitHubConnector {
    fn connect(&self, credentials: &Credentials) -> Result<Box<dyn RemoteHost>> {
        Ok(Box::new(GitHubClient {
            http: self.http.clone(),
            api_url: self.api_url.clone(),
            token: credentials.token().clone(),
        }))
    }
}

/// A GitHub client acting as one user.
#[derive(Debug)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: Token,
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    description: &'a str,
}

#[derive(Deserialize)]
struct RepoResponse {
    full_name: String,
    clone_url: String,
}

#[derive(Serialize)]
struct TopicsRequest<'a> {
    names: &'a [String],
}

#[derive(Deserialize)]
struct PublicKeyResponse {
    key_id: String,
    key: String,
}

#[derive(Serialize)]
struct SecretRequest<'a> {
    encrypted_value: &'a str,
    key_id: &'a str,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    full_name: String,
    #[serde(default)]
    topics: Vec<String>,
}

#[derive(Deserialize)]
struct RunsResponse {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

#[derive(Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<WorkflowJob>,
}

#[derive(Deserialize)]
struct ApiMessage {
    message: String,
    /// Per-field details; entries are objects with a `message` or bare strings.
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// A non-success response, read once.
struct Failure {
    status: StatusCode,
    body: Option<ApiMessage>,
}

impl Failure {
    async fn read(response: Response) -> Self {
        let status = response.status();
        let body = response.json::<ApiMessage>().await.ok();
        Self { status, body }
    }

    fn details(&self) -> impl Iterator<Item = &str> {
        self.body.iter().flat_map(|b| &b.errors).filter_map(|e| {
            e.get("message")
                .and_then(serde_json::Value::as_str)
                .or_else(|| e.as_str())
        })
    }

    /// `<status>: <message> (<detail>; ...)`, or the bare status.
    fn message(&self) -> String {
        let Some(body) = &self.body else {
            return self.status.to_string();
        };
        let details: Vec<&str> = self.details().collect();
        if details.is_empty() {
            format!("{}: {}", self.status, body.message)
        } else {
            format!("{}: {} ({})", self.status, body.message, details.join("; "))
        }
    }

    fn name_taken(&self) -> bool {
        let coded = self.body.iter().flat_map(|b| &b.errors).any(|e| {
            e.get("code").and_then(serde_json::Value::as_str) == Some("already_exists")
        });
        coded || self.details().any(|d| d.contains("name already exists"))
    }

    fn into_error(self, operation: &str) -> Error {
        let message = self.message();
        status_error(operation, self.status, message)
    }
}

impl GitHubClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(self.token.expose())
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn dispatch(&self, operation: &str, builder: RequestBuilder) -> Result<Response> {
        trace!(operation, "calling GitHub");
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|e| Error::remote_unavailable(operation, transport_reason(e)))?;
        debug!(operation, status = response.status().as_u16(), "GitHub responded");
        Ok(response)
    }

    async fn send(&self, operation: &str, builder: RequestBuilder) -> Result<Response> {
        let response = self.dispatch(operation, builder).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Failure::read(response).await.into_error(operation))
    }

    async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::remote_unavailable(operation, format!("unexpected response: {}", e)))
    }

    fn repo_path(repo: &RepoRef, suffix: &str) -> String {
        format!("/repos/{}/{}{}", repo.owner(), repo.name(), suffix)
    }
}

#[async_trait]
impl RemoteHost for GitHubClient {
    async fn create_repository(
        &self,
        owner: &RepositoryOwner,
        settings: &NewRepository,
    ) -> Result<RepositoryHandle> {
        let operation = "create repository";
        let path = match owner {
            RepositoryOwner::User => "/user/repos".to_string(),
            RepositoryOwner::Organization(org) => format!("/orgs/{}/repos", org),
        };
        let body = CreateRepoRequest {
            name: &settings.name,
            private: settings.private,
            description: &settings.description,
        };

        let response = self
            .dispatch(operation, self.http.post(self.url(&path)).json(&body))
            .await?;
        if !response.status().is_success() {
            let failure = Failure::read(response).await;
            return Err(match failure.status {
                StatusCode::UNPROCESSABLE_ENTITY if failure.name_taken() => {
                    Error::conflict(operation, failure.message())
                }
                StatusCode::UNPROCESSABLE_ENTITY => ValidationError::InvalidField {
                    field: "targetRepo",
                    reason: failure.message(),
                }
                .into(),
                _ => failure.into_error(operation),
            });
        }
        let created: RepoResponse = Self::decode(operation, response).await?;

        let repo = RepoRef::parse(&created.full_name)?;
        debug!(repo = %repo, "repository created");
        Ok(RepositoryHandle {
            repo,
            clone_url: created.clone_url,
        })
    }

    async fn set_topics(&self, repo: &RepoRef, topics: &[String]) -> Result<()> {
        let url = self.url(&Self::repo_path(repo, "/topics"));
        self.send("set topics", self.http.put(url).json(&TopicsRequest { names: topics }))
            .await?;
        Ok(())
    }

    async fn public_key(&self, repo: &RepoRef) -> Result<RecipientKey> {
        let operation = "get public key";
        let url = self.url(&Self::repo_path(repo, "/actions/secrets/public-key"));
        let response = self.send(operation, self.http.get(url)).await?;
        let key: PublicKeyResponse = Self::decode(operation, response).await?;
        Ok(RecipientKey::from_base64(key.key_id, &key.key)?)
    }

    async fn upload_secret(&self, repo: &RepoRef, secret: &SealedSecret) -> Result<()> {
        let url = self.url(&Self::repo_path(
            repo,
            &format!("/actions/secrets/{}", secret.name()),
        ));
        let body = SecretRequest {
            encrypted_value: secret.encrypted_value(),
            key_id: secret.key_id(),
        };
        self.send("upload secret", self.http.put(url).json(&body)).await?;
        debug!(repo = %repo, secret = secret.name(), "secret uploaded");
        Ok(())
    }

    async fn search_by_topic(&self, topic: &str) -> Result<Vec<RepositorySummary>> {
        let operation = "search repositories";
        let query = format!("topic:{}", topic);
        let request = self.http.get(self.url("/search/repositories")).query(&[
            ("q", query.as_str()),
            ("sort", "pushed"),
            ("order", "desc"),
            ("per_page", SEARCH_PAGE_SIZE),
        ]);
        let response = self.send(operation, request).await?;
        let found: SearchResponse = Self::decode(operation, response).await?;

        found
            .items
            .into_iter()
            .map(|item| {
                Ok::<_, Error>(RepositorySummary {
                    repo: RepoRef::parse(&item.full_name)?,
                    topics: item.topics,
                })
            })
            .collect()
    }

    async fn latest_workflow_run(&self, repo: &RepoRef) -> Result<Option<WorkflowRun>> {
        let operation = "list workflow runs";
        let url = self.url(&Self::repo_path(repo, "/actions/runs"));
        let response = self
            .send(operation, self.http.get(url).query(&[("per_page", "1")]))
            .await?;
        let runs: RunsResponse = Self::decode(operation, response).await?;
        Ok(runs.workflow_runs.into_iter().next())
    }

    async fn workflow_jobs(&self, repo: &RepoRef, run_id: u64) -> Result<Vec<WorkflowJob>> {
        let operation = "list workflow jobs";
        let url = self.url(&Self::repo_path(repo, &format!("/actions/runs/{}/jobs", run_id)));
        let response = self.send(operation, self.http.get(url)).await?;
        let jobs: JobsResponse = Self::decode(operation, response).await?;
        Ok(jobs.jobs)
    }
}

fn transport_reason(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e.without_url())
    } else {
        e.to_string()
    }
}

fn status_error(operation: &str, status: StatusCode, message: String) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::authorization(operation, message),
        StatusCode::NOT_FOUND => Error::not_found(operation, message),
        _ => Error::remote_unavailable(operation, message),
    }
}
