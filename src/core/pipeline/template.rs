//! Provisioning a new cluster repository from a template.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use super::Pipeline;
use crate::core::cipher;
use crate::core::constants;
use crate::core::document::Edit;
use crate::core::domain::{Credentials, RepoRef, RepositoryOwner, Secret};
use crate::core::remote::{NewRepository, RemoteHost};
use crate::core::types::CommitId;
use crate::core::vcs::RemoteUrl;
use crate::error::{Error, Result, ValidationError};

/// A validated clone-from-template request.
#[derive(Debug)]
pub struct TemplateClone {
    pub template: RepoRef,
    pub target: RepoRef,
    secrets: Vec<Secret>,
}

impl TemplateClone {
    /// Resolve the three delivered secrets from the request map.
    ///
    /// `awsAccessKeyId` and `awsSecretAccessKey` are required. `githubToken`
    /// falls back to the caller's own token. Other entries are ignored.
    pub fn new(
        template: RepoRef,
        target: RepoRef,
        provided: &HashMap<String, String>,
        credentials: &Credentials,
    ) -> Result<Self, ValidationError> {
        let required = |name: &'static str| -> Result<Secret, ValidationError> {
            match provided.get(name) {
                Some(value) if !value.is_empty() => Ok(Secret::new(name, value.as_str())),
                _ => Err(ValidationError::MissingSecret(name)),
            }
        };

        let scm_token = match provided.get(constants::SECRET_SCM_TOKEN) {
            Some(value) if !value.is_empty() => value.clone(),
            _ => credentials.token().expose().to_string(),
        };

        Ok(Self {
            template,
            target,
            secrets: vec![
                required(constants::SECRET_ACCESS_KEY_ID)?,
                required(constants::SECRET_SECRET_ACCESS_KEY)?,
                Secret::new(constants::SECRET_SCM_TOKEN, scm_token),
            ],
        })
    }

    pub fn secrets(&self) -> &[Secret] {
        &self.secrets
    }
}

impl Pipeline {
    /// Provision `request.target` from `request.template`.
    ///
    /// Clones the template, creates and tags the destination repository,
    /// renames the cluster and marks it absent, commits, uploads the sealed
    /// secrets and finally pushes, which triggers the first CI run.
    ///
    /// # Errors
    ///
    /// Returns `NoChange` if the template already describes the target,
    /// `Conflict` if the destination exists or already has the branch, and
    /// the remote, sealing and document errors of the underlying steps.
    #[instrument(skip_all, fields(template = %request.template, target = %request.target))]
    pub async fn clone_from_template(
        &self,
        host: &dyn RemoteHost,
        credentials: &Credentials,
        request: &TemplateClone,
    ) -> Result<CommitId> {
        let template_url = self.repo_url(&request.template, credentials)?;
        let checkout = self.checkout(&template_url).await?;

        let owner = RepositoryOwner::for_target(credentials.user(), request.target.owner());
        let name = request.target.name();
        let created = host
            .create_repository(
                &owner,
                &NewRepository {
                    name: name.to_string(),
                    private: true,
                    description: format!("{} repo", name),
                },
            )
            .await?;
        host.set_topics(&created.repo, &[self.settings.topic.clone()])
            .await?;
        debug!(repo = %created.repo, "destination created and tagged");

        let fork_url = RemoteUrl::parse(&created.clone_url)?.with_credentials(credentials);
        self.vcs
            .add_remote(&checkout.dir, constants::FORK_REMOTE, &fork_url)
            .await?;

        let edits = [
            Edit::set(constants::STATE_PATH, "absent"),
            Edit::set(constants::NAME_PATH, name),
        ];
        if !self.edit(&checkout, &edits)? {
            return Err(Error::NoChange);
        }
        let message = format!("set state to absent and change name to {}", name);
        let commit = self.vcs.commit_all(&checkout.dir, &message).await?;

        for secret in request.secrets() {
            deliver_secret(host, &created.repo, secret).await?;
        }

        self.push_guarded(&checkout, constants::FORK_REMOTE, None)
            .await?;
        info!(repo = %created.repo, commit = %commit, "cluster repository provisioned");
        Ok(commit)
    }
}

/// Seal against a freshly fetched key and upload.
async fn deliver_secret(host: &dyn RemoteHost, repo: &RepoRef, secret: &Secret) -> Result<()> {
    let key = host.public_key(repo).await?;
    let sealed = cipher::seal_secret(secret, &key)?;
    host.upload_secret(repo, &sealed).await?;
    debug!(repo = %repo, secret = secret.name(), key_id = key.key_id(), "secret delivered");
    Ok(())
}
