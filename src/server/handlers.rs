//! Endpoint handlers.
//!
//! Each handler validates its body, connects a host client for the caller,
//! runs one operation and maps the outcome to a response body.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::info;

use super::error::ApiError;
use super::messages::{
    CloneRequest, CloneResponse, ClustersResponse, ListRequest, MutationResponse,
    ProfilesRequest, RunStatusResponse, StateRequest, StatusRequest,
};
use super::AppState;
use crate::core::domain::{ClusterState, ClusterStatus, MutationOutcome, RunReport};
use crate::core::pipeline::TemplateClone;
use crate::core::status::StatusReporter;
use crate::error::Result;

const NOTHING_TO_DO: &str = "No change. Nothing to do.";

pub async fn clone_from_template(
    State(state): State<AppState>,
    body: Result<Json<CloneRequest>, JsonRejection>,
) -> Result<Json<CloneResponse>, ApiError> {
    let Json(req) = body?;
    let commit = run_clone(&state, req)
        .await
        .map_err(ApiError::failed("Template cloning failed"))?;

    Ok(Json(CloneResponse {
        result: "Template cloning successfully".to_string(),
        commit,
    }))
}

async fn run_clone(state: &AppState, req: CloneRequest) -> Result<String> {
    let credentials = req.identity.credentials()?;
    let request = TemplateClone::new(
        req.template()?,
        req.target.repo()?,
        &req.secrets,
        &credentials,
    )?;
    info!(template = %request.template, target = %request.target, "clone from template");

    let host = state.connector.connect(&credentials)?;
    state
        .pipeline
        .clone_from_template(host.as_ref(), &credentials, &request)
        .await
}

pub async fn change_state(
    State(state): State<AppState>,
    body: Result<Json<StateRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(req) = body?;
    let (cluster_state, outcome) = run_state(&state, req)
        .await
        .map_err(ApiError::failed("Cluster state change failed"))?;

    Ok(Json(mutation_response(
        outcome,
        format!("Cluster desired state changed to {}", cluster_state),
    )))
}

async fn run_state(state: &AppState, req: StateRequest) -> Result<(ClusterState, MutationOutcome)> {
    let credentials = req.identity.credentials()?;
    let target = req.target.repo()?;
    let cluster_state: ClusterState = req.cluster_state.parse()?;
    info!(repo = %target, state = %cluster_state, "change cluster state");

    let outcome = state
        .pipeline
        .change_state(&credentials, &target, cluster_state)
        .await?;
    Ok((cluster_state, outcome))
}

pub async fn apply_profiles(
    State(state): State<AppState>,
    body: Result<Json<ProfilesRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(req) = body?;
    let outcome = run_profiles(&state, req)
        .await
        .map_err(ApiError::failed("Cluster profiles apply failed"))?;

    Ok(Json(mutation_response(outcome, "Profiles applied".to_string())))
}

async fn run_profiles(state: &AppState, req: ProfilesRequest) -> Result<MutationOutcome> {
    let credentials = req.identity.credentials()?;
    let target = req.target.repo()?;
    info!(repo = %target, profiles = req.profiles.len(), "apply profiles");

    state
        .pipeline
        .apply_profiles(&credentials, &target, &req.profiles)
        .await
}

pub async fn run_status(
    State(state): State<AppState>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<RunStatusResponse>, ApiError> {
    let Json(req) = body?;
    let report = fetch_run_status(&state, req)
        .await
        .map_err(ApiError::failed("Fail to get cluster status"))?;

    Ok(Json(RunStatusResponse {
        status: report.status,
        conclusion: report.conclusion,
        result: report.steps,
        link: report.link,
    }))
}

async fn fetch_run_status(state: &AppState, req: StatusRequest) -> Result<RunReport> {
    let credentials = req.identity.credentials()?;
    let target = req.target.repo()?;
    let host = state.connector.connect(&credentials)?;
    StatusReporter::new(host.as_ref(), &state.pipeline.settings().topic)
        .run_status(&target)
        .await
}

pub async fn list_clusters(
    State(state): State<AppState>,
    body: Result<Json<ListRequest>, JsonRejection>,
) -> Result<Json<ClustersResponse>, ApiError> {
    let Json(req) = body?;
    let clusters = fetch_clusters(&state, req)
        .await
        .map_err(ApiError::failed("Fail to list clusters and their status"))?;

    Ok(Json(ClustersResponse { result: clusters }))
}

async fn fetch_clusters(state: &AppState, req: ListRequest) -> Result<Vec<ClusterStatus>> {
    let credentials = req.identity.credentials()?;
    let host = state.connector.connect(&credentials)?;
    StatusReporter::new(host.as_ref(), &state.pipeline.settings().topic)
        .list_clusters()
        .await
}

fn mutation_response(outcome: MutationOutcome, changed_message: String) -> MutationResponse {
    match outcome {
        MutationOutcome::Unchanged => MutationResponse {
            result: NOTHING_TO_DO.to_string(),
            changed: false,
            commit: None,
        },
        MutationOutcome::Pushed { commit } => MutationResponse {
            result: changed_message,
            changed: true,
            commit: Some(commit),
        },
    }
}
