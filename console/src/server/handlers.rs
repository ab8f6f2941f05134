//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::deploy::trigger::{DeployRequest, DeployTicket};
use crate::errors::ConsoleError;
use crate::http::github::{Branch, Repository};
use crate::models::{Deployment, LogEntry, Project, RepositoryRef};
use crate::server::state::ServerState;
use crate::utils::version_info;

/// Error body returned by every failing handler
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ConsoleError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConsoleError::NotFound(_) => StatusCode::NOT_FOUND,
            ConsoleError::ValidationError(_) | ConsoleError::JsonError(_) => {
                StatusCode::BAD_REQUEST
            }
            ConsoleError::Conflict(_) => StatusCode::CONFLICT,
            ConsoleError::SourceHostError(_)
            | ConsoleError::ProviderError(_)
            | ConsoleError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ConsoleError::NotFound(_) => "Not found",
            ConsoleError::ValidationError(_) | ConsoleError::JsonError(_) => "Validation error",
            ConsoleError::Conflict(_) => "Conflict",
            ConsoleError::SourceHostError(_)
            | ConsoleError::ProviderError(_)
            | ConsoleError::HttpError(_) => "Upstream error",
            ConsoleError::ConfigError(_) => "Configuration error",
            _ => "Internal error",
        }
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        let body = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ConsoleError>;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "deployhub-console".to_string(),
        version: version.version,
    })
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    Json(version_info())
}

// ================================ SOURCE HOST ==================================== //

pub async fn repositories_handler(
    State(state): State<Arc<ServerState>>,
) -> ApiResult<Vec<Repository>> {
    Ok(Json(state.source.list_repositories().await?))
}

pub async fn branches_handler(
    State(state): State<Arc<ServerState>>,
    Path((owner, repo)): Path<(String, String)>,
) -> ApiResult<Vec<Branch>> {
    let repository = RepositoryRef::new(owner, repo);
    Ok(Json(state.source.list_branches(&repository).await?))
}

// ================================== PROJECTS ===================================== //

pub async fn projects_handler(State(state): State<Arc<ServerState>>) -> ApiResult<Vec<Project>> {
    Ok(Json(state.storage.list_projects().await?))
}

pub async fn project_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Project> {
    let project = state
        .storage
        .get_project(&id)
        .await?
        .ok_or_else(|| ConsoleError::NotFound(format!("project {}", id)))?;
    Ok(Json(project))
}

pub async fn project_deployments_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Deployment>> {
    Ok(Json(state.storage.list_deployments(Some(&id)).await?))
}

pub async fn redeploy_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<DeployTicket> {
    Ok(Json(state.deployer.redeploy(&id).await?))
}

// ================================= DEPLOYMENTS =================================== //

pub async fn deployment_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Deployment> {
    let deployment = state
        .storage
        .get_deployment(&id)
        .await?
        .ok_or_else(|| ConsoleError::NotFound(format!("deployment {}", id)))?;
    Ok(Json(deployment))
}

pub async fn deployment_logs_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<LogEntry>> {
    Ok(Json(state.broadcaster.history(&id).await?))
}

pub async fn clear_deployment_logs_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ConsoleError> {
    state.broadcaster.clear(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body is taken as raw JSON so that shape errors surface as 400s with the
/// console's error body
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<serde_json::Value>,
) -> ApiResult<DeployTicket> {
    let request: DeployRequest = serde_json::from_value(body)
        .map_err(|e| ConsoleError::ValidationError(e.to_string()))?;
    Ok(Json(state.deployer.deploy(request).await?))
}
