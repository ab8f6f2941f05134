//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::ConsoleError;
use crate::server::handlers::{
    branches_handler, clear_deployment_logs_handler, deploy_handler, deployment_handler,
    deployment_logs_handler, health_handler, project_deployments_handler, project_handler,
    projects_handler, redeploy_handler, repositories_handler, version_handler,
};
use crate::server::state::ServerState;
use crate::server::ws::ws_handler;

/// Build the console router
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Source host
        .route("/api/repositories", get(repositories_handler))
        .route(
            "/api/repositories/{owner}/{repo}/branches",
            get(branches_handler),
        )
        // Projects
        .route("/api/projects", get(projects_handler))
        .route("/api/projects/{id}", get(project_handler))
        .route(
            "/api/projects/{id}/deployments",
            get(project_deployments_handler),
        )
        .route("/api/projects/{id}/deploy", post(redeploy_handler))
        // Deployments
        .route("/api/deploy", post(deploy_handler))
        .route("/api/deployments/{id}", get(deployment_handler))
        .route(
            "/api/deployments/{id}/logs",
            get(deployment_logs_handler).delete(clear_deployment_logs_handler),
        )
        // Live consoles
        .route("/ws", get(ws_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), ConsoleError>>, ConsoleError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| ConsoleError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ConsoleError::ServerError(e.to_string()))
    });

    Ok(handle)
}
