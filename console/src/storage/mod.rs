//! Project, deployment and console-history storage
//!
//! The orchestration core only talks to [`Storage`]. Records have
//! shallow-merge update semantics and no policy: keeping the project and
//! deployment invariants is the driver's job.

pub mod memory;
pub mod settings;

use async_trait::async_trait;

use crate::errors::ConsoleResult;
use crate::models::{
    Deployment, DeploymentUpdate, LogEntry, NewDeployment, NewProject, Project, ProjectUpdate,
};

pub use memory::MemStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    /// All projects, most recently deployed first; never-deployed last
    async fn list_projects(&self) -> ConsoleResult<Vec<Project>>;

    async fn get_project(&self, id: &str) -> ConsoleResult<Option<Project>>;

    /// Create a project in the `idle` status with a fresh ID
    async fn create_project(&self, project: NewProject) -> ConsoleResult<Project>;

    /// Merge `update` into the project. `Ok(None)` when it does not exist.
    async fn update_project(
        &self,
        id: &str,
        update: ProjectUpdate,
    ) -> ConsoleResult<Option<Project>>;

    /// Deployments, optionally of one project, newest first
    async fn list_deployments(&self, project_id: Option<&str>) -> ConsoleResult<Vec<Deployment>>;

    async fn get_deployment(&self, id: &str) -> ConsoleResult<Option<Deployment>>;

    /// Create a `pending` deployment starting now, with an empty console history
    async fn create_deployment(&self, deployment: NewDeployment) -> ConsoleResult<Deployment>;

    /// Merge `update` into the deployment. `Ok(None)` when it does not exist.
    async fn update_deployment(
        &self,
        id: &str,
        update: DeploymentUpdate,
    ) -> ConsoleResult<Option<Deployment>>;

    /// Console history of a deployment, oldest first
    async fn get_deployment_logs(&self, deployment_id: &str) -> ConsoleResult<Vec<LogEntry>>;

    async fn add_deployment_log(&self, deployment_id: &str, entry: LogEntry) -> ConsoleResult<()>;

    async fn clear_deployment_logs(&self, deployment_id: &str) -> ConsoleResult<()>;
}
