//! Deploy requests: validation, record creation and driver launch

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::deploy::driver::{Driver, RunTarget};
use crate::errors::{ConsoleError, ConsoleResult};
use crate::http::github::SourceHost;
use crate::models::{NewDeployment, NewProject, Project, ProjectStatus, RepositoryRef};
use crate::storage::Storage;
use crate::utils::placeholder_commit;

/// Body of a deploy request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default, rename = "type")]
    pub project_type: String,
}

impl DeployRequest {
    pub fn validate(&self) -> ConsoleResult<NewProject> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ConsoleError::ValidationError("name is required".to_string()));
        }
        if self.repository.trim().is_empty() {
            return Err(ConsoleError::ValidationError(
                "repository is required".to_string(),
            ));
        }
        let branch = self.branch.trim();
        if branch.is_empty() {
            return Err(ConsoleError::ValidationError("branch is required".to_string()));
        }

        let repository: RepositoryRef = self
            .repository
            .parse()
            .map_err(ConsoleError::ValidationError)?;
        let project_type = self
            .project_type
            .parse()
            .map_err(ConsoleError::ValidationError)?;

        Ok(NewProject {
            name: name.to_string(),
            repository,
            branch: branch.to_string(),
            project_type,
        })
    }
}

/// Returned as soon as the deployment record exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployTicket {
    pub project_id: String,
    pub deployment_id: String,
    pub message: String,
}

/// Turns deploy requests into records and driver runs
pub struct Deployer {
    storage: Arc<dyn Storage>,
    source: Arc<dyn SourceHost>,
    driver: Arc<Driver>,
}

impl Deployer {
    pub fn new(storage: Arc<dyn Storage>, source: Arc<dyn SourceHost>, driver: Arc<Driver>) -> Self {
        Self {
            storage,
            source,
            driver,
        }
    }

    pub fn driver(&self) -> &Arc<Driver> {
        &self.driver
    }

    /// Create a project from `request` and start its first deployment
    pub async fn deploy(&self, request: DeployRequest) -> ConsoleResult<DeployTicket> {
        let new_project = request.validate()?;
        let project = self.storage.create_project(new_project).await?;
        info!(
            "Created project {} ({}) from {}",
            project.id, project.name, project.repository
        );
        self.start(project).await
    }

    /// Start a new deployment of an existing project
    pub async fn redeploy(&self, project_id: &str) -> ConsoleResult<DeployTicket> {
        let project = self
            .storage
            .get_project(project_id)
            .await?
            .ok_or_else(|| ConsoleError::NotFound(format!("project {}", project_id)))?;

        if project.status == ProjectStatus::Deploying {
            return Err(ConsoleError::Conflict(format!(
                "project {} already has a deployment in progress",
                project_id
            )));
        }

        self.start(project).await
    }

    /// Record a pending deployment and launch its run without waiting for it
    async fn start(&self, project: Project) -> ConsoleResult<DeployTicket> {
        let commit_hash = self.resolve_commit(&project).await;
        let deployment = self
            .storage
            .create_deployment(NewDeployment {
                project_id: project.id.clone(),
                commit_hash: Some(commit_hash),
            })
            .await?;

        info!(
            "Created deployment {} for project {}",
            deployment.id, project.id
        );

        let ticket = DeployTicket {
            project_id: project.id.clone(),
            deployment_id: deployment.id.clone(),
            message: "Deployment started".to_string(),
        };

        self.driver.launch(RunTarget {
            deployment_id: deployment.id,
            project,
        });

        Ok(ticket)
    }

    /// Head commit of the project's branch, or a random placeholder when the
    /// source host cannot be reached
    async fn resolve_commit(&self, project: &Project) -> String {
        match self
            .source
            .branch_head(&project.repository, &project.branch)
            .await
        {
            Ok(sha) => sha,
            Err(e) => {
                warn!(
                    "Could not resolve head of {}@{}: {}",
                    project.repository, project.branch, e
                );
                placeholder_commit()
            }
        }
    }
}
