//! In-memory storage

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::errors::ConsoleResult;
use crate::models::{
    Deployment, DeploymentStatus, DeploymentUpdate, LogEntry, NewDeployment, NewProject, Project,
    ProjectStatus, ProjectUpdate,
};
use crate::storage::Storage;
use crate::utils::generate_uuid;

/// Process-local storage.
///
/// Each map sits behind its own lock and every update is a read-modify-write
/// under the write lock, so interleaved callers never observe a half-merged
/// record. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemStorage {
    projects: RwLock<HashMap<String, Project>>,
    deployments: RwLock<HashMap<String, Deployment>>,
    deployment_logs: RwLock<HashMap<String, Vec<LogEntry>>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn list_projects(&self) -> ConsoleResult<Vec<Project>> {
        let projects = self.projects.read().unwrap_or_else(|e| e.into_inner());
        let mut projects: Vec<Project> = projects.values().cloned().collect();
        projects.sort_by(|a, b| b.last_deployed_at.cmp(&a.last_deployed_at));
        Ok(projects)
    }

    async fn get_project(&self, id: &str) -> ConsoleResult<Option<Project>> {
        let projects = self.projects.read().unwrap_or_else(|e| e.into_inner());
        Ok(projects.get(id).cloned())
    }

    async fn create_project(&self, project: NewProject) -> ConsoleResult<Project> {
        let project = Project {
            id: generate_uuid(),
            name: project.name,
            repository: project.repository,
            branch: project.branch,
            project_type: project.project_type,
            status: ProjectStatus::Idle,
            deployed_url: None,
            last_deployed_at: None,
        };

        let mut projects = self.projects.write().unwrap_or_else(|e| e.into_inner());
        projects.insert(project.id.clone(), project.clone());
        debug!("Created project: {} ({})", project.name, project.id);
        Ok(project)
    }

    async fn update_project(
        &self,
        id: &str,
        update: ProjectUpdate,
    ) -> ConsoleResult<Option<Project>> {
        let mut projects = self.projects.write().unwrap_or_else(|e| e.into_inner());
        let Some(project) = projects.get_mut(id) else {
            return Ok(None);
        };

        update.apply(project);
        debug!("Updated project: {} ({}) - status: {:?}", project.name, id, project.status);
        Ok(Some(project.clone()))
    }

    async fn list_deployments(&self, project_id: Option<&str>) -> ConsoleResult<Vec<Deployment>> {
        let deployments = self.deployments.read().unwrap_or_else(|e| e.into_inner());
        let mut deployments: Vec<Deployment> = deployments
            .values()
            .filter(|d| project_id.map_or(true, |id| d.project_id == id))
            .cloned()
            .collect();
        deployments.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(deployments)
    }

    async fn get_deployment(&self, id: &str) -> ConsoleResult<Option<Deployment>> {
        let deployments = self.deployments.read().unwrap_or_else(|e| e.into_inner());
        Ok(deployments.get(id).cloned())
    }

    async fn create_deployment(&self, deployment: NewDeployment) -> ConsoleResult<Deployment> {
        let deployment = Deployment {
            id: generate_uuid(),
            project_id: deployment.project_id,
            status: DeploymentStatus::Pending,
            commit_hash: deployment.commit_hash,
            started_at: Utc::now(),
            completed_at: None,
        };

        {
            let mut deployments = self.deployments.write().unwrap_or_else(|e| e.into_inner());
            deployments.insert(deployment.id.clone(), deployment.clone());
        }
        {
            let mut logs = self.deployment_logs.write().unwrap_or_else(|e| e.into_inner());
            logs.insert(deployment.id.clone(), Vec::new());
        }

        debug!(
            "Created deployment: {} for project {}",
            deployment.id, deployment.project_id
        );
        Ok(deployment)
    }

    async fn update_deployment(
        &self,
        id: &str,
        update: DeploymentUpdate,
    ) -> ConsoleResult<Option<Deployment>> {
        let mut deployments = self.deployments.write().unwrap_or_else(|e| e.into_inner());
        let Some(deployment) = deployments.get_mut(id) else {
            return Ok(None);
        };

        update.apply(deployment);
        debug!("Updated deployment: {} - status: {}", id, deployment.status.as_str());
        Ok(Some(deployment.clone()))
    }

    async fn get_deployment_logs(&self, deployment_id: &str) -> ConsoleResult<Vec<LogEntry>> {
        let logs = self.deployment_logs.read().unwrap_or_else(|e| e.into_inner());
        Ok(logs.get(deployment_id).cloned().unwrap_or_default())
    }

    async fn add_deployment_log(&self, deployment_id: &str, entry: LogEntry) -> ConsoleResult<()> {
        let mut logs = self.deployment_logs.write().unwrap_or_else(|e| e.into_inner());
        logs.entry(deployment_id.to_string()).or_default().push(entry);
        Ok(())
    }

    async fn clear_deployment_logs(&self, deployment_id: &str) -> ConsoleResult<()> {
        let mut logs = self.deployment_logs.write().unwrap_or_else(|e| e.into_inner());
        logs.remove(deployment_id);
        Ok(())
    }
}
