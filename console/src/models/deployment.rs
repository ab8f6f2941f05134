//! Deployment models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deployment status.
///
/// Moves strictly forward: pending, building, deploying, then success or
/// failed. See [`crate::deploy::fsm::DeploymentFsm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    #[default]
    Pending,
    Building,
    Deploying,
    Success,
    Failed,
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Success | DeploymentStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Building => "building",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failed => "failed",
        }
    }
}

/// One deployment run of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Unique deployment ID
    pub id: String,

    /// Owning project
    pub project_id: String,

    pub status: DeploymentStatus,

    /// Head commit of the branch at request time, or a placeholder token
    pub commit_hash: Option<String>,

    pub started_at: DateTime<Utc>,

    /// Set once, on entering success or failed
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields supplied when creating a deployment
#[derive(Debug, Clone)]
pub struct NewDeployment {
    pub project_id: String,
    pub commit_hash: Option<String>,
}

/// Shallow partial update of a deployment
#[derive(Debug, Clone, Default)]
pub struct DeploymentUpdate {
    pub status: Option<DeploymentStatus>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl DeploymentUpdate {
    pub fn status(status: DeploymentStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Terminal update: status plus completion time
    pub fn completed(status: DeploymentStatus, at: DateTime<Utc>) -> Self {
        Self {
            status: Some(status),
            completed_at: Some(at),
        }
    }

    pub fn apply(self, deployment: &mut Deployment) {
        if let Some(status) = self.status {
            deployment.status = status;
        }
        if let Some(completed_at) = self.completed_at {
            deployment.completed_at = Some(completed_at);
        }
    }
}
