//! Project models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of application a project builds into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Frontend,
    Backend,
    Fullstack,
}

impl ProjectType {
    /// Whether the build produces static frontend assets
    pub fn builds_assets(&self) -> bool {
        matches!(self, ProjectType::Frontend | ProjectType::Fullstack)
    }

    /// Whether the build compiles server-side code
    pub fn compiles_backend(&self) -> bool {
        matches!(self, ProjectType::Backend | ProjectType::Fullstack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Frontend => "frontend",
            ProjectType::Backend => "backend",
            ProjectType::Fullstack => "fullstack",
        }
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontend" => Ok(ProjectType::Frontend),
            "backend" => Ok(ProjectType::Backend),
            "fullstack" => Ok(ProjectType::Fullstack),
            _ => Err(format!(
                "invalid project type '{}', expected frontend, backend or fullstack",
                s
            )),
        }
    }
}

/// Project status as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Idle,
    Deploying,
    Deployed,
    Failed,
}

/// A source repository identified by its owner and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Browser URL of the repository on GitHub
    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(RepositoryRef::new(owner, name))
            }
            _ => Err(format!("invalid repository '{}', expected owner/name", s)),
        }
    }
}

impl Serialize for RepositoryRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepositoryRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A deployable project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub repository: RepositoryRef,
    pub branch: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub status: ProjectStatus,

    /// Set only while the latest deployment is a success
    pub deployed_url: Option<String>,

    /// Set only while the latest deployment is a success
    pub last_deployed_at: Option<DateTime<Utc>>,
}

/// Fields supplied when creating a project
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub repository: RepositoryRef,
    pub branch: String,
    pub project_type: ProjectType,
}

/// Shallow partial update of a project.
///
/// `None` leaves a field untouched. For nullable fields `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub status: Option<ProjectStatus>,
    pub deployed_url: Option<Option<String>>,
    pub last_deployed_at: Option<Option<DateTime<Utc>>>,
}

impl ProjectUpdate {
    pub fn status(status: ProjectStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply(self, project: &mut Project) {
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(deployed_url) = self.deployed_url {
            project.deployed_url = deployed_url;
        }
        if let Some(last_deployed_at) = self.last_deployed_at {
            project.last_deployed_at = last_deployed_at;
        }
    }
}
