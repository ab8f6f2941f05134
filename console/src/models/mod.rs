//! Domain models shared by the store, the drivers and the API

pub mod deployment;
pub mod log;
pub mod project;

pub use deployment::{Deployment, DeploymentStatus, DeploymentUpdate, NewDeployment};
pub use log::{LogEntry, Severity};
pub use project::{NewProject, Project, ProjectStatus, ProjectType, ProjectUpdate, RepositoryRef};
