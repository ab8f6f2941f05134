//! Finite state machine for a deployment run

use crate::errors::ConsoleError;
use crate::models::DeploymentStatus;

/// Deployment event
#[derive(Debug, Clone)]
pub enum DeploymentEvent {
    /// Start building
    Build,

    /// Build confirmed, start releasing
    Deploy,

    /// Release completed
    Succeed,

    /// Any fault before a terminal state
    Fail(String),
}

/// Deployment FSM.
///
/// Statuses only move forward and a terminal status is never left, so a
/// failed run cannot be resumed: retrying means a new deployment.
#[derive(Debug, Clone)]
pub struct DeploymentFsm {
    state: DeploymentStatus,
    error: Option<String>,
    history: Vec<DeploymentStatus>,
}

impl DeploymentFsm {
    /// Create a new FSM in pending state
    pub fn new() -> Self {
        Self {
            state: DeploymentStatus::Pending,
            error: None,
            history: vec![DeploymentStatus::Pending],
        }
    }

    /// Get current state
    pub fn state(&self) -> DeploymentStatus {
        self.state
    }

    /// Get the failure reason, if the run failed
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Every status visited so far, in order
    pub fn history(&self) -> &[DeploymentStatus] {
        &self.history
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DeploymentEvent) -> Result<DeploymentStatus, ConsoleError> {
        let new_state = match (&self.state, &event) {
            (DeploymentStatus::Pending, DeploymentEvent::Build) => DeploymentStatus::Building,
            (DeploymentStatus::Building, DeploymentEvent::Deploy) => DeploymentStatus::Deploying,
            (DeploymentStatus::Deploying, DeploymentEvent::Succeed) => DeploymentStatus::Success,

            (
                DeploymentStatus::Pending | DeploymentStatus::Building | DeploymentStatus::Deploying,
                DeploymentEvent::Fail(err),
            ) => {
                self.error = Some(err.clone());
                DeploymentStatus::Failed
            }

            (state, event) => {
                return Err(ConsoleError::InvalidTransition(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        self.history.push(new_state);
        Ok(new_state)
    }
}

impl Default for DeploymentFsm {
    fn default() -> Self {
        Self::new()
    }
}
