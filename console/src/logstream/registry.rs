//! Deployment log channel registry

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::logstream::observer::Observer;

/// Deployment ID to the observers currently subscribed to it.
///
/// Purely in-memory. An entry exists only while it has at least one
/// observer.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Vec<Arc<dyn Observer>>>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `observer` to the deployment's set. Returns `false` if it was
    /// already registered there.
    pub fn register(&self, deployment_id: &str, observer: Arc<dyn Observer>) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let observers = channels.entry(deployment_id.to_string()).or_default();

        if observers.iter().any(|o| o.id() == observer.id()) {
            return false;
        }

        debug!(
            "Registered observer {} for deployment {}",
            observer.id(),
            deployment_id
        );
        observers.push(observer);
        true
    }

    /// Remove an observer. The deployment's entry is dropped once its last
    /// observer leaves. Returns `false` if the observer was not registered.
    pub fn unregister(&self, deployment_id: &str, observer_id: &str) -> bool {
        let mut channels = self.channels.write().unwrap_or_else(|e| e.into_inner());
        let Some(observers) = channels.get_mut(deployment_id) else {
            return false;
        };

        let before = observers.len();
        observers.retain(|o| o.id() != observer_id);
        let removed = observers.len() != before;

        if observers.is_empty() {
            channels.remove(deployment_id);
        }

        if removed {
            debug!(
                "Unregistered observer {} for deployment {}",
                observer_id, deployment_id
            );
        }
        removed
    }

    /// Snapshot of the observers registered for a deployment
    pub fn observers(&self, deployment_id: &str) -> Vec<Arc<dyn Observer>> {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        channels.get(deployment_id).cloned().unwrap_or_default()
    }

    pub fn observer_count(&self, deployment_id: &str) -> usize {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        channels.get(deployment_id).map_or(0, Vec::len)
    }

    pub fn contains(&self, deployment_id: &str) -> bool {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        channels.contains_key(deployment_id)
    }

    /// Number of deployments with at least one observer
    pub fn len(&self) -> usize {
        let channels = self.channels.read().unwrap_or_else(|e| e.into_inner());
        channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
