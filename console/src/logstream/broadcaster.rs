//! Console event broadcaster

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::errors::ConsoleResult;
use crate::logstream::observer::Observer;
use crate::logstream::protocol::ServerMessage;
use crate::logstream::registry::ChannelRegistry;
use crate::models::LogEntry;
use crate::storage::Storage;

/// Number of publish gates deployments are hashed onto
const GATE_STRIPES: usize = 64;

/// Records console lines in deployment history and pushes them to observers.
///
/// Publishing to a deployment and subscribing to it take the same gate, so a
/// subscriber's backfill snapshot and its registration are atomic with
/// respect to publishes: every line lands either in the backfill or in the
/// live stream, exactly once.
pub struct Broadcaster {
    storage: Arc<dyn Storage>,
    registry: Arc<ChannelRegistry>,
    gates: Vec<Mutex<()>>,
}

impl Broadcaster {
    pub fn new(storage: Arc<dyn Storage>, registry: Arc<ChannelRegistry>) -> Self {
        Self {
            storage,
            registry,
            gates: (0..GATE_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    pub fn registry(&self) -> &Arc<ChannelRegistry> {
        &self.registry
    }

    fn gate(&self, deployment_id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        deployment_id.hash(&mut hasher);
        &self.gates[(hasher.finish() as usize) % self.gates.len()]
    }

    /// Append `entry` to the deployment's history, then send it to every
    /// registered observer whose channel is open.
    ///
    /// Fails only when the history append fails. Observers that are closed or
    /// whose send fails are skipped and stay registered. Returns how many
    /// observers received the entry.
    pub async fn publish(&self, deployment_id: &str, entry: LogEntry) -> ConsoleResult<usize> {
        let _gate = self.gate(deployment_id).lock().await;

        self.storage
            .add_deployment_log(deployment_id, entry.clone())
            .await?;

        let message = ServerMessage::log(entry);
        let mut delivered = 0;
        for observer in self.registry.observers(deployment_id) {
            if !observer.is_open() {
                continue;
            }
            match observer.send(&message) {
                Ok(()) => delivered += 1,
                Err(e) => debug!("Skipping observer {}: {}", observer.id(), e),
            }
        }

        Ok(delivered)
    }

    /// Register `observer` for a deployment and replay its history, oldest
    /// first. Returns the number of replayed entries.
    pub async fn subscribe(
        &self,
        deployment_id: &str,
        observer: Arc<dyn Observer>,
    ) -> ConsoleResult<usize> {
        let _gate = self.gate(deployment_id).lock().await;

        self.registry.register(deployment_id, observer.clone());

        let history = match self.storage.get_deployment_logs(deployment_id).await {
            Ok(history) => history,
            Err(e) => {
                self.registry.unregister(deployment_id, observer.id());
                return Err(e);
            }
        };

        let mut replayed = 0;
        for entry in history {
            if !observer.is_open() {
                break;
            }
            if let Err(e) = observer.send(&ServerMessage::log(entry)) {
                warn!("Backfill to observer {} interrupted: {}", observer.id(), e);
                break;
            }
            replayed += 1;
        }

        debug!(
            "Observer {} subscribed to deployment {} ({} entries replayed)",
            observer.id(),
            deployment_id,
            replayed
        );
        Ok(replayed)
    }

    /// Stop streaming a deployment to an observer
    pub fn unsubscribe(&self, deployment_id: &str, observer_id: &str) -> bool {
        self.registry.unregister(deployment_id, observer_id)
    }

    /// Recorded history of a deployment
    pub async fn history(&self, deployment_id: &str) -> ConsoleResult<Vec<LogEntry>> {
        self.storage.get_deployment_logs(deployment_id).await
    }

    /// Drop a deployment's history. Registered observers keep receiving
    /// anything published afterwards.
    pub async fn clear(&self, deployment_id: &str) -> ConsoleResult<()> {
        let _gate = self.gate(deployment_id).lock().await;
        self.storage.clear_deployment_logs(deployment_id).await
    }
}
