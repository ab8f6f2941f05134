//! Console subscription protocol
//!
//! Clients send `{"type": "subscribe", "deploymentId": "..."}` and receive
//! `{"type": "log", "log": {...}}` for every recorded line of that deployment,
//! backfill first, then live.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{ConsoleError, ConsoleResult};
use crate::logstream::broadcaster::Broadcaster;
use crate::logstream::observer::Observer;
use crate::models::LogEntry;

/// Messages sent by console clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe {
        #[serde(rename = "deploymentId")]
        deployment_id: String,
    },
}

impl ClientMessage {
    /// Parse and validate a raw text frame
    pub fn parse(text: &str) -> ConsoleResult<Self> {
        let message: ClientMessage = serde_json::from_str(text)
            .map_err(|e| ConsoleError::ProtocolError(format!("malformed message: {}", e)))?;

        match &message {
            ClientMessage::Subscribe { deployment_id } if deployment_id.trim().is_empty() => Err(
                ConsoleError::ProtocolError("subscribe without deploymentId".to_string()),
            ),
            _ => Ok(message),
        }
    }
}

/// Messages pushed to console clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Log { log: LogEntry },
}

impl ServerMessage {
    pub fn log(entry: LogEntry) -> Self {
        ServerMessage::Log { log: entry }
    }
}

/// Protocol state of one connected client.
///
/// A session watches at most one deployment. Subscribing to another one
/// moves the registration; subscribing again to the current one is a no-op.
pub struct SubscriptionSession {
    broadcaster: Arc<Broadcaster>,
    observer: Arc<dyn Observer>,
    current: Option<String>,
}

impl SubscriptionSession {
    pub fn new(broadcaster: Arc<Broadcaster>, observer: Arc<dyn Observer>) -> Self {
        Self {
            broadcaster,
            observer,
            current: None,
        }
    }

    /// Deployment currently watched, if any
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Handle one text frame from the client. Protocol errors leave the
    /// session untouched; the caller logs them and keeps the connection.
    pub async fn handle_text(&mut self, text: &str) -> ConsoleResult<()> {
        match ClientMessage::parse(text)? {
            ClientMessage::Subscribe { deployment_id } => {
                self.subscribe(deployment_id).await?;
            }
        }
        Ok(())
    }

    /// Watch `deployment_id`, replaying its history. Returns the number of
    /// replayed entries.
    pub async fn subscribe(&mut self, deployment_id: String) -> ConsoleResult<usize> {
        if self.current.as_deref() == Some(deployment_id.as_str()) {
            debug!(
                "Observer {} already subscribed to {}",
                self.observer.id(),
                deployment_id
            );
            return Ok(0);
        }

        if let Some(previous) = self.current.take() {
            self.broadcaster.unsubscribe(&previous, self.observer.id());
        }

        let replayed = self
            .broadcaster
            .subscribe(&deployment_id, self.observer.clone())
            .await?;
        info!(
            "Observer {} watching deployment {}",
            self.observer.id(),
            deployment_id
        );
        self.current = Some(deployment_id);
        Ok(replayed)
    }

    /// Release the registration. Called when the client's channel closes.
    pub fn close(&mut self) {
        if let Some(deployment_id) = self.current.take() {
            self.broadcaster
                .unsubscribe(&deployment_id, self.observer.id());
        }
    }
}

impl Drop for SubscriptionSession {
    fn drop(&mut self) {
        self.close();
    }
}
