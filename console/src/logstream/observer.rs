//! Observer handles

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::errors::{ConsoleError, ConsoleResult};
use crate::logstream::protocol::ServerMessage;
use crate::utils::generate_uuid;

/// The sending half of a connected console client.
///
/// `send` must not block: it is called while the deployment's publish gate
/// is held.
pub trait Observer: Send + Sync {
    /// Identity used by the registry to find this observer again
    fn id(&self) -> &str;

    /// Whether the underlying channel can take messages right now
    fn is_open(&self) -> bool;

    fn send(&self, message: &ServerMessage) -> ConsoleResult<()>;
}

/// Observer backed by an unbounded queue drained by a transport writer task
pub struct ChannelObserver {
    id: String,
    tx: mpsc::UnboundedSender<ServerMessage>,
    open: AtomicBool,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = Self {
            id: generate_uuid(),
            tx,
            open: AtomicBool::new(true),
        };
        (observer, rx)
    }

    /// Mark the channel as no longer usable. Registration is left alone.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

impl Observer for ChannelObserver {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst) && !self.tx.is_closed()
    }

    fn send(&self, message: &ServerMessage) -> ConsoleResult<()> {
        self.tx
            .send(message.clone())
            .map_err(|_| ConsoleError::ChannelClosed(self.id.clone()))
    }
}
