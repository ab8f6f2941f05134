//! Server state

use std::sync::Arc;

use crate::deploy::trigger::Deployer;
use crate::http::github::SourceHost;
use crate::logstream::Broadcaster;
use crate::storage::Storage;

/// Server state shared across handlers
pub struct ServerState {
    pub storage: Arc<dyn Storage>,
    pub broadcaster: Arc<Broadcaster>,
    pub deployer: Arc<Deployer>,
    pub source: Arc<dyn SourceHost>,
}

impl ServerState {
    pub fn new(
        storage: Arc<dyn Storage>,
        broadcaster: Arc<Broadcaster>,
        deployer: Arc<Deployer>,
        source: Arc<dyn SourceHost>,
    ) -> Self {
        Self {
            storage,
            broadcaster,
            deployer,
            source,
        }
    }
}
