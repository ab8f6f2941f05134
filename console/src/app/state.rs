//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::AppOptions;
use crate::deploy::driver::{DeployStrategy, Driver, Pace};
use crate::deploy::provider::ProviderStrategy;
use crate::deploy::simulated::SimulatedStrategy;
use crate::deploy::trigger::Deployer;
use crate::deploy::StrategyKind;
use crate::errors::ConsoleResult;
use crate::http::github::{GitHubClient, SourceHost};
use crate::http::vercel::VercelClient;
use crate::logstream::{Broadcaster, ChannelRegistry};
use crate::storage::{MemStorage, Storage};

/// Main application state.
///
/// Every store is created here once and handed to the components that use
/// it; nothing is process-global.
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub registry: Arc<ChannelRegistry>,
    pub broadcaster: Arc<Broadcaster>,
    pub source: Arc<dyn SourceHost>,
    pub driver: Arc<Driver>,
    pub deployer: Arc<Deployer>,
}

impl AppState {
    /// Initialize application state
    pub fn init(options: &AppOptions) -> ConsoleResult<Self> {
        info!("Initializing application state...");

        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let source = GitHubClient::new(&options.github.base_url, options.github.token.clone())?
            .into_shared();

        let strategy = build_strategy(options, source.clone())?;
        info!("Deployments run with the {} strategy", strategy.name());

        Ok(Self::with_components(storage, source, strategy))
    }

    /// Assemble the state around existing components
    pub fn with_components(
        storage: Arc<dyn Storage>,
        source: Arc<dyn SourceHost>,
        strategy: Arc<dyn DeployStrategy>,
    ) -> Self {
        let registry = Arc::new(ChannelRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(storage.clone(), registry.clone()));
        let driver = Arc::new(Driver::new(
            storage.clone(),
            broadcaster.clone(),
            strategy,
        ));
        let deployer = Arc::new(Deployer::new(
            storage.clone(),
            source.clone(),
            driver.clone(),
        ));

        Self {
            storage,
            registry,
            broadcaster,
            source,
            driver,
            deployer,
        }
    }

    /// Shutdown application state
    pub async fn shutdown(&self) -> ConsoleResult<()> {
        info!(
            "Shutting down application state ({} deployments still watched)",
            self.registry.len()
        );
        Ok(())
    }
}

fn build_strategy(
    options: &AppOptions,
    source: Arc<dyn SourceHost>,
) -> ConsoleResult<Arc<dyn DeployStrategy>> {
    let pace = Pace::new(options.time_scale);
    let strategy: Arc<dyn DeployStrategy> = match options.strategy {
        StrategyKind::Simulated => Arc::new(SimulatedStrategy::new(options.domain.clone(), pace)),
        StrategyKind::Vercel => {
            let provider = VercelClient::new(&options.vercel.base_url, options.vercel.token.clone())?;
            Arc::new(ProviderStrategy::new(
                source,
                Arc::new(provider),
                options.provider,
                pace,
            ))
        }
    };
    Ok(strategy)
}
