//! Provider-backed deployments
//!
//! The building phase creates a deployment on the external provider and
//! polls it until the provider reports it ready. The provider has no
//! distinct deploying phase, so the deploying phase only narrates the
//! certificate setup of an already built deployment.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::deploy::driver::{
    narrate_build, BuildOutput, BuildPauses, DeployStrategy, Pace, RunContext,
};
use crate::errors::{ConsoleError, ConsoleResult};
use crate::http::github::SourceHost;
use crate::http::vercel::{DeployProvider, ProviderDeployment, ReadyState};

/// Polling schedule of a provider build
#[derive(Debug, Clone, Copy)]
pub struct ProviderOptions {
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_attempts: 60,
        }
    }
}

const BUILD_PAUSES: BuildPauses = BuildPauses {
    clone: 1000,
    after_clone: 500,
    after_install: 500,
    after_build: 500,
};

pub struct ProviderStrategy {
    source: Arc<dyn SourceHost>,
    provider: Arc<dyn DeployProvider>,
    options: ProviderOptions,
    pace: Pace,
}

impl ProviderStrategy {
    pub fn new(
        source: Arc<dyn SourceHost>,
        provider: Arc<dyn DeployProvider>,
        options: ProviderOptions,
        pace: Pace,
    ) -> Self {
        Self {
            source,
            provider,
            options,
            pace,
        }
    }

    async fn create(&self, ctx: &RunContext<'_>) -> ConsoleResult<ProviderDeployment> {
        let project = ctx.project();
        let repository_id = self.source.repository_id(&project.repository).await?;
        self.provider
            .create_deployment(repository_id, &project.branch, &project.name)
            .await
    }

    /// Poll the provider until the deployment is ready.
    ///
    /// A failed poll is retried unless it happens on the last allowed attempt
    /// or is a configuration fault. ERROR and CANCELED states end the wait at
    /// once.
    async fn wait_until_ready(
        &self,
        ctx: &RunContext<'_>,
        provider_id: &str,
    ) -> ConsoleResult<ProviderDeployment> {
        let max_attempts = self.options.max_attempts;
        let mut attempts = 0;

        while attempts < max_attempts {
            tokio::time::sleep(self.options.poll_interval).await;
            attempts += 1;

            let deployment = match self.provider.get_deployment(provider_id).await {
                Ok(deployment) => deployment,
                Err(e @ ConsoleError::ConfigError(_)) => return Err(e),
                Err(e) if attempts >= max_attempts => return Err(e),
                Err(e) => {
                    warn!(
                        "Poll {}/{} of {} deployment {} failed: {}",
                        attempts,
                        max_attempts,
                        self.provider.name(),
                        provider_id,
                        e
                    );
                    continue;
                }
            };

            match deployment.ready_state {
                ReadyState::Ready => {
                    ctx.success("Build completed successfully").await?;
                    return Ok(deployment);
                }
                ReadyState::Error => {
                    let message = deployment.error_message().unwrap_or("Unknown error");
                    return Err(ConsoleError::ProviderBuildFailed(message.to_string()));
                }
                ReadyState::Building => {
                    let elapsed = self.options.poll_interval.as_secs() * attempts as u64;
                    ctx.info(format!("Build in progress... ({}s)", elapsed))
                        .await?;
                }
                ReadyState::Queued => {
                    ctx.info("Build queued...").await?;
                }
                ReadyState::Canceled => {
                    return Err(ConsoleError::ProviderBuildCanceled);
                }
                ReadyState::Other => {
                    debug!(
                        "Deployment {} in an unhandled provider state",
                        provider_id
                    );
                }
            }
        }

        Err(ConsoleError::PollTimeout {
            attempts: max_attempts,
        })
    }
}

#[async_trait]
impl DeployStrategy for ProviderStrategy {
    fn name(&self) -> &'static str {
        self.provider.name()
    }

    async fn prepare(&self, ctx: &RunContext<'_>) -> ConsoleResult<()> {
        let project = ctx.project();
        self.pace.step(500).await?;
        ctx.info(format!("Preparing to deploy {}...", project.name))
            .await?;
        self.pace.step(500).await?;
        ctx.info(format!("Repository: {}", project.repository.html_url()))
            .await?;
        ctx.info(format!("Branch: {}", project.branch)).await?;
        self.pace.step(500).await?;
        Ok(())
    }

    async fn build(&self, ctx: &RunContext<'_>) -> ConsoleResult<BuildOutput> {
        ctx.info("Connecting to Vercel...").await?;
        self.pace.step(800).await?;

        ctx.info("Fetching repository details...").await?;
        let created = self.create(ctx).await.map_err(|e| match e {
            ConsoleError::ConfigError(_) => e,
            e => ConsoleError::ProviderError(format!("Failed to create Vercel deployment: {}", e)),
        })?;
        info!(
            "Created {} deployment {} for deployment {}",
            self.provider.name(),
            created.id,
            ctx.deployment_id()
        );
        ctx.success("Vercel deployment created").await?;
        ctx.info(format!("Deployment ID: {}", created.id)).await?;
        self.pace.step(500).await?;

        narrate_build(ctx, &self.pace, BUILD_PAUSES).await?;

        ctx.info("Waiting for Vercel to complete build...").await?;
        let ready = self.wait_until_ready(ctx, &created.id).await?;

        Ok(BuildOutput {
            provider_url: Some(ready.url),
        })
    }

    async fn release(&self, ctx: &RunContext<'_>, build: BuildOutput) -> ConsoleResult<String> {
        let address = build.provider_url.ok_or_else(|| {
            ConsoleError::ProviderError("Vercel did not assign a deployment URL".to_string())
        })?;

        ctx.info("Deploying to Vercel production...").await?;
        self.pace.step(1000).await?;
        ctx.info("Configuring SSL certificate...").await?;
        self.pace.step(500).await?;
        ctx.success("SSL certificate configured").await?;
        self.pace.step(500).await?;

        Ok(format!("https://{}", address))
    }

    async fn announce(&self, ctx: &RunContext<'_>, url: &str) -> ConsoleResult<()> {
        ctx.success("Application deployed successfully").await?;
        self.pace.step(500).await?;
        ctx.success(format!("Deployment complete! Available at {}", url))
            .await?;
        self.pace.step(500).await?;
        ctx.info("Your site is now live and accessible").await?;
        Ok(())
    }
}
