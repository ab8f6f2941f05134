//! Local simulated deployments
//!
//! Nothing is built: every phase is a fixed narration with fixed delays, and
//! the deployment is published under the configured domain.

use async_trait::async_trait;

use crate::deploy::driver::{
    narrate_build, BuildOutput, BuildPauses, DeployStrategy, Pace, RunContext,
};
use crate::errors::ConsoleResult;
use crate::utils::host_label;

const BUILD_PAUSES: BuildPauses = BuildPauses {
    clone: 1200,
    after_clone: 600,
    after_install: 800,
    after_build: 600,
};

pub struct SimulatedStrategy {
    domain: String,
    pace: Pace,
}

impl SimulatedStrategy {
    pub fn new(domain: impl Into<String>, pace: Pace) -> Self {
        Self {
            domain: domain.into(),
            pace,
        }
    }

    /// Public URL of a project deployed by this strategy
    pub fn url_for(&self, project_name: &str) -> String {
        format!("https://{}.{}", host_label(project_name), self.domain)
    }
}

#[async_trait]
impl DeployStrategy for SimulatedStrategy {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn prepare(&self, ctx: &RunContext<'_>) -> ConsoleResult<()> {
        self.pace.step(1000).await?;
        ctx.info(format!("Preparing to deploy {}...", ctx.project().name))
            .await?;
        self.pace.step(800).await?;
        Ok(())
    }

    async fn build(&self, ctx: &RunContext<'_>) -> ConsoleResult<BuildOutput> {
        narrate_build(ctx, &self.pace, BUILD_PAUSES).await?;
        Ok(BuildOutput::default())
    }

    async fn release(&self, ctx: &RunContext<'_>, _build: BuildOutput) -> ConsoleResult<String> {
        ctx.info("Deploying to production...").await?;
        self.pace.step(1200).await?;
        ctx.info("Creating container...").await?;
        self.pace.step(1000).await?;
        ctx.info("Configuring networking...").await?;
        self.pace.step(800).await?;
        ctx.info("Setting up SSL certificate...").await?;
        self.pace.step(1000).await?;
        ctx.success("SSL certificate configured").await?;
        self.pace.step(600).await?;
        ctx.info("Starting application...").await?;
        self.pace.step(1500).await?;

        Ok(self.url_for(&ctx.project().name))
    }

    async fn announce(&self, ctx: &RunContext<'_>, url: &str) -> ConsoleResult<()> {
        ctx.success("Application started successfully").await?;
        self.pace.step(500).await?;
        ctx.success(format!("Deployment complete! Available at {}", url))
            .await?;
        self.pace.step(500).await?;
        ctx.info("Health checks passed").await?;
        Ok(())
    }
}
