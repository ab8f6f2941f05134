//! Deployment driver: the phase sequencer shared by every strategy

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::deploy::fsm::{DeploymentEvent, DeploymentFsm};
use crate::errors::{ConsoleError, ConsoleResult};
use crate::logstream::Broadcaster;
use crate::models::{
    DeploymentStatus, DeploymentUpdate, LogEntry, Project, ProjectStatus, ProjectUpdate,
};
use crate::storage::Storage;

/// The deployment a driver run advances, and the project it belongs to
#[derive(Debug, Clone)]
pub struct RunTarget {
    pub deployment_id: String,
    pub project: Project,
}

/// Narration pacing. Step delays are multiplied by `scale`; a scale of zero
/// disables them.
#[derive(Debug, Clone, Copy)]
pub struct Pace {
    scale: f64,
}

impl Pace {
    pub fn new(scale: f64) -> Self {
        Self {
            scale: scale.max(0.0),
        }
    }

    pub fn instant() -> Self {
        Self::new(0.0)
    }

    pub async fn step(&self, millis: u64) -> ConsoleResult<()> {
        if self.scale == 0.0 {
            return Ok(());
        }
        let delay = Duration::try_from_secs_f64(millis as f64 * self.scale / 1000.0)
            .map_err(|e| {
                ConsoleError::ConfigError(format!(
                    "step of {}ms at time scale {}: {}",
                    millis, self.scale, e
                ))
            })?;
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

impl Default for Pace {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Handle a strategy uses to narrate its run
pub struct RunContext<'a> {
    broadcaster: &'a Broadcaster,
    target: &'a RunTarget,
}

impl<'a> RunContext<'a> {
    pub fn new(broadcaster: &'a Broadcaster, target: &'a RunTarget) -> Self {
        Self {
            broadcaster,
            target,
        }
    }

    pub fn deployment_id(&self) -> &str {
        &self.target.deployment_id
    }

    pub fn project(&self) -> &Project {
        &self.target.project
    }

    pub async fn emit(&self, entry: LogEntry) -> ConsoleResult<()> {
        self.broadcaster
            .publish(&self.target.deployment_id, entry)
            .await
            .map(|_| ())
    }

    pub async fn info(&self, message: impl Into<String> + Send) -> ConsoleResult<()> {
        self.emit(LogEntry::info(message)).await
    }

    pub async fn success(&self, message: impl Into<String> + Send) -> ConsoleResult<()> {
        self.emit(LogEntry::success(message)).await
    }

    pub async fn warning(&self, message: impl Into<String> + Send) -> ConsoleResult<()> {
        self.emit(LogEntry::warning(message)).await
    }
}

/// What the building phase hands over to the deploying phase
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    /// Address assigned by an external provider, without scheme
    pub provider_url: Option<String>,
}

/// How a deployment is built and released.
///
/// The driver owns the state machine, persistence and failure handling;
/// a strategy only decides when each phase is complete and what it narrates.
#[async_trait]
pub trait DeployStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Narration between "Deployment initialized" and the building phase
    async fn prepare(&self, ctx: &RunContext<'_>) -> ConsoleResult<()>;

    /// Building phase. Returns once the build is confirmed.
    async fn build(&self, ctx: &RunContext<'_>) -> ConsoleResult<BuildOutput>;

    /// Deploying phase. Returns the public URL of the deployment.
    async fn release(&self, ctx: &RunContext<'_>, build: BuildOutput) -> ConsoleResult<String>;

    /// Narration once success has been persisted
    async fn announce(&self, ctx: &RunContext<'_>, url: &str) -> ConsoleResult<()>;
}

/// Pauses of the shared build narration, in milliseconds
#[derive(Debug, Clone, Copy)]
pub struct BuildPauses {
    /// Repository fetch
    pub clone: u64,
    /// After "Repository cloned successfully"
    pub after_clone: u64,
    /// After "Dependencies installed"
    pub after_install: u64,
    /// After each completed compile step
    pub after_build: u64,
}

/// Fetch, install and compile narration shared by both strategies
pub async fn narrate_build(
    ctx: &RunContext<'_>,
    pace: &Pace,
    pauses: BuildPauses,
) -> ConsoleResult<()> {
    ctx.info("Fetching repository from GitHub...").await?;
    pace.step(pauses.clone).await?;
    ctx.success("Repository cloned successfully").await?;
    pace.step(pauses.after_clone).await?;

    ctx.info("Installing dependencies...").await?;
    pace.step(1500).await?;
    ctx.success("Dependencies installed").await?;
    pace.step(pauses.after_install).await?;

    let project_type = ctx.project().project_type;
    if project_type.builds_assets() {
        ctx.info("Building frontend assets...").await?;
        pace.step(2000).await?;
        ctx.info("Optimizing bundle size...").await?;
        pace.step(1000).await?;
        ctx.success("Frontend build completed").await?;
        pace.step(pauses.after_build).await?;
    }

    if project_type.compiles_backend() {
        ctx.info("Compiling backend code...").await?;
        pace.step(1500).await?;
        ctx.success("Backend compilation successful").await?;
        pace.step(pauses.after_build).await?;
    }

    Ok(())
}

/// Advances deployments through pending, building, deploying and a terminal
/// state, one independent run per deployment.
pub struct Driver {
    storage: Arc<dyn Storage>,
    broadcaster: Arc<Broadcaster>,
    strategy: Arc<dyn DeployStrategy>,
}

impl Driver {
    pub fn new(
        storage: Arc<dyn Storage>,
        broadcaster: Arc<Broadcaster>,
        strategy: Arc<dyn DeployStrategy>,
    ) -> Self {
        Self {
            storage,
            broadcaster,
            strategy,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Run a deployment on its own task. The caller does not need to await
    /// the handle; faults are handled inside the run, and a run that panics
    /// is still recorded as failed.
    pub fn launch(self: &Arc<Self>, target: RunTarget) -> JoinHandle<DeploymentStatus> {
        let driver = Arc::clone(self);
        tokio::spawn(async move {
            let run = tokio::spawn({
                let driver = Arc::clone(&driver);
                let target = target.clone();
                async move { driver.run(target).await }
            });
            match run.await {
                Ok(status) => status,
                Err(e) => driver.recover(target, e).await,
            }
        })
    }

    /// Fail a deployment whose run task died before reaching a terminal state
    async fn recover(&self, target: RunTarget, fault: JoinError) -> DeploymentStatus {
        error!(
            "Deployment {} run aborted: {}",
            target.deployment_id, fault
        );

        match self.storage.get_deployment(&target.deployment_id).await {
            Ok(Some(deployment)) if deployment.status.is_terminal() => {
                return deployment.status;
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    "Unable to read deployment {} after its run aborted: {}",
                    target.deployment_id, e
                );
            }
        }

        let ctx = RunContext::new(&self.broadcaster, &target);
        let mut fsm = DeploymentFsm::new();
        let reason = if fault.is_panic() {
            "deployment run panicked"
        } else {
            "deployment run was cancelled"
        };
        self.fail(&mut fsm, &ctx, ConsoleError::Internal(reason.to_string()))
            .await;
        fsm.state()
    }

    /// Run a deployment to a terminal state and return that state
    pub async fn run(&self, target: RunTarget) -> DeploymentStatus {
        info!(
            "Starting {} deployment {} for project {}",
            self.strategy.name(),
            target.deployment_id,
            target.project.name
        );

        let ctx = RunContext::new(&self.broadcaster, &target);
        let mut fsm = DeploymentFsm::new();

        match self.advance(&mut fsm, &ctx).await {
            Ok(url) => {
                if let Err(e) = self.strategy.announce(&ctx, &url).await {
                    warn!(
                        "Deployment {} succeeded but its final narration failed: {}",
                        target.deployment_id, e
                    );
                }
                info!(
                    "Deployment {} completed successfully at {}",
                    target.deployment_id, url
                );
            }
            Err(e) => self.fail(&mut fsm, &ctx, e).await,
        }

        fsm.state()
    }

    async fn advance(&self, fsm: &mut DeploymentFsm, ctx: &RunContext<'_>) -> ConsoleResult<String> {
        // Pending
        self.update_deployment(ctx, DeploymentUpdate::status(DeploymentStatus::Pending))
            .await?;
        self.update_project(ctx, ProjectUpdate::status(ProjectStatus::Deploying))
            .await?;
        ctx.info("Deployment initialized").await?;
        self.strategy.prepare(ctx).await?;

        // Building
        let status = fsm.process(DeploymentEvent::Build)?;
        self.update_deployment(ctx, DeploymentUpdate::status(status))
            .await?;
        let build = self.strategy.build(ctx).await?;

        // Deploying
        let status = fsm.process(DeploymentEvent::Deploy)?;
        self.update_deployment(ctx, DeploymentUpdate::status(status))
            .await?;
        let url = self.strategy.release(ctx, build).await?;

        // Success
        let completed_at = Utc::now();
        self.update_deployment(
            ctx,
            DeploymentUpdate::completed(DeploymentStatus::Success, completed_at),
        )
        .await?;
        fsm.process(DeploymentEvent::Succeed)?;

        let project_update = ProjectUpdate {
            status: Some(ProjectStatus::Deployed),
            deployed_url: Some(Some(url.clone())),
            last_deployed_at: Some(Some(completed_at)),
        };
        if let Err(e) = self.update_project(ctx, project_update).await {
            error!(
                "Deployment {} succeeded but project {} was not updated: {}",
                ctx.deployment_id(),
                ctx.project().id,
                e
            );
        }

        Ok(url)
    }

    async fn fail(&self, fsm: &mut DeploymentFsm, ctx: &RunContext<'_>, fault: ConsoleError) {
        let reason = fault.to_string();
        error!("Deployment {} failed: {}", ctx.deployment_id(), reason);

        if let Err(e) = fsm.process(DeploymentEvent::Fail(reason.clone())) {
            error!("Deployment {}: {}", ctx.deployment_id(), e);
            return;
        }

        let completed_at = Utc::now();
        if let Err(e) = self
            .update_deployment(
                ctx,
                DeploymentUpdate::completed(DeploymentStatus::Failed, completed_at),
            )
            .await
        {
            error!(
                "Unable to mark deployment {} as failed: {}",
                ctx.deployment_id(),
                e
            );
        }

        let project_update = ProjectUpdate {
            status: Some(ProjectStatus::Failed),
            deployed_url: Some(None),
            last_deployed_at: Some(None),
        };
        if let Err(e) = self.update_project(ctx, project_update).await {
            error!(
                "Unable to mark project {} as failed: {}",
                ctx.project().id,
                e
            );
        }

        if let Err(e) = ctx
            .emit(LogEntry::error(format!("Deployment failed: {}", reason)))
            .await
        {
            error!(
                "Unable to record failure of deployment {}: {}",
                ctx.deployment_id(),
                e
            );
        }
    }

    async fn update_deployment(
        &self,
        ctx: &RunContext<'_>,
        update: DeploymentUpdate,
    ) -> ConsoleResult<()> {
        self.storage
            .update_deployment(ctx.deployment_id(), update)
            .await?
            .ok_or_else(|| {
                ConsoleError::NotFound(format!("deployment {}", ctx.deployment_id()))
            })?;
        Ok(())
    }

    async fn update_project(&self, ctx: &RunContext<'_>, update: ProjectUpdate) -> ConsoleResult<()> {
        self.storage
            .update_project(&ctx.project().id, update)
            .await?
            .ok_or_else(|| ConsoleError::NotFound(format!("project {}", ctx.project().id)))?;
        Ok(())
    }
}
