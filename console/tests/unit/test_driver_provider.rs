//! Provider strategy runs through the driver, against a scripted provider

use std::sync::Arc;
use std::time::Duration;

use deployhub::deploy::driver::{Driver, Pace, RunTarget};
use deployhub::deploy::provider::{ProviderOptions, ProviderStrategy};
use deployhub::http::vercel::ReadyState;
use deployhub::logstream::{Broadcaster, ChannelRegistry};
use deployhub::models::{DeploymentStatus, LogEntry, ProjectStatus, ProjectType, Severity};
use deployhub::storage::Storage;

use crate::support::{messages, seed, FakeProvider, FakeSource, Poll, RecordingStorage};

struct Outcome {
    status: DeploymentStatus,
    statuses: Vec<DeploymentStatus>,
    completions: u32,
    logs: Vec<LogEntry>,
    lines: Vec<String>,
    project_status: ProjectStatus,
    deployed_url: Option<String>,
}

impl Outcome {
    fn errors(&self) -> Vec<&LogEntry> {
        self.logs
            .iter()
            .filter(|l| l.level == Severity::Error)
            .collect()
    }

    fn last_message(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or_default()
    }
}

async fn deploy_with(
    source: Arc<FakeSource>,
    provider: Arc<FakeProvider>,
    max_attempts: u32,
) -> Outcome {
    let storage = RecordingStorage::new();
    let (project, deployment) = seed(storage.as_ref(), "demo", ProjectType::Frontend).await;

    let broadcaster = Arc::new(Broadcaster::new(
        storage.clone(),
        Arc::new(ChannelRegistry::new()),
    ));
    let strategy = ProviderStrategy::new(
        source,
        provider,
        ProviderOptions {
            poll_interval: Duration::from_secs(3),
            max_attempts,
        },
        Pace::default(),
    );
    let driver = Driver::new(storage.clone(), broadcaster, Arc::new(strategy));

    let status = driver
        .run(RunTarget {
            deployment_id: deployment.id.clone(),
            project: project.clone(),
        })
        .await;

    let project = storage.get_project(&project.id).await.unwrap().unwrap();
    Outcome {
        status,
        statuses: storage.statuses(&deployment.id),
        completions: storage.completions(&deployment.id),
        logs: storage.get_deployment_logs(&deployment.id).await.unwrap(),
        lines: messages(storage.as_ref(), &deployment.id).await,
        project_status: project.status,
        deployed_url: project.deployed_url,
    }
}

fn failed_statuses() -> Vec<DeploymentStatus> {
    vec![
        DeploymentStatus::Pending,
        DeploymentStatus::Building,
        DeploymentStatus::Failed,
    ]
}

#[tokio::test(start_paused = true)]
async fn test_ready_build_succeeds() {
    let provider = FakeProvider::scripted(
        vec![
            Poll::State(ReadyState::Queued),
            Poll::State(ReadyState::Building),
        ],
        Poll::State(ReadyState::Ready),
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Success);
    assert_eq!(
        outcome.statuses,
        vec![
            DeploymentStatus::Pending,
            DeploymentStatus::Building,
            DeploymentStatus::Deploying,
            DeploymentStatus::Success,
        ]
    );
    assert_eq!(outcome.completions, 1);
    assert_eq!(provider.polls(), 3);
    assert_eq!(outcome.project_status, ProjectStatus::Deployed);
    assert_eq!(
        outcome.deployed_url.as_deref(),
        Some("https://demo-abc123.vercel.app")
    );

    for expected in [
        "Repository: https://github.com/acme/demo",
        "Branch: main",
        "Vercel deployment created",
        "Deployment ID: dpl_test",
        "Build queued...",
        "Build in progress... (6s)",
        "Build completed successfully",
        "Deployment complete! Available at https://demo-abc123.vercel.app",
    ] {
        assert!(
            outcome.lines.contains(&expected.to_string()),
            "missing line: {}",
            expected
        );
    }

    // Deploying narration only starts once the build is confirmed
    let ready = outcome
        .lines
        .iter()
        .position(|l| l == "Build completed successfully")
        .unwrap();
    let ssl = outcome
        .lines
        .iter()
        .position(|l| l == "Configuring SSL certificate...")
        .unwrap();
    assert!(ready < ssl);
    assert_eq!(outcome.last_message(), "Your site is now live and accessible");
    assert!(outcome.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_provider_error_on_fifth_poll() {
    let provider = FakeProvider::scripted(
        vec![
            Poll::State(ReadyState::Queued),
            Poll::State(ReadyState::Building),
            Poll::State(ReadyState::Building),
            Poll::State(ReadyState::Building),
            Poll::Failed("Command \"npm run build\" exited with 1"),
        ],
        Poll::State(ReadyState::Ready),
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(outcome.statuses, failed_statuses());
    assert_eq!(outcome.completions, 1);
    assert_eq!(provider.polls(), 5);
    assert_eq!(outcome.project_status, ProjectStatus::Failed);
    assert!(outcome.deployed_url.is_none());

    let errors = outcome.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "Deployment failed: Vercel build failed: Command \"npm run build\" exited with 1"
    );
    assert_eq!(outcome.logs.last(), Some(errors[0]));
}

#[tokio::test(start_paused = true)]
async fn test_provider_error_without_message() {
    let provider = FakeProvider::scripted(vec![], Poll::State(ReadyState::Error));
    let outcome = deploy_with(FakeSource::connected(), provider, 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(
        outcome.last_message(),
        "Deployment failed: Vercel build failed: Unknown error"
    );
}

#[tokio::test(start_paused = true)]
async fn test_never_ready_times_out() {
    let provider = FakeProvider::scripted(vec![], Poll::State(ReadyState::Building));
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(outcome.statuses, failed_statuses());
    assert_eq!(provider.polls(), 60);
    assert_eq!(
        outcome.last_message(),
        "Deployment failed: Deployment timeout - build took too long (60 polls)"
    );
    assert!(!outcome.last_message().contains("Vercel build failed"));
    assert_eq!(outcome.errors().len(), 1);
    assert!(outcome
        .lines
        .contains(&"Build in progress... (180s)".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_canceled_build_fails_without_timeout() {
    let provider = FakeProvider::scripted(
        vec![
            Poll::State(ReadyState::Building),
            Poll::State(ReadyState::Canceled),
        ],
        Poll::State(ReadyState::Ready),
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(outcome.statuses, failed_statuses());
    assert_eq!(provider.polls(), 2);
    assert_eq!(
        outcome.last_message(),
        "Deployment failed: Vercel build was canceled"
    );
    assert_eq!(outcome.errors().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unhandled_states_keep_polling() {
    let provider = FakeProvider::scripted(
        vec![Poll::State(ReadyState::Other), Poll::State(ReadyState::Other)],
        Poll::State(ReadyState::Ready),
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Success);
    assert_eq!(provider.polls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_transient_poll_faults_are_retried() {
    let provider = FakeProvider::scripted(
        vec![Poll::Fault, Poll::Fault, Poll::State(ReadyState::Building)],
        Poll::State(ReadyState::Ready),
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Success);
    assert_eq!(provider.polls(), 4);
    // Retried faults leave no trace in the console
    assert!(outcome.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_fault_on_final_attempt_is_fatal() {
    let provider = FakeProvider::scripted(
        vec![
            Poll::State(ReadyState::Building),
            Poll::State(ReadyState::Building),
            Poll::State(ReadyState::Building),
            Poll::State(ReadyState::Building),
        ],
        Poll::Fault,
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 5).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(provider.polls(), 5);
    assert_eq!(
        outcome.last_message(),
        "Deployment failed: Vercel API error (503): upstream unavailable"
    );
}

#[tokio::test(start_paused = true)]
async fn test_fault_before_final_attempt_then_timeout() {
    let provider = FakeProvider::scripted(
        vec![
            Poll::State(ReadyState::Building),
            Poll::State(ReadyState::Building),
            Poll::Fault,
        ],
        Poll::State(ReadyState::Queued),
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 4).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(provider.polls(), 4);
    assert_eq!(
        outcome.last_message(),
        "Deployment failed: Deployment timeout - build took too long (4 polls)"
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_token_fails_without_polling() {
    let provider = FakeProvider::failing_create(Poll::Unconfigured);
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(outcome.statuses, failed_statuses());
    assert_eq!(provider.polls(), 0);
    assert_eq!(
        outcome.last_message(),
        "Deployment failed: VERCEL_TOKEN not configured"
    );
    assert_eq!(outcome.errors().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_token_revoked_while_polling_is_fatal() {
    let provider = FakeProvider::scripted(
        vec![Poll::State(ReadyState::Building), Poll::Unconfigured],
        Poll::State(ReadyState::Ready),
    );
    let outcome = deploy_with(FakeSource::connected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(provider.polls(), 2);
    assert_eq!(
        outcome.last_message(),
        "Deployment failed: VERCEL_TOKEN not configured"
    );
}

#[tokio::test(start_paused = true)]
async fn test_unknown_repository_aborts_deploy() {
    let provider = FakeProvider::scripted(vec![], Poll::State(ReadyState::Ready));
    let outcome = deploy_with(FakeSource::disconnected(), provider.clone(), 60).await;

    assert_eq!(outcome.status, DeploymentStatus::Failed);
    assert_eq!(provider.polls(), 0);
    assert!(outcome
        .last_message()
        .starts_with("Deployment failed: Failed to create Vercel deployment: GitHub error:"));
    assert_eq!(outcome.errors().len(), 1);
}
