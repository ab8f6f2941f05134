//! Storage under concurrent use

use std::sync::Arc;

use chrono::Utc;
use deployhub::models::{
    DeploymentStatus, DeploymentUpdate, LogEntry, NewDeployment, ProjectType,
};
use deployhub::storage::{MemStorage, Storage};

use crate::support::seed;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_to_different_deployments() {
    const DEPLOYMENTS: usize = 8;
    const LINES: usize = 200;

    let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
    let mut ids = Vec::new();
    for _ in 0..DEPLOYMENTS {
        let deployment = storage
            .create_deployment(NewDeployment {
                project_id: "p-1".to_string(),
                commit_hash: None,
            })
            .await
            .unwrap();
        ids.push(deployment.id);
    }

    let mut tasks = Vec::new();
    for id in ids.clone() {
        let storage = storage.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..LINES {
                storage
                    .add_deployment_log(&id, LogEntry::info(format!("{} {}", id, i)))
                    .await
                    .unwrap();
                if i % 10 == 0 {
                    storage
                        .update_deployment(&id, DeploymentUpdate::status(DeploymentStatus::Building))
                        .await
                        .unwrap();
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for id in ids {
        let logs = storage.get_deployment_logs(&id).await.unwrap();
        assert_eq!(logs.len(), LINES);
        for (i, entry) in logs.iter().enumerate() {
            assert_eq!(entry.message, format!("{} {}", id, i));
        }
        let deployment = storage.get_deployment(&id).await.unwrap().unwrap();
        assert_eq!(deployment.status, DeploymentStatus::Building);
    }
}

#[tokio::test]
async fn test_completion_is_kept_by_later_partial_updates() {
    let storage = MemStorage::new();
    let (_, deployment) = seed(&storage, "demo", ProjectType::Backend).await;

    let at = Utc::now();
    storage
        .update_deployment(
            &deployment.id,
            DeploymentUpdate::completed(DeploymentStatus::Success, at),
        )
        .await
        .unwrap();
    let updated = storage
        .update_deployment(&deployment.id, DeploymentUpdate::default())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.status, DeploymentStatus::Success);
    assert_eq!(updated.completed_at, Some(at));
    assert_eq!(updated.started_at, deployment.started_at);
    assert_eq!(updated.commit_hash, deployment.commit_hash);
}

#[tokio::test]
async fn test_logs_of_unknown_deployment() {
    let storage = MemStorage::new();
    assert!(storage.get_deployment_logs("nope").await.unwrap().is_empty());
    storage
        .add_deployment_log("nope", LogEntry::info("orphan"))
        .await
        .unwrap();
    assert_eq!(storage.get_deployment_logs("nope").await.unwrap().len(), 1);
}
