//! Backfill and live streaming to observers joining at different times

use std::sync::Arc;
use std::time::Duration;

use deployhub::deploy::driver::{Driver, Pace, RunTarget};
use deployhub::deploy::simulated::SimulatedStrategy;
use deployhub::logstream::{Broadcaster, ChannelObserver, ChannelRegistry, SubscriptionSession};
use deployhub::models::{DeploymentStatus, LogEntry, ProjectType};
use deployhub::storage::{MemStorage, Storage};

use crate::support::{drain, seed};

fn broadcaster(storage: Arc<dyn Storage>) -> Arc<Broadcaster> {
    Arc::new(Broadcaster::new(storage, Arc::new(ChannelRegistry::new())))
}

#[tokio::test(start_paused = true)]
async fn test_late_observers_see_the_same_sequence() {
    let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
    let broadcaster = broadcaster(storage.clone());
    let (project, deployment) = seed(storage.as_ref(), "demo", ProjectType::Fullstack).await;

    // Joined before the run starts
    let (early, mut early_rx) = ChannelObserver::new();
    let mut early_session = SubscriptionSession::new(broadcaster.clone(), Arc::new(early));
    early_session.subscribe(deployment.id.clone()).await.unwrap();

    let driver = Arc::new(Driver::new(
        storage.clone(),
        broadcaster.clone(),
        Arc::new(SimulatedStrategy::new("deployhub.app", Pace::default())),
    ));
    let run = driver.launch(RunTarget {
        deployment_id: deployment.id.clone(),
        project,
    });

    tokio::time::sleep(Duration::from_secs(3)).await;
    let (first, mut first_rx) = ChannelObserver::new();
    let mut first_session = SubscriptionSession::new(broadcaster.clone(), Arc::new(first));
    let replayed = first_session
        .handle_text(&format!(
            r#"{{"type":"subscribe","deploymentId":"{}"}}"#,
            deployment.id
        ))
        .await;
    assert!(replayed.is_ok());

    tokio::time::sleep(Duration::from_secs(6)).await;
    let (second, mut second_rx) = ChannelObserver::new();
    let mut second_session = SubscriptionSession::new(broadcaster.clone(), Arc::new(second));
    let backfill = second_session.subscribe(deployment.id.clone()).await.unwrap();
    assert!(backfill > 0);

    assert_eq!(run.await.unwrap(), DeploymentStatus::Success);

    let history = storage.get_deployment_logs(&deployment.id).await.unwrap();
    let early = drain(&mut early_rx);
    let first = drain(&mut first_rx);
    let second = drain(&mut second_rx);

    assert!(!history.is_empty());
    assert_eq!(early, history);
    assert_eq!(first, history);
    assert_eq!(second, history);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_subscribe_during_concurrent_publishes() {
    const LINES: usize = 500;

    for _ in 0..10 {
        let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
        let broadcaster = broadcaster(storage.clone());

        let publisher = {
            let broadcaster = broadcaster.clone();
            tokio::spawn(async move {
                for i in 0..LINES {
                    broadcaster
                        .publish("d-1", LogEntry::info(format!("line {}", i)))
                        .await
                        .unwrap();
                    if i % 16 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };

        let subscriber = {
            let broadcaster = broadcaster.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                let (observer, rx) = ChannelObserver::new();
                broadcaster.subscribe("d-1", Arc::new(observer)).await.unwrap();
                rx
            })
        };

        publisher.await.unwrap();
        let mut rx = subscriber.await.unwrap();

        let received: Vec<String> = drain(&mut rx).into_iter().map(|e| e.message).collect();
        let expected: Vec<String> = (0..LINES).map(|i| format!("line {}", i)).collect();
        assert_eq!(received, expected);
    }
}

#[tokio::test]
async fn test_disconnect_releases_registration() {
    let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
    let broadcaster = broadcaster(storage.clone());

    let (a, _rx_a) = ChannelObserver::new();
    let (b, _rx_b) = ChannelObserver::new();
    let mut a = SubscriptionSession::new(broadcaster.clone(), Arc::new(a));
    let mut b = SubscriptionSession::new(broadcaster.clone(), Arc::new(b));
    a.subscribe("d-1".to_string()).await.unwrap();
    b.subscribe("d-1".to_string()).await.unwrap();
    assert_eq!(broadcaster.registry().observer_count("d-1"), 2);

    a.close();
    assert_eq!(broadcaster.registry().observer_count("d-1"), 1);
    drop(b);
    assert!(broadcaster.registry().is_empty());

    // Nobody listens any more; the history still grows
    let delivered = broadcaster
        .publish("d-1", LogEntry::info("after everyone left"))
        .await
        .unwrap();
    assert_eq!(delivered, 0);
    assert_eq!(broadcaster.history("d-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reconnecting_observer_gets_full_history_again() {
    let storage: Arc<dyn Storage> = Arc::new(MemStorage::new());
    let broadcaster = broadcaster(storage.clone());
    broadcaster.publish("d-1", LogEntry::info("one")).await.unwrap();

    let (observer, mut rx) = ChannelObserver::new();
    let mut session = SubscriptionSession::new(broadcaster.clone(), Arc::new(observer));
    session.subscribe("d-1".to_string()).await.unwrap();
    session.close();

    broadcaster.publish("d-1", LogEntry::info("two")).await.unwrap();
    assert_eq!(drain(&mut rx).len(), 1);

    let (observer, mut rx) = ChannelObserver::new();
    let mut session = SubscriptionSession::new(broadcaster.clone(), Arc::new(observer));
    assert_eq!(session.subscribe("d-1".to_string()).await.unwrap(), 2);
    let messages: Vec<String> = drain(&mut rx).into_iter().map(|e| e.message).collect();
    assert_eq!(messages, vec!["one", "two"]);
}
