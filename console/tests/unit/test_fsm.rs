//! FSM unit tests

use deployhub::deploy::fsm::{DeploymentEvent, DeploymentFsm};
use deployhub::errors::ConsoleError;
use deployhub::models::DeploymentStatus;
use tokio_test::{assert_err, assert_ok};

#[test]
fn test_fsm_initial_state() {
    let fsm = DeploymentFsm::new();
    assert_eq!(fsm.state(), DeploymentStatus::Pending);
    assert!(fsm.error().is_none());
    assert!(!fsm.is_terminal());
    assert_eq!(fsm.history(), &[DeploymentStatus::Pending]);
}

#[test]
fn test_fsm_success_flow() {
    let mut fsm = DeploymentFsm::new();

    assert_ok!(fsm.process(DeploymentEvent::Build));
    assert_ok!(fsm.process(DeploymentEvent::Deploy));
    assert_ok!(fsm.process(DeploymentEvent::Succeed));

    assert_eq!(
        fsm.history(),
        &[
            DeploymentStatus::Pending,
            DeploymentStatus::Building,
            DeploymentStatus::Deploying,
            DeploymentStatus::Success,
        ]
    );
    assert!(fsm.is_terminal());
}

#[test]
fn test_fsm_fails_from_every_active_state() {
    for steps in 0..3 {
        let mut fsm = DeploymentFsm::new();
        let events = [DeploymentEvent::Build, DeploymentEvent::Deploy];
        for event in events.into_iter().take(steps) {
            fsm.process(event).unwrap();
        }

        let state = fsm.process(DeploymentEvent::Fail("boom".to_string())).unwrap();
        assert_eq!(state, DeploymentStatus::Failed);
        assert_eq!(fsm.error(), Some("boom"));
    }
}

#[test]
fn test_fsm_never_skips_a_phase() {
    let mut fsm = DeploymentFsm::new();
    assert!(matches!(
        fsm.process(DeploymentEvent::Deploy),
        Err(ConsoleError::InvalidTransition(_))
    ));
    assert_err!(fsm.process(DeploymentEvent::Succeed));

    fsm.process(DeploymentEvent::Build).unwrap();
    assert_err!(fsm.process(DeploymentEvent::Build));
    assert_err!(fsm.process(DeploymentEvent::Succeed));

    // Rejected events leave the state untouched
    assert_eq!(fsm.state(), DeploymentStatus::Building);
    assert_eq!(fsm.history().len(), 2);
}

#[test]
fn test_fsm_terminal_states_are_final() {
    let mut failed = DeploymentFsm::new();
    failed.process(DeploymentEvent::Fail("first".to_string())).unwrap();
    assert_err!(failed.process(DeploymentEvent::Build));
    assert_err!(failed.process(DeploymentEvent::Fail("second".to_string())));
    assert_eq!(failed.error(), Some("first"));

    let mut succeeded = DeploymentFsm::new();
    succeeded.process(DeploymentEvent::Build).unwrap();
    succeeded.process(DeploymentEvent::Deploy).unwrap();
    succeeded.process(DeploymentEvent::Succeed).unwrap();
    assert_err!(succeeded.process(DeploymentEvent::Fail("late".to_string())));
    assert_eq!(succeeded.state(), DeploymentStatus::Success);
}
