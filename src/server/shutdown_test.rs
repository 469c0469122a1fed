//! Tests for termination signaling

use super::shutdown::*;
use std::time::Duration;

/// Test that termination channel starts untriggered
#[tokio::test]
async fn test_termination_channel_initially_untriggered() {
    let (_controller, signal) = termination_channel();

    assert_eq!(signal.reason(), None);
}

/// Test that termination can be triggered
#[tokio::test]
async fn test_termination_channel_triggers() {
    let (controller, signal) = termination_channel();

    controller.trigger(Termination::Crash);

    assert_eq!(signal.reason(), Some(Termination::Crash));
}

/// Test that the first reason wins
#[tokio::test]
async fn test_first_reason_wins() {
    let (controller, signal) = termination_channel();

    controller.trigger(Termination::Crash);
    controller.trigger(Termination::Signal("SIGTERM"));

    assert_eq!(signal.reason(), Some(Termination::Crash));
}

/// Test that wait completes when termination is triggered
#[tokio::test]
async fn test_wait_completes_on_trigger() {
    let (controller, mut signal) = termination_channel();

    // Spawn task that triggers termination after delay
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        controller.trigger(Termination::Signal("SIGTERM"));
    });

    let result = tokio::time::timeout(Duration::from_secs(1), signal.wait()).await;

    assert_eq!(
        result.expect("wait() should complete when triggered"),
        Some(Termination::Signal("SIGTERM"))
    );
}

/// Test that wait returns None once every controller is dropped
#[tokio::test]
async fn test_wait_returns_none_when_controllers_dropped() {
    let (controller, mut signal) = termination_channel();
    let cloned = controller.clone();
    drop(controller);
    drop(cloned);

    let result = tokio::time::timeout(Duration::from_secs(1), signal.wait()).await;
    assert_eq!(result.expect("wait() should not hang"), None);
}

/// Test that cloned signals all observe termination
#[tokio::test]
async fn test_signal_clones_share_state() {
    let (controller, signal) = termination_channel();
    let signal2 = signal.clone();

    controller.clone().trigger(Termination::Crash);

    assert_eq!(signal.reason(), Some(Termination::Crash));
    assert_eq!(signal2.reason(), Some(Termination::Crash));
}

/// Test exit codes per reason
#[test]
fn test_exit_codes() {
    assert_eq!(Termination::Crash.exit_code(), 1);
    assert_eq!(
        Termination::SentinelFailure("disk full".to_string()).exit_code(),
        1
    );
    assert_eq!(Termination::Signal("SIGTERM").exit_code(), 0);
}
