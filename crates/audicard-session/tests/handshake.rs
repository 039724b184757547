//! Integration tests for the double-reset handshake.
//!
//! These run with paused time so the settle delay and handshake timeout
//! elapse deterministically.

mod common;

use std::time::Duration;

use audicard_core::CardType;
use audicard_reader::ReaderError;
use audicard_reader::mock::PortOpKind;
use audicard_session::SessionState;
use audicard_session::config::SessionConfig;
use audicard_session::events::{FailureReason, ReadEvent};
use common::harness;
use tokio::time::timeout;

/// Generous bound for waits that must complete; virtual time makes these
/// cheap.
const WAIT: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn polling_starts_only_after_second_reset_completion() {
    let mut fixture = harness(SessionConfig::default());
    fixture.service.begin_read(CardType::Auto).await.unwrap();

    timeout(WAIT, fixture.reader.wait_for_ops(PortOpKind::Reset, 1))
        .await
        .unwrap();

    // Complete the first reset twice: the duplicate arrives while the settle
    // delay is still pending.
    fixture.reader.complete_reset().await.unwrap();
    fixture.reader.complete_reset().await.unwrap();

    // The sequencer still issues its delayed second reset.
    timeout(WAIT, fixture.reader.wait_for_ops(PortOpKind::Reset, 2))
        .await
        .unwrap();

    // The duplicate must not be mistaken for the second completion: no
    // polling commands may have been issued.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(fixture.reader.op_count(PortOpKind::PowerOn), 0);
    assert_eq!(fixture.reader.op_count(PortOpKind::Transmit), 0);

    // The genuine second completion unblocks polling.
    fixture.reader.complete_reset().await.unwrap();
    timeout(WAIT, fixture.reader.wait_for_ops(PortOpKind::PowerOn, 1))
        .await
        .unwrap();
    assert_eq!(fixture.service.state(), SessionState::PollingActive);

    fixture.service.stop_read().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn handshake_timeout_reports_failure_and_releases_reader() {
    let config = SessionConfig {
        handshake_timeout: Duration::from_secs(2),
        ..SessionConfig::default()
    };
    let mut fixture = harness(config);
    fixture.service.begin_read(CardType::Auto).await.unwrap();

    // Nobody completes the reset; the attempt must fail rather than hang.
    let event = timeout(WAIT, fixture.events.recv())
        .await
        .expect("handshake failure must be reported")
        .expect("sink open");
    match event {
        ReadEvent::Failed(FailureReason::Handshake { .. }) => {}
        other => panic!("expected handshake failure, got {other:?}"),
    }

    // The reader was released before the failure was reported, and no
    // polling command was ever issued.
    assert_eq!(fixture.reader.op_count(PortOpKind::PowerOff), 1);
    assert_eq!(fixture.reader.op_count(PortOpKind::Sleep), 1);
    assert_eq!(fixture.reader.op_count(PortOpKind::Stop), 1);
    assert_eq!(fixture.reader.op_count(PortOpKind::PowerOn), 0);
    assert_eq!(fixture.service.state(), SessionState::Terminated);

    fixture.service.stop_read().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reset_command_failure_fails_the_handshake() {
    let mut fixture = harness(SessionConfig::default());
    fixture
        .reader
        .fail_next_command(ReaderError::command_failed("start", "no transport"));

    // The command fails in the background pipeline, not in begin_read.
    fixture.service.begin_read(CardType::Auto).await.unwrap();

    let event = timeout(WAIT, fixture.events.recv())
        .await
        .expect("handshake failure must be reported")
        .expect("sink open");
    match event {
        ReadEvent::Failed(FailureReason::Handshake { message }) => {
            assert!(message.contains("no transport"), "got: {message}");
        }
        other => panic!("expected handshake failure, got {other:?}"),
    }

    assert_eq!(fixture.reader.op_count(PortOpKind::PowerOff), 1);
    assert_eq!(fixture.reader.op_count(PortOpKind::Stop), 1);
    assert_eq!(fixture.service.state(), SessionState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn only_one_delayed_reset_in_flight_despite_notification_storm() {
    let mut fixture = harness(SessionConfig::default());
    fixture.service.begin_read(CardType::Auto).await.unwrap();

    timeout(WAIT, fixture.reader.wait_for_ops(PortOpKind::Reset, 1))
        .await
        .unwrap();

    // A storm of first-reset completions.
    for _ in 0..5 {
        fixture.reader.complete_reset().await.unwrap();
    }

    timeout(WAIT, fixture.reader.wait_for_ops(PortOpKind::Reset, 2))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    // Exactly one delayed reset was issued and exactly one handshake sleep.
    assert_eq!(fixture.reader.op_count(PortOpKind::Reset), 2);
    assert_eq!(fixture.reader.op_count(PortOpKind::Sleep), 1);
    assert_eq!(fixture.reader.op_count(PortOpKind::PowerOn), 0);

    fixture.service.stop_read().await.unwrap();
}
