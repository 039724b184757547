//! Shared fixtures for session integration tests.

#![allow(dead_code)]

use audicard_reader::mock::{
    MockEnvironment, MockEnvironmentHandle, MockReaderHandle, MockReaderPort,
};
use audicard_reader::{AnyAudioEnvironment, AnyReaderPort};
use audicard_session::config::SessionConfig;
use audicard_session::events::ReadEvent;
use audicard_session::service::ReaderService;
use tokio::sync::mpsc;

/// A service wired to mock hardware, plus the control handles driving it.
pub struct Harness {
    pub service: ReaderService,
    pub events: mpsc::Receiver<ReadEvent>,
    pub reader: MockReaderHandle,
    pub environment: MockEnvironmentHandle,
}

/// Build a harness; resets must be completed manually through the reader
/// handle.
pub fn harness(config: SessionConfig) -> Harness {
    let (port, reader) = MockReaderPort::new();
    let (environment, environment_handle) = MockEnvironment::new();

    let (service, events) = ReaderService::new(
        AnyReaderPort::Mock(port),
        AnyAudioEnvironment::Mock(environment),
        config,
    )
    .expect("default test configuration is valid");

    Harness {
        service,
        events,
        reader,
        environment: environment_handle,
    }
}

/// Build a harness whose reader completes every reset on its own, so the
/// handshake runs unattended.
pub fn auto_harness() -> Harness {
    let fixture = harness(SessionConfig::default());
    fixture.reader.set_auto_reset_complete(true);
    fixture
}
