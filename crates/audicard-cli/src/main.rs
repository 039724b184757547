//! Demo binary: a full read session against the mock reader.
//!
//! Runs the double-reset handshake, polls at the configured cadence, scripts
//! a card tap through the mock control handle, and prints every event the
//! session reports. With `--taps 0` the reader stays silent and the run ends
//! in the disconnect report instead.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use audicard_core::CardType;
use audicard_reader::mock::{MockEnvironment, MockReaderPort};
use audicard_reader::{AnyAudioEnvironment, AnyReaderPort};
use audicard_session::config::SessionConfig;
use audicard_session::events::ReadEvent;
use audicard_session::service::ReaderService;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "audicard", about = "Audio-jack card reader session demo")]
struct Args {
    /// Card technology to poll for.
    #[arg(long, default_value = "auto")]
    card_type: CardType,

    /// Poll cadence in milliseconds.
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// UID the simulated card answers with, as hex digits.
    #[arg(long, default_value = "04ABCDEF")]
    uid: String,

    /// Number of poll cycles the simulated card stays in the field.
    #[arg(long, default_value_t = 3)]
    taps: u32,
}

fn parse_uid(text: &str) -> Result<Vec<u8>> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        bail!("UID must be an even number of hex digits, got {text:?}");
    }
    (0..cleaned.len())
        .step_by(2)
        .map(|index| {
            u8::from_str_radix(&cleaned[index..index + 2], 16)
                .with_context(|| format!("invalid hex byte in UID {text:?}"))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let uid = parse_uid(&args.uid)?;

    let (port, reader) = MockReaderPort::new();
    reader.set_auto_reset_complete(true);
    let (environment, _environment_handle) = MockEnvironment::new();

    let config = SessionConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        ..SessionConfig::default()
    };
    let poll_interval = config.poll_interval;

    let (mut service, mut events) = ReaderService::new(
        AnyReaderPort::Mock(port),
        AnyAudioEnvironment::Mock(environment),
        config,
    )?;

    service.begin_read(args.card_type).await?;
    info!(card_type = %args.card_type, "read session requested");

    // Script the "hardware": hold a card in the field for a few cycles,
    // then remove it and let the disconnect detection end the run.
    let taps = args.taps;
    let script = tokio::spawn(async move {
        use audicard_reader::mock::PortOpKind;
        for tap in 1..=taps {
            reader.wait_for_ops(PortOpKind::Transmit, tap as usize).await;
            if reader.respond(uid.clone()).await.is_err() {
                return;
            }
        }
        if taps > 0 {
            info!("card removed from field");
        }
    });

    let mut cards_seen = 0u32;
    while let Some(event) = events.recv().await {
        match event {
            ReadEvent::Card(card) => {
                cards_seen += 1;
                info!(uid = %card.hex(), cards_seen, "card identifier");
            }
            ReadEvent::Failed(reason) => {
                warn!(%reason, "session ended");
                break;
            }
        }
    }

    service.stop_read().await?;
    script.abort();
    info!(
        cards_seen,
        cadence_ms = poll_interval.as_millis() as u64,
        "demo finished"
    );
    Ok(())
}
