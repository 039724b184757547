//! Constants for the audio-jack reader session lifecycle.
//!
//! Values here mirror the behaviour of the reader firmware and are load-bearing
//! for session timing: the poll cadence, the settle delay inside the reset
//! handshake, and the missed-cycle disconnect threshold together determine how
//! quickly a vanished reader is detected (threshold × cadence).

use std::time::Duration;

// ============================================================================
// Card commands and status words
// ============================================================================

/// APDU that asks the contactless card for its UID.
///
/// `FF CA 00 00 00` is the PC/SC-style "get data" pseudo-APDU understood by
/// the reader firmware; the response carries the card UID followed by the
/// status word.
///
/// # Examples
///
/// ```
/// use audicard_core::constants::SELECT_UID_APDU;
///
/// assert_eq!(SELECT_UID_APDU.len(), 5);
/// assert_eq!(SELECT_UID_APDU[0], 0xFF);
/// ```
pub const SELECT_UID_APDU: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// Status word returned when no card is in the reader field.
///
/// A transmit that finds no card answers with exactly these two bytes
/// (`63 00`). The pair is a status indicator, not a card identifier, and must
/// never be surfaced as one.
///
/// # Examples
///
/// ```
/// use audicard_core::constants::NO_CARD_STATUS;
/// use audicard_core::types::render_hex;
///
/// assert_eq!(render_hex(&NO_CARD_STATUS), "63 00 ");
/// ```
pub const NO_CARD_STATUS: [u8; 2] = [0x63, 0x00];

// ============================================================================
// Session timing
// ============================================================================

/// Default time the reader is given to answer a PICC command.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Default interval between successive poll attempts.
///
/// The very first poll waits one full interval after the session starts (the
/// reader needs the same amount of time to stabilise as it needs between
/// polls).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default pause between putting the reader to sleep and issuing the second
/// reset of the power-up handshake.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound on the whole double-reset handshake.
///
/// A reader that produces no reset completion within this window is treated
/// as failed; there is no automatic retry.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Connection health
// ============================================================================

/// Number of consecutive poll cycles without any reader response after which
/// the session declares the device disconnected.
///
/// The counter counts cycles, not wall-clock time: with the default cadence
/// this amounts to four seconds of silence.
pub const MISSED_CYCLE_THRESHOLD: u32 = 4;

// ============================================================================
// Channel capacities
// ============================================================================

/// Buffer size of the reader notification stream.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Buffer size of the result sink handed to the host application.
pub const SINK_CHANNEL_CAPACITY: usize = 64;
