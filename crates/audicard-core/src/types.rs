//! Data types exchanged with the audio-jack reader.
//!
//! The types here are immutable once constructed: a [`Command`] is built when
//! a card type is selected and read-only afterwards, and a [`CardIdentifier`]
//! is a snapshot of one successful poll.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_RESPONSE_TIMEOUT, NO_CARD_STATUS, SELECT_UID_APDU};
use crate::error::{Error, Result};

/// Render a byte buffer as uppercase hexadecimal text.
///
/// Each byte becomes exactly two hex digits followed by a single space,
/// including the last byte, so the rendered text always carries a trailing
/// space. An empty buffer renders as the empty string. Downstream consumers
/// parse this exact shape; do not change it.
///
/// # Examples
///
/// ```
/// use audicard_core::types::render_hex;
///
/// assert_eq!(render_hex(&[0x04, 0xAB, 0xCD, 0xEF]), "04 AB CD EF ");
/// assert_eq!(render_hex(&[0x00]), "00 ");
/// assert_eq!(render_hex(&[]), "");
/// ```
pub fn render_hex(buffer: &[u8]) -> String {
    let mut text = String::with_capacity(buffer.len() * 3);
    for byte in buffer {
        // write! into a String cannot fail
        let _ = write!(text, "{byte:02X} ");
    }
    text
}

/// Check whether a response is the "no card present" status word.
///
/// # Examples
///
/// ```
/// use audicard_core::types::is_no_card_sentinel;
///
/// assert!(is_no_card_sentinel(&[0x63, 0x00]));
/// assert!(!is_no_card_sentinel(&[0x04, 0xAB, 0xCD, 0xEF]));
/// ```
pub fn is_no_card_sentinel(response: &[u8]) -> bool {
    response == NO_CARD_STATUS
}

/// Card technology selector for PICC polling.
///
/// The reader powers its contactless field for one family of card
/// technologies per poll; the wire codes are the ones the reader firmware
/// expects in the power-on command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum CardType {
    /// ISO 14443 Type A (Mifare family).
    Iso14443a,

    /// ISO 14443 Type B.
    Iso14443b,

    /// FeliCa at 212 kbps.
    Felica212,

    /// FeliCa at 424 kbps.
    Felica424,

    /// Poll every supported technology.
    #[default]
    Auto,
}

impl CardType {
    /// Wire code sent to the reader in the PICC power-on command.
    pub fn code(&self) -> u8 {
        match self {
            Self::Iso14443a => 0x01,
            Self::Iso14443b => 0x02,
            Self::Felica212 => 0x04,
            Self::Felica424 => 0x08,
            Self::Auto => 0x8F,
        }
    }

    /// Human-readable name for the card type.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Iso14443a => "ISO 14443 Type A",
            Self::Iso14443b => "ISO 14443 Type B",
            Self::Felica212 => "FeliCa 212kbps",
            Self::Felica424 => "FeliCa 424kbps",
            Self::Auto => "Auto",
        }
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CardType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iso14443a" | "type-a" | "typea" | "a" => Ok(Self::Iso14443a),
            "iso14443b" | "type-b" | "typeb" | "b" => Ok(Self::Iso14443b),
            "felica212" => Ok(Self::Felica212),
            "felica424" => Ok(Self::Felica424),
            "auto" => Ok(Self::Auto),
            other => Err(Error::invalid_data(format!("unknown card type: {other}"))),
        }
    }
}

/// Immutable command sent to the card on every poll cycle.
///
/// Holds the APDU payload and the time the reader is given to answer it.
/// Constructed once per card-type selection and shared read-only by the
/// polling loop.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use audicard_core::types::Command;
///
/// let command = Command::select_uid(Duration::from_secs(1));
/// assert_eq!(command.apdu()[0], 0xFF);
/// assert_eq!(command.response_timeout(), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct Command {
    apdu: Bytes,
    response_timeout: Duration,
}

impl Command {
    /// Create a command from a raw APDU payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is empty.
    pub fn new(apdu: impl Into<Bytes>, response_timeout: Duration) -> Result<Self> {
        let apdu = apdu.into();
        if apdu.is_empty() {
            return Err(Error::invalid_data("command APDU cannot be empty"));
        }
        Ok(Self {
            apdu,
            response_timeout,
        })
    }

    /// The standard UID read command with the given response timeout.
    pub fn select_uid(response_timeout: Duration) -> Self {
        Self {
            apdu: Bytes::from_static(&SELECT_UID_APDU),
            response_timeout,
        }
    }

    /// The APDU payload.
    pub fn apdu(&self) -> &[u8] {
        &self.apdu
    }

    /// Time the reader is given to answer this command.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }
}

impl Default for Command {
    fn default() -> Self {
        Self::select_uid(DEFAULT_RESPONSE_TIMEOUT)
    }
}

/// Identifier read from a card during one poll cycle.
///
/// Carries the raw response bytes, the derived hexadecimal text (see
/// [`render_hex`] for the exact shape) and the capture timestamp. The
/// no-card status word is not a valid identifier and is rejected at
/// construction.
///
/// # Examples
///
/// ```
/// use audicard_core::types::CardIdentifier;
///
/// let card = CardIdentifier::from_response(&[0x04, 0xAB, 0xCD, 0xEF]).unwrap();
/// assert_eq!(card.hex(), "04 AB CD EF ");
///
/// assert!(CardIdentifier::from_response(&[0x63, 0x00]).is_err());
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CardIdentifier {
    uid: Vec<u8>,
    hex: String,
    read_at: DateTime<Utc>,
}

impl CardIdentifier {
    /// Build an identifier from a raw response APDU.
    ///
    /// # Errors
    ///
    /// Returns an error if the response is empty or is the no-card status
    /// word.
    pub fn from_response(response: &[u8]) -> Result<Self> {
        if response.is_empty() {
            return Err(Error::invalid_data("card response cannot be empty"));
        }
        if is_no_card_sentinel(response) {
            return Err(Error::invalid_data(
                "no-card status word is not a card identifier",
            ));
        }
        Ok(Self {
            uid: response.to_vec(),
            hex: render_hex(response),
            read_at: Utc::now(),
        })
    }

    /// Raw response bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.uid
    }

    /// Uppercase hexadecimal rendering of the response.
    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// When this identifier was captured.
    pub fn read_at(&self) -> DateTime<Utc> {
        self.read_at
    }
}

impl fmt::Display for CardIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex)
    }
}
