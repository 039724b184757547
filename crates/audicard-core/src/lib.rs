//! Core types for the audicard audio-jack card reader stack.
//!
//! This crate holds the pieces shared by every other audicard crate: the
//! command and identifier types exchanged with the reader, the wire-level
//! constants (select APDU, no-card status bytes, default timings), and the
//! session error taxonomy.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
