//! Oscine Core
//!
//! Core types and binary codec for the Open Sound Control (OSC) 1.0
//! wire protocol.
//!
//! This crate provides:
//! - Typed message arguments ([`Argument`])
//! - Message and bundle encoding/decoding ([`Message`], [`Bundle`], [`Packet`])
//! - NTP-era fixed-point timestamps ([`Timetag`])
//! - Address pattern compilation and matching ([`pattern`])
//!
//! Everything here is synchronous and allocation-light; transports and
//! dispatch live in `oscine-transport` and `oscine-server`.

pub mod argument;
pub mod bundle;
pub mod error;
pub mod message;
pub mod packet;
pub mod pattern;
pub mod timetag;
pub mod wire;

pub use argument::Argument;
pub use bundle::Bundle;
pub use error::{Error, Result};
pub use message::Message;
pub use packet::Packet;
pub use timetag::Timetag;

/// Leading byte of every typetag string.
pub const TYPETAG_PREFIX: u8 = b',';

/// Leading byte of every encoded message address.
pub const MESSAGE_CHAR: u8 = b'/';

/// Leading byte of every encoded bundle.
pub const BUNDLE_CHAR: u8 = b'#';

/// The OSC-string marking the start of a bundle, including its NUL
/// terminator (8 bytes, already 4-byte aligned).
pub const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";

/// Deepest bundle nesting the parser will follow. The wire format
/// itself permits unbounded nesting.
pub const MAX_BUNDLE_DEPTH: usize = 32;
